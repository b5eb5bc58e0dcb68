//! Port traits: the crate's boundaries to configuration, persistence and
//! the indicator catalog.

pub mod config_port;
pub mod strategy_port;
pub mod catalog_port;
