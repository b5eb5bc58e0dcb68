//! Concrete adapter implementations for ports, plus text rendering.

pub mod file_config_adapter;
pub mod json_strategy_adapter;
pub mod catalog_file_adapter;
pub mod text_renderer;
