//! Core domain types and logic.

pub mod catalog;
pub mod condition;
pub mod rule_node;
pub mod rule_tree;
pub mod target_slot;
pub mod tree_editor;
pub mod mirror;
pub mod session;
pub mod validation;
pub mod strategy;
pub mod config_validation;
pub mod error;
