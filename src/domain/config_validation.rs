//! Configuration validation.
//!
//! Validates the editor config before any strategy file is touched.

use crate::domain::error::RulecraftError;
use crate::ports::config_port::ConfigPort;

pub const LOG_FORMATS: [&str; 2] = ["pretty", "json"];

pub fn validate_editor_config(config: &dyn ConfigPort) -> Result<(), RulecraftError> {
    validate_strict(config)?;
    validate_catalog_path(config)?;
    validate_log_format(config)?;
    validate_log_filter(config)?;
    Ok(())
}

fn validate_strict(config: &dyn ConfigPort) -> Result<(), RulecraftError> {
    match config.get_string("editor", "strict") {
        None => Ok(()),
        Some(s) if matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "1" | "false" | "no" | "0"
        ) =>
        {
            Ok(())
        }
        Some(s) => Err(RulecraftError::ConfigInvalid {
            section: "editor".to_string(),
            key: "strict".to_string(),
            reason: format!("expected true or false, found '{}'", s),
        }),
    }
}

fn validate_catalog_path(config: &dyn ConfigPort) -> Result<(), RulecraftError> {
    match config.get_string("catalog", "path") {
        Some(s) if s.trim().is_empty() => Err(RulecraftError::ConfigInvalid {
            section: "catalog".to_string(),
            key: "path".to_string(),
            reason: "path must not be empty when set".to_string(),
        }),
        _ => Ok(()),
    }
}

fn validate_log_format(config: &dyn ConfigPort) -> Result<(), RulecraftError> {
    match config.get_string("logging", "format") {
        None => Ok(()),
        Some(s) if LOG_FORMATS.contains(&s.trim().to_lowercase().as_str()) => Ok(()),
        Some(s) => Err(RulecraftError::ConfigInvalid {
            section: "logging".to_string(),
            key: "format".to_string(),
            reason: format!("unknown format '{}', expected pretty or json", s),
        }),
    }
}

fn validate_log_filter(config: &dyn ConfigPort) -> Result<(), RulecraftError> {
    match config.get_string("logging", "filter") {
        Some(s) if s.trim().is_empty() => Err(RulecraftError::ConfigInvalid {
            section: "logging".to_string(),
            key: "filter".to_string(),
            reason: "filter must not be empty when set".to_string(),
        }),
        _ => Ok(()),
    }
}
