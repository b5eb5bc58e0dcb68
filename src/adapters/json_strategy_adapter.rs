//! JSON file strategy adapter.
//!
//! Reads and writes a single strategy record in the backend's wire shape.

use crate::domain::error::RulecraftError;
use crate::domain::strategy::StrategyRecord;
use crate::ports::strategy_port::StrategyPort;
use std::fs;
use std::path::{Path, PathBuf};

pub struct JsonStrategyFile {
    path: PathBuf,
}

impl JsonStrategyFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl StrategyPort for JsonStrategyFile {
    fn load(&self) -> Result<StrategyRecord, RulecraftError> {
        let content = fs::read_to_string(&self.path)?;
        let record = serde_json::from_str(&content)?;
        tracing::debug!(path = %self.path.display(), "strategy loaded");
        Ok(record)
    }

    fn save(&self, record: &StrategyRecord) -> Result<(), RulecraftError> {
        let mut content = serde_json::to_string_pretty(record)?;
        content.push('\n');
        fs::write(&self.path, content)?;
        tracing::debug!(path = %self.path.display(), "strategy saved");
        Ok(())
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}
