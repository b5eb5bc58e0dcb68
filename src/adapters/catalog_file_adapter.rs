//! Indicator catalog read from a JSON export of the backend registry.

use crate::domain::catalog::IndicatorCatalog;
use crate::domain::error::RulecraftError;
use crate::ports::catalog_port::CatalogPort;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CatalogFileAdapter {
    path: PathBuf,
}

impl CatalogFileAdapter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CatalogPort for CatalogFileAdapter {
    fn load_catalog(&self) -> Result<IndicatorCatalog, RulecraftError> {
        let content = fs::read_to_string(&self.path)?;
        let catalog = IndicatorCatalog::from_json(&content)?;
        tracing::debug!(
            path = %self.path.display(),
            indicators = catalog.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }
}
