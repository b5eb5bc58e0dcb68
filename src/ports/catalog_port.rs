//! Indicator catalog source port trait.

use crate::domain::catalog::IndicatorCatalog;
use crate::domain::error::RulecraftError;

pub trait CatalogPort {
    fn load_catalog(&self) -> Result<IndicatorCatalog, RulecraftError>;
}

/// The catalog shipped with the crate.
pub struct BuiltinCatalog;

impl CatalogPort for BuiltinCatalog {
    fn load_catalog(&self) -> Result<IndicatorCatalog, RulecraftError> {
        Ok(IndicatorCatalog::builtin())
    }
}
