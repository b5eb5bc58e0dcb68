//! Strategy persistence port trait.

use crate::domain::error::RulecraftError;
use crate::domain::strategy::StrategyRecord;

/// Where a strategy record is read from and written back to.
pub trait StrategyPort {
    fn load(&self) -> Result<StrategyRecord, RulecraftError>;

    fn save(&self, record: &StrategyRecord) -> Result<(), RulecraftError>;

    fn exists(&self) -> bool;
}
