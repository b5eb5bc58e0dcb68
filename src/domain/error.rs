//! Domain error types.

use crate::domain::rule_node::NodeId;
use crate::domain::rule_tree::RuleType;
use crate::domain::target_slot::Slot;
use crate::domain::validation::TreeIssue;

/// Top-level error type for rulecraft.
#[derive(Debug, thiserror::Error)]
pub enum RulecraftError {
    #[error("no {rule_type} rule with id {id}")]
    NodeNotFound { rule_type: RuleType, id: NodeId },

    #[error("{rule_type} rule {id} already exists")]
    DuplicateId { rule_type: RuleType, id: NodeId },

    #[error("{slot} of {rule_type} rule {id} is empty")]
    SlotEmpty {
        rule_type: RuleType,
        id: NodeId,
        slot: Slot,
    },

    #[error("{slot} of {rule_type} rule {id} is not {expected}")]
    SlotKindMismatch {
        rule_type: RuleType,
        id: NodeId,
        slot: Slot,
        expected: &'static str,
    },

    #[error("{slot} of {rule_type} rule {id}: {value} holds a number that is not finite")]
    NonFiniteNumber {
        rule_type: RuleType,
        id: NodeId,
        slot: Slot,
        value: String,
    },

    #[error("unknown indicator {key}")]
    UnknownIndicator { key: String },

    #[error("indicator {indicator} has no parameter {parameter}")]
    UnknownParameter { indicator: String, parameter: String },

    #[error("slot holds indicator {found}, edit was made against {expected}")]
    IndicatorMismatch { expected: String, found: String },

    #[error("strategy has {} invalid rule(s): {}", .issues.len(), summarize(.issues))]
    InvalidTree { issues: Vec<TreeIssue> },

    #[error("strategy has no buy or sell rules")]
    EmptyStrategy,

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("malformed strategy data: {0}")]
    Wire(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn summarize(issues: &[TreeIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<&RulecraftError> for std::process::ExitCode {
    fn from(err: &RulecraftError) -> Self {
        let code: u8 = match err {
            RulecraftError::Io(_) => 1,
            RulecraftError::ConfigParse { .. } | RulecraftError::ConfigInvalid { .. } => 2,
            RulecraftError::Wire(_) => 3,
            RulecraftError::NodeNotFound { .. }
            | RulecraftError::DuplicateId { .. }
            | RulecraftError::SlotEmpty { .. }
            | RulecraftError::SlotKindMismatch { .. }
            | RulecraftError::UnknownParameter { .. }
            | RulecraftError::IndicatorMismatch { .. }
            | RulecraftError::NonFiniteNumber { .. } => 4,
            RulecraftError::UnknownIndicator { .. }
            | RulecraftError::InvalidTree { .. }
            | RulecraftError::EmptyStrategy => 5,
        };
        std::process::ExitCode::from(code)
    }
}
