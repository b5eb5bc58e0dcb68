//! Addressing of one operand slot, used to route picker results back into
//! the tree.

use crate::domain::condition::Condition;
use crate::domain::rule_node::{NodeId, RuleNode};
use crate::domain::rule_tree::RuleType;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    OperandA,
    OperandB,
}

impl Slot {
    pub fn get(self, node: &RuleNode) -> Option<&Condition> {
        match self {
            Slot::OperandA => node.operand_a.as_ref(),
            Slot::OperandB => node.operand_b.as_ref(),
        }
    }

    /// Copy of `node` with this slot set to `condition`.
    pub fn set(self, node: &RuleNode, condition: Option<Condition>) -> RuleNode {
        let mut updated = node.clone();
        match self {
            Slot::OperandA => updated.operand_a = condition,
            Slot::OperandB => updated.operand_b = condition,
        }
        updated
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::OperandA => f.write_str("operandA"),
            Slot::OperandB => f.write_str("operandB"),
        }
    }
}

impl FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "operanda" => Ok(Slot::OperandA),
            "b" | "operandb" => Ok(Slot::OperandB),
            _ => Err(format!("unknown slot '{}', expected a or b", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetSlot {
    pub rule_type: RuleType,
    pub node_id: NodeId,
    pub slot: Slot,
}

impl TargetSlot {
    pub fn new(rule_type: RuleType, node_id: impl Into<NodeId>, slot: Slot) -> Self {
        Self {
            rule_type,
            node_id: node_id.into(),
            slot,
        }
    }
}

impl fmt::Display for TargetSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.rule_type, self.node_id, self.slot)
    }
}
