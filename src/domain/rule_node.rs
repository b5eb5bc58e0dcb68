//! Signal block data structures.
//!
//! - `NodeId`: opaque, stable identity of a block
//! - `ComparisonOperator`: how `operand_a` is compared with `operand_b`
//! - `LogicOperator`: how a block's children combine
//! - `RuleNode`: one block plus its nested AND-children
//! - `NodePatch`: field-wise update applied by the editor

use crate::domain::condition::Condition;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// 64 random bits, hex encoded.
    pub fn generate() -> Self {
        NodeId(hex::encode(rand::random::<[u8; 8]>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        NodeId(value)
    }
}

impl FromStr for NodeId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(NodeId::from(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[default]
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "crosses-above")]
    CrossesAbove,
    #[serde(rename = "crosses-below")]
    CrossesBelow,
}

impl ComparisonOperator {
    pub const ALL: [ComparisonOperator; 5] = [
        ComparisonOperator::GreaterThan,
        ComparisonOperator::LessThan,
        ComparisonOperator::Equal,
        ComparisonOperator::CrossesAbove,
        ComparisonOperator::CrossesBelow,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::Equal => "=",
            ComparisonOperator::CrossesAbove => "crosses-above",
            ComparisonOperator::CrossesBelow => "crosses-below",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ComparisonOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ComparisonOperator::ALL
            .into_iter()
            .find(|op| op.symbol() == needle)
            .ok_or_else(|| {
                format!(
                    "unknown operator '{}', expected one of: >, <, =, crosses-above, crosses-below",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicOperator {
    #[default]
    And,
    Or,
}

impl fmt::Display for LogicOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicOperator::And => f.write_str("AND"),
            LogicOperator::Or => f.write_str("OR"),
        }
    }
}

impl FromStr for LogicOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(LogicOperator::And),
            "OR" => Ok(LogicOperator::Or),
            _ => Err(format!("unknown logic operator '{}', expected AND or OR", s)),
        }
    }
}

/// One comparison block. Children are shared with earlier tree snapshots
/// until an edit touches them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleNode {
    pub id: NodeId,
    #[serde(default)]
    pub operator: ComparisonOperator,
    #[serde(default)]
    pub operand_a: Option<Condition>,
    #[serde(default)]
    pub operand_b: Option<Condition>,
    #[serde(default)]
    pub child_logic_operator: LogicOperator,
    #[serde(default)]
    pub children: Vec<Arc<RuleNode>>,
}

impl RuleNode {
    pub fn new() -> Self {
        Self::with_id(NodeId::generate())
    }

    pub fn with_id(id: NodeId) -> Self {
        Self {
            id,
            operator: ComparisonOperator::default(),
            operand_a: None,
            operand_b: None,
            child_logic_operator: LogicOperator::default(),
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(|c| c.subtree_len()).sum::<usize>()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.any_id(&mut |candidate| candidate == id)
    }

    /// True if `predicate` holds for the id of any node in this subtree.
    pub fn any_id<P>(&self, predicate: &mut P) -> bool
    where
        P: FnMut(&NodeId) -> bool,
    {
        predicate(&self.id) || self.children.iter().any(|c| c.any_id(predicate))
    }
}

impl Default for RuleNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Field-wise update for `update_rule_data`. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub operator: Option<ComparisonOperator>,
    pub operand_a: Option<Option<Condition>>,
    pub operand_b: Option<Option<Condition>>,
    pub child_logic_operator: Option<LogicOperator>,
    pub children: Option<Vec<Arc<RuleNode>>>,
}

impl NodePatch {
    /// Overwrite every field except the id, e.g. after reloading a saved strategy.
    pub fn replace_with(node: &RuleNode) -> Self {
        Self {
            operator: Some(node.operator),
            operand_a: Some(node.operand_a.clone()),
            operand_b: Some(node.operand_b.clone()),
            child_logic_operator: Some(node.child_logic_operator),
            children: Some(node.children.clone()),
        }
    }

    pub fn operator(mut self, operator: ComparisonOperator) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn operand_a(mut self, condition: Option<Condition>) -> Self {
        self.operand_a = Some(condition);
        self
    }

    pub fn operand_b(mut self, condition: Option<Condition>) -> Self {
        self.operand_b = Some(condition);
        self
    }

    pub fn child_logic_operator(mut self, logic: LogicOperator) -> Self {
        self.child_logic_operator = Some(logic);
        self
    }

    pub fn children(mut self, children: Vec<Arc<RuleNode>>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, node: &RuleNode) -> RuleNode {
        RuleNode {
            id: node.id.clone(),
            operator: self.operator.unwrap_or(node.operator),
            operand_a: self.operand_a.clone().unwrap_or_else(|| node.operand_a.clone()),
            operand_b: self.operand_b.clone().unwrap_or_else(|| node.operand_b.clone()),
            child_logic_operator: self
                .child_logic_operator
                .unwrap_or(node.child_logic_operator),
            children: self.children.clone().unwrap_or_else(|| node.children.clone()),
        }
    }
}
