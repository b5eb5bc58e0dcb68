//! Buy and sell rule forests.

use crate::domain::rule_node::{NodeId, RuleNode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Buy,
    Sell,
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleType::Buy => f.write_str("buy"),
            RuleType::Sell => f.write_str("sell"),
        }
    }
}

impl FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(RuleType::Buy),
            "sell" => Ok(RuleType::Sell),
            _ => Err(format!("unknown rule type '{}', expected buy or sell", s)),
        }
    }
}

/// Two independent id spaces: nothing addressed to `buy` is ever looked up
/// in `sell`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleTree {
    #[serde(default)]
    pub buy: Vec<Arc<RuleNode>>,
    #[serde(default)]
    pub sell: Vec<Arc<RuleNode>>,
}

impl RuleTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rules(&self, rule_type: RuleType) -> &[Arc<RuleNode>] {
        match rule_type {
            RuleType::Buy => &self.buy,
            RuleType::Sell => &self.sell,
        }
    }

    /// Copy of this tree with one side replaced. The other side is shared.
    pub fn with_rules(&self, rule_type: RuleType, rules: Vec<Arc<RuleNode>>) -> Self {
        match rule_type {
            RuleType::Buy => Self {
                buy: rules,
                sell: self.sell.clone(),
            },
            RuleType::Sell => Self {
                buy: self.buy.clone(),
                sell: rules,
            },
        }
    }

    pub fn find(&self, rule_type: RuleType, id: &NodeId) -> Option<&Arc<RuleNode>> {
        find_in(self.rules(rule_type), id)
    }

    pub fn node_count(&self, rule_type: RuleType) -> usize {
        self.rules(rule_type).iter().map(|n| n.subtree_len()).sum()
    }

    /// Depth-first, pre-order.
    pub fn ids(&self, rule_type: RuleType) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.node_count(rule_type));
        collect_ids(self.rules(rule_type), &mut out);
        out
    }

    /// Deepest nesting level; 0 for an empty side, 1 for top-level only.
    pub fn depth(&self, rule_type: RuleType) -> usize {
        depth_of(self.rules(rule_type))
    }

    pub fn is_empty(&self) -> bool {
        self.buy.is_empty() && self.sell.is_empty()
    }
}

fn find_in<'a>(nodes: &'a [Arc<RuleNode>], id: &NodeId) -> Option<&'a Arc<RuleNode>> {
    for node in nodes {
        if node.id == *id {
            return Some(node);
        }
        if let Some(found) = find_in(&node.children, id) {
            return Some(found);
        }
    }
    None
}

fn collect_ids(nodes: &[Arc<RuleNode>], out: &mut Vec<NodeId>) {
    for node in nodes {
        out.push(node.id.clone());
        collect_ids(&node.children, out);
    }
}

fn depth_of(nodes: &[Arc<RuleNode>]) -> usize {
    nodes
        .iter()
        .map(|n| 1 + depth_of(&n.children))
        .max()
        .unwrap_or(0)
}
