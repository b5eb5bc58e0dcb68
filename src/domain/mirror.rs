//! Buy/sell mirroring.
//!
//! A sell rule is often the buy rule with its comparisons flipped; these
//! helpers derive one from the other without touching the source node.

use crate::domain::error::RulecraftError;
use crate::domain::rule_node::{ComparisonOperator, NodeId, RuleNode};
use crate::domain::rule_tree::{RuleTree, RuleType};
use crate::domain::tree_editor;
use std::sync::Arc;

impl ComparisonOperator {
    pub fn mirrored(self) -> Self {
        match self {
            ComparisonOperator::GreaterThan => ComparisonOperator::LessThan,
            ComparisonOperator::LessThan => ComparisonOperator::GreaterThan,
            ComparisonOperator::CrossesAbove => ComparisonOperator::CrossesBelow,
            ComparisonOperator::CrossesBelow => ComparisonOperator::CrossesAbove,
            ComparisonOperator::Equal => ComparisonOperator::Equal,
        }
    }
}

/// Fresh-id copy of `node` with every operator in the subtree mirrored.
/// Operands and child logic are kept as they are.
pub fn mirror_node(node: &RuleNode) -> RuleNode {
    RuleNode {
        id: NodeId::generate(),
        operator: node.operator.mirrored(),
        operand_a: node.operand_a.clone(),
        operand_b: node.operand_b.clone(),
        child_logic_operator: node.child_logic_operator,
        children: node
            .children
            .iter()
            .map(|child| Arc::new(mirror_node(child)))
            .collect(),
    }
}

/// Append the mirror of buy rule `buy_id` to the sell rules.
pub fn mirror_into_sell(tree: &RuleTree, buy_id: &NodeId) -> RuleTree {
    try_mirror_into_sell(tree, buy_id)
        .map(|(tree, _)| tree)
        .unwrap_or_else(|err| {
            tracing::debug!(error = %err, "mirror ignored, tree unchanged");
            tree.clone()
        })
}

/// Like `mirror_into_sell`, also returning the id of the new sell rule.
pub fn try_mirror_into_sell(
    tree: &RuleTree,
    buy_id: &NodeId,
) -> Result<(RuleTree, NodeId), RulecraftError> {
    let source = tree
        .find(RuleType::Buy, buy_id)
        .ok_or_else(|| RulecraftError::NodeNotFound {
            rule_type: RuleType::Buy,
            id: buy_id.clone(),
        })?;
    let mirrored = mirror_node(source);
    let id = mirrored.id.clone();
    let tree = tree_editor::try_insert_rule(
        tree,
        RuleType::Sell,
        None,
        mirrored.child_logic_operator,
        mirrored,
    )?;
    Ok((tree, id))
}
