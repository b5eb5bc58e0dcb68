//! Pure edit operations on a `RuleTree`.
//!
//! Every operation takes the current tree by reference and returns a new
//! one; the input is never modified. Only the nodes on the path from the
//! root to the edited list are rebuilt, every other subtree is shared with
//! the input through its `Arc`.
//!
//! The `try_*` forms report why an edit was refused. The plain forms log the
//! refusal at debug level and return the input tree unchanged, so a stale id
//! coming from the UI never aborts an editing session.

use crate::domain::catalog::IndicatorDefinition;
use crate::domain::condition::{Condition, ConditionKind, IndicatorRef, ParameterValue};
use crate::domain::error::RulecraftError;
use crate::domain::rule_node::{LogicOperator, NodeId, NodePatch, RuleNode};
use crate::domain::rule_tree::{RuleTree, RuleType};
use crate::domain::target_slot::{Slot, TargetSlot};
use std::collections::HashSet;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Lenient forms
// ---------------------------------------------------------------------------

/// Append a fresh node. `parent_id == None` appends at top level; with a
/// parent, `AND` nests under it and `OR` inserts right after it.
pub fn add_rule(
    tree: &RuleTree,
    rule_type: RuleType,
    parent_id: Option<&NodeId>,
    as_operator: LogicOperator,
) -> RuleTree {
    or_unchanged(tree, try_add_rule(tree, rule_type, parent_id, as_operator))
}

/// `add_rule` with a caller-built node, so the caller knows its id.
pub fn insert_rule(
    tree: &RuleTree,
    rule_type: RuleType,
    parent_id: Option<&NodeId>,
    as_operator: LogicOperator,
    node: RuleNode,
) -> RuleTree {
    or_unchanged(
        tree,
        try_insert_rule(tree, rule_type, parent_id, as_operator, node),
    )
}

/// Remove a node together with its whole subtree.
pub fn delete_rule(tree: &RuleTree, rule_type: RuleType, id: &NodeId) -> RuleTree {
    or_unchanged(tree, try_delete_rule(tree, rule_type, id))
}

pub fn update_rule_data(
    tree: &RuleTree,
    rule_type: RuleType,
    id: &NodeId,
    patch: &NodePatch,
) -> RuleTree {
    or_unchanged(tree, try_update_rule_data(tree, rule_type, id, patch))
}

/// Put a condition into the targeted slot. Accepts an indicator definition
/// (seeded with its defaults) or a bare number.
pub fn update_block_condition(
    tree: &RuleTree,
    target: &TargetSlot,
    condition: impl Into<Condition>,
) -> RuleTree {
    or_unchanged(tree, try_update_block_condition(tree, target, condition))
}

pub fn clear_block_condition(tree: &RuleTree, target: &TargetSlot) -> RuleTree {
    or_unchanged(tree, try_clear_block_condition(tree, target))
}

/// No-op unless the slot holds an indicator.
pub fn update_block_timeframe(tree: &RuleTree, target: &TargetSlot, timeframe: &str) -> RuleTree {
    or_unchanged(tree, try_update_block_timeframe(tree, target, timeframe))
}

pub fn update_block_parameter(
    tree: &RuleTree,
    target: &TargetSlot,
    definition: &IndicatorDefinition,
    key: &str,
    value: ParameterValue,
) -> RuleTree {
    or_unchanged(
        tree,
        try_update_block_parameter(tree, target, definition, key, value),
    )
}

/// No-op unless the slot holds a constant.
pub fn update_block_constant(tree: &RuleTree, target: &TargetSlot, value: f64) -> RuleTree {
    or_unchanged(tree, try_update_block_constant(tree, target, value))
}

fn or_unchanged(tree: &RuleTree, result: Result<RuleTree, RulecraftError>) -> RuleTree {
    result.unwrap_or_else(|err| {
        tracing::debug!(error = %err, "edit ignored, tree unchanged");
        tree.clone()
    })
}

// ---------------------------------------------------------------------------
// Strict forms
// ---------------------------------------------------------------------------

pub fn try_add_rule(
    tree: &RuleTree,
    rule_type: RuleType,
    parent_id: Option<&NodeId>,
    as_operator: LogicOperator,
) -> Result<RuleTree, RulecraftError> {
    try_insert_rule(tree, rule_type, parent_id, as_operator, RuleNode::new())
}

pub fn try_insert_rule(
    tree: &RuleTree,
    rule_type: RuleType,
    parent_id: Option<&NodeId>,
    as_operator: LogicOperator,
    node: RuleNode,
) -> Result<RuleTree, RulecraftError> {
    let mut duplicate = None;
    node.any_id(&mut |id| {
        let taken = tree.find(rule_type, id).is_some();
        if taken {
            duplicate = Some(id.clone());
        }
        taken
    });
    if let Some(id) = duplicate {
        return Err(RulecraftError::DuplicateId { rule_type, id });
    }

    let Some(parent_id) = parent_id else {
        let mut rules = tree.rules(rule_type).to_vec();
        rules.push(Arc::new(node));
        return Ok(tree.with_rules(rule_type, rules));
    };

    match as_operator {
        LogicOperator::And => replace_node(tree, rule_type, parent_id, |parent| {
            let mut updated = parent.clone();
            updated.children.push(Arc::new(node));
            Ok(updated)
        }),
        LogicOperator::Or => {
            let node = Arc::new(node);
            edit_side(tree, rule_type, parent_id, |siblings, position| {
                siblings.insert(position + 1, Arc::clone(&node));
            })
        }
    }
}

pub fn try_delete_rule(
    tree: &RuleTree,
    rule_type: RuleType,
    id: &NodeId,
) -> Result<RuleTree, RulecraftError> {
    edit_side(tree, rule_type, id, |siblings, position| {
        siblings.remove(position);
    })
}

pub fn try_update_rule_data(
    tree: &RuleTree,
    rule_type: RuleType,
    id: &NodeId,
    patch: &NodePatch,
) -> Result<RuleTree, RulecraftError> {
    let operands = [
        (Slot::OperandA, &patch.operand_a),
        (Slot::OperandB, &patch.operand_b),
    ];
    for (slot, operand) in operands {
        if let Some(Some(condition)) = operand {
            check_finite(&TargetSlot::new(rule_type, id.clone(), slot), condition)?;
        }
    }
    replace_node(tree, rule_type, id, |node| {
        if let Some(children) = &patch.children {
            check_patched_children(tree, rule_type, node, children)?;
        }
        Ok(patch.apply(node))
    })
}

pub fn try_update_block_condition(
    tree: &RuleTree,
    target: &TargetSlot,
    condition: impl Into<Condition>,
) -> Result<RuleTree, RulecraftError> {
    let condition = condition.into();
    check_finite(target, &condition)?;
    replace_node(tree, target.rule_type, &target.node_id, |node| {
        Ok(target.slot.set(node, Some(condition)))
    })
}

pub fn try_clear_block_condition(
    tree: &RuleTree,
    target: &TargetSlot,
) -> Result<RuleTree, RulecraftError> {
    replace_node(tree, target.rule_type, &target.node_id, |node| {
        Ok(target.slot.set(node, None))
    })
}

pub fn try_update_block_timeframe(
    tree: &RuleTree,
    target: &TargetSlot,
    timeframe: &str,
) -> Result<RuleTree, RulecraftError> {
    edit_slot(tree, target, |current| {
        current
            .with_timeframe(timeframe)
            .ok_or_else(|| kind_mismatch(target, ConditionKind::Indicator))
    })
}

pub fn try_update_block_parameter(
    tree: &RuleTree,
    target: &TargetSlot,
    definition: &IndicatorDefinition,
    key: &str,
    value: ParameterValue,
) -> Result<RuleTree, RulecraftError> {
    edit_slot(tree, target, |current| {
        if current.kind() != ConditionKind::Indicator {
            return Err(kind_mismatch(target, ConditionKind::Indicator));
        }
        current.with_parameter(definition, key, value)
    })
}

pub fn try_update_block_constant(
    tree: &RuleTree,
    target: &TargetSlot,
    value: f64,
) -> Result<RuleTree, RulecraftError> {
    edit_slot(tree, target, |current| {
        current
            .with_constant(value)
            .ok_or_else(|| kind_mismatch(target, ConditionKind::Constant))
    })
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

/// The condition in the targeted slot, or why there is none.
pub fn slot_condition<'a>(
    tree: &'a RuleTree,
    target: &TargetSlot,
) -> Result<&'a Condition, RulecraftError> {
    let node = tree
        .find(target.rule_type, &target.node_id)
        .ok_or_else(|| not_found(target.rule_type, &target.node_id))?;
    target
        .slot
        .get(node)
        .ok_or_else(|| RulecraftError::SlotEmpty {
            rule_type: target.rule_type,
            id: target.node_id.clone(),
            slot: target.slot,
        })
}

pub fn slot_indicator<'a>(
    tree: &'a RuleTree,
    target: &TargetSlot,
) -> Result<&'a IndicatorRef, RulecraftError> {
    slot_condition(tree, target)?
        .as_indicator()
        .ok_or_else(|| kind_mismatch(target, ConditionKind::Indicator))
}

/// Rewrite the filled slot named by `target`.
fn edit_slot<F>(tree: &RuleTree, target: &TargetSlot, rewrite: F) -> Result<RuleTree, RulecraftError>
where
    F: FnOnce(&Condition) -> Result<Condition, RulecraftError>,
{
    let updated = rewrite(slot_condition(tree, target)?)?;
    try_update_block_condition(tree, target, updated)
}

fn replace_node<F>(
    tree: &RuleTree,
    rule_type: RuleType,
    id: &NodeId,
    build: F,
) -> Result<RuleTree, RulecraftError>
where
    F: FnOnce(&RuleNode) -> Result<RuleNode, RulecraftError>,
{
    let current = tree
        .find(rule_type, id)
        .ok_or_else(|| not_found(rule_type, id))?;
    let replacement = Arc::new(build(current)?);
    edit_side(tree, rule_type, id, |siblings, position| {
        siblings[position] = Arc::clone(&replacement);
    })
}

fn edit_side<F>(
    tree: &RuleTree,
    rule_type: RuleType,
    id: &NodeId,
    mut edit: F,
) -> Result<RuleTree, RulecraftError>
where
    F: FnMut(&mut Vec<Arc<RuleNode>>, usize),
{
    edit_siblings(tree.rules(rule_type), id, &mut edit)
        .map(|rules| tree.with_rules(rule_type, rules))
        .ok_or_else(|| not_found(rule_type, id))
}

/// Find the sibling list holding the first pre-order match of `id` and apply
/// `edit` to a copy of it, rebuilding each ancestor on the way back up.
/// `None` if `id` is absent.
fn edit_siblings<F>(
    nodes: &[Arc<RuleNode>],
    id: &NodeId,
    edit: &mut F,
) -> Option<Vec<Arc<RuleNode>>>
where
    F: FnMut(&mut Vec<Arc<RuleNode>>, usize),
{
    for (index, node) in nodes.iter().enumerate() {
        if node.id == *id {
            let mut edited = nodes.to_vec();
            edit(&mut edited, index);
            return Some(edited);
        }
        if let Some(children) = edit_siblings(&node.children, id, edit) {
            let mut edited = nodes.to_vec();
            edited[index] = Arc::new(RuleNode {
                children,
                ..(**node).clone()
            });
            return Some(edited);
        }
    }
    None
}

/// Ids under `children` must not occur elsewhere on the side, ignoring the
/// subtree they replace.
fn check_patched_children(
    tree: &RuleTree,
    rule_type: RuleType,
    node: &RuleNode,
    children: &[Arc<RuleNode>],
) -> Result<(), RulecraftError> {
    let mut replaced = HashSet::new();
    node.any_id(&mut |id| {
        replaced.insert(id.clone());
        false
    });
    let mut taken: HashSet<NodeId> = tree
        .ids(rule_type)
        .into_iter()
        .filter(|id| !replaced.contains(id))
        .collect();
    taken.insert(node.id.clone());

    let mut duplicate = None;
    for child in children {
        let clash = child.any_id(&mut |id| {
            let fresh = taken.insert(id.clone());
            if !fresh {
                duplicate = Some(id.clone());
            }
            !fresh
        });
        if clash {
            break;
        }
    }
    match duplicate {
        Some(id) => Err(RulecraftError::DuplicateId { rule_type, id }),
        None => Ok(()),
    }
}

fn check_finite(target: &TargetSlot, condition: &Condition) -> Result<(), RulecraftError> {
    if condition.is_finite() {
        return Ok(());
    }
    Err(RulecraftError::NonFiniteNumber {
        rule_type: target.rule_type,
        id: target.node_id.clone(),
        slot: target.slot,
        value: condition.to_string(),
    })
}

fn not_found(rule_type: RuleType, id: &NodeId) -> RulecraftError {
    RulecraftError::NodeNotFound {
        rule_type,
        id: id.clone(),
    }
}

fn kind_mismatch(target: &TargetSlot, expected: ConditionKind) -> RulecraftError {
    RulecraftError::SlotKindMismatch {
        rule_type: target.rule_type,
        id: target.node_id.clone(),
        slot: target.slot,
        expected: expected.describe(),
    }
}
