//! Editing session: the current tree plus the slot the indicator picker is
//! open for.
//!
//! A session is an ordinary value. The host creates one when the builder
//! opens and drops it when the builder closes.

use crate::domain::catalog::IndicatorDefinition;
use crate::domain::condition::{Condition, ParameterValue};
use crate::domain::mirror;
use crate::domain::rule_node::{LogicOperator, NodeId, NodePatch, RuleNode};
use crate::domain::rule_tree::{RuleTree, RuleType};
use crate::domain::target_slot::TargetSlot;
use crate::domain::tree_editor;

#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    tree: RuleTree,
    pending: Option<TargetSlot>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tree(tree: RuleTree) -> Self {
        Self {
            tree,
            pending: None,
        }
    }

    pub fn tree(&self) -> &RuleTree {
        &self.tree
    }

    pub fn into_tree(self) -> RuleTree {
        self.tree
    }

    pub fn pending_target(&self) -> Option<&TargetSlot> {
        self.pending.as_ref()
    }

    pub fn open_picker(&mut self, target: TargetSlot) {
        tracing::debug!(%target, "picker opened");
        self.pending = Some(target);
    }

    pub fn cancel_picker(&mut self) {
        if let Some(target) = self.pending.take() {
            tracing::debug!(%target, "picker cancelled");
        }
    }

    /// Route a picked indicator to the pending slot and close the picker.
    /// Returns `false` when no picker was open.
    pub fn select_indicator(&mut self, definition: &IndicatorDefinition) -> bool {
        let Some(target) = self.pending.take() else {
            tracing::debug!(indicator = %definition.key, "indicator picked with no pending slot");
            return false;
        };
        tracing::debug!(%target, indicator = %definition.key, "indicator picked");
        self.tree = tree_editor::update_block_condition(&self.tree, &target, definition);
        true
    }

    /// Route a timeframe to the pending slot. The picker stays open.
    pub fn select_timeframe(&mut self, timeframe: &str) -> bool {
        let Some(target) = self.pending.as_ref() else {
            return false;
        };
        tracing::debug!(%target, timeframe, "timeframe picked");
        self.tree = tree_editor::update_block_timeframe(&self.tree, target, timeframe);
        true
    }

    /// Adds a fresh node and returns its id. The id is only present in the
    /// tree if the parent (when given) was found.
    pub fn add_rule(
        &mut self,
        rule_type: RuleType,
        parent_id: Option<&NodeId>,
        as_operator: LogicOperator,
    ) -> NodeId {
        let node = RuleNode::new();
        let id = node.id.clone();
        self.tree = tree_editor::insert_rule(&self.tree, rule_type, parent_id, as_operator, node);
        id
    }

    pub fn delete_rule(&mut self, rule_type: RuleType, id: &NodeId) {
        let stale = self.pending.as_ref().is_some_and(|target| {
            target.rule_type == rule_type
                && self
                    .tree
                    .find(rule_type, id)
                    .is_some_and(|removed| removed.contains(&target.node_id))
        });
        if stale {
            tracing::debug!(%id, "pending slot removed with its rule");
            self.pending = None;
        }
        self.tree = tree_editor::delete_rule(&self.tree, rule_type, id);
    }

    pub fn update_rule_data(&mut self, rule_type: RuleType, id: &NodeId, patch: &NodePatch) {
        self.tree = tree_editor::update_rule_data(&self.tree, rule_type, id, patch);
    }

    pub fn update_block_condition(&mut self, target: &TargetSlot, condition: impl Into<Condition>) {
        self.tree = tree_editor::update_block_condition(&self.tree, target, condition);
    }

    pub fn update_block_parameter(
        &mut self,
        target: &TargetSlot,
        definition: &IndicatorDefinition,
        key: &str,
        value: ParameterValue,
    ) {
        self.tree =
            tree_editor::update_block_parameter(&self.tree, target, definition, key, value);
    }

    pub fn update_block_constant(&mut self, target: &TargetSlot, value: f64) {
        self.tree = tree_editor::update_block_constant(&self.tree, target, value);
    }

    pub fn mirror_into_sell(&mut self, buy_id: &NodeId) {
        self.tree = mirror::mirror_into_sell(&self.tree, buy_id);
    }
}
