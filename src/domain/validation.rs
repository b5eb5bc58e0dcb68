//! Render-time checks of a rule tree against the indicator catalog.
//!
//! Nothing here mutates the tree. Issues are reported for the presentation
//! layer to display (e.g. an "unknown indicator" placeholder).

use crate::domain::catalog::IndicatorCatalog;
use crate::domain::condition::Condition;
use crate::domain::error::RulecraftError;
use crate::domain::rule_node::{NodeId, RuleNode};
use crate::domain::rule_tree::{RuleTree, RuleType};
use crate::domain::strategy::StrategyRecord;
use crate::domain::target_slot::{Slot, TargetSlot};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum TreeIssue {
    UnknownIndicator { target: TargetSlot, key: String },
    UnsupportedTimeframe {
        target: TargetSlot,
        key: String,
        timeframe: String,
    },
    UnknownParameter {
        target: TargetSlot,
        key: String,
        parameter: String,
    },
    EmptySlot { target: TargetSlot },
    DuplicateId { rule_type: RuleType, id: NodeId },
}

impl TreeIssue {
    /// Empty slots are expected while a rule is being built.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, TreeIssue::EmptySlot { .. })
    }
}

impl fmt::Display for TreeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeIssue::UnknownIndicator { target, key } => {
                write!(f, "{target}: unknown indicator {key}")
            }
            TreeIssue::UnsupportedTimeframe {
                target,
                key,
                timeframe,
            } => write!(f, "{target}: {key} does not support timeframe {timeframe}"),
            TreeIssue::UnknownParameter {
                target,
                key,
                parameter,
            } => write!(f, "{target}: {key} has no parameter {parameter}"),
            TreeIssue::EmptySlot { target } => write!(f, "{target}: empty"),
            TreeIssue::DuplicateId { rule_type, id } => {
                write!(f, "{rule_type}: id {id} used more than once")
            }
        }
    }
}

pub fn validate_tree(tree: &RuleTree, catalog: &IndicatorCatalog) -> Vec<TreeIssue> {
    let mut issues = Vec::new();
    for rule_type in [RuleType::Buy, RuleType::Sell] {
        let mut seen = HashSet::new();
        check_nodes(
            tree.rules(rule_type),
            rule_type,
            catalog,
            &mut seen,
            &mut issues,
        );
    }
    issues
}

/// Fails on any blocking issue, or when neither side has a rule.
pub fn validate_strategy(
    record: &StrategyRecord,
    catalog: &IndicatorCatalog,
) -> Result<(), RulecraftError> {
    if record.rules.is_empty() {
        return Err(RulecraftError::EmptyStrategy);
    }
    let issues: Vec<TreeIssue> = validate_tree(&record.rules, catalog)
        .into_iter()
        .filter(TreeIssue::is_blocking)
        .collect();
    if issues.is_empty() {
        Ok(())
    } else {
        Err(RulecraftError::InvalidTree { issues })
    }
}

fn check_nodes(
    nodes: &[Arc<RuleNode>],
    rule_type: RuleType,
    catalog: &IndicatorCatalog,
    seen: &mut HashSet<NodeId>,
    issues: &mut Vec<TreeIssue>,
) {
    for node in nodes {
        if !seen.insert(node.id.clone()) {
            issues.push(TreeIssue::DuplicateId {
                rule_type,
                id: node.id.clone(),
            });
        }
        for slot in [Slot::OperandA, Slot::OperandB] {
            let target = TargetSlot::new(rule_type, node.id.clone(), slot);
            match slot.get(node) {
                None => issues.push(TreeIssue::EmptySlot { target }),
                Some(condition) => check_condition(condition, target, catalog, issues),
            }
        }
        check_nodes(&node.children, rule_type, catalog, seen, issues);
    }
}

fn check_condition(
    condition: &Condition,
    target: TargetSlot,
    catalog: &IndicatorCatalog,
    issues: &mut Vec<TreeIssue>,
) {
    let Some(indicator) = condition.as_indicator() else {
        return;
    };
    let key = indicator.indicator_key.clone();
    let Some(definition) = catalog.get(&key) else {
        issues.push(TreeIssue::UnknownIndicator { target, key });
        return;
    };
    for parameter in indicator.parameter_values.keys() {
        if definition.parameter(parameter).is_none() {
            issues.push(TreeIssue::UnknownParameter {
                target: target.clone(),
                key: key.clone(),
                parameter: parameter.clone(),
            });
        }
    }
    if !definition.supports_timeframe(&indicator.timeframe) {
        issues.push(TreeIssue::UnsupportedTimeframe {
            target,
            key,
            timeframe: indicator.timeframe.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::condition::{IndicatorRef, ParameterValue};
    use std::collections::BTreeMap;

    fn filled(id: &str) -> RuleNode {
        let catalog = IndicatorCatalog::builtin();
        let mut node = RuleNode::with_id(id.into());
        node.operand_a = Some(Condition::from(catalog.get("RSI").unwrap()));
        node.operand_b = Some(Condition::constant(30.0));
        node
    }

    fn unresolved(key: &str, timeframe: &str, params: &[(&str, f64)]) -> Condition {
        let parameter_values: BTreeMap<String, ParameterValue> = params
            .iter()
            .map(|(k, v)| (k.to_string(), ParameterValue::Number(*v)))
            .collect();
        Condition::indicator_unresolved(IndicatorRef {
            indicator_key: key.into(),
            parameter_values,
            timeframe: timeframe.into(),
        })
    }

    #[test]
    fn complete_tree_has_no_issues() {
        let tree = RuleTree {
            buy: vec![Arc::new(filled("a"))],
            sell: vec![Arc::new(filled("b"))],
        };
        assert!(validate_tree(&tree, &IndicatorCatalog::builtin()).is_empty());
    }

    #[test]
    fn reports_empty_slots() {
        let tree = RuleTree {
            buy: vec![Arc::new(RuleNode::with_id("a".into()))],
            sell: Vec::new(),
        };
        let issues = validate_tree(&tree, &IndicatorCatalog::builtin());
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| !i.is_blocking()));
    }

    #[test]
    fn reports_unknown_indicator_and_bad_timeframe() {
        let mut node = filled("a");
        node.operand_a = Some(unresolved("VWAPX", "1h", &[]));
        node.operand_b = Some(unresolved("SMA", "3m", &[("period", 10.0), ("shift", 1.0)]));
        let tree = RuleTree {
            buy: vec![Arc::new(node)],
            sell: Vec::new(),
        };
        let issues = validate_tree(&tree, &IndicatorCatalog::builtin());
        assert_eq!(issues.len(), 3, "{issues:?}");
        assert!(matches!(&issues[0], TreeIssue::UnknownIndicator { key, .. } if key == "VWAPX"));
        assert!(matches!(&issues[1], TreeIssue::UnknownParameter { parameter, .. } if parameter == "shift"));
        assert!(matches!(&issues[2], TreeIssue::UnsupportedTimeframe { timeframe, .. } if timeframe == "3m"));
        assert_eq!(issues[0].to_string(), "buy/a/operandA: unknown indicator VWAPX");
    }

    #[test]
    fn reports_duplicate_ids_per_side() {
        let mut parent = filled("a");
        parent.children.push(Arc::new(filled("a")));
        let tree = RuleTree {
            buy: vec![Arc::new(parent)],
            sell: vec![Arc::new(filled("a"))],
        };
        let issues = validate_tree(&tree, &IndicatorCatalog::builtin());
        assert_eq!(issues.len(), 1);
        assert!(matches!(&issues[0], TreeIssue::DuplicateId { rule_type: RuleType::Buy, .. }));
    }

    #[test]
    fn validate_strategy_rejects_empty_and_blocking() {
        let catalog = IndicatorCatalog::builtin();
        let mut record = StrategyRecord::new("empty");
        assert!(matches!(
            validate_strategy(&record, &catalog),
            Err(RulecraftError::EmptyStrategy)
        ));

        record.rules.buy.push(Arc::new(RuleNode::with_id("a".into())));
        assert!(validate_strategy(&record, &catalog).is_ok(), "empty slots are not blocking");

        let mut bad = filled("b");
        bad.operand_a = Some(unresolved("NOPE", "1h", &[]));
        record.rules.sell.push(Arc::new(bad));
        assert!(matches!(
            validate_strategy(&record, &catalog),
            Err(RulecraftError::InvalidTree { issues }) if issues.len() == 1
        ));
    }
}
