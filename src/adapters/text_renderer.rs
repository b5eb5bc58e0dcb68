//! Plain-text rendering of a strategy's rule tree.
//!
//! Labels are resolved against the catalog at render time; keys the catalog
//! does not know are shown as `<unknown indicator KEY>` and the tree itself
//! is never touched.

use crate::domain::catalog::IndicatorCatalog;
use crate::domain::condition::Condition;
use crate::domain::rule_node::{LogicOperator, RuleNode};
use crate::domain::rule_tree::{RuleTree, RuleType};
use crate::domain::strategy::StrategyRecord;
use std::fmt::Write;
use std::sync::Arc;

const EMPTY_SLOT: &str = "___";

pub fn render_strategy(record: &StrategyRecord, catalog: &IndicatorCatalog) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Strategy: {}", record.name);
    if !record.description.is_empty() {
        let _ = writeln!(out, "{}", record.description);
    }
    out.push_str(&render_tree(&record.rules, catalog));
    out
}

pub fn render_tree(tree: &RuleTree, catalog: &IndicatorCatalog) -> String {
    let mut out = String::new();
    for (rule_type, title) in [(RuleType::Buy, "BUY"), (RuleType::Sell, "SELL")] {
        let _ = writeln!(out, "{title}");
        let rules = tree.rules(rule_type);
        if rules.is_empty() {
            out.push_str("  (no rules)\n");
        }
        // top-level blocks are alternatives
        render_nodes(&mut out, rules, LogicOperator::Or, 1, catalog);
    }
    out
}

fn render_nodes(
    out: &mut String,
    nodes: &[Arc<RuleNode>],
    joiner: LogicOperator,
    depth: usize,
    catalog: &IndicatorCatalog,
) {
    for (index, node) in nodes.iter().enumerate() {
        let indent = "  ".repeat(depth);
        let prefix = if index == 0 {
            String::new()
        } else {
            format!("{joiner} ")
        };
        let _ = writeln!(
            out,
            "{indent}{prefix}{} {} {}  #{}",
            operand_label(node.operand_a.as_ref(), catalog),
            node.operator,
            operand_label(node.operand_b.as_ref(), catalog),
            node.id,
        );
        render_nodes(out, &node.children, node.child_logic_operator, depth + 1, catalog);
    }
}

pub fn operand_label(condition: Option<&Condition>, catalog: &IndicatorCatalog) -> String {
    let Some(condition) = condition else {
        return EMPTY_SLOT.to_string();
    };
    let Some(indicator) = condition.as_indicator() else {
        return condition.display_name().to_string();
    };
    match catalog.get(&indicator.indicator_key) {
        Some(definition) => {
            let fresh = Condition::indicator(definition, indicator.clone());
            format!("{} [{}]", fresh.display_name(), indicator.timeframe)
        }
        None => format!("<unknown indicator {}>", indicator.indicator_key),
    }
}
