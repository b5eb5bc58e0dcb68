#![allow(dead_code)]

use rulecraft::adapters::json_strategy_adapter::JsonStrategyFile;
use rulecraft::domain::catalog::{IndicatorCatalog, IndicatorDefinition};
use rulecraft::domain::condition::Condition;
use rulecraft::domain::rule_node::{ComparisonOperator, LogicOperator, NodeId, RuleNode};
use rulecraft::domain::rule_tree::{RuleTree, RuleType};
use rulecraft::domain::strategy::StrategyRecord;
use rulecraft::domain::target_slot::{Slot, TargetSlot};
use rulecraft::domain::tree_editor;
use rulecraft::ports::strategy_port::StrategyPort;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub fn catalog() -> IndicatorCatalog {
    IndicatorCatalog::builtin()
}

pub fn indicator(key: &str) -> IndicatorDefinition {
    catalog().get(key).unwrap().clone()
}

pub fn id(s: &str) -> NodeId {
    NodeId::from(s)
}

pub fn leaf(id: &str) -> RuleNode {
    RuleNode::with_id(id.into())
}

pub fn block(id: &str, a: Option<Condition>, op: ComparisonOperator, b: Option<Condition>) -> RuleNode {
    let mut node = RuleNode::with_id(id.into());
    node.operand_a = a;
    node.operator = op;
    node.operand_b = b;
    node
}

pub fn target(rule_type: RuleType, node: &str, slot: Slot) -> TargetSlot {
    TargetSlot::new(rule_type, node, slot)
}

/// buy: a(b(c)), d   sell: x
pub fn sample_tree() -> RuleTree {
    let tree = RuleTree::new();
    let tree = tree_editor::insert_rule(&tree, RuleType::Buy, None, LogicOperator::And, leaf("a"));
    let tree =
        tree_editor::insert_rule(&tree, RuleType::Buy, Some(&id("a")), LogicOperator::And, leaf("b"));
    let tree =
        tree_editor::insert_rule(&tree, RuleType::Buy, Some(&id("b")), LogicOperator::And, leaf("c"));
    let tree = tree_editor::insert_rule(&tree, RuleType::Buy, Some(&id("a")), LogicOperator::Or, leaf("d"));
    tree_editor::insert_rule(&tree, RuleType::Sell, None, LogicOperator::And, leaf("x"))
}

/// Three levels of AND nesting, an OR group, indicator and constant
/// operands, and one empty slot.
pub fn rich_tree() -> RuleTree {
    let sma = Condition::from(&indicator("SMA"));
    let rsi = Condition::from(&indicator("RSI"));
    let macd = Condition::from(&indicator("MACD"));

    let mut deepest = block("l3", Some(macd), ComparisonOperator::CrossesAbove, Some(Condition::constant(0.0)));
    deepest.child_logic_operator = LogicOperator::Or;
    deepest.children = vec![
        Arc::new(block("or1", Some(rsi.clone()), ComparisonOperator::LessThan, Some(Condition::constant(30.0)))),
        Arc::new(block("or2", Some(rsi.clone()), ComparisonOperator::GreaterThan, None)),
    ];
    let mut middle = block("l2", Some(sma.clone()), ComparisonOperator::GreaterThan, Some(Condition::constant(-1.5)));
    middle.children = vec![Arc::new(deepest)];
    let mut top = block("l1", Some(sma), ComparisonOperator::GreaterThan, Some(Condition::constant(50.0)));
    top.children = vec![Arc::new(middle)];

    RuleTree {
        buy: vec![Arc::new(top)],
        sell: vec![Arc::new(block("s1", Some(rsi), ComparisonOperator::CrossesBelow, Some(Condition::constant(70.0))))],
    }
}

/// A strategy file inside a temp dir that lives as long as the fixture.
pub struct TempStrategy {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TempStrategy {
    pub fn new(record: &StrategyRecord) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("strategy.json");
        JsonStrategyFile::new(&path).save(record).unwrap();
        Self { dir, path }
    }

    pub fn with_tree(tree: RuleTree) -> Self {
        let mut record = StrategyRecord::new("Fixture");
        record.rules = tree;
        Self::new(&record)
    }

    pub fn load(&self) -> StrategyRecord {
        JsonStrategyFile::new(&self.path).load().unwrap()
    }

    pub fn path_str(&self) -> &str {
        self.path.to_str().unwrap()
    }
}
