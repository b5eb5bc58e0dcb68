//! CLI integration tests for strategy file editing.
//!
//! Tests cover:
//! - Config loading from real INI files on disk
//! - Creating, showing and validating strategy files
//! - Each edit command against a strategy file in a temp dir
//! - Strict versus lenient handling of refused edits
//! - Custom indicator catalogs

mod common;

use clap::Parser;
use common::*;
use rulecraft::cli::{self, Cli, EditorConfig};
use rulecraft::domain::condition::ParameterValue;
use rulecraft::domain::error::RulecraftError;
use rulecraft::domain::rule_node::{ComparisonOperator, LogicOperator, NodeId};
use rulecraft::domain::rule_tree::{RuleTree, RuleType};
use rulecraft::domain::strategy::StrategyRecord;
use rulecraft::logging::LogFormat;
use std::io::Write;
use std::path::{Path, PathBuf};

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn exec(args: &[&str], config: &EditorConfig) -> Result<String, RulecraftError> {
    let mut argv = vec!["rulecraft"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();
    cli::execute(&cli.command, config)
}

fn strict() -> EditorConfig {
    EditorConfig::default()
}

fn lenient() -> EditorConfig {
    EditorConfig {
        strict: false,
        ..EditorConfig::default()
    }
}

mod config_loading {
    use super::*;

    #[test]
    fn no_config_file_gives_defaults() {
        assert_eq!(cli::load_editor_config(None).unwrap(), EditorConfig::default());
    }

    #[test]
    fn reads_all_sections_from_disk() {
        let ini = write_temp_ini(
            "[editor]\nstrict = false\n\n[catalog]\npath = indicators.json\n\n[logging]\nfilter = rulecraft=debug\nformat = JSON\n",
        );
        let config = cli::load_editor_config(Some(ini.path())).unwrap();
        assert!(!config.strict);
        assert_eq!(config.catalog_path, Some(PathBuf::from("indicators.json")));
        assert_eq!(config.log_filter, "rulecraft=debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn missing_config_file_is_parse_error() {
        let result = cli::load_editor_config(Some(Path::new("/nonexistent/rulecraft.ini")));
        assert!(matches!(result, Err(RulecraftError::ConfigParse { .. })));
    }

    #[test]
    fn invalid_strict_value_is_rejected() {
        let ini = write_temp_ini("[editor]\nstrict = sometimes\n");
        let result = cli::load_editor_config(Some(ini.path()));
        assert!(matches!(
            result,
            Err(RulecraftError::ConfigInvalid { ref key, .. }) if key == "strict"
        ));
    }
}

mod files {
    use super::*;

    #[test]
    fn new_creates_empty_strategy() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("s.json");
        let path_str = path.to_str().unwrap();
        exec(&["new", "-s", path_str, "--name", "Breakout", "--description", "Range break"], &strict())
            .unwrap();

        let fixture = TempStrategy {
            dir,
            path: path.clone(),
        };
        let record = fixture.load();
        assert_eq!(record.name, "Breakout");
        assert_eq!(record.description, "Range break");
        assert!(record.rules.is_empty());
        assert!(record.created_at.is_some());
    }

    #[test]
    fn new_refuses_to_overwrite_without_force() {
        let fixture = TempStrategy::with_tree(sample_tree());
        let result = exec(&["new", "-s", fixture.path_str(), "--name", "Other"], &strict());
        assert!(matches!(result, Err(RulecraftError::Io(_))));
        assert_eq!(fixture.load().rules, sample_tree());

        exec(&["new", "-s", fixture.path_str(), "--name", "Other", "--force"], &strict()).unwrap();
        assert!(fixture.load().rules.is_empty());
    }

    #[test]
    fn show_renders_both_sides() {
        let fixture = TempStrategy::with_tree(rich_tree());
        let out = exec(&["show", "-s", fixture.path_str()], &strict()).unwrap();
        assert!(out.starts_with("Strategy: Fixture\n"));
        assert!(out.contains("BUY\n  SMA(20) [1h] > 50  #l1\n"));
        assert!(out.contains("SELL\n  RSI(14) [1h] crosses-below 70  #s1\n"));
        assert!(out.contains("OR RSI(14) [1h] > ___  #or2"));
    }

    #[test]
    fn show_missing_file_is_io_error() {
        let result = exec(&["show", "-s", "/nonexistent/s.json"], &strict());
        assert!(matches!(result, Err(RulecraftError::Io(_))));
    }

    #[test]
    fn validate_reports_warnings_and_counts() {
        let fixture = TempStrategy::with_tree(rich_tree());
        let out = exec(&["validate", "-s", fixture.path_str()], &strict()).unwrap();
        assert!(out.contains("warning: buy/or2/operandB"));
        assert!(out.ends_with("OK: 5 buy block(s), 1 sell block(s)\n"));
    }

    #[test]
    fn validate_fails_on_empty_strategy() {
        let fixture = TempStrategy::with_tree(RuleTree::new());
        let result = exec(&["validate", "-s", fixture.path_str()], &strict());
        assert!(matches!(result, Err(RulecraftError::EmptyStrategy)));
    }

    #[test]
    fn indicators_lists_catalog() {
        let out = exec(&["indicators"], &strict()).unwrap();
        assert!(out.lines().any(|l| l.starts_with("RSI")));
    }
}

mod editing {
    use super::*;

    #[test]
    fn add_prints_new_id_and_nests() {
        let fixture = TempStrategy::with_tree(sample_tree());
        let out = exec(
            &["add", "-s", fixture.path_str(), "--side", "buy", "--parent", "d"],
            &strict(),
        )
        .unwrap();
        let new_id = NodeId::from(out.trim());

        let record = fixture.load();
        let d = record.rules.find(RuleType::Buy, &id("d")).unwrap();
        assert_eq!(d.children.len(), 1);
        assert_eq!(d.children[0].id, new_id);
        assert!(record.updated_at.is_some());
    }

    #[test]
    fn add_or_inserts_sibling() {
        let fixture = TempStrategy::with_tree(sample_tree());
        exec(
            &["add", "-s", fixture.path_str(), "--side", "buy", "--parent", "a", "--as", "OR"],
            &strict(),
        )
        .unwrap();
        let rules = fixture.load().rules;
        assert_eq!(rules.buy.len(), 3);
        assert_eq!(rules.buy[0].id, id("a"));
        assert_eq!(rules.buy[2].id, id("d"));
    }

    #[test]
    fn delete_removes_subtree() {
        let fixture = TempStrategy::with_tree(sample_tree());
        exec(&["delete", "-s", fixture.path_str(), "--side", "buy", "--id", "b"], &strict()).unwrap();
        let rules = fixture.load().rules;
        assert_eq!(rules.ids(RuleType::Buy), vec![id("a"), id("d")]);
    }

    #[test]
    fn operator_and_logic_updates() {
        let fixture = TempStrategy::with_tree(sample_tree());
        let path = fixture.path_str();
        exec(
            &["set-operator", "-s", path, "--side", "buy", "--id", "c", "--operator", "crosses-above"],
            &strict(),
        )
        .unwrap();
        exec(&["set-logic", "-s", path, "--side", "buy", "--id", "a", "--logic", "OR"], &strict())
            .unwrap();

        let rules = fixture.load().rules;
        let c = rules.find(RuleType::Buy, &id("c")).unwrap();
        assert_eq!(c.operator, ComparisonOperator::CrossesAbove);
        let a = rules.find(RuleType::Buy, &id("a")).unwrap();
        assert_eq!(a.child_logic_operator, LogicOperator::Or);
    }

    #[test]
    fn slot_edits_build_a_full_comparison() {
        let fixture = TempStrategy::with_tree(sample_tree());
        let path = fixture.path_str();
        let run = |extra: &[&str]| {
            let mut args: Vec<&str> = vec![extra[0], "-s", path, "--side", "sell", "--id", "x"];
            args.extend_from_slice(&extra[1..]);
            exec(&args, &strict())
        };

        run(&["set-indicator", "--slot", "a", "--indicator", "RSI"]).unwrap();
        run(&["set-param", "--slot", "a", "--param", "period", "--value", "21"]).unwrap();
        run(&["set-timeframe", "--slot", "a", "--timeframe", "4h"]).unwrap();
        run(&["set-constant", "--slot", "b", "--value", "-5"]).unwrap();

        let rules = fixture.load().rules;
        let x = rules.find(RuleType::Sell, &id("x")).unwrap();
        let a = x.operand_a.as_ref().unwrap();
        let rsi = a.as_indicator().unwrap();
        assert_eq!(a.display_name(), "RSI(21)");
        assert_eq!(rsi.parameter_values["period"], ParameterValue::Number(21.0));
        assert_eq!(rsi.timeframe, "4h");
        assert_eq!(x.operand_b.as_ref().unwrap().as_constant(), Some(-5.0));

        run(&["clear-slot", "--slot", "b"]).unwrap();
        let x = fixture.load().rules.find(RuleType::Sell, &id("x")).unwrap().clone();
        assert!(x.operand_b.is_none());
    }

    #[test]
    fn numeric_parameters_are_stored_as_numbers() {
        let fixture = TempStrategy::with_tree(sample_tree());
        let path = fixture.path_str();
        let slot = ["--side", "buy", "--id", "d", "--slot", "a"];
        let mut set_indicator = vec!["set-indicator", "-s", path];
        set_indicator.extend(slot);
        set_indicator.extend(["--indicator", "SMA"]);
        exec(&set_indicator, &strict()).unwrap();
        let mut set_param = vec!["set-param", "-s", path];
        set_param.extend(slot);
        set_param.extend(["--param", "period", "--value", "50"]);
        exec(&set_param, &strict()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&fixture.path).unwrap()).unwrap();
        let params = &raw["rules"]["buy"][1]["operandA"]["value"]["parameterValues"];
        assert_eq!(params["period"], serde_json::json!(50.0));
        assert!(exec(&["show", "-s", path], &strict()).unwrap().contains("SMA(50) [1h]"));
    }

    #[test]
    fn non_finite_constant_never_reaches_the_file() {
        let fixture = TempStrategy::with_tree(sample_tree());
        let before = std::fs::read_to_string(&fixture.path).unwrap();
        let parsed = Cli::try_parse_from([
            "rulecraft", "set-constant", "-s", fixture.path_str(), "--side", "buy", "--id", "d",
            "--slot", "b", "--value", "inf",
        ]);
        assert!(parsed.is_err());
        assert_eq!(std::fs::read_to_string(&fixture.path).unwrap(), before);
        assert!(exec(&["show", "-s", fixture.path_str()], &strict()).is_ok());
    }

    #[test]
    fn unknown_indicator_is_refused() {
        let fixture = TempStrategy::with_tree(sample_tree());
        let result = exec(
            &["set-indicator", "-s", fixture.path_str(), "--side", "buy", "--id", "a", "--slot", "a", "--indicator", "VWAPX"],
            &strict(),
        );
        assert!(matches!(result, Err(RulecraftError::UnknownIndicator { .. })));
    }

    #[test]
    fn mirror_prints_sell_id() {
        let fixture = TempStrategy::with_tree(rich_tree());
        let out = exec(&["mirror", "-s", fixture.path_str(), "--id", "l1"], &strict()).unwrap();
        let sell_id = NodeId::from(out.trim());
        let rules = fixture.load().rules;
        assert_eq!(rules.sell.len(), 2);
        let clone = rules.find(RuleType::Sell, &sell_id).unwrap();
        assert_eq!(clone.operator, ComparisonOperator::LessThan);
        assert_eq!(clone.subtree_len(), 5);
    }
}

mod strictness {
    use super::*;

    #[test]
    fn strict_mode_fails_on_unknown_node() {
        let fixture = TempStrategy::with_tree(sample_tree());
        let result = exec(&["delete", "-s", fixture.path_str(), "--side", "sell", "--id", "a"], &strict());
        assert!(matches!(result, Err(RulecraftError::NodeNotFound { .. })));
    }

    #[test]
    fn lenient_mode_leaves_file_untouched() {
        let mut record = StrategyRecord::new("Untouched");
        record.rules = sample_tree();
        let fixture = TempStrategy::new(&record);
        let before = std::fs::read_to_string(&fixture.path).unwrap();

        let out = exec(
            &["add", "-s", fixture.path_str(), "--side", "sell", "--parent", "ghost"],
            &lenient(),
        )
        .unwrap();
        assert!(out.is_empty());
        exec(
            &["set-constant", "-s", fixture.path_str(), "--side", "buy", "--id", "ghost", "--slot", "b", "--value", "1"],
            &lenient(),
        )
        .unwrap();

        assert_eq!(std::fs::read_to_string(&fixture.path).unwrap(), before);
    }

    #[test]
    fn parameter_edit_on_constant_slot_is_kind_mismatch() {
        let fixture = TempStrategy::with_tree(rich_tree());
        let result = exec(
            &["set-param", "-s", fixture.path_str(), "--side", "buy", "--id", "l1", "--slot", "b", "--param", "period", "--value", "5"],
            &strict(),
        );
        assert!(matches!(result, Err(RulecraftError::SlotKindMismatch { .. })));
    }
}

mod custom_catalog {
    use super::*;

    #[test]
    fn catalog_file_replaces_builtin() {
        let mut catalog = tempfile::NamedTempFile::new().unwrap();
        write!(
            catalog,
            r#"{{"VWAP": {{"name": "VWAP", "category": "volume", "defaultTimeframe": "15m"}}}}"#
        )
        .unwrap();
        let config = EditorConfig {
            catalog_path: Some(catalog.path().to_path_buf()),
            ..EditorConfig::default()
        };

        let out = exec(&["indicators"], &config).unwrap();
        assert_eq!(out.lines().count(), 1);

        let fixture = TempStrategy::with_tree(sample_tree());
        exec(
            &["set-indicator", "-s", fixture.path_str(), "--side", "buy", "--id", "d", "--slot", "a", "--indicator", "VWAP"],
            &config,
        )
        .unwrap();
        let rules = fixture.load().rules;
        let d = rules.find(RuleType::Buy, &id("d")).unwrap();
        assert_eq!(d.operand_a.as_ref().unwrap().display_name(), "VWAP");
        assert_eq!(d.operand_a.as_ref().unwrap().as_indicator().unwrap().timeframe, "15m");

        // the builtin SMA is unknown to this catalog
        let result = exec(
            &["set-indicator", "-s", fixture.path_str(), "--side", "buy", "--id", "d", "--slot", "a", "--indicator", "SMA"],
            &config,
        );
        assert!(matches!(result, Err(RulecraftError::UnknownIndicator { .. })));
    }
}
