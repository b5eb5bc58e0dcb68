//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::catalog_file_adapter::CatalogFileAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_strategy_adapter::JsonStrategyFile;
use crate::adapters::text_renderer;
use crate::domain::catalog::IndicatorCatalog;
use crate::domain::condition::ParameterValue;
use crate::domain::config_validation::validate_editor_config;
use crate::domain::error::RulecraftError;
use crate::domain::mirror;
use crate::domain::rule_node::{ComparisonOperator, LogicOperator, NodeId, NodePatch, RuleNode};
use crate::domain::rule_tree::{RuleTree, RuleType};
use crate::domain::strategy::StrategyRecord;
use crate::domain::target_slot::{Slot, TargetSlot};
use crate::domain::tree_editor;
use crate::domain::validation::{validate_strategy, validate_tree};
use crate::logging::{self, LogFormat};
use crate::ports::catalog_port::{BuiltinCatalog, CatalogPort};
use crate::ports::config_port::ConfigPort;
use crate::ports::strategy_port::StrategyPort;

#[derive(Parser, Debug)]
#[command(name = "rulecraft", about = "Build and edit trading strategy rule trees")]
pub struct Cli {
    /// Editor configuration (INI)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct StrategyArg {
    /// Strategy file (JSON)
    #[arg(short, long)]
    pub strategy: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct NodeArgs {
    #[arg(long)]
    pub side: RuleType,
    #[arg(long)]
    pub id: NodeId,
}

#[derive(Args, Debug, Clone)]
pub struct SlotArgs {
    #[command(flatten)]
    pub node: NodeArgs,
    /// Operand slot: a or b
    #[arg(long)]
    pub slot: Slot,
}

impl SlotArgs {
    fn target(&self) -> TargetSlot {
        TargetSlot::new(self.node.side, self.node.id.clone(), self.slot)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty strategy file
    New {
        #[command(flatten)]
        file: StrategyArg,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print a strategy's rules
    Show {
        #[command(flatten)]
        file: StrategyArg,
    },
    /// Check a strategy against the indicator catalog
    Validate {
        #[command(flatten)]
        file: StrategyArg,
    },
    /// List the indicators in the catalog
    Indicators,
    /// Add a rule block
    Add {
        #[command(flatten)]
        file: StrategyArg,
        #[arg(long)]
        side: RuleType,
        /// Block to attach to; top level when omitted
        #[arg(long)]
        parent: Option<NodeId>,
        /// AND nests under the parent, OR inserts after it
        #[arg(long = "as", default_value = "AND")]
        as_operator: LogicOperator,
    },
    /// Delete a rule block and everything nested under it
    Delete {
        #[command(flatten)]
        file: StrategyArg,
        #[command(flatten)]
        node: NodeArgs,
    },
    /// Set a block's comparison operator
    SetOperator {
        #[command(flatten)]
        file: StrategyArg,
        #[command(flatten)]
        node: NodeArgs,
        #[arg(long)]
        operator: ComparisonOperator,
    },
    /// Set how a block's children combine
    SetLogic {
        #[command(flatten)]
        file: StrategyArg,
        #[command(flatten)]
        node: NodeArgs,
        #[arg(long)]
        logic: LogicOperator,
    },
    /// Put an indicator (with its default parameters) into a slot
    SetIndicator {
        #[command(flatten)]
        file: StrategyArg,
        #[command(flatten)]
        slot: SlotArgs,
        #[arg(long)]
        indicator: String,
    },
    /// Change one parameter of the indicator in a slot
    SetParam {
        #[command(flatten)]
        file: StrategyArg,
        #[command(flatten)]
        slot: SlotArgs,
        #[arg(long)]
        param: String,
        /// Number, true/false, or text for select parameters
        #[arg(long, allow_negative_numbers = true, value_parser = parse_parameter_value)]
        value: ParameterValue,
    },
    /// Put a constant into a slot
    SetConstant {
        #[command(flatten)]
        file: StrategyArg,
        #[command(flatten)]
        slot: SlotArgs,
        #[arg(long, allow_negative_numbers = true, value_parser = parse_finite)]
        value: f64,
    },
    /// Change the timeframe of the indicator in a slot
    SetTimeframe {
        #[command(flatten)]
        file: StrategyArg,
        #[command(flatten)]
        slot: SlotArgs,
        #[arg(long)]
        timeframe: String,
    },
    /// Empty a slot
    ClearSlot {
        #[command(flatten)]
        file: StrategyArg,
        #[command(flatten)]
        slot: SlotArgs,
    },
    /// Copy a buy block to the sell rules with its comparisons flipped
    Mirror {
        #[command(flatten)]
        file: StrategyArg,
        /// Buy block to mirror
        #[arg(long)]
        id: NodeId,
    },
}

fn parse_finite(s: &str) -> Result<f64, String> {
    let value: f64 = s.trim().parse().map_err(|e| format!("'{s}' is not a number: {e}"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("'{s}' is not a finite number"))
    }
}

fn parse_parameter_value(s: &str) -> Result<ParameterValue, String> {
    let Ok(value) = s.parse::<ParameterValue>();
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("'{s}' is not a finite number"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Refused edits fail the command instead of leaving the file unchanged.
    pub strict: bool,
    pub catalog_path: Option<PathBuf>,
    pub log_filter: String,
    pub log_format: LogFormat,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            strict: true,
            catalog_path: None,
            log_filter: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match load_editor_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    logging::init_logging(&config.log_filter, config.log_format);

    match execute(&cli.command, &config) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_editor_config(path: Option<&Path>) -> Result<EditorConfig, RulecraftError> {
    let Some(path) = path else {
        return build_editor_config(&FileConfigAdapter::empty());
    };
    let adapter =
        FileConfigAdapter::from_file(path).map_err(|e| RulecraftError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;
    build_editor_config(&adapter)
}

pub fn build_editor_config(adapter: &dyn ConfigPort) -> Result<EditorConfig, RulecraftError> {
    validate_editor_config(adapter)?;
    let defaults = EditorConfig::default();

    let log_format = match adapter.get_string("logging", "format") {
        Some(s) => s
            .parse::<LogFormat>()
            .map_err(|reason| RulecraftError::ConfigInvalid {
                section: "logging".into(),
                key: "format".into(),
                reason,
            })?,
        None => defaults.log_format,
    };

    Ok(EditorConfig {
        strict: adapter.get_bool("editor", "strict", defaults.strict),
        catalog_path: adapter.get_path("catalog", "path"),
        log_filter: adapter
            .get_string("logging", "filter")
            .map(|s| s.trim().to_string())
            .unwrap_or(defaults.log_filter),
        log_format,
    })
}

pub fn load_catalog(config: &EditorConfig) -> Result<IndicatorCatalog, RulecraftError> {
    let source: Box<dyn CatalogPort> = match &config.catalog_path {
        Some(path) => Box::new(CatalogFileAdapter::new(path)),
        None => Box::new(BuiltinCatalog),
    };
    source.load_catalog()
}

/// Run one command; returns what should be printed on stdout.
pub fn execute(command: &Command, config: &EditorConfig) -> Result<String, RulecraftError> {
    match command {
        Command::New {
            file,
            name,
            description,
            force,
        } => run_new(&file.strategy, name, description, *force),
        Command::Show { file } => {
            let record = JsonStrategyFile::new(&file.strategy).load()?;
            Ok(text_renderer::render_strategy(&record, &load_catalog(config)?))
        }
        Command::Validate { file } => run_validate(&file.strategy, config),
        Command::Indicators => run_indicators(config),
        Command::Add {
            file,
            side,
            parent,
            as_operator,
        } => {
            let node = RuleNode::new();
            let id = node.id.clone();
            let changed = edit_strategy(&file.strategy, config, |tree| {
                tree_editor::try_insert_rule(tree, *side, parent.as_ref(), *as_operator, node)
            })?;
            Ok(if changed { format!("{id}\n") } else { String::new() })
        }
        Command::Delete { file, node } => {
            edit_strategy(&file.strategy, config, |tree| {
                tree_editor::try_delete_rule(tree, node.side, &node.id)
            })?;
            Ok(String::new())
        }
        Command::SetOperator {
            file,
            node,
            operator,
        } => {
            let patch = NodePatch::default().operator(*operator);
            edit_strategy(&file.strategy, config, |tree| {
                tree_editor::try_update_rule_data(tree, node.side, &node.id, &patch)
            })?;
            Ok(String::new())
        }
        Command::SetLogic { file, node, logic } => {
            let patch = NodePatch::default().child_logic_operator(*logic);
            edit_strategy(&file.strategy, config, |tree| {
                tree_editor::try_update_rule_data(tree, node.side, &node.id, &patch)
            })?;
            Ok(String::new())
        }
        Command::SetIndicator {
            file,
            slot,
            indicator,
        } => {
            let catalog = load_catalog(config)?;
            let definition = catalog.require(indicator)?;
            edit_strategy(&file.strategy, config, |tree| {
                tree_editor::try_update_block_condition(tree, &slot.target(), definition)
            })?;
            Ok(String::new())
        }
        Command::SetParam {
            file,
            slot,
            param,
            value,
        } => {
            let catalog = load_catalog(config)?;
            let target = slot.target();
            edit_strategy(&file.strategy, config, |tree| {
                let key = &tree_editor::slot_indicator(tree, &target)?.indicator_key;
                let definition = catalog.require(key)?;
                tree_editor::try_update_block_parameter(tree, &target, definition, param, value.clone())
            })?;
            Ok(String::new())
        }
        Command::SetConstant { file, slot, value } => {
            edit_strategy(&file.strategy, config, |tree| {
                tree_editor::try_update_block_condition(tree, &slot.target(), *value)
            })?;
            Ok(String::new())
        }
        Command::SetTimeframe {
            file,
            slot,
            timeframe,
        } => {
            let catalog = load_catalog(config)?;
            let target = slot.target();
            edit_strategy(&file.strategy, config, |tree| {
                let key = &tree_editor::slot_indicator(tree, &target)?.indicator_key;
                if let Some(definition) = catalog.get(key) {
                    if !definition.supports_timeframe(timeframe) {
                        tracing::warn!(indicator = %key, %timeframe, "timeframe not supported by catalog");
                    }
                }
                tree_editor::try_update_block_timeframe(tree, &target, timeframe)
            })?;
            Ok(String::new())
        }
        Command::ClearSlot { file, slot } => {
            edit_strategy(&file.strategy, config, |tree| {
                tree_editor::try_clear_block_condition(tree, &slot.target())
            })?;
            Ok(String::new())
        }
        Command::Mirror { file, id } => {
            let mut mirrored = None;
            edit_strategy(&file.strategy, config, |tree| {
                let (tree, sell_id) = mirror::try_mirror_into_sell(tree, id)?;
                mirrored = Some(sell_id);
                Ok(tree)
            })?;
            Ok(mirrored.map(|id| format!("{id}\n")).unwrap_or_default())
        }
    }
}

/// Load, edit and save a strategy file. Returns whether the file changed.
///
/// In lenient mode a refused edit is logged and the file is left as it was.
fn edit_strategy<F>(path: &Path, config: &EditorConfig, edit: F) -> Result<bool, RulecraftError>
where
    F: FnOnce(&RuleTree) -> Result<RuleTree, RulecraftError>,
{
    let store = JsonStrategyFile::new(path);
    let mut record = store.load()?;
    match edit(&record.rules) {
        Ok(tree) => record.rules = tree,
        Err(e) if !config.strict => {
            tracing::warn!(error = %e, "edit ignored, strategy unchanged");
            return Ok(false);
        }
        Err(e) => return Err(e),
    }
    record.touch();
    store.save(&record)?;
    tracing::info!(path = %path.display(), "strategy updated");
    Ok(true)
}

fn run_new(path: &Path, name: &str, description: &str, force: bool) -> Result<String, RulecraftError> {
    let store = JsonStrategyFile::new(path);
    if store.exists() && !force {
        return Err(RulecraftError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} already exists (use --force to overwrite)", path.display()),
        )));
    }
    let mut record = StrategyRecord::new(name);
    record.description = description.to_string();
    record.touch();
    store.save(&record)?;
    tracing::info!(path = %path.display(), "strategy created");
    Ok(String::new())
}

fn run_validate(path: &Path, config: &EditorConfig) -> Result<String, RulecraftError> {
    let record = JsonStrategyFile::new(path).load()?;
    let catalog = load_catalog(config)?;

    let mut out = String::new();
    for issue in validate_tree(&record.rules, &catalog)
        .iter()
        .filter(|i| !i.is_blocking())
    {
        let _ = writeln!(out, "warning: {issue}");
    }
    validate_strategy(&record, &catalog)?;
    let _ = writeln!(
        out,
        "OK: {} buy block(s), {} sell block(s)",
        record.rules.node_count(RuleType::Buy),
        record.rules.node_count(RuleType::Sell),
    );
    Ok(out)
}

fn run_indicators(config: &EditorConfig) -> Result<String, RulecraftError> {
    let catalog = load_catalog(config)?;
    let mut out = String::new();
    for definition in catalog.iter() {
        let params: Vec<String> = definition
            .parameters
            .iter()
            .map(|p| format!("{}={}", p.key, p.default_value))
            .collect();
        let _ = writeln!(
            out,
            "{:<8} {:<12} {:<24} {}",
            definition.key,
            definition.category,
            params.join(","),
            definition.default_timeframe,
        );
    }
    Ok(out)
}
