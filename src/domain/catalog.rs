//! Indicator catalog types.
//!
//! The catalog itself is owned by the backend; this module only models its
//! shape so editor operations can seed conditions from a definition and the
//! render layer can resolve keys:
//! - `IndicatorDefinition`: name, parameter schema and timeframes of one indicator
//! - `ParameterSpec`: one declared parameter with its default value
//! - `IndicatorCatalog`: definitions by key

use crate::domain::condition::ParameterValue;
use crate::domain::error::RulecraftError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Number,
    Boolean,
    Select,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub default_value: ParameterValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ParameterValue>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorDefinition {
    /// Filled from the catalog map key when loaded from a catalog file.
    #[serde(default, skip_serializing)]
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    pub default_timeframe: String,
    #[serde(default)]
    pub supported_timeframes: Vec<String>,
}

impl IndicatorDefinition {
    pub fn parameter(&self, key: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.key == key)
    }

    /// An empty `supported_timeframes` list accepts any timeframe.
    pub fn supports_timeframe(&self, timeframe: &str) -> bool {
        self.supported_timeframes.is_empty()
            || self.supported_timeframes.iter().any(|tf| tf == timeframe)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorCatalog {
    definitions: BTreeMap<String, IndicatorDefinition>,
}

impl IndicatorCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(definitions: impl IntoIterator<Item = IndicatorDefinition>) -> Self {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.insert(definition);
        }
        catalog
    }

    /// Parse the backend's catalog document: a JSON object keyed by indicator key.
    pub fn from_json(json: &str) -> Result<Self, RulecraftError> {
        let raw: BTreeMap<String, IndicatorDefinition> = serde_json::from_str(json)?;
        Ok(Self::from_definitions(raw.into_iter().map(|(key, mut def)| {
            def.key = key;
            def
        })))
    }

    pub fn insert(&mut self, definition: IndicatorDefinition) {
        self.definitions.insert(definition.key.clone(), definition);
    }

    pub fn get(&self, key: &str) -> Option<&IndicatorDefinition> {
        self.definitions.get(key)
    }

    pub fn require(&self, key: &str) -> Result<&IndicatorDefinition, RulecraftError> {
        self.get(key).ok_or_else(|| RulecraftError::UnknownIndicator {
            key: key.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorDefinition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Default set used when no catalog file is configured.
    pub fn builtin() -> Self {
        const TIMEFRAMES: [&str; 6] = ["5m", "15m", "1h", "4h", "1d", "1w"];

        fn number(key: &str, name: &str, default: f64) -> ParameterSpec {
            ParameterSpec {
                key: key.into(),
                name: name.into(),
                kind: ParameterKind::Number,
                default_value: ParameterValue::Number(default),
                options: None,
            }
        }

        fn define(key: &str, category: &str, parameters: Vec<ParameterSpec>) -> IndicatorDefinition {
            IndicatorDefinition {
                key: key.into(),
                name: key.into(),
                category: category.into(),
                parameters,
                default_timeframe: "1h".into(),
                supported_timeframes: TIMEFRAMES.iter().map(|tf| tf.to_string()).collect(),
            }
        }

        let source = ParameterSpec {
            key: "source".into(),
            name: "Source".into(),
            kind: ParameterKind::Select,
            default_value: ParameterValue::Text("close".into()),
            options: Some(
                ["open", "high", "low", "close"]
                    .iter()
                    .map(|s| ParameterValue::Text(s.to_string()))
                    .collect(),
            ),
        };

        Self::from_definitions([
            define("SMA", "trend", vec![number("period", "Period", 20.0)]),
            define("EMA", "trend", vec![number("period", "Period", 20.0)]),
            define("RSI", "momentum", vec![number("period", "Period", 14.0)]),
            define(
                "MACD",
                "momentum",
                vec![
                    number("fast", "Fast Period", 12.0),
                    number("slow", "Slow Period", 26.0),
                    number("signal", "Signal Period", 9.0),
                ],
            ),
            define(
                "BBANDS",
                "volatility",
                vec![
                    number("period", "Period", 20.0),
                    number("stddev", "Standard Deviations", 2.0),
                ],
            ),
            define("ATR", "volatility", vec![number("period", "Period", 14.0)]),
            define("PRICE", "price", vec![source]),
        ])
    }
}
