//! Rule operands.
//!
//! - `ConditionValue`: what an operand is (an indicator reference or a constant)
//! - `IndicatorRef`: indicator key, parameter values and timeframe
//! - `ParameterValue`: one parameter value as the catalog declares it
//! - `Condition`: a `ConditionValue` plus its cached display label
//!
//! The label is derived data. Every constructor and mutator here regenerates
//! it, and equality ignores it.

use crate::domain::catalog::IndicatorDefinition;
use crate::domain::error::RulecraftError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Number(n) => write!(f, "{}", n),
            ParameterValue::Flag(b) => write!(f, "{}", b),
            ParameterValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl ParameterValue {
    /// False only for a NaN or infinite number, which JSON cannot carry.
    pub fn is_finite(&self) -> bool {
        match self {
            ParameterValue::Number(n) => n.is_finite(),
            ParameterValue::Flag(_) | ParameterValue::Text(_) => true,
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Number(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        ParameterValue::Flag(value)
    }
}

impl std::str::FromStr for ParameterValue {
    type Err = std::convert::Infallible;

    /// Numbers and booleans are recognised; anything else is kept as text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<f64>() {
            return Ok(ParameterValue::Number(n));
        }
        Ok(match trimmed {
            "true" => ParameterValue::Flag(true),
            "false" => ParameterValue::Flag(false),
            other => ParameterValue::Text(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorRef {
    pub indicator_key: String,
    #[serde(default)]
    pub parameter_values: BTreeMap<String, ParameterValue>,
    pub timeframe: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Indicator(IndicatorRef),
    Constant(f64),
}

impl ConditionValue {
    pub fn kind(&self) -> ConditionKind {
        match self {
            ConditionValue::Indicator(_) => ConditionKind::Indicator,
            ConditionValue::Constant(_) => ConditionKind::Constant,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    Indicator,
    Constant,
}

impl ConditionKind {
    pub fn describe(self) -> &'static str {
        match self {
            ConditionKind::Indicator => "an indicator",
            ConditionKind::Constant => "a constant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ConditionWire", into = "ConditionWire")]
pub struct Condition {
    value: ConditionValue,
    display_name: String,
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Condition {
    /// Label from the definition's name, parameters in declaration order.
    pub fn indicator(definition: &IndicatorDefinition, indicator: IndicatorRef) -> Self {
        let display_name = indicator_label(definition, &indicator.parameter_values);
        Self {
            value: ConditionValue::Indicator(indicator),
            display_name,
        }
    }

    /// Build an indicator operand without a catalog at hand. The label falls
    /// back to the key with parameters in key order.
    pub fn indicator_unresolved(indicator: IndicatorRef) -> Self {
        let display_name = fallback_label(&indicator);
        Self {
            value: ConditionValue::Indicator(indicator),
            display_name,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self {
            value: ConditionValue::Constant(value),
            display_name: constant_label(value),
        }
    }

    pub fn value(&self) -> &ConditionValue {
        &self.value
    }

    pub fn kind(&self) -> ConditionKind {
        self.value.kind()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn as_indicator(&self) -> Option<&IndicatorRef> {
        match &self.value {
            ConditionValue::Indicator(indicator) => Some(indicator),
            ConditionValue::Constant(_) => None,
        }
    }

    pub fn as_constant(&self) -> Option<f64> {
        match self.value {
            ConditionValue::Constant(value) => Some(value),
            ConditionValue::Indicator(_) => None,
        }
    }

    /// Set one parameter and regenerate the label from the full parameter set.
    pub fn with_parameter(
        &self,
        definition: &IndicatorDefinition,
        key: &str,
        value: ParameterValue,
    ) -> Result<Self, RulecraftError> {
        let ConditionValue::Indicator(indicator) = &self.value else {
            return Err(RulecraftError::IndicatorMismatch {
                expected: definition.key.clone(),
                found: self.display_name.clone(),
            });
        };
        if indicator.indicator_key != definition.key {
            return Err(RulecraftError::IndicatorMismatch {
                expected: definition.key.clone(),
                found: indicator.indicator_key.clone(),
            });
        }
        if definition.parameter(key).is_none() {
            return Err(RulecraftError::UnknownParameter {
                indicator: definition.key.clone(),
                parameter: key.to_string(),
            });
        }
        let mut updated = indicator.clone();
        updated.parameter_values.insert(key.to_string(), value);
        Ok(Self::indicator(definition, updated))
    }

    /// Returns `None` unless this is an indicator operand.
    pub fn with_timeframe(&self, timeframe: &str) -> Option<Self> {
        let indicator = self.as_indicator()?;
        Some(Self {
            value: ConditionValue::Indicator(IndicatorRef {
                timeframe: timeframe.to_string(),
                ..indicator.clone()
            }),
            display_name: self.display_name.clone(),
        })
    }

    /// Returns `None` unless this is a constant operand.
    pub fn with_constant(&self, value: f64) -> Option<Self> {
        self.as_constant().map(|_| Self::constant(value))
    }

    /// Every number in this operand can be written to JSON.
    pub fn is_finite(&self) -> bool {
        match &self.value {
            ConditionValue::Constant(value) => value.is_finite(),
            ConditionValue::Indicator(indicator) => indicator
                .parameter_values
                .values()
                .all(ParameterValue::is_finite),
        }
    }
}

impl From<&IndicatorDefinition> for Condition {
    fn from(definition: &IndicatorDefinition) -> Self {
        let parameter_values = definition
            .parameters
            .iter()
            .map(|p| (p.key.clone(), p.default_value.clone()))
            .collect();
        Self::indicator(
            definition,
            IndicatorRef {
                indicator_key: definition.key.clone(),
                parameter_values,
                timeframe: definition.default_timeframe.clone(),
            },
        )
    }
}

impl From<f64> for Condition {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            ConditionValue::Indicator(indicator) => {
                write!(f, "{} [{}]", self.display_name, indicator.timeframe)
            }
            ConditionValue::Constant(_) => write!(f, "{}", self.display_name),
        }
    }
}

fn indicator_label(
    definition: &IndicatorDefinition,
    values: &BTreeMap<String, ParameterValue>,
) -> String {
    let params: Vec<String> = definition
        .parameters
        .iter()
        .filter_map(|p| values.get(&p.key).map(ToString::to_string))
        .collect();
    join_label(&definition.name, &params)
}

fn fallback_label(indicator: &IndicatorRef) -> String {
    let params: Vec<String> = indicator
        .parameter_values
        .values()
        .map(ToString::to_string)
        .collect();
    join_label(&indicator.indicator_key, &params)
}

fn join_label(name: &str, params: &[String]) -> String {
    if params.is_empty() {
        name.to_string()
    } else {
        format!("{}({})", name, params.join(","))
    }
}

fn constant_label(value: f64) -> String {
    value.to_string()
}

/// Wire form: `{"kind", "value", "displayName"}` where `value` is an object
/// for indicators and a bare number for constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConditionWire {
    kind: ConditionKind,
    value: WireValue,
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum WireValue {
    Constant(f64),
    Indicator(IndicatorRef),
}

impl TryFrom<ConditionWire> for Condition {
    type Error = String;

    fn try_from(wire: ConditionWire) -> Result<Self, Self::Error> {
        let mut condition = match (wire.kind, wire.value) {
            (ConditionKind::Indicator, WireValue::Indicator(indicator)) => {
                Condition::indicator_unresolved(indicator)
            }
            (ConditionKind::Constant, WireValue::Constant(value)) => Condition::constant(value),
            (kind, _) => {
                return Err(format!("condition of kind {kind:?} has a mismatched value"));
            }
        };
        if !wire.display_name.is_empty() {
            condition.display_name = wire.display_name;
        }
        Ok(condition)
    }
}

impl From<Condition> for ConditionWire {
    fn from(condition: Condition) -> Self {
        let kind = condition.kind();
        let value = match condition.value {
            ConditionValue::Indicator(indicator) => WireValue::Indicator(indicator),
            ConditionValue::Constant(value) => WireValue::Constant(value),
        };
        ConditionWire {
            kind,
            value,
            display_name: condition.display_name,
        }
    }
}
