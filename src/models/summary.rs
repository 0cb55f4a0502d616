//! Typed view of the JSON object returned by the summarization service.
//!
//! The service output is untrusted: every field may be missing, null, or of
//! the wrong type. Defaults are applied here, once, so reconciliation and
//! classification never re-derive them.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_ACTIVITY_NAME: &str = "Activity";
pub const DEFAULT_FLAG_TYPE: &str = "cumulative_load";

/// Raw service JSON plus its typed projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSummary {
    pub raw: Value,
    pub summary: NightlySummary,
}

impl ParsedSummary {
    pub fn from_value(raw: Value) -> Self {
        let summary = serde_json::from_value(raw.clone()).unwrap_or_default();
        Self { raw, summary }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NightlySummary {
    #[serde(default, deserialize_with = "lenient")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub activities: Vec<ActivitySummary>,
    #[serde(default, deserialize_with = "lenient")]
    pub crash: CrashSummary,
    #[serde(default, deserialize_with = "lenient_list")]
    pub warning_flags: Vec<WarningFlagSummary>,
    #[serde(default, deserialize_with = "lenient")]
    pub energy_balance: EnergyBalance,
    #[serde(default, deserialize_with = "lenient")]
    pub supportive_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    #[serde(default = "default_activity_name", deserialize_with = "lenient_name")]
    pub name: String,
    /// Stored as given; see [`effort_entries`] for the typed reading.
    #[serde(default = "empty_effort", deserialize_with = "lenient_effort")]
    pub effort: Value,
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub duration_minutes: Option<i64>,
    #[serde(default, deserialize_with = "truthy")]
    pub difficulty_noted: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub notes: Option<String>,
}

impl Default for ActivitySummary {
    fn default() -> Self {
        Self {
            name: default_activity_name(),
            effort: empty_effort(),
            duration_minutes: None,
            difficulty_noted: false,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffortEntry {
    pub category: EffortCategory,
    pub color: EffortColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffortCategory {
    Physical,
    Cognitive,
    Social,
    Sensory,
    Emotional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffortColor {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrashSummary {
    #[serde(default, deserialize_with = "truthy")]
    pub occurred: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningFlagSummary {
    #[serde(rename = "type", default = "default_flag_type", deserialize_with = "lenient_flag_type")]
    pub flag_type: String,
    #[serde(default, deserialize_with = "lenient")]
    pub severity: FlagSeverity,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub related_activities: Vec<String>,
}

impl Default for WarningFlagSummary {
    fn default() -> Self {
        Self {
            flag_type: default_flag_type(),
            severity: FlagSeverity::default(),
            description: None,
            related_activities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FlagSeverity {
    High,
    Medium,
    #[default]
    Low,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyBalance {
    #[serde(default, deserialize_with = "lenient")]
    pub assessment: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub current_state: Option<String>,
    #[serde(default, deserialize_with = "truthy")]
    pub recovery_needed: bool,
}

/// Closed vocabulary of `energy_balance.assessment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyAssessment {
    Surplus,
    Balanced,
    SlightDeficit,
    ModerateDeficit,
    SignificantDeficit,
}

impl EnergyAssessment {
    /// Case-insensitive parse; unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "surplus" => Some(Self::Surplus),
            "balanced" => Some(Self::Balanced),
            "slight_deficit" => Some(Self::SlightDeficit),
            "moderate_deficit" => Some(Self::ModerateDeficit),
            "significant_deficit" => Some(Self::SignificantDeficit),
            _ => None,
        }
    }
}

/// Entries of an `effort` value that fit the category and color
/// vocabularies, in order. Anything else yields nothing.
pub fn effort_entries(effort: &Value) -> Vec<EffortEntry> {
    match effort {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| EffortEntry::deserialize(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

fn empty_effort() -> Value {
    Value::Array(Vec::new())
}

fn default_activity_name() -> String {
    DEFAULT_ACTIVITY_NAME.to_string()
}

fn default_flag_type() -> String {
    DEFAULT_FLAG_TYPE.to_string()
}

/// Any value that does not fit `T` becomes `T::default()`.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Non-lists become empty; each element is parsed leniently.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    })
}

/// Non-lists become empty; elements that do not parse are dropped.
fn lenient_entries<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    let total = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if kept.len() < total {
        tracing::debug!(dropped = total - kept.len(), "Dropped unrecognized summary entries");
    }
    Ok(kept)
}

/// Only an explicit null is replaced; every other value is kept as given.
fn lenient_effort<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => empty_effort(),
        value => value,
    })
}

/// Whole numbers only, including floats such as `30.0`.
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Number(n) = value else {
        return Ok(None);
    };
    Ok(n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    }))
}

/// Flags the service may send as `1`, `"true"` or `"yes"`. Zero, the empty
/// string and null are false; any other value is true.
fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

fn lenient_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let name: Option<String> = lenient(deserializer)?;
    Ok(name.unwrap_or_else(default_activity_name))
}

fn lenient_flag_type<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let flag_type: Option<String> = lenient(deserializer)?;
    Ok(flag_type.unwrap_or_else(default_flag_type))
}
