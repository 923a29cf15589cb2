use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Energy,
    Water,
    Waste,
    Emissions,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Water => "water",
            Self::Waste => "waste",
            Self::Emissions => "emissions",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasurementRecord {
    #[serde(default, deserialize_with = "de_token")]
    pub date: String,
    #[serde(default, deserialize_with = "de_token")]
    pub department: String,
    #[serde(default, deserialize_with = "de_token")]
    pub unit: String,
    #[serde(default, deserialize_with = "de_token")]
    pub machine: String,
    #[serde(default, deserialize_with = "de_token")]
    pub shift: String,
    #[serde(default, deserialize_with = "de_metric")]
    pub energy: f64,
    #[serde(default, deserialize_with = "de_metric")]
    pub water: f64,
    #[serde(default, deserialize_with = "de_metric")]
    pub waste: f64,
    #[serde(default, deserialize_with = "de_metric")]
    pub emissions: f64,
}

impl MeasurementRecord {
    pub fn metric(&self, kind: MetricKind) -> f64 {
        let value = match kind {
            MetricKind::Energy => self.energy,
            MetricKind::Water => self.water,
            MetricKind::Waste => self.waste,
            MetricKind::Emissions => self.emissions,
        };
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }

    pub fn day(&self) -> Option<NaiveDate> {
        parse_day(&self.date)
    }
}

pub fn parse_day(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

// Tags arrive as strings or bare numbers depending on the payload producer;
// both compare as strings downstream.
fn de_token<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(text) => text,
        serde_json::Value::Number(number) => number.to_string(),
        serde_json::Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    })
}

// Metric fields that fail numeric coercion degrade to 0 instead of rejecting
// the record.
fn de_metric<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse::<f64>().ok(),
        serde_json::Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    };
    Ok(parsed.filter(|parsed| parsed.is_finite()).unwrap_or(0.0))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub department: Option<String>,
    pub unit: Option<String>,
    pub machine: Option<String>,
    pub shift: Option<String>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.from.is_none()
            && self.to.is_none()
            && self.department.is_none()
            && self.unit.is_none()
            && self.machine.is_none()
            && self.shift.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterField {
    From,
    To,
    Department,
    Unit,
    Machine,
    Shift,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub departments: Vec<String>,
    pub units: Vec<String>,
    pub machines: Vec<String>,
    pub shifts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatePoint {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallPoint {
    pub date: String,
    pub energy: f64,
    pub water: f64,
    pub waste: f64,
    pub emissions: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTotals {
    pub energy: f64,
    pub water: f64,
    pub waste: f64,
    pub emissions: f64,
}

impl MetricTotals {
    pub fn get(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Energy => self.energy,
            MetricKind::Water => self.water,
            MetricKind::Waste => self.waste,
            MetricKind::Emissions => self.emissions,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub energy: u8,
    pub water: u8,
    pub waste: u8,
    pub emissions: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub date: String,
    pub department: String,
    pub machine: String,
    pub metric: MetricKind,
    pub value: f64,
    pub message: String,
}

impl Alert {
    // Deliberately coarse fingerprint: two alerts with the same tuple are
    // acknowledged together.
    pub fn identity_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.metric.as_str(),
            self.date,
            self.machine,
            self.department,
            self.value
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Open,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub details: Alert,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub text: String,
    pub ts: DateTime<Utc>,
}

pub type NoteBook = BTreeMap<String, Vec<Note>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMarker {
    pub id: String,
    pub date: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub ts: DateTime<Utc>,
    pub action: String,
}

pub type AcknowledgementSet = HashSet<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadOutcome {
    SourceEndpoint,
    GeneratedFallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    pub source: LoadOutcome,
    pub notice: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentTotal {
    pub department: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricInsights {
    pub metric: MetricKind,
    pub trend: Vec<AggregatePoint>,
    pub hotspots: Vec<DepartmentTotal>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallInsights {
    pub trend: Vec<OverallPoint>,
    pub totals: MetricTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub records_loaded: usize,
    pub filtered: Vec<MeasurementRecord>,
    pub totals: MetricTotals,
    pub energy_series: Vec<AggregatePoint>,
    pub water_series: Vec<AggregatePoint>,
    pub waste_series: Vec<AggregatePoint>,
    pub emissions_series: Vec<AggregatePoint>,
    pub overall_series: Vec<OverallPoint>,
    pub alerts: Vec<Alert>,
    pub active_alerts: Vec<Alert>,
    pub goal_progress: GoalProgress,
    pub options: FilterOptions,
    pub auto_refresh: bool,
}
