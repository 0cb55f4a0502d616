//! Per-day severity for the history strip.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::db::nightly;
use crate::models::activity::Activity;
use crate::models::nightly_checkin::NightlyCheckin;
use crate::models::summary::{EffortColor, EnergyAssessment, FlagSeverity};

const HEAVY_CRASH_KEYWORDS: [&str; 6] = ["severe", "heavy", "significant", "major", "extreme", "high"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// No nightly record for the day.
    #[default]
    None,
    Green,
    Yellow,
    Red,
}

/// Which rule set a record can support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    SignalRich,
    EffortOnly,
}

impl Strategy {
    pub fn select(signals: &DaySignals) -> Self {
        if signals.energy_assessment.is_some() || !signals.warning_severities.is_empty() {
            Strategy::SignalRich
        } else {
            Strategy::EffortOnly
        }
    }
}

/// Everything the classifier reads for one stored nightly record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DaySignals {
    pub crash_occurred: bool,
    pub crash_severity: Option<String>,
    pub energy_assessment: Option<String>,
    pub warning_severities: Vec<FlagSeverity>,
    /// Raw `effort_json` of each activity.
    pub activity_efforts: Vec<String>,
}

impl DaySignals {
    pub fn from_record(
        record: &NightlyCheckin,
        warning_severities: Vec<FlagSeverity>,
        activities: &[Activity],
    ) -> Self {
        Self {
            crash_occurred: record.crash_occurred,
            crash_severity: record.crash_severity.clone(),
            energy_assessment: record
                .energy_assessment
                .clone()
                .filter(|a| !a.trim().is_empty()),
            warning_severities,
            activity_efforts: activities.iter().map(|a| a.effort_json.clone()).collect(),
        }
    }

    fn heavy_crash(&self) -> bool {
        if !self.crash_occurred {
            return false;
        }
        let severity = self
            .crash_severity
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        HEAVY_CRASH_KEYWORDS.iter().any(|k| severity.contains(k))
    }

    fn has_flag(&self, severity: FlagSeverity) -> bool {
        self.warning_severities.contains(&severity)
    }
}

pub fn classify(signals: &DaySignals) -> Severity {
    match Strategy::select(signals) {
        Strategy::SignalRich => classify_signal_rich(signals),
        Strategy::EffortOnly => classify_effort_only(signals),
    }
}

fn classify_signal_rich(signals: &DaySignals) -> Severity {
    let significant_deficit = signals
        .energy_assessment
        .as_deref()
        .and_then(EnergyAssessment::parse)
        == Some(EnergyAssessment::SignificantDeficit);

    if signals.heavy_crash() {
        Severity::Red
    } else if significant_deficit || signals.has_flag(FlagSeverity::High) {
        Severity::Red
    } else if signals.crash_occurred || signals.has_flag(FlagSeverity::Medium) {
        Severity::Yellow
    } else {
        Severity::Green
    }
}

fn classify_effort_only(signals: &DaySignals) -> Severity {
    if signals.crash_occurred {
        return Severity::Red;
    }

    let mut worst = Severity::Green;
    for effort_json in &signals.activity_efforts {
        let Some(entries) = effort_list(effort_json) else {
            tracing::debug!(effort = %effort_json, "Unreadable effort data counts as yellow");
            worst = Severity::Yellow;
            continue;
        };
        // Only the color matters here; the category may be anything.
        for entry in entries {
            match entry.get("color").and_then(|c| EffortColor::deserialize(c).ok()) {
                Some(EffortColor::Red) => return Severity::Red,
                Some(EffortColor::Yellow) => worst = Severity::Yellow,
                Some(EffortColor::Green) | None => {}
            }
        }
    }
    worst
}

/// `None` unless the stored text is a JSON array.
fn effort_list(effort_json: &str) -> Option<Vec<serde_json::Value>> {
    match serde_json::from_str(effort_json).ok()? {
        serde_json::Value::Array(items) => Some(items),
        _ => None,
    }
}

/// Severity of every date that has a nightly record.
pub async fn classify_all(
    conn: &mut SqliteConnection,
) -> Result<HashMap<NaiveDate, Severity>, sqlx::Error> {
    let records = nightly::list_all(&mut *conn).await?;

    let mut flags: HashMap<i64, Vec<FlagSeverity>> = HashMap::new();
    for (checkin_id, severity) in nightly::list_all_flag_severities(&mut *conn).await? {
        flags.entry(checkin_id).or_default().push(severity);
    }

    let mut activities: HashMap<i64, Vec<Activity>> = HashMap::new();
    for activity in nightly::list_all_activities(&mut *conn).await? {
        activities.entry(activity.checkin_id).or_default().push(activity);
    }

    Ok(records
        .iter()
        .map(|record| {
            let signals = DaySignals::from_record(
                record,
                flags.remove(&record.id).unwrap_or_default(),
                activities.get(&record.id).map(Vec::as_slice).unwrap_or_default(),
            );
            (record.checkin_date, classify(&signals))
        })
        .collect())
}

/// Severity of one date; `None` when nothing is stored for it.
pub async fn classify_date(
    conn: &mut SqliteConnection,
    date: NaiveDate,
) -> Result<Severity, sqlx::Error> {
    let Some(record) = nightly::get_by_date(&mut *conn, date).await? else {
        return Ok(Severity::None);
    };
    let flags = nightly::list_warning_flags(&mut *conn, record.id).await?;
    let activities = nightly::list_activities(&mut *conn, record.id).await?;
    let signals = DaySignals::from_record(
        &record,
        flags.iter().map(|f| f.severity).collect(),
        &activities,
    );
    Ok(classify(&signals))
}
