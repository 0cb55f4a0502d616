use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::summary::ParsedSummary;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NightlyCheckin {
    pub id: i64,
    pub checkin_date: NaiveDate,
    pub is_backdated: bool,
    pub crash_occurred: bool,
    pub crash_severity: Option<String>,
    pub crash_description: Option<String>,
    pub energy_assessment: Option<String>,
    pub energy_current_state: Option<String>,
    pub energy_recovery_needed: bool,
    pub supportive_message: Option<String>,
    #[serde(skip_serializing)]
    pub summary_json: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NightlyCheckin {
    pub fn raw_summary(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.summary_json)
    }
}

/// Scalar projection of a summary written to `nightly_checkins`.
#[derive(Debug, Clone, PartialEq)]
pub struct NightlyFields {
    pub is_backdated: bool,
    pub crash_occurred: bool,
    pub crash_severity: Option<String>,
    pub crash_description: Option<String>,
    pub energy_assessment: Option<String>,
    pub energy_current_state: Option<String>,
    pub energy_recovery_needed: bool,
    pub supportive_message: Option<String>,
    pub summary_json: String,
}

impl NightlyFields {
    pub fn from_summary(
        is_backdated: bool,
        parsed: &ParsedSummary,
    ) -> Result<Self, serde_json::Error> {
        let s = &parsed.summary;
        Ok(Self {
            is_backdated,
            crash_occurred: s.crash.occurred,
            crash_severity: s.crash.severity.clone(),
            crash_description: s.crash.description.clone(),
            energy_assessment: s.energy_balance.assessment.clone(),
            energy_current_state: s.energy_balance.current_state.clone(),
            energy_recovery_needed: s.energy_balance.recovery_needed,
            supportive_message: s.supportive_message.clone(),
            summary_json: serde_json::to_string(&parsed.raw)?,
        })
    }
}
