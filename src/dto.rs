//! # Uplift: Request/Response DTOs
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body
//! - `*Response` → serialized to client JSON
//! - Range and length checks are expressed via `validator` derive macros

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::checkin::DayDetail;
use crate::services::history::HistoryDay;
use crate::services::reconcile::{ActivityPolicy, ReconcileOutcome};

// ============================================================================
// Status
// ============================================================================

/// GET /api/status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub summaries_enabled: bool,
    pub model: String,
    /// Standing warning while summaries are disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

// ============================================================================
// Morning
// ============================================================================

/// POST /api/morning-checkins, always recorded for today
#[derive(Debug, Deserialize, Validate)]
pub struct MorningCheckinRequest {
    /// 1 (very poor) to 5 (very good)
    #[validate(range(min = 1, max = 5, message = "Sleep quality must be 1-5"))]
    pub sleep_quality: i32,

    /// 1 (empty) to 5 (full)
    #[validate(range(min = 1, max = 5, message = "Energy level must be 1-5"))]
    pub energy_level: i32,
}

// ============================================================================
// Nightly
// ============================================================================

/// POST /api/nightly-checkins
#[derive(Debug, Deserialize, Validate)]
pub struct NightlyCheckinRequest {
    /// Free-text narration of the day
    #[validate(length(min = 1, max = 20000, message = "Text must be 1-20000 characters"))]
    pub text: String,

    /// Day the narration is about. Default: today (UTC)
    pub date: Option<NaiveDate>,

    /// Activity reconciliation policy. Default: server configuration
    pub policy: Option<ActivityPolicy>,
}

#[derive(Debug, Serialize)]
pub struct NightlyCheckinResponse {
    pub created: bool,
    pub activities_inserted: usize,
    pub activities_updated: usize,
    pub warning_flags: usize,
    pub day: DayDetail,
}

impl NightlyCheckinResponse {
    pub fn new(outcome: ReconcileOutcome, day: DayDetail) -> Self {
        Self {
            created: outcome.created,
            activities_inserted: outcome.activities_inserted,
            activities_updated: outcome.activities_updated,
            warning_flags: outcome.warning_flags,
            day,
        }
    }
}

// ============================================================================
// History
// ============================================================================

/// GET /api/history
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub today: NaiveDate,
    pub days: Vec<HistoryDay>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_morning_request_ranges() {
        let ok = MorningCheckinRequest {
            sleep_quality: 1,
            energy_level: 5,
        };
        assert!(ok.validate().is_ok());

        let bad = MorningCheckinRequest {
            sleep_quality: 0,
            energy_level: 6,
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("sleep_quality"));
        assert!(fields.contains_key("energy_level"));
    }

    #[test]
    fn test_nightly_request_defaults() {
        let req: NightlyCheckinRequest =
            serde_json::from_str(r#"{ "text": "Quiet day." }"#).unwrap();
        assert!(req.date.is_none());
        assert!(req.policy.is_none());
        assert!(req.validate().is_ok());

        let req: NightlyCheckinRequest = serde_json::from_str(
            r#"{ "text": "Quiet day.", "date": "2026-10-15", "policy": "replace" }"#,
        )
        .unwrap();
        assert_eq!(req.policy, Some(ActivityPolicy::Replace));
        assert_eq!(req.date, NaiveDate::from_ymd_opt(2026, 10, 15));
    }

    #[test]
    fn test_status_omits_warning_when_enabled() {
        let status = StatusResponse {
            summaries_enabled: true,
            model: "gemini-2.5-flash".into(),
            warning: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert!(json.get("warning").is_none());
    }
}
