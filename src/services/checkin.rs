//! Nightly submission flow: summarize, reconcile, log the raw text.

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::db::{journal, nightly, Store};
use crate::error::{AppError, AppResult};
use crate::models::activity::ActivityResponse;
use crate::models::checkin_entry::CheckinEntry;
use crate::models::morning_checkin::MorningCheckin;
use crate::models::nightly_checkin::NightlyCheckin;
use crate::models::warning_flag::WarningFlagResponse;
use crate::services::reconcile::{self, ActivityPolicy, ReconcileOutcome};
use crate::services::severity::{self, Severity};
use crate::services::summarizer::{self, TextGenerator};

#[derive(Debug)]
pub struct NightlySubmission<'a> {
    pub date: NaiveDate,
    pub today: NaiveDate,
    pub text: &'a str,
    pub policy: ActivityPolicy,
}

/// Everything stored for one day, as shown in the detail panel.
#[derive(Debug, Serialize)]
pub struct DayDetail {
    pub date: NaiveDate,
    pub severity: Severity,
    pub morning: Option<MorningCheckin>,
    pub nightly: Option<NightlyCheckin>,
    /// Stored service output for the nightly record, verbatim.
    pub summary: Option<serde_json::Value>,
    pub activities: Vec<ActivityResponse>,
    pub warning_flags: Vec<WarningFlagResponse>,
    pub entries: Vec<CheckinEntry>,
}

pub async fn submit_nightly(
    store: &Store,
    generator: &dyn TextGenerator,
    submission: NightlySubmission<'_>,
) -> AppResult<(ReconcileOutcome, DayDetail)> {
    let text = submission.text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("Check-in text must not be empty".into()));
    }
    if submission.date > submission.today {
        return Err(AppError::Validation(
            "Nightly check-ins cannot be saved for future dates".into(),
        ));
    }

    // Nothing is written unless the service produced a usable summary.
    let parsed = summarizer::summarize_day(generator, submission.date, text).await?;

    let outcome = reconcile::upsert_nightly(
        store,
        submission.date,
        submission.date != submission.today,
        &parsed,
        submission.policy,
    )
    .await?;

    let summary_json =
        serde_json::to_string(&parsed.raw).map_err(|e| AppError::Internal(e.into()))?;
    let mut conn = store.acquire().await?;
    journal::insert_entry(&mut conn, submission.date, text, &summary_json, Utc::now()).await?;
    drop(conn);

    let detail = load_day(store, submission.date).await?;
    Ok((outcome, detail))
}

pub async fn load_day(store: &Store, date: NaiveDate) -> AppResult<DayDetail> {
    let mut conn = store.acquire().await?;

    let morning = journal::get_morning_checkin(&mut conn, date).await?;
    let record = nightly::get_by_date(&mut conn, date).await?;
    let (activities, warning_flags) = match &record {
        Some(record) => (
            nightly::list_activities(&mut conn, record.id).await?,
            nightly::list_warning_flags(&mut conn, record.id).await?,
        ),
        None => (Vec::new(), Vec::new()),
    };
    let summary = record.as_ref().and_then(|r| r.raw_summary().ok());
    let entries = journal::list_entries(&mut conn, date).await?;
    let severity = severity::classify_date(&mut conn, date).await?;

    Ok(DayDetail {
        date,
        severity,
        morning,
        nightly: record,
        summary,
        activities: activities.into_iter().map(ActivityResponse::from).collect(),
        warning_flags: warning_flags.into_iter().map(WarningFlagResponse::from).collect(),
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::testing::memory_store;
    use crate::services::summarizer::{CannedGenerator, SummaryError};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn submission(date: NaiveDate, text: &str) -> NightlySubmission<'_> {
        NightlySubmission {
            date,
            today: today(),
            text,
            policy: ActivityPolicy::Merge,
        }
    }

    async fn row_count(store: &Store, table: &str) -> i64 {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let mut conn = store.acquire().await.unwrap();
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *conn).await.unwrap();
        count
    }

    const REPLY: &str = r#"Here you go:
{"date":"2026-10-16","activities":[{"name":"Laundry","effort":[{"category":"physical","color":"yellow"}]}],
 "crash":{"occurred":false},"warning_flags":[{"type":"rushed","severity":"medium"}],
 "energy_balance":{"assessment":"slight_deficit"},"supportive_message":"Be gentle tomorrow."}"#;

    #[tokio::test]
    async fn test_submission_writes_day_and_entry() {
        let store = memory_store().await;
        let generator = CannedGenerator::replying(REPLY);

        let (outcome, detail) =
            submit_nightly(&store, &generator, submission(today(), "  Did laundry in a hurry.  "))
                .await
                .unwrap();

        assert!(outcome.created);
        let nightly = detail.nightly.unwrap();
        assert!(!nightly.is_backdated);
        assert_eq!(nightly.supportive_message.as_deref(), Some("Be gentle tomorrow."));
        assert_eq!(detail.activities.len(), 1);
        assert_eq!(detail.warning_flags.len(), 1);
        assert_eq!(detail.severity, Severity::Yellow);
        assert_eq!(detail.entries.len(), 1);
        assert_eq!(detail.entries[0].user_text, "Did laundry in a hurry.");
        let entry = serde_json::to_value(&detail.entries[0]).unwrap();
        assert_eq!(entry["summary"]["warning_flags"][0]["type"], "rushed");
        assert_eq!(detail.summary.unwrap()["supportive_message"], "Be gentle tomorrow.");
    }

    #[tokio::test]
    async fn test_backdated_submission() {
        let store = memory_store().await;
        let generator = CannedGenerator::replying(REPLY);
        let yesterday = today().pred_opt().unwrap();

        let (_, detail) = submit_nightly(&store, &generator, submission(yesterday, "late entry"))
            .await
            .unwrap();
        assert!(detail.nightly.unwrap().is_backdated);
    }

    #[tokio::test]
    async fn test_resubmission_appends_entries() {
        let store = memory_store().await;
        let generator = CannedGenerator::replying(REPLY);

        submit_nightly(&store, &generator, submission(today(), "first")).await.unwrap();
        let (outcome, detail) = submit_nightly(&store, &generator, submission(today(), "second"))
            .await
            .unwrap();

        assert!(!outcome.created);
        assert_eq!(detail.entries.len(), 2);
        assert_eq!(detail.activities.len(), 1);
        assert_eq!(row_count(&store, "nightly_checkins").await, 1);
    }

    #[tokio::test]
    async fn test_malformed_reply_writes_nothing() {
        let store = memory_store().await;
        let generator = CannedGenerator::replying("Sorry, I can't help with that.");

        let err = submit_nightly(&store, &generator, submission(today(), "a long day"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Summary(SummaryError::MalformedResponse(_))));
        for table in ["nightly_checkins", "activities", "warning_flags", "checkin_entries"] {
            assert_eq!(row_count(&store, table).await, 0, "{table} was written");
        }
    }

    #[tokio::test]
    async fn test_service_failure_writes_nothing() {
        let store = memory_store().await;
        let err = submit_nightly(&store, &CannedGenerator::failing(503), submission(today(), "x"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Summary(SummaryError::Service { status: 503, .. })));
        assert_eq!(row_count(&store, "checkin_entries").await, 0);
    }

    #[tokio::test]
    async fn test_input_validation() {
        let store = memory_store().await;
        let generator = CannedGenerator::replying(REPLY);

        let blank = submit_nightly(&store, &generator, submission(today(), "   ")).await;
        assert!(matches!(blank, Err(AppError::Validation(_))));

        let future = submit_nightly(&store, &generator, submission(today().succ_opt().unwrap(), "x")).await;
        assert!(matches!(future, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_load_empty_day() {
        let store = memory_store().await;
        let detail = load_day(&store, today()).await.unwrap();

        assert_eq!(detail.severity, Severity::None);
        assert!(detail.morning.is_none());
        assert!(detail.nightly.is_none());
        assert!(detail.summary.is_none());
        assert!(detail.activities.is_empty());
        assert!(detail.entries.is_empty());
    }
}
