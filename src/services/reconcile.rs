//! Upserts a day's nightly check-in and reconciles its activities and
//! warning flags against what is already stored.

use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{nightly, Store};
use crate::error::{AppError, AppResult};
use crate::models::nightly_checkin::NightlyFields;
use crate::models::summary::ParsedSummary;

/// How activities from a new summary meet the ones already stored for the day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityPolicy {
    /// Drop stored activities and insert the new list.
    Replace,
    /// Update stored activities by name, append unknown ones, keep the rest.
    #[default]
    Merge,
}

impl FromStr for ActivityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "merge" => Ok(Self::Merge),
            other => Err(format!("unknown activity policy: {other}")),
        }
    }
}

impl std::fmt::Display for ActivityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Replace => "replace",
            Self::Merge => "merge",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub checkin_id: i64,
    pub created: bool,
    pub activities_inserted: usize,
    pub activities_updated: usize,
    pub warning_flags: usize,
}

/// Writes `parsed` as the nightly record for `date`.
///
/// The record keeps its id across saves. Warning flags are always replaced;
/// activities follow `policy`. All writes share one transaction.
pub async fn upsert_nightly(
    store: &Store,
    date: NaiveDate,
    is_backdated: bool,
    parsed: &ParsedSummary,
    policy: ActivityPolicy,
) -> AppResult<ReconcileOutcome> {
    let fields = NightlyFields::from_summary(is_backdated, parsed)
        .map_err(|e| AppError::Internal(e.into()))?;
    let now = Utc::now();

    let mut tx = store.begin().await?;

    let existing = nightly::find_id_by_date(&mut tx, date).await?;
    match existing {
        Some(id) => nightly::update(&mut tx, id, &fields, now).await?,
        None => nightly::insert(&mut tx, date, &fields, now).await?,
    }

    // Looked up again rather than trusting the insert to report an id.
    let checkin_id = nightly::find_id_by_date(&mut tx, date)
        .await?
        .ok_or_else(|| {
            AppError::Reconciliation(format!("nightly check-in for {date} missing after save"))
        })?;

    if existing.is_some() {
        nightly::delete_warning_flags(&mut tx, checkin_id).await?;
        if policy == ActivityPolicy::Replace {
            nightly::delete_activities(&mut tx, checkin_id).await?;
        }
    }

    let mut outcome = ReconcileOutcome {
        checkin_id,
        created: existing.is_none(),
        activities_inserted: 0,
        activities_updated: 0,
        warning_flags: 0,
    };

    for activity in &parsed.summary.activities {
        if policy == ActivityPolicy::Merge {
            if let Some(activity_id) =
                nightly::find_activity_id(&mut tx, checkin_id, &activity.name).await?
            {
                nightly::update_activity(&mut tx, activity_id, activity).await?;
                outcome.activities_updated += 1;
                continue;
            }
        }
        nightly::insert_activity(&mut tx, checkin_id, activity).await?;
        outcome.activities_inserted += 1;
    }

    for flag in &parsed.summary.warning_flags {
        nightly::insert_warning_flag(&mut tx, checkin_id, flag).await?;
        outcome.warning_flags += 1;
    }

    tx.commit().await?;

    tracing::info!(
        %date,
        checkin_id,
        %policy,
        created = outcome.created,
        activities_inserted = outcome.activities_inserted,
        activities_updated = outcome.activities_updated,
        warning_flags = outcome.warning_flags,
        "Nightly check-in reconciled"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::testing::memory_store;
    use crate::models::summary::{EffortColor, FlagSeverity, DEFAULT_FLAG_TYPE};
    use serde_json::{json, Value};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn first_summary() -> Value {
        json!({
            "date": "2026-10-14",
            "activities": [
                { "name": "Work call", "effort": [{ "category": "cognitive", "color": "yellow" }], "duration_minutes": 60 },
                { "name": "Cooking", "effort": [{ "category": "physical", "color": "green" }] }
            ],
            "crash": { "occurred": false },
            "warning_flags": [
                { "type": "pushed_through", "severity": "medium", "description": "kept going", "related_activities": ["Work call"] },
                { "type": "rushed", "severity": "low" }
            ],
            "energy_balance": { "assessment": "slight_deficit", "recovery_needed": false },
            "supportive_message": "Gentle evening ahead."
        })
    }

    fn second_summary() -> Value {
        json!({
            "date": "2026-10-14",
            "activities": [
                { "name": "Work call", "effort": [{ "category": "cognitive", "color": "red" }, { "category": "social", "color": "yellow" }], "difficulty_noted": true },
                { "name": "Short walk", "effort": [{ "category": "physical", "color": "yellow" }] }
            ],
            "warning_flags": [],
            "energy_balance": { "assessment": "moderate_deficit" }
        })
    }

    async fn save(store: &Store, raw: Value, policy: ActivityPolicy) -> ReconcileOutcome {
        upsert_nightly(store, day(), false, &ParsedSummary::from_value(raw), policy)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_save_inserts_everything() {
        let store = memory_store().await;
        let outcome = save(&store, first_summary(), ActivityPolicy::Merge).await;

        assert!(outcome.created);
        assert_eq!(outcome.activities_inserted, 2);
        assert_eq!(outcome.warning_flags, 2);

        let mut conn = store.acquire().await.unwrap();
        let record = nightly::get_by_date(&mut conn, day()).await.unwrap().unwrap();
        assert_eq!(record.id, outcome.checkin_id);
        assert_eq!(record.energy_assessment.as_deref(), Some("slight_deficit"));
        assert_eq!(record.supportive_message.as_deref(), Some("Gentle evening ahead."));

        let activities = nightly::list_activities(&mut conn, record.id).await.unwrap();
        let names: Vec<&str> = activities.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Work call", "Cooking"]);
        assert_eq!(activities[0].duration_minutes, Some(60));

        let flags = nightly::list_warning_flags(&mut conn, record.id).await.unwrap();
        assert_eq!(flags[0].severity, FlagSeverity::Medium);
        assert_eq!(flags[0].related_activity_names(), vec!["Work call".to_string()]);
    }

    #[tokio::test]
    async fn test_merge_updates_by_name_and_appends() {
        let store = memory_store().await;
        let first = save(&store, first_summary(), ActivityPolicy::Merge).await;
        let second = save(&store, second_summary(), ActivityPolicy::Merge).await;

        assert_eq!(first.checkin_id, second.checkin_id);
        assert!(!second.created);
        assert_eq!(second.activities_updated, 1);
        assert_eq!(second.activities_inserted, 1);

        let mut conn = store.acquire().await.unwrap();
        let activities = nightly::list_activities(&mut conn, second.checkin_id).await.unwrap();
        let names: Vec<&str> = activities.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Work call", "Cooking", "Short walk"]);

        let work = &activities[0];
        let effort = work.effort().unwrap();
        assert_eq!(effort.len(), 2);
        assert_eq!(effort[0].color, EffortColor::Red);
        assert!(work.difficulty_noted);
        assert_eq!(work.duration_minutes, None);
    }

    #[tokio::test]
    async fn test_replace_keeps_only_latest_activities() {
        let store = memory_store().await;
        save(&store, first_summary(), ActivityPolicy::Replace).await;
        let second = save(&store, second_summary(), ActivityPolicy::Replace).await;

        assert_eq!(second.activities_inserted, 2);
        assert_eq!(second.activities_updated, 0);

        let mut conn = store.acquire().await.unwrap();
        let activities = nightly::list_activities(&mut conn, second.checkin_id).await.unwrap();
        let names: Vec<&str> = activities.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Work call", "Short walk"]);
    }

    #[tokio::test]
    async fn test_warning_flags_always_replaced() {
        for policy in [ActivityPolicy::Merge, ActivityPolicy::Replace] {
            let store = memory_store().await;
            let first = save(&store, first_summary(), policy).await;
            let mut conn = store.acquire().await.unwrap();
            assert_eq!(
                nightly::list_warning_flags(&mut conn, first.checkin_id).await.unwrap().len(),
                2
            );
            drop(conn);

            let second = save(&store, second_summary(), policy).await;
            let mut conn = store.acquire().await.unwrap();
            let flags = nightly::list_warning_flags(&mut conn, second.checkin_id).await.unwrap();
            assert!(flags.is_empty(), "flags left behind under {policy}");
        }
    }

    #[tokio::test]
    async fn test_raw_summary_round_trips() {
        let store = memory_store().await;
        let raw = first_summary();
        save(&store, raw.clone(), ActivityPolicy::Merge).await;

        let mut conn = store.acquire().await.unwrap();
        let record = nightly::get_by_date(&mut conn, day()).await.unwrap().unwrap();
        assert_eq!(record.raw_summary().unwrap(), raw);
    }

    #[tokio::test]
    async fn test_update_preserves_created_at_and_refreshes_fields() {
        let store = memory_store().await;
        save(&store, first_summary(), ActivityPolicy::Merge).await;
        let mut conn = store.acquire().await.unwrap();
        let before = nightly::get_by_date(&mut conn, day()).await.unwrap().unwrap();
        drop(conn);

        upsert_nightly(
            &store,
            day(),
            true,
            &ParsedSummary::from_value(second_summary()),
            ActivityPolicy::Merge,
        )
        .await
        .unwrap();

        let mut conn = store.acquire().await.unwrap();
        let after = nightly::get_by_date(&mut conn, day()).await.unwrap().unwrap();
        assert_eq!(before.id, after.id);
        assert_eq!(before.created_at, after.created_at);
        assert!(after.updated_at >= before.updated_at);
        assert!(after.is_backdated);
        assert_eq!(after.energy_assessment.as_deref(), Some("moderate_deficit"));
        assert!(after.supportive_message.is_none());
    }

    #[tokio::test]
    async fn test_defaults_for_sparse_summary() {
        let store = memory_store().await;
        let outcome = save(
            &store,
            json!({
                "activities": [{ "effort": "lots" }],
                "warning_flags": [{ "description": "unclear" }]
            }),
            ActivityPolicy::Merge,
        )
        .await;

        let mut conn = store.acquire().await.unwrap();
        let record = nightly::get_by_date(&mut conn, day()).await.unwrap().unwrap();
        assert!(!record.crash_occurred);
        assert!(record.crash_severity.is_none());
        assert!(!record.energy_recovery_needed);

        let activities = nightly::list_activities(&mut conn, outcome.checkin_id).await.unwrap();
        assert_eq!(activities[0].name, "Activity");
        assert_eq!(activities[0].effort_json, r#""lots""#);
        assert!(activities[0].effort().unwrap().is_empty());

        let flags = nightly::list_warning_flags(&mut conn, outcome.checkin_id).await.unwrap();
        assert_eq!(flags[0].flag_type, DEFAULT_FLAG_TYPE);
        assert_eq!(flags[0].severity, FlagSeverity::Low);
    }

    #[tokio::test]
    async fn test_dates_are_independent() {
        let store = memory_store().await;
        let other = NaiveDate::from_ymd_opt(2026, 10, 13).unwrap();
        let a = save(&store, first_summary(), ActivityPolicy::Merge).await;
        let b = upsert_nightly(
            &store,
            other,
            true,
            &ParsedSummary::from_value(second_summary()),
            ActivityPolicy::Merge,
        )
        .await
        .unwrap();

        assert_ne!(a.checkin_id, b.checkin_id);
        let mut conn = store.acquire().await.unwrap();
        assert_eq!(nightly::list_activities(&mut conn, a.checkin_id).await.unwrap().len(), 2);
        assert_eq!(nightly::list_warning_flags(&mut conn, a.checkin_id).await.unwrap().len(), 2);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("MERGE".parse::<ActivityPolicy>(), Ok(ActivityPolicy::Merge));
        assert_eq!(" replace ".parse::<ActivityPolicy>(), Ok(ActivityPolicy::Replace));
        assert!("append".parse::<ActivityPolicy>().is_err());
        assert_eq!(ActivityPolicy::default(), ActivityPolicy::Merge);
    }
}
