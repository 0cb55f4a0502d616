//! Nightly check-ins and their child activities and warning flags.
//!
//! Every helper takes a plain connection so the same statements run on a
//! pooled connection or inside the reconciliation transaction.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqliteConnection;

use crate::models::activity::Activity;
use crate::models::nightly_checkin::{NightlyCheckin, NightlyFields};
use crate::models::summary::{ActivitySummary, FlagSeverity, WarningFlagSummary};
use crate::models::warning_flag::WarningFlag;

pub async fn find_id_by_date(
    conn: &mut SqliteConnection,
    date: NaiveDate,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM nightly_checkins WHERE checkin_date = ?")
        .bind(date)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn insert(
    conn: &mut SqliteConnection,
    date: NaiveDate,
    fields: &NightlyFields,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO nightly_checkins
            (checkin_date, is_backdated, crash_occurred, crash_severity, crash_description,
             energy_assessment, energy_current_state, energy_recovery_needed,
             supportive_message, summary_json, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(date)
    .bind(fields.is_backdated)
    .bind(fields.crash_occurred)
    .bind(&fields.crash_severity)
    .bind(&fields.crash_description)
    .bind(&fields.energy_assessment)
    .bind(&fields.energy_current_state)
    .bind(fields.energy_recovery_needed)
    .bind(&fields.supportive_message)
    .bind(&fields.summary_json)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    fields: &NightlyFields,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE nightly_checkins SET
            is_backdated = ?, crash_occurred = ?, crash_severity = ?, crash_description = ?,
            energy_assessment = ?, energy_current_state = ?, energy_recovery_needed = ?,
            supportive_message = ?, summary_json = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(fields.is_backdated)
    .bind(fields.crash_occurred)
    .bind(&fields.crash_severity)
    .bind(&fields.crash_description)
    .bind(&fields.energy_assessment)
    .bind(&fields.energy_current_state)
    .bind(fields.energy_recovery_needed)
    .bind(&fields.supportive_message)
    .bind(&fields.summary_json)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn get_by_date(
    conn: &mut SqliteConnection,
    date: NaiveDate,
) -> Result<Option<NightlyCheckin>, sqlx::Error> {
    sqlx::query_as::<_, NightlyCheckin>("SELECT * FROM nightly_checkins WHERE checkin_date = ?")
        .bind(date)
        .fetch_optional(&mut *conn)
        .await
}

/// Full scan, newest date first.
pub async fn list_all(conn: &mut SqliteConnection) -> Result<Vec<NightlyCheckin>, sqlx::Error> {
    sqlx::query_as::<_, NightlyCheckin>("SELECT * FROM nightly_checkins ORDER BY checkin_date DESC")
        .fetch_all(&mut *conn)
        .await
}

// ----------------------------------------------------------------------------
// Activities
// ----------------------------------------------------------------------------

pub async fn find_activity_id(
    conn: &mut SqliteConnection,
    checkin_id: i64,
    name: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT id FROM activities WHERE checkin_id = ? AND name = ? ORDER BY id LIMIT 1",
    )
    .bind(checkin_id)
    .bind(name)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn insert_activity(
    conn: &mut SqliteConnection,
    checkin_id: i64,
    activity: &ActivitySummary,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO activities
            (checkin_id, name, effort_json, duration_minutes, difficulty_noted, notes)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(checkin_id)
    .bind(&activity.name)
    .bind(effort_json(activity))
    .bind(activity.duration_minutes)
    .bind(activity.difficulty_noted)
    .bind(&activity.notes)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn update_activity(
    conn: &mut SqliteConnection,
    activity_id: i64,
    activity: &ActivitySummary,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE activities
        SET effort_json = ?, duration_minutes = ?, difficulty_noted = ?, notes = ?
        WHERE id = ?
        "#,
    )
    .bind(effort_json(activity))
    .bind(activity.duration_minutes)
    .bind(activity.difficulty_noted)
    .bind(&activity.notes)
    .bind(activity_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn delete_activities(
    conn: &mut SqliteConnection,
    checkin_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM activities WHERE checkin_id = ?")
        .bind(checkin_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Activities in insertion order.
pub async fn list_activities(
    conn: &mut SqliteConnection,
    checkin_id: i64,
) -> Result<Vec<Activity>, sqlx::Error> {
    sqlx::query_as::<_, Activity>("SELECT * FROM activities WHERE checkin_id = ? ORDER BY id")
        .bind(checkin_id)
        .fetch_all(&mut *conn)
        .await
}

pub async fn list_all_activities(
    conn: &mut SqliteConnection,
) -> Result<Vec<Activity>, sqlx::Error> {
    sqlx::query_as::<_, Activity>("SELECT * FROM activities ORDER BY checkin_id, id")
        .fetch_all(&mut *conn)
        .await
}

fn effort_json(activity: &ActivitySummary) -> String {
    activity.effort.to_string()
}

// ----------------------------------------------------------------------------
// Warning flags
// ----------------------------------------------------------------------------

pub async fn insert_warning_flag(
    conn: &mut SqliteConnection,
    checkin_id: i64,
    flag: &WarningFlagSummary,
) -> Result<(), sqlx::Error> {
    let related = serde_json::to_string(&flag.related_activities).unwrap_or_else(|_| "[]".into());
    sqlx::query(
        r#"
        INSERT INTO warning_flags (checkin_id, flag_type, severity, description, related_activities)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(checkin_id)
    .bind(&flag.flag_type)
    .bind(flag.severity)
    .bind(&flag.description)
    .bind(related)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn delete_warning_flags(
    conn: &mut SqliteConnection,
    checkin_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM warning_flags WHERE checkin_id = ?")
        .bind(checkin_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn list_warning_flags(
    conn: &mut SqliteConnection,
    checkin_id: i64,
) -> Result<Vec<WarningFlag>, sqlx::Error> {
    sqlx::query_as::<_, WarningFlag>("SELECT * FROM warning_flags WHERE checkin_id = ? ORDER BY id")
        .bind(checkin_id)
        .fetch_all(&mut *conn)
        .await
}

/// `(checkin_id, severity)` for every stored flag.
pub async fn list_all_flag_severities(
    conn: &mut SqliteConnection,
) -> Result<Vec<(i64, FlagSeverity)>, sqlx::Error> {
    sqlx::query_as::<_, (i64, FlagSeverity)>("SELECT checkin_id, severity FROM warning_flags")
        .fetch_all(&mut *conn)
        .await
}
