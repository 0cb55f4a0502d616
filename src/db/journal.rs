use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqliteConnection;

use crate::models::checkin_entry::CheckinEntry;
use crate::models::morning_checkin::MorningCheckin;

/// Writes the morning check-in for `date`, replacing any earlier one wholesale.
pub async fn replace_morning_checkin(
    conn: &mut SqliteConnection,
    date: NaiveDate,
    sleep_quality: i32,
    energy_level: i32,
    now: DateTime<Utc>,
) -> Result<MorningCheckin, sqlx::Error> {
    sqlx::query_as::<_, MorningCheckin>(
        r#"
        INSERT OR REPLACE INTO morning_checkins (checkin_date, sleep_quality, energy_level, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(date)
    .bind(sleep_quality)
    .bind(energy_level)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
}

pub async fn get_morning_checkin(
    conn: &mut SqliteConnection,
    date: NaiveDate,
) -> Result<Option<MorningCheckin>, sqlx::Error> {
    sqlx::query_as::<_, MorningCheckin>("SELECT * FROM morning_checkins WHERE checkin_date = ?")
        .bind(date)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn insert_entry(
    conn: &mut SqliteConnection,
    date: NaiveDate,
    user_text: &str,
    summary_json: &str,
    now: DateTime<Utc>,
) -> Result<CheckinEntry, sqlx::Error> {
    sqlx::query_as::<_, CheckinEntry>(
        r#"
        INSERT INTO checkin_entries (entry_date, user_text, summary_json, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(date)
    .bind(user_text)
    .bind(summary_json)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
}

/// Entries for a day, newest first.
pub async fn list_entries(
    conn: &mut SqliteConnection,
    date: NaiveDate,
) -> Result<Vec<CheckinEntry>, sqlx::Error> {
    sqlx::query_as::<_, CheckinEntry>(
        "SELECT * FROM checkin_entries WHERE entry_date = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(date)
    .fetch_all(&mut *conn)
    .await
}
