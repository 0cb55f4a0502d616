use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MorningCheckin {
    pub id: i64,
    pub checkin_date: NaiveDate,
    pub sleep_quality: i32,
    pub energy_level: i32,
    pub created_at: DateTime<Utc>,
}
