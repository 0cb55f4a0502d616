use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::summary::{effort_entries, EffortEntry};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: i64,
    pub checkin_id: i64,
    pub name: String,
    pub effort_json: String,
    pub duration_minutes: Option<i64>,
    pub difficulty_noted: bool,
    pub notes: Option<String>,
}

impl Activity {
    /// Recognized effort entries; unknown categories or colors are skipped.
    pub fn effort(&self) -> Result<Vec<EffortEntry>, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(&self.effort_json)?;
        Ok(effort_entries(&value))
    }
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub id: i64,
    pub name: String,
    pub effort: Vec<EffortEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    pub difficulty_noted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<Activity> for ActivityResponse {
    fn from(activity: Activity) -> Self {
        let effort = activity.effort().unwrap_or_else(|e| {
            tracing::warn!(activity_id = activity.id, error = %e, "Unreadable effort data");
            Vec::new()
        });
        Self {
            id: activity.id,
            name: activity.name,
            effort,
            duration_minutes: activity.duration_minutes,
            difficulty_noted: activity.difficulty_noted,
            notes: activity.notes,
        }
    }
}
