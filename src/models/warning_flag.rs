use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::summary::FlagSeverity;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WarningFlag {
    pub id: i64,
    pub checkin_id: i64,
    pub flag_type: String,
    pub severity: FlagSeverity,
    pub description: Option<String>,
    pub related_activities: String,
}

impl WarningFlag {
    /// Activity names the flag mentions; informational only.
    pub fn related_activity_names(&self) -> Vec<String> {
        serde_json::from_str(&self.related_activities).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct WarningFlagResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub flag_type: String,
    pub severity: FlagSeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub related_activities: Vec<String>,
}

impl From<WarningFlag> for WarningFlagResponse {
    fn from(flag: WarningFlag) -> Self {
        let related_activities = flag.related_activity_names();
        Self {
            id: flag.id,
            flag_type: flag.flag_type,
            severity: flag.severity,
            description: flag.description,
            related_activities,
        }
    }
}
