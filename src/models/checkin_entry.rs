use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;

/// Append-only log of the raw text submitted for a day.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CheckinEntry {
    pub id: i64,
    pub entry_date: NaiveDate,
    pub user_text: String,
    /// Service output produced for this submission.
    #[serde(rename = "summary", serialize_with = "as_json")]
    pub summary_json: String,
    pub created_at: DateTime<Utc>,
}

/// Emits stored JSON text as JSON; text that does not parse goes out as a string.
fn as_json<S: Serializer>(text: &str, serializer: S) -> Result<S::Ok, S::Error> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => value.serialize(serializer),
        Err(_) => serializer.serialize_str(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(summary_json: &str) -> CheckinEntry {
        CheckinEntry {
            id: 1,
            entry_date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            user_text: "Slow morning.".into(),
            summary_json: summary_json.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_serialized_as_object() {
        let value = serde_json::to_value(entry(r#"{"supportive_message":"Rest."}"#)).unwrap();
        assert_eq!(value["summary"], json!({ "supportive_message": "Rest." }));
        assert!(value.get("summary_json").is_none());
    }

    #[test]
    fn test_unreadable_summary_serialized_as_text() {
        let value = serde_json::to_value(entry("{oops")).unwrap();
        assert_eq!(value["summary"], "{oops");
    }
}
