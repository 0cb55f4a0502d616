use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::services::severity::Severity;

pub const HISTORY_DAYS: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryDay {
    pub date: NaiveDate,
    pub label: String,
    pub is_today: bool,
    pub severity: Severity,
}

/// The trailing window ending at `today`, oldest first.
pub fn build_window(today: NaiveDate, severities: &HashMap<NaiveDate, Severity>) -> Vec<HistoryDay> {
    (0..HISTORY_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let is_today = offset == 0;
            HistoryDay {
                date,
                label: if is_today {
                    "Today".to_string()
                } else {
                    date.format("%a").to_string()
                },
                is_today,
                severity: severities.get(&date).copied().unwrap_or_default(),
            }
        })
        .collect()
}
