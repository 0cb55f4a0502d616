use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{NaiveDate, Utc};

use crate::dto::HistoryResponse;
use crate::error::AppResult;
use crate::services::checkin::{self, DayDetail};
use crate::services::{history, severity};
use crate::AppState;

pub async fn get_history(State(state): State<AppState>) -> AppResult<Json<HistoryResponse>> {
    let today = Utc::now().date_naive();

    let mut conn = state.store.acquire().await?;
    let severities = severity::classify_all(&mut conn).await?;

    Ok(Json(HistoryResponse {
        today,
        days: history::build_window(today, &severities),
    }))
}

pub async fn get_day(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> AppResult<Json<DayDetail>> {
    let day = checkin::load_day(&state.store, date).await?;
    Ok(Json(day))
}
