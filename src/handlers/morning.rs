use axum::{extract::State, Json};
use chrono::Utc;
use validator::Validate;

use crate::db::journal;
use crate::dto::MorningCheckinRequest;
use crate::error::{AppError, AppResult};
use crate::models::morning_checkin::MorningCheckin;
use crate::AppState;

pub async fn save_morning_checkin(
    State(state): State<AppState>,
    Json(body): Json<MorningCheckinRequest>,
) -> AppResult<Json<MorningCheckin>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let now = Utc::now();
    let mut conn = state.store.acquire().await?;
    let checkin = journal::replace_morning_checkin(
        &mut conn,
        now.date_naive(),
        body.sleep_quality,
        body.energy_level,
        now,
    )
    .await?;

    tracing::info!(date = %checkin.checkin_date, "Morning check-in saved");
    Ok(Json(checkin))
}
