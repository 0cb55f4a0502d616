use axum::{extract::State, Json};
use chrono::Utc;
use validator::Validate;

use crate::dto::{NightlyCheckinRequest, NightlyCheckinResponse};
use crate::error::{AppError, AppResult};
use crate::services::checkin::{self, NightlySubmission};
use crate::AppState;

pub async fn submit_nightly_checkin(
    State(state): State<AppState>,
    Json(body): Json<NightlyCheckinRequest>,
) -> AppResult<Json<NightlyCheckinResponse>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let today = Utc::now().date_naive();
    let submission = NightlySubmission {
        date: body.date.unwrap_or(today),
        today,
        text: &body.text,
        policy: body.policy.unwrap_or(state.config.activity_policy),
    };

    let (outcome, day) =
        checkin::submit_nightly(&state.store, state.generator.as_ref(), submission).await?;

    Ok(Json(NightlyCheckinResponse::new(outcome, day)))
}
