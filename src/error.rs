use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::summarizer::SummaryError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Summary(#[from] SummaryError),

    /// The store did not hold what was just written to it.
    #[error("Reconciliation error: {0}")]
    Reconciliation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::Summary(e) => e.kind(),
            AppError::Reconciliation(_) => "reconciliation",
            AppError::Database(_) | AppError::Migration(_) => "store",
            AppError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Summary(SummaryError::Configuration(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Summary(_) => StatusCode::BAD_GATEWAY,
            AppError::Reconciliation(_)
            | AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Summary(e) => {
                tracing::warn!(error = %e, kind = e.kind(), "Summarization failed");
                e.to_string()
            }
            AppError::Reconciliation(msg) => {
                tracing::error!(error = %msg, "Reconciliation error");
                self.to_string()
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                self.to_string()
            }
            AppError::Migration(e) => {
                tracing::error!(error = %e, "Migration error");
                self.to_string()
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                "Internal server error".into()
            }
        };

        let body = json!({
            "error": {
                "message": message,
                "code": status.as_u16(),
                "kind": self.kind(),
            }
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
