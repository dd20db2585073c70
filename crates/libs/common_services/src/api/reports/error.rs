use crate::database::DbError;
use crate::utils::validation_message;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use color_eyre::eyre;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{0}")]
    Validation(String),

    #[error("Report not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("File too large, maximum is {max_bytes} bytes")]
    TooLarge { max_bytes: usize },

    #[error("Database error")]
    Database(#[from] DbError),

    #[error("Storage error")]
    Storage(#[from] std::io::Error),

    #[error("internal error")]
    Internal(#[from] eyre::Report),
}

fn log_error(error: &ReportError) {
    match error {
        ReportError::Validation(message) => info!("Report -> Validation failed: {}", message),
        ReportError::NotFound => info!("Report -> Not found"),
        ReportError::Forbidden(message) => warn!("Report -> Forbidden: {}", message),
        ReportError::TooLarge { max_bytes } => {
            info!("Report -> Upload exceeded {} bytes", max_bytes);
        }
        ReportError::Database(e) => error!("Report -> Database query failed: {:?}", e),
        ReportError::Storage(e) => error!("Report -> Image storage failed: {:?}", e),
        ReportError::Internal(e) => error!("Report -> Internal error: {:?}", e),
    }
}

impl ReportError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Database(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        log_error(&self);

        let status = self.status_code();
        let message = match self {
            Self::Database(_) | Self::Storage(_) | Self::Internal(_) => {
                "Server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({ "success": false, "message": message }));
        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for ReportError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(validation_message(&errors))
    }
}
