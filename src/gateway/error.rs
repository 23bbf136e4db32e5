use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::constants::INTERNAL_ERROR_DETAIL;
use crate::runner::RunnerError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl From<RunnerError> for GatewayError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::InvalidInput { reason } => GatewayError::InvalidRequest(reason),
            other => GatewayError::InternalError(other.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            GatewayError::InvalidRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            GatewayError::InternalError(reason) => {
                error!(error = %reason, "Unhandled error while serving request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_DETAIL.to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}
