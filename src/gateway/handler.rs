use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::constants::REQUEST_ID_HEADER;
use crate::gateway::error::GatewayError;
use crate::gateway::schema::{HealthResponse, ScoreRequest, ScoreResponse};
use crate::gateway::state::HandlerState;

#[instrument(skip(state, body), fields(request_id = tracing::field::Empty, items = tracing::field::Empty))]
pub async fn score_handler(
    State(state): State<HandlerState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let request_id = Uuid::new_v4();
    let span = tracing::Span::current();
    span.record("request_id", tracing::field::display(&request_id));

    let Json(body) =
        body.map_err(|rejection| GatewayError::InvalidRequest(rejection.body_text()))?;

    let request: ScoreRequest = serde_json::from_value(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))?;
    let request = request.validate()?;
    span.record("items", request.len());

    let runner = state.runner.get_or_init().await?;
    let params = runner.effective_params(request.batch_size, request.evaluation_mode.as_deref());

    debug!(
        batch_size = params.batch_size,
        evaluation_mode = %params.evaluation_mode,
        "Dispatching score request"
    );

    let scores = runner
        .score_async(
            request.contexts,
            request.claims,
            request.batch_size,
            request.evaluation_mode,
        )
        .await?;

    info!(scores = scores.len(), "Score request complete");

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        headers.insert(REQUEST_ID_HEADER, value);
    }

    let response = ScoreResponse {
        scores,
        evaluation_mode: params.evaluation_mode,
        batch_size: params.batch_size,
        device: runner.device().to_string(),
    };

    Ok((StatusCode::OK, headers, Json(response)).into_response())
}

#[instrument(skip(state))]
pub async fn health_handler(State(state): State<HandlerState>) -> Result<Response, GatewayError> {
    let runner = state.runner.get_or_init().await?;

    Ok(Json(HealthResponse {
        status: "ok",
        device: runner.device().to_string(),
        evaluation_mode: runner.evaluation_mode().to_string(),
        batch_size: runner.default_batch_size(),
    })
    .into_response())
}
