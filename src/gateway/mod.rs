//! HTTP gateway (Axum) for consistency scoring.
//!
//! This module is primarily used by the `alignscore-server` binary.

#![allow(missing_docs)]

pub mod error;
pub mod handler;
pub mod schema;
pub mod state;

#[cfg(test)]
mod handler_tests;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use handler::{health_handler, score_handler};
pub use state::HandlerState;

pub fn create_router_with_state(state: HandlerState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/score", post(score_handler))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
