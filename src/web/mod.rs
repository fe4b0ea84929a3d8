//! HTTP JSON front end for the tracker.
//!
//! Mutating routes take HTML form bodies and answer with a redirect to `/`,
//! so a plain HTML form can drive it. Unparseable form input is
//! ignored rather than reported.

pub mod handlers;
pub mod state;

use crate::core::TrackerError;
use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;
use tower_http::trace::TraceLayer;

pub use state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::healthcheck))
        .route("/set_total", post(handlers::set_total))
        .route("/add", post(handlers::add))
        .route("/daily_goal", post(handlers::set_daily_goal))
        .route("/reset", post(handlers::reset))
        .route("/chart-data", get(handlers::chart_data))
        .route("/calendar", get(handlers::calendar))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug)]
pub enum WebError {
    Tracker(TrackerError),
    Internal(String),
}

impl From<TrackerError> for WebError {
    fn from(err: TrackerError) -> Self {
        WebError::Tracker(err)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (message, code) = match self {
            WebError::Tracker(err @ TrackerError::IoError(_)) => (err.to_string(), "io_error"),
            WebError::Tracker(err @ TrackerError::SerializationError(_)) => {
                (err.to_string(), "serialization_error")
            }
            WebError::Tracker(err @ TrackerError::LockError(_)) => (err.to_string(), "lock_error"),
            WebError::Internal(msg) => (msg, "internal_error"),
        };

        tracing::error!(code, error = %message, "request failed");

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        });

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, WebError>;
