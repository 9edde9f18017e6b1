use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tankrelay_core::error::CoreError;
use tankrelay_core::telemetry::PayloadError;
use tankrelay_events::TransportError;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce consistent JSON error responses of
/// the form `{"error": ..., "code": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The request body is not a valid snapshot.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// Publishing to the broker failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A domain-level error from `tankrelay_core`.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Payload(err) => (StatusCode::BAD_REQUEST, "INVALID_PAYLOAD", err.to_string()),
            AppError::Transport(err) => {
                tracing::error!(error = %err, "Transport error");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "PUBLISH_FAILED",
                    "Telemetry could not be published".to_string(),
                )
            }
            AppError::Core(err) => {
                tracing::error!(error = %err, "Internal core error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
