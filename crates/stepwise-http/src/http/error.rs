//! Mapping engine errors to HTTP responses.
//!
//! Most `FlowError` kinds are defects and map to an error envelope; a
//! missing prerequisite value is the one the host recovers from, by
//! sending the client back to the start of the workflow (the engine only
//! reports the condition, the translation is a transport-layer choice).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;
use stepwise_types::{FlowError, Handle};

/// A failed workflow request, paired with the handle that restarts the
/// workflow for recoverable cases.
#[derive(Debug)]
pub struct AppError {
    error: FlowError,
    restart: Handle,
}

impl AppError {
    pub fn new(error: FlowError, restart: Handle) -> Self {
        Self { error, restart }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.error {
            FlowError::MissingStepValue { label } => {
                tracing::warn!(step = %label, "client ahead of its session, restarting flow");
                return Redirect::to(self.restart.as_str()).into_response();
            }
            FlowError::UnsupportedStream { .. } => (StatusCode::NOT_FOUND, "UNSUPPORTED_STREAM"),
            FlowError::FlowExhausted { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "FLOW_EXHAUSTED")
            }
            FlowError::Decode { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "DECODE_ERROR"),
            FlowError::DuplicateLabel { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DUPLICATE_LABEL")
            }
            FlowError::Execution { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "STEP_FAILED"),
        };

        tracing::error!(error = %self.error, code, "workflow request failed");

        let body = json!({
            "data": null,
            "meta": {
                "timestamp": chrono::Utc::now().to_rfc3339(),
            },
            "errors": [{
                "code": code,
                "message": self.error.to_string(),
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    fn restart() -> Handle {
        Handle::new("/flow/start")
    }

    #[test]
    fn test_missing_value_redirects_to_start() {
        let response = AppError::new(
            FlowError::MissingStepValue {
                label: "name".into(),
            },
            restart(),
        )
        .into_response();

        assert!(response.status().is_redirection());
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "/flow/start"
        );
    }

    #[test]
    fn test_unsupported_stream_is_not_found() {
        let response = AppError::new(
            FlowError::UnsupportedStream {
                label: "name".into(),
            },
            restart(),
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_defects_are_internal_errors() {
        for error in [
            FlowError::FlowExhausted { label: "x".into() },
            FlowError::Decode {
                label: "x".into(),
                reason: "bad json".into(),
            },
            FlowError::DuplicateLabel { label: "x".into() },
            FlowError::execution("x", "boom"),
        ] {
            let response = AppError::new(error, restart()).into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
