//! Mapping of library errors to HTTP responses.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::FetchtextError;

/// Body sent when a batch is aborted. Internal details stay in the logs.
pub const FATAL_RESPONSE_BODY: &str = "Non-recoverable error while extracting content.\n";

/// Error returned by API handlers.
///
/// All error bodies are `text/plain`; only successful transforms produce JSON.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Payload rejected before any record was dispatched.
    pub fn bad_request(error: FetchtextError) -> Self {
        tracing::warn!("Rejected transform request: {}", error);
        Self {
            status: StatusCode::BAD_REQUEST,
            message: format!("{}\n", error),
        }
    }

    /// A batch was aborted by a non-recoverable error.
    pub fn fatal(error: FetchtextError) -> Self {
        tracing::error!("Transform batch aborted: {}", error);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: FATAL_RESPONSE_BODY.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.message,
        )
            .into_response()
    }
}
