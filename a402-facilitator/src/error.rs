//! HTTP error mapping for the facilitator service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors surfaced by the facilitator endpoints.
///
/// Malformed bodies are the caller's fault (400); anything else — including
/// a payment for a scheme/network no handler serves — is a server-side
/// condition (500). Validation failures never take this path: they are
/// returned as regular responses with `isValid: false` / `success: false`.
#[derive(Debug, thiserror::Error)]
pub enum FacilitatorHttpError {
    /// JSON body deserialization failed.
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// Protocol-level error (version detection, missing fields).
    #[error("protocol error: {0}")]
    Protocol(#[from] a402_proto::ProtocolError),

    /// Engine dispatch error (no handler, hook abort).
    #[error("{0}")]
    Engine(Box<dyn std::error::Error + Send + Sync>),
}

impl FacilitatorHttpError {
    /// Wraps an engine dispatch error.
    #[must_use]
    pub fn engine(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Engine(err)
    }
}

impl IntoResponse for FacilitatorHttpError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidBody(_) | Self::Protocol(_) => StatusCode::BAD_REQUEST,
            Self::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
