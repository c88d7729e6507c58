// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication error types with consistent API responses.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

/// Body of a rejected remote response.
///
/// Carried as decoded JSON when the remote sent parseable JSON, raw text
/// otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RemoteBody {
    Json(serde_json::Value),
    Text(String),
}

impl RemoteBody {
    /// Decode the body as JSON if possible, keeping the raw text otherwise.
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => RemoteBody::Json(value),
            Err(_) => RemoteBody::Text(text),
        }
    }
}

impl fmt::Display for RemoteBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteBody::Json(value) => write!(f, "{}", value),
            RemoteBody::Text(text) => f.write_str(text),
        }
    }
}

/// Every failure `authenticate`, `verify` and `refresh` can surface.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    // --- Transport ---
    #[error("Authentication service connection error: {0}")]
    ServiceUnreachable(String),

    #[error("Authentication service timed out: {0}")]
    ServiceTimeout(String),

    #[error(
        "Authentication service response has incorrect content-type. \
         Expected application/json but received {}",
        .0.as_deref().unwrap_or("<none>")
    )]
    UnexpectedContentType(Option<String>),

    #[error("Authentication service rejected the request (HTTP {status}): {body}")]
    RemoteRejected { status: u16, body: RemoteBody },

    #[error("Authentication service returned an invalid response: {0}")]
    InvalidResponse(String),

    // --- Decode ---
    #[error("Malformed access token: {0}")]
    MalformedToken(String),

    // --- Reconciliation ---
    #[error("Access token has no usable '{0}' claim")]
    ClaimMissing(String),

    #[error("Integrity error with user from authentication service: {0}")]
    IdentityConflict(String),

    #[error("User mapping rejected the remote record: {0}")]
    MappingRejected(String),

    #[error("Mapping strategy unavailable: {0}")]
    MappingUnavailable(String),

    #[error("Local user store error: {0}")]
    Store(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    // --- Setup ---
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl AuthError {
    /// True for failures raised while talking to the remote service.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            AuthError::ServiceUnreachable(_)
                | AuthError::ServiceTimeout(_)
                | AuthError::UnexpectedContentType(_)
                | AuthError::RemoteRejected { .. }
                | AuthError::InvalidResponse(_)
        )
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote: Option<RemoteBody>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let details = Some(self.to_string());
        let (status, error) = match &self {
            AuthError::ServiceUnreachable(_) => (StatusCode::BAD_GATEWAY, "service_unreachable"),
            AuthError::ServiceTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "service_timeout"),
            AuthError::UnexpectedContentType(_) => {
                (StatusCode::BAD_GATEWAY, "unexpected_content_type")
            }
            AuthError::InvalidResponse(_) => (StatusCode::BAD_GATEWAY, "invalid_response"),
            AuthError::RemoteRejected { .. } => (StatusCode::UNAUTHORIZED, "remote_rejected"),
            AuthError::MalformedToken(_) => (StatusCode::UNAUTHORIZED, "malformed_token"),
            AuthError::ClaimMissing(_) => (StatusCode::UNAUTHORIZED, "claim_missing"),
            AuthError::IdentityConflict(_) => (StatusCode::UNAUTHORIZED, "identity_conflict"),
            AuthError::MappingRejected(_) => (StatusCode::UNAUTHORIZED, "mapping_rejected"),
            AuthError::MappingUnavailable(_) | AuthError::Store(_) | AuthError::Config(_) => {
                tracing::error!(error = %self, "Internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            AuthError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };

        let (remote_status, remote) = match self {
            AuthError::RemoteRejected { status, body } => (Some(status), Some(body)),
            _ => (None, None),
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details: if status == StatusCode::INTERNAL_SERVER_ERROR {
                None
            } else {
                details
            },
            status: remote_status,
            remote,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_body_prefers_json() {
        let body = RemoteBody::from_text(r#"{"detail":"nope"}"#.to_string());
        assert_eq!(
            body,
            RemoteBody::Json(serde_json::json!({ "detail": "nope" }))
        );

        let body = RemoteBody::from_text("<html>Not Found</html>".to_string());
        assert_eq!(body, RemoteBody::Text("<html>Not Found</html>".to_string()));
    }

    #[test]
    fn unexpected_content_type_message() {
        let err = AuthError::UnexpectedContentType(Some("text/html".to_string()));
        assert!(err.to_string().ends_with("received text/html"));

        let err = AuthError::UnexpectedContentType(None);
        assert!(err.to_string().ends_with("received <none>"));
    }

    #[test]
    fn rejected_response_carries_remote_status() {
        let err = AuthError::RemoteRejected {
            status: 404,
            body: RemoteBody::Json(serde_json::json!({ "detail": "Not found." })),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
