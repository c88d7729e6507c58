// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP transport to the remote auth service.
//!
//! Handles:
//! - JSON POSTs and bearer-authenticated GETs
//! - Mapping connection failures and timeouts to typed errors
//! - Rejecting non-200 statuses and non-JSON content types
//!
//! A single attempt per call; there are no retries.

use crate::error::{AuthError, RemoteBody};
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const JSON_MEDIA_TYPE: &str = "application/json";

/// Thin JSON client bound to the remote service's base URL.
#[derive(Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
}

impl Transport {
    /// Build a transport whose every request shares one timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::ServiceUnreachable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body and return the decoded JSON response.
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, AuthError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "POST to auth service");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(classify_send_error)?;

        check_response_json(response).await
    }

    /// GET with a pre-rendered authorization header (e.g. `Bearer <token>`).
    pub async fn get_with_auth(
        &self,
        path: &str,
        header_name: &HeaderName,
        header_value: &str,
    ) -> Result<Value, AuthError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "GET from auth service");

        let mut value = HeaderValue::from_str(header_value)
            .map_err(|e| AuthError::MalformedToken(format!("token is not a valid header value: {}", e)))?;
        value.set_sensitive(true);

        let response = self
            .http
            .get(&url)
            .header(header_name.clone(), value)
            .header(CONTENT_TYPE, JSON_MEDIA_TYPE)
            .send()
            .await
            .map_err(classify_send_error)?;

        check_response_json(response).await
    }
}

/// Map a reqwest failure onto the transport error kinds.
fn classify_send_error(e: reqwest::Error) -> AuthError {
    if e.is_timeout() {
        AuthError::ServiceTimeout(e.to_string())
    } else {
        AuthError::ServiceUnreachable(e.to_string())
    }
}

/// Check status, then content type, then parse the JSON body.
async fn check_response_json(response: reqwest::Response) -> Result<Value, AuthError> {
    let status = response.status();

    if status != StatusCode::OK {
        let body = response.text().await.map_err(classify_send_error)?;
        tracing::warn!(status = status.as_u16(), "Auth service rejected request");
        return Err(AuthError::RemoteRejected {
            status: status.as_u16(),
            body: RemoteBody::from_text(body),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if !content_type.as_deref().is_some_and(is_json_media_type) {
        return Err(AuthError::UnexpectedContentType(content_type));
    }

    let bytes = response.bytes().await.map_err(classify_send_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::InvalidResponse(format!("JSON parse error: {}", e)))
}

/// True for `application/json`, ignoring parameters and case.
fn is_json_media_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|media| media.trim().eq_ignore_ascii_case(JSON_MEDIA_TYPE))
        .unwrap_or(false)
}
