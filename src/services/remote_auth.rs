// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the remote auth service's four protocol operations.

use crate::config::Config;
use crate::error::AuthError;
use crate::models::{Credentials, RefreshedToken, RemoteUserRecord, TokenPair, UserId};
use crate::services::transport::Transport;
use reqwest::header::HeaderName;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

/// Issue, verify, refresh and fetch-user against the remote service.
#[derive(Clone)]
pub struct RemoteAuthClient {
    transport: Transport,
    auth_header: HeaderName,
    config: Config,
}

impl RemoteAuthClient {
    /// Fails on invalid configuration, never later inside a request.
    pub fn new(config: &Config) -> Result<Self, AuthError> {
        config.validate()?;
        Ok(Self {
            transport: Transport::new(config.base_url.clone(), config.request_timeout)?,
            auth_header: config.auth_header_name()?,
            config: config.clone(),
        })
    }

    /// Exchange credentials for an access/refresh pair.
    pub async fn issue_tokens(&self, credentials: &Credentials) -> Result<TokenPair, AuthError> {
        let mut body = Map::new();
        body.insert(
            self.config.identity_field_name.clone(),
            Value::String(credentials.identity.clone()),
        );
        body.insert(
            "password".to_string(),
            Value::String(credentials.secret.clone()),
        );

        let response = self
            .transport
            .post(&self.config.token_issue_path, &body)
            .await?;
        let tokens: TokenPair = parse_shape(response, "token pair")?;

        tracing::info!(
            identity = %credentials.identity,
            "Tokens issued by auth service"
        );
        Ok(tokens)
    }

    /// Verify a token; the payload shape is defined by the remote service.
    pub async fn verify(&self, token: &str) -> Result<Value, AuthError> {
        self.transport
            .post(&self.config.verify_path, &json!({ "token": token }))
            .await
    }

    /// Obtain a new access token with a refresh token.
    pub async fn refresh(&self, refresh: &str) -> Result<RefreshedToken, AuthError> {
        let response = self
            .transport
            .post(&self.config.refresh_path, &json!({ "refresh": refresh }))
            .await?;
        parse_shape(response, "refresh response")
    }

    /// Fetch the canonical user record using the access token as bearer.
    pub async fn fetch_remote_user(
        &self,
        user_id: &UserId,
        access_token: &str,
    ) -> Result<RemoteUserRecord, AuthError> {
        let path = self.config.user_detail_path(user_id.as_str());
        let auth_value = format!("{} {}", self.config.bearer_scheme, access_token);

        let response = self
            .transport
            .get_with_auth(&path, &self.auth_header, &auth_value)
            .await?;
        RemoteUserRecord::from_json(response)
    }
}

fn parse_shape<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, AuthError> {
    serde_json::from_value(value)
        .map_err(|e| AuthError::InvalidResponse(format!("unexpected {}: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_shape_reports_missing_fields() {
        let err = parse_shape::<TokenPair>(json!({ "access": "a" }), "token pair").unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse(msg) if msg.contains("token pair")));
    }

    #[test]
    fn parse_shape_keeps_extra_refresh_fields() {
        let refreshed: RefreshedToken =
            parse_shape(json!({ "access": "a2", "expires_in": 300 }), "refresh").unwrap();
        assert_eq!(refreshed.access, "a2");
        assert_eq!(refreshed.refresh, None);
        assert_eq!(refreshed.extra.get("expires_in"), Some(&json!(300)));
    }
}
