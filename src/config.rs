// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Resolved once at startup and injected into the client; nothing reads the
//! environment after that.

use reqwest::header::HeaderName;
use std::env;
use std::time::Duration;

/// Placeholder substituted with the user id in the user-detail path.
pub const USER_ID_PLACEHOLDER: &str = "{user_id}";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Remote authentication configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root URL of the remote auth service (paths are appended verbatim)
    pub base_url: String,
    pub token_issue_path: String,
    pub verify_path: String,
    pub refresh_path: String,
    /// Must contain `{user_id}`
    pub user_detail_path_template: String,
    /// Name of the credential field carrying the identity (e.g. `username`)
    pub identity_field_name: String,
    /// Access token claim holding the remote user id
    pub subject_claim_name: String,
    pub bearer_header_name: String,
    pub bearer_scheme: String,
    /// Applied uniformly to every remote call
    pub request_timeout: Duration,
    /// Registered mapping strategy name (`direct` or a delegated serializer)
    pub mapping_strategy: String,
    /// Whether the token endpoint mirrors the user locally
    pub sync_local_user: bool,
    /// Fields the local store treats as unique across users
    pub unique_fields: Vec<String>,
    /// Server port
    pub port: u16,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self::with_base_url("http://127.0.0.1:9")
    }

    /// Default settings against an explicit base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token_issue_path: "/auth/token/".to_string(),
            verify_path: "/auth/token/verify/".to_string(),
            refresh_path: "/auth/token/refresh/".to_string(),
            user_detail_path_template: "/auth/users/{user_id}/".to_string(),
            identity_field_name: "username".to_string(),
            subject_claim_name: "user_id".to_string(),
            bearer_header_name: "Authorization".to_string(),
            bearer_scheme: "Bearer".to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            mapping_strategy: "direct".to_string(),
            sync_local_user: true,
            unique_fields: vec!["username".to_string()],
            port: 8080,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let base_url = env::var("REMOTE_AUTH_SERVICE_URL")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("REMOTE_AUTH_SERVICE_URL"))?;

        let mut config = Self::with_base_url(base_url);

        if let Ok(v) = env::var("REMOTE_AUTH_SERVICE_TOKEN_PATH") {
            config.token_issue_path = v;
        }
        if let Ok(v) = env::var("REMOTE_AUTH_SERVICE_VERIFY_PATH") {
            config.verify_path = v;
        }
        if let Ok(v) = env::var("REMOTE_AUTH_SERVICE_REFRESH_PATH") {
            config.refresh_path = v;
        }
        if let Ok(v) = env::var("REMOTE_AUTH_SERVICE_USER_PATH") {
            config.user_detail_path_template = v;
        }
        if let Ok(v) = env::var("REMOTE_JWT_IDENTITY_FIELD") {
            config.identity_field_name = v;
        }
        if let Ok(v) = env::var("REMOTE_JWT_USER_ID_CLAIM") {
            config.subject_claim_name = v;
        }
        if let Ok(v) = env::var("REMOTE_JWT_AUTH_HEADER_NAME") {
            config.bearer_header_name = v;
        }
        if let Ok(v) = env::var("REMOTE_JWT_AUTH_HEADER_TYPE") {
            config.bearer_scheme = v;
        }
        if let Ok(v) = env::var("REMOTE_JWT_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("REMOTE_JWT_REQUEST_TIMEOUT_SECS", v.clone()))?;
            if secs == 0 {
                return Err(ConfigError::Invalid("REMOTE_JWT_REQUEST_TIMEOUT_SECS", v));
            }
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Ok(v) = env::var("REMOTE_JWT_MAPPING_STRATEGY") {
            config.mapping_strategy = v.trim().to_string();
        }
        if let Ok(v) = env::var("REMOTE_JWT_SYNC_LOCAL_USER") {
            config.sync_local_user = parse_bool(&v)
                .ok_or(ConfigError::Invalid("REMOTE_JWT_SYNC_LOCAL_USER", v))?;
        }
        if let Ok(v) = env::var("REMOTE_JWT_UNIQUE_FIELDS") {
            config.unique_fields = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        config.port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.user_detail_path_template.contains(USER_ID_PLACEHOLDER) {
            return Err(ConfigError::Invalid(
                "REMOTE_AUTH_SERVICE_USER_PATH",
                self.user_detail_path_template.clone(),
            ));
        }
        if self.identity_field_name.is_empty() {
            return Err(ConfigError::Invalid(
                "REMOTE_JWT_IDENTITY_FIELD",
                String::new(),
            ));
        }
        self.auth_header_name()?;
        Ok(())
    }

    /// Parsed name of the header carrying the access token on user fetches.
    pub fn auth_header_name(&self) -> Result<HeaderName, ConfigError> {
        HeaderName::from_bytes(self.bearer_header_name.as_bytes()).map_err(|_| {
            ConfigError::Invalid(
                "REMOTE_JWT_AUTH_HEADER_NAME",
                self.bearer_header_name.clone(),
            )
        })
    }

    /// Render the user-detail path for the given id.
    pub fn user_detail_path(&self, user_id: &str) -> String {
        self.user_detail_path_template
            .replace(USER_ID_PLACEHOLDER, &urlencoding::encode(user_id))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
