// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token routes backed by the remote auth service.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::{AuthError, Result};
use crate::models::{Credentials, RefreshedToken, TokenPair};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/token", post(obtain_token))
        .route("/auth/token/verify", post(verify_token))
        .route("/auth/token/refresh", post(refresh_token))
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    token: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    refresh: String,
}

/// Exchange credentials for tokens, mirroring the user locally if configured.
async fn obtain_token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<TokenPair>> {
    let credentials = credentials_from_body(&body, &state.config.identity_field_name)?;

    let tokens = state
        .synchronizer
        .authenticate(&credentials, state.config.sync_local_user)
        .await?;

    Ok(Json(tokens))
}

async fn verify_token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<Value>> {
    Ok(Json(state.synchronizer.verify(&body.token).await?))
}

async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<RefreshedToken>> {
    Ok(Json(state.synchronizer.refresh(&body.refresh).await?))
}

/// Pull `{<identity_field>, password}` out of a login body.
fn credentials_from_body(body: &Map<String, Value>, identity_field: &str) -> Result<Credentials> {
    let field = |name: &str| -> Result<String> {
        match body.get(name) {
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            _ => Err(AuthError::BadRequest(format!("'{}' is required", name))),
        }
    };

    Ok(Credentials::new(field(identity_field)?, field("password")?))
}
