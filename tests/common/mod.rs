// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fake remote auth service for integration tests.
//!
//! Serves the four protocol endpoints on an ephemeral localhost port and
//! mints real HS256 access tokens so the client decodes genuine JWTs.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use remote_jwt::config::Config;
use remote_jwt::db::InMemoryUserStore;
use remote_jwt::services::{StrategyRegistry, UserSynchronizer};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const SIGNING_KEY: &[u8] = b"fake_auth_service_signing_key!!!";

/// How the fake service misbehaves, if at all.
#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub enum Mode {
    #[default]
    Normal,
    /// Token endpoint sleeps before answering
    SlowTokens(Duration),
    /// Token endpoint answers 200 with JSON text labelled `text/html`
    HtmlTokens,
    /// Token endpoint returns this string as the access token
    AccessOverride(String),
    /// User-detail endpoint answers with this status and a JSON body
    UserStatus(u16),
    /// User-detail endpoint answers 404 with an HTML page
    UserHtml404,
}

/// A remote account: credentials plus the user-detail record.
#[derive(Clone)]
pub struct Account {
    pub password: String,
    pub record: Value,
}

#[derive(Default)]
pub struct FakeState {
    pub accounts: Mutex<HashMap<String, Account>>,
    pub mode: Mutex<Mode>,
    /// Headers of the most recent user-detail request
    pub user_request_headers: Mutex<Option<HeaderMap>>,
    /// Body of the most recent token request
    pub token_request_body: Mutex<Option<Value>>,
    pub token_requests: Mutex<u32>,
}

#[allow(dead_code)]
impl FakeState {
    pub fn add_account(&self, identity: &str, password: &str, record: Value) {
        self.accounts.lock().unwrap().insert(
            identity.to_string(),
            Account {
                password: password.to_string(),
                record,
            },
        );
    }

    pub fn set_mode(&self, mode: Mode) {
        *self.mode.lock().unwrap() = mode;
    }

    fn mode(&self) -> Mode {
        self.mode.lock().unwrap().clone()
    }
}

/// Running fake service.
pub struct FakeAuthService {
    pub base_url: String,
    pub state: Arc<FakeState>,
}

/// Start a fake service with `alice` (id 42) registered.
#[allow(dead_code)]
pub async fn start_fake_service() -> FakeAuthService {
    let state = Arc::new(FakeState::default());
    state.add_account(
        "alice",
        "wonderland",
        json!({ "id": 42, "username": "alice", "email": "a@x.com" }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake auth service");
    let addr = listener.local_addr().unwrap();

    let app = fake_router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeAuthService {
        base_url: format!("http://{}", addr),
        state,
    }
}

/// Synchronizer and store wired to the fake service.
#[allow(dead_code)]
pub fn test_synchronizer(config: &Config) -> (UserSynchronizer, Arc<InMemoryUserStore>) {
    let store = Arc::new(InMemoryUserStore::new(config.unique_fields.clone()));
    let synchronizer =
        UserSynchronizer::new(config, store.clone(), &StrategyRegistry::default())
            .expect("Failed to build synchronizer");
    (synchronizer, store)
}

/// Mint an access token carrying both `sub` (string) and `user_id` (number).
pub fn mint_access_token(user_id: &Value) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();

    let sub = match user_id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &json!({
            "token_type": "access",
            "sub": sub,
            "user_id": user_id,
            "iat": now,
            "exp": now + 300,
        }),
        &EncodingKey::from_secret(SIGNING_KEY),
    )
    .expect("Failed to mint access token")
}

fn fake_router(state: Arc<FakeState>) -> Router {
    Router::new()
        .route("/auth/token/", post(issue))
        .route("/auth/token/verify/", post(verify))
        .route("/auth/token/refresh/", post(refresh))
        .route("/auth/users/{id}/", get(user_detail))
        .with_state(state)
}

fn unauthorized(detail: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": detail, "code": "token_not_valid" })),
    )
        .into_response()
}

async fn issue(State(state): State<Arc<FakeState>>, Json(body): Json<Map<String, Value>>) -> Response {
    *state.token_requests.lock().unwrap() += 1;
    *state.token_request_body.lock().unwrap() = Some(Value::Object(body.clone()));

    let mode = state.mode();
    if let Mode::SlowTokens(delay) = mode {
        tokio::time::sleep(delay).await;
    }

    // Identity may arrive under any configured field name.
    let password = body.get("password").and_then(Value::as_str).unwrap_or("");
    let account = {
        let accounts = state.accounts.lock().unwrap();
        body.iter()
            .filter(|(k, _)| k.as_str() != "password")
            .filter_map(|(_, v)| v.as_str())
            .find_map(|identity| accounts.get(identity).cloned())
    };

    let Some(account) = account.filter(|a| a.password == password) else {
        return unauthorized("No active account found with the given credentials");
    };

    let access = match mode {
        Mode::AccessOverride(access) => access,
        _ => mint_access_token(&account.record["id"]),
    };
    let tokens = json!({ "access": access, "refresh": format!("refresh-{}", account.record["id"]) });

    if let Mode::HtmlTokens = state.mode() {
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html")],
            tokens.to_string(),
        )
            .into_response();
    }

    Json(tokens).into_response()
}

async fn verify(Json(body): Json<Value>) -> Response {
    let token = body["token"].as_str().unwrap_or_default();
    match decode::<Value>(
        token,
        &DecodingKey::from_secret(SIGNING_KEY),
        &Validation::new(Algorithm::HS256),
    ) {
        Ok(_) => Json(json!({})).into_response(),
        Err(_) => unauthorized("Token is invalid or expired"),
    }
}

async fn refresh(Json(body): Json<Value>) -> Response {
    let refresh = body["refresh"].as_str().unwrap_or_default();
    match refresh.strip_prefix("refresh-") {
        Some(id) => {
            let id: Value = serde_json::from_str(id).unwrap_or(Value::String(id.to_string()));
            Json(json!({ "access": mint_access_token(&id) })).into_response()
        }
        None => unauthorized("Token is invalid or expired"),
    }
}

async fn user_detail(
    State(state): State<Arc<FakeState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    *state.user_request_headers.lock().unwrap() = Some(headers);

    match state.mode() {
        Mode::UserStatus(status) => {
            let status = StatusCode::from_u16(status).unwrap();
            return (status, Json(json!({ "detail": "Not found." }))).into_response();
        }
        Mode::UserHtml404 => {
            return (
                StatusCode::NOT_FOUND,
                [(header::CONTENT_TYPE, "text/html")],
                "<html><body>Not Found</body></html>",
            )
                .into_response();
        }
        _ => {}
    }

    let record = state
        .accounts
        .lock()
        .unwrap()
        .values()
        .map(|a| a.record.clone())
        .find(|r| match &r["id"] {
            Value::String(s) => s == &id,
            other => other.to_string() == id,
        });

    match record {
        Some(record) => Json(record).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response(),
    }
}
