// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strategies for reconciling a remote user record into the local store.
//!
//! Strategies are registered by name and resolved once when the
//! synchronizer is built, so an unknown name fails at startup instead of in
//! the middle of a login.

use crate::db::{LocalUserStore, StoreError};
use crate::error::AuthError;
use crate::models::{LocalUser, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

/// Name of the built-in strategy that writes remote fields straight through.
pub const DIRECT: &str = "direct";

/// Name of the built-in profile serializer.
pub const PROFILE: &str = "profile";

/// Extra information handed to delegated serializers.
#[derive(Debug, Clone, Copy)]
pub struct MappingContext<'a> {
    /// Claim the user id was read from
    pub claim_name: &'a str,
    pub user_id: &'a UserId,
    /// Remote fields exactly as received (without `id`)
    pub raw_payload: &'a Map<String, Value>,
}

/// Reconciles `{id, fields}` into a local store.
#[async_trait]
pub trait MappingStrategy: Send + Sync {
    fn name(&self) -> &str;

    async fn reconcile(
        &self,
        store: &dyn LocalUserStore,
        id: &UserId,
        fields: Map<String, Value>,
        ctx: &MappingContext<'_>,
    ) -> Result<(LocalUser, bool), AuthError>;
}

/// Upsert the remote fields unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectUpsert;

#[async_trait]
impl MappingStrategy for DirectUpsert {
    fn name(&self) -> &str {
        DIRECT
    }

    async fn reconcile(
        &self,
        store: &dyn LocalUserStore,
        id: &UserId,
        fields: Map<String, Value>,
        _ctx: &MappingContext<'_>,
    ) -> Result<(LocalUser, bool), AuthError> {
        store.upsert(id, fields).await.map_err(store_error)
    }
}

/// Caller-supplied validation step for [`DelegatedSerializer`].
///
/// Returns the fields to save, or a human-readable rejection.
pub trait UserSerializer: Send + Sync {
    fn validate(
        &self,
        data: Map<String, Value>,
        ctx: &MappingContext<'_>,
    ) -> Result<Map<String, Value>, String>;
}

impl<F> UserSerializer for F
where
    F: Fn(Map<String, Value>, &MappingContext<'_>) -> Result<Map<String, Value>, String>
        + Send
        + Sync,
{
    fn validate(
        &self,
        data: Map<String, Value>,
        ctx: &MappingContext<'_>,
    ) -> Result<Map<String, Value>, String> {
        self(data, ctx)
    }
}

/// Validate through a [`UserSerializer`], then save the validated fields.
#[derive(Clone)]
pub struct DelegatedSerializer {
    name: String,
    serializer: Arc<dyn UserSerializer>,
}

impl DelegatedSerializer {
    pub fn new(name: impl Into<String>, serializer: Arc<dyn UserSerializer>) -> Self {
        Self {
            name: name.into(),
            serializer,
        }
    }
}

#[async_trait]
impl MappingStrategy for DelegatedSerializer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn reconcile(
        &self,
        store: &dyn LocalUserStore,
        id: &UserId,
        fields: Map<String, Value>,
        ctx: &MappingContext<'_>,
    ) -> Result<(LocalUser, bool), AuthError> {
        let validated = self.serializer.validate(fields, ctx).map_err(|reason| {
            AuthError::MappingRejected(format!(
                "serializer '{}' failed to parse the received payload: {}",
                self.name, reason
            ))
        })?;

        store.upsert(id, validated).await.map_err(store_error)
    }
}

/// Profile fields accepted by [`ProfileSerializer`].
#[derive(Debug, Deserialize, Serialize, Validate)]
struct ProfileFields {
    #[validate(length(min = 1, max = 150))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[validate(email)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[validate(length(max = 150))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[validate(length(max = 150))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_active: Option<bool>,
}

/// Keeps only well-formed profile fields and drops everything else.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileSerializer;

impl UserSerializer for ProfileSerializer {
    fn validate(
        &self,
        data: Map<String, Value>,
        _ctx: &MappingContext<'_>,
    ) -> Result<Map<String, Value>, String> {
        let mut profile: ProfileFields =
            serde_json::from_value(Value::Object(data)).map_err(|e| e.to_string())?;

        // Blank email means "not shared", not an invalid address.
        if profile.email.as_deref() == Some("") {
            profile.email = None;
        }

        profile.validate().map_err(|e| e.to_string())?;

        match serde_json::to_value(profile).map_err(|e| e.to_string())? {
            Value::Object(map) => Ok(map),
            other => Err(format!("profile serialized to non-object: {}", other)),
        }
    }
}

fn store_error(e: StoreError) -> AuthError {
    match e {
        StoreError::Conflict { .. } => {
            AuthError::IdentityConflict(format!("{}. Different user models?", e))
        }
        StoreError::Unavailable(msg) => AuthError::Store(msg),
    }
}

/// Named mapping strategies available at startup.
#[derive(Clone)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn MappingStrategy>>,
}

impl Default for StrategyRegistry {
    /// Registry holding `direct` and `profile`.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(DirectUpsert));
        registry.register_serializer(PROFILE, Arc::new(ProfileSerializer));
        registry
    }
}

impl StrategyRegistry {
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Register a strategy under its own name, replacing any previous one.
    pub fn register(&mut self, strategy: Arc<dyn MappingStrategy>) -> &mut Self {
        self.strategies
            .insert(strategy.name().to_string(), strategy);
        self
    }

    /// Register a delegated serializer under `name`.
    pub fn register_serializer(
        &mut self,
        name: impl Into<String>,
        serializer: Arc<dyn UserSerializer>,
    ) -> &mut Self {
        self.register(Arc::new(DelegatedSerializer::new(name, serializer)))
    }

    /// Look up a strategy by configured name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn MappingStrategy>, AuthError> {
        self.strategies.get(name).cloned().ok_or_else(|| {
            let mut known: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
            known.sort_unstable();
            AuthError::MappingUnavailable(format!(
                "no mapping strategy named '{}' (registered: {})",
                name,
                known.join(", ")
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryUserStore;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn ctx<'a>(id: &'a UserId, raw: &'a Map<String, Value>) -> MappingContext<'a> {
        MappingContext {
            claim_name: "user_id",
            user_id: id,
            raw_payload: raw,
        }
    }

    #[test]
    fn registry_resolves_builtins() {
        let registry = StrategyRegistry::default();
        assert_eq!(registry.resolve(DIRECT).unwrap().name(), DIRECT);
        assert_eq!(registry.resolve(PROFILE).unwrap().name(), PROFILE);
    }

    #[test]
    fn registry_unknown_name_is_unavailable() {
        let registry = StrategyRegistry::default();
        let err = registry.resolve("custom.UserSerializer").err().unwrap();
        assert!(matches!(err, AuthError::MappingUnavailable(msg) if msg.contains("direct, profile")));
    }

    #[test]
    fn profile_serializer_filters_unknown_fields() {
        let id = UserId::new("1");
        let raw = fields(json!({ "username": "alice", "email": "a@x.com", "is_staff": true }));
        let out = ProfileSerializer
            .validate(raw.clone(), &ctx(&id, &raw))
            .unwrap();
        assert_eq!(out.get("username"), Some(&json!("alice")));
        assert_eq!(out.get("email"), Some(&json!("a@x.com")));
        assert!(!out.contains_key("is_staff"));
    }

    #[test]
    fn profile_serializer_rejects_bad_email() {
        let id = UserId::new("1");
        let raw = fields(json!({ "username": "alice", "email": "not-an-email" }));
        assert!(ProfileSerializer.validate(raw.clone(), &ctx(&id, &raw)).is_err());

        let raw = fields(json!({ "username": 12 }));
        assert!(ProfileSerializer.validate(raw.clone(), &ctx(&id, &raw)).is_err());
    }

    #[test]
    fn profile_serializer_treats_blank_email_as_absent() {
        let id = UserId::new("1");
        let raw = fields(json!({ "username": "alice", "email": "" }));
        let out = ProfileSerializer.validate(raw.clone(), &ctx(&id, &raw)).unwrap();
        assert!(!out.contains_key("email"));
    }

    #[tokio::test]
    async fn delegated_rejection_leaves_store_untouched() {
        let store = InMemoryUserStore::default();
        fn reject(
            _: Map<String, Value>,
            _: &MappingContext<'_>,
        ) -> Result<Map<String, Value>, String> {
            Err("nope".to_string())
        }

        let strategy = DelegatedSerializer::new("strict", Arc::new(reject));
        let id = UserId::new("9");
        let raw = fields(json!({ "email": "a@x.com" }));

        let err = strategy
            .reconcile(&store, &id, raw.clone(), &ctx(&id, &raw))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MappingRejected(msg) if msg.contains("nope")));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn direct_conflict_is_identity_conflict() {
        let store = InMemoryUserStore::new(vec!["username".to_string()]);
        let raw = fields(json!({ "username": "alice" }));

        let first = UserId::new("1");
        DirectUpsert
            .reconcile(&store, &first, raw.clone(), &ctx(&first, &raw))
            .await
            .unwrap();

        let second = UserId::new("2");
        let err = DirectUpsert
            .reconcile(&store, &second, raw.clone(), &ctx(&second, &raw))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::IdentityConflict(_)));
    }
}
