// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication against the remote service with local user mirroring.
//!
//! `authenticate` runs issue → decode → fetch user → reconcile strictly in
//! order. When synchronization is requested the call is all-or-nothing: tokens
//! are only returned once the user exists locally.

use crate::config::Config;
use crate::db::LocalUserStore;
use crate::error::AuthError;
use crate::models::{Credentials, LocalUser, RefreshedToken, TokenPair};
use crate::services::mapping::{MappingContext, MappingStrategy, StrategyRegistry};
use crate::services::remote_auth::RemoteAuthClient;
use crate::services::token_codec;
use serde_json::Value;
use std::sync::Arc;

/// Local record produced by a reconciliation.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub user: LocalUser,
    pub created: bool,
}

/// Remote authentication plus reconciliation into a [`LocalUserStore`].
#[derive(Clone)]
pub struct UserSynchronizer {
    client: RemoteAuthClient,
    store: Arc<dyn LocalUserStore>,
    strategy: Arc<dyn MappingStrategy>,
    subject_claim_name: String,
}

impl UserSynchronizer {
    /// Build from configuration, resolving the mapping strategy up front.
    pub fn new(
        config: &Config,
        store: Arc<dyn LocalUserStore>,
        registry: &StrategyRegistry,
    ) -> Result<Self, AuthError> {
        let strategy = registry.resolve(&config.mapping_strategy)?;
        let client = RemoteAuthClient::new(config)?;

        tracing::info!(
            base_url = %config.base_url,
            strategy = strategy.name(),
            "User synchronizer initialized"
        );

        Ok(Self {
            client,
            store,
            strategy,
            subject_claim_name: config.subject_claim_name.clone(),
        })
    }

    pub fn client(&self) -> &RemoteAuthClient {
        &self.client
    }

    pub fn store(&self) -> &Arc<dyn LocalUserStore> {
        &self.store
    }

    /// Obtain tokens for `credentials`, optionally mirroring the user locally.
    pub async fn authenticate(
        &self,
        credentials: &Credentials,
        sync_local_user: bool,
    ) -> Result<TokenPair, AuthError> {
        let tokens = self.client.issue_tokens(credentials).await?;

        if !sync_local_user {
            return Ok(tokens);
        }

        self.sync_user(&tokens).await.inspect_err(|e| {
            tracing::warn!(
                identity = %credentials.identity,
                error = %e,
                "Local user synchronization failed, withholding tokens"
            );
        })?;

        Ok(tokens)
    }

    /// Reconcile the user identified by an already-issued token pair.
    pub async fn sync_user(&self, tokens: &TokenPair) -> Result<SyncOutcome, AuthError> {
        let claims = token_codec::decode(&tokens.access)?;
        let user_id = claims.subject(&self.subject_claim_name)?;

        let record = self
            .client
            .fetch_remote_user(&user_id, &tokens.access)
            .await?;

        let raw_payload = record.fields.clone();
        let ctx = MappingContext {
            claim_name: &self.subject_claim_name,
            user_id: &record.id,
            raw_payload: &raw_payload,
        };

        let (user, created) = self
            .strategy
            .reconcile(self.store.as_ref(), &record.id, record.fields, &ctx)
            .await?;

        tracing::info!(
            user_id = %user.id,
            created,
            strategy = self.strategy.name(),
            "Local user reconciled"
        );

        Ok(SyncOutcome { user, created })
    }

    /// Verify a token with the remote service.
    pub async fn verify(&self, token: &str) -> Result<Value, AuthError> {
        self.client.verify(token).await
    }

    /// Refresh an access token with the remote service.
    pub async fn refresh(&self, refresh: &str) -> Result<RefreshedToken, AuthError> {
        self.client.refresh(refresh).await
    }
}
