// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local user storage.

pub mod memory;

pub use memory::InMemoryUserStore;

use crate::models::{LocalUser, UserId};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Local persistence boundary for mirrored users.
///
/// Implementations must be safe under concurrent upserts keyed by id.
#[async_trait]
pub trait LocalUserStore: Send + Sync {
    /// Create or update the user with `id`, replacing the given fields.
    ///
    /// Returns the stored record and whether it was newly created.
    ///
    /// ## Errors
    ///
    /// Returns `StoreError::Conflict` if the fields violate a uniqueness
    /// constraint held by another user.
    async fn upsert(
        &self,
        id: &UserId,
        fields: Map<String, Value>,
    ) -> Result<(LocalUser, bool), StoreError>;

    /// Get a user by id.
    async fn get(&self, id: &UserId) -> Result<Option<LocalUser>, StoreError>;
}

/// Errors from the local store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique constraint violation.
    #[error("{field} '{value}' already belongs to user {owner}")]
    Conflict {
        field: String,
        value: String,
        owner: UserId,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
