// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process user store.

use super::{LocalUserStore, StoreError};
use crate::models::{LocalUser, UserId};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// User store held in memory, with unique-field enforcement across users.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, LocalUser>>,
    unique_fields: Vec<String>,
}

impl InMemoryUserStore {
    /// Create a store enforcing uniqueness of the given fields.
    pub fn new(unique_fields: Vec<String>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            unique_fields,
        }
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    fn find_conflict(
        &self,
        users: &HashMap<UserId, LocalUser>,
        id: &UserId,
        fields: &Map<String, Value>,
    ) -> Option<StoreError> {
        for field in &self.unique_fields {
            let Some(value) = fields.get(field).filter(|v| !is_blank(v)) else {
                continue;
            };

            let owner = users
                .values()
                .find(|u| &u.id != id && u.fields.get(field) == Some(value));

            if let Some(owner) = owner {
                return Some(StoreError::Conflict {
                    field: field.clone(),
                    value: match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    },
                    owner: owner.id.clone(),
                });
            }
        }
        None
    }
}

/// Null and empty-string values are never considered taken.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[async_trait]
impl LocalUserStore for InMemoryUserStore {
    async fn upsert(
        &self,
        id: &UserId,
        fields: Map<String, Value>,
    ) -> Result<(LocalUser, bool), StoreError> {
        // Write lock held across the check so uniqueness cannot race.
        let mut users = self.users.write().await;

        if let Some(conflict) = self.find_conflict(&users, id, &fields) {
            return Err(conflict);
        }

        let now = chrono::Utc::now().to_rfc3339();
        match users.get_mut(id) {
            Some(existing) => {
                existing.fields.extend(fields);
                existing.updated_at = now;
                Ok((existing.clone(), false))
            }
            None => {
                let user = LocalUser {
                    id: id.clone(),
                    fields,
                    created_at: now.clone(),
                    updated_at: now,
                };
                users.insert(id.clone(), user.clone());
                Ok((user, true))
            }
        }
    }

    async fn get(&self, id: &UserId) -> Result<Option<LocalUser>, StoreError> {
        Ok(self.users.read().await.get(id).cloned())
    }
}
