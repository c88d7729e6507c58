//! Remote and local user records.

use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Reconciliation key shared by the remote and local records.
///
/// Remote services send ids as strings or integers; both normalize to their
/// text form so a `"42"` claim and an `42` record id address the same user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Normalize a JSON scalar into an id. Returns `None` for null, booleans,
    /// arrays, objects and empty strings.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User record returned by the remote user-detail endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteUserRecord {
    pub id: UserId,
    /// Every field except `id`; opaque to the core.
    pub fields: Map<String, Value>,
}

impl RemoteUserRecord {
    /// Pop `id` out of the remote JSON; it becomes the reconciliation key.
    pub fn from_json(value: Value) -> Result<Self, AuthError> {
        let Value::Object(mut fields) = value else {
            return Err(AuthError::InvalidResponse(
                "user detail is not a JSON object".to_string(),
            ));
        };

        let raw_id = fields
            .remove("id")
            .ok_or_else(|| AuthError::InvalidResponse("user detail has no id".to_string()))?;

        let id = UserId::from_json(&raw_id).ok_or_else(|| {
            AuthError::InvalidResponse(format!("user detail has unusable id: {}", raw_id))
        })?;

        Ok(Self { id, fields })
    }
}

/// User mirrored into the local store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalUser {
    pub id: UserId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// When the user was first mirrored (RFC 3339)
    pub created_at: String,
    /// Last reconciliation (RFC 3339)
    pub updated_at: String,
}

impl LocalUser {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}
