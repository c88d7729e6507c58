// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Unverified decoding of access tokens.
//!
//! The remote service already verified the token it issued; this module only
//! reads the claims back out. The signature segment is carried along verbatim
//! and is never checked, so decoded claims are informational only.

use crate::error::AuthError;
use crate::models::UserId;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Value};

/// Header, payload and raw signature of a three-segment token.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClaims {
    pub header: Map<String, Value>,
    pub payload: Map<String, Value>,
    pub signature: String,
}

impl DecodedClaims {
    /// Read the remote user id out of the named payload claim.
    pub fn subject(&self, claim_name: &str) -> Result<UserId, AuthError> {
        self.payload
            .get(claim_name)
            .and_then(UserId::from_json)
            .ok_or_else(|| AuthError::ClaimMissing(claim_name.to_string()))
    }
}

/// Split a token into its segments and decode header and payload.
pub fn decode(token: &str) -> Result<DecodedClaims, AuthError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, signature] = segments.as_slice() else {
        return Err(AuthError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    Ok(DecodedClaims {
        header: decode_segment(header, "header")?,
        payload: decode_segment(payload, "payload")?,
        signature: signature.to_string(),
    })
}

fn decode_segment(segment: &str, which: &str) -> Result<Map<String, Value>, AuthError> {
    let padded = restore_padding(segment)
        .ok_or_else(|| AuthError::MalformedToken(format!("{} has an invalid length", which)))?;

    let bytes = STANDARD
        .decode(padded)
        .map_err(|e| AuthError::MalformedToken(format!("{} is not base64: {}", which, e)))?;

    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AuthError::MalformedToken(format!(
            "{} is not a JSON object",
            which
        ))),
        Err(e) => Err(AuthError::MalformedToken(format!(
            "{} is not JSON: {}",
            which, e
        ))),
    }
}

/// Map the URL-safe alphabet onto the standard one and pad to a multiple of 4.
///
/// Existing padding is stripped first so only the needed `=` are appended.
/// Returns `None` when no amount of padding can make the length valid.
fn restore_padding(segment: &str) -> Option<String> {
    let trimmed = segment.trim_end_matches('=');
    let missing = match trimmed.len() % 4 {
        0 => 0,
        1 => return None,
        rem => 4 - rem,
    };

    let mut out: String = trimmed
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    out.extend(std::iter::repeat('=').take(missing));
    Some(out)
}
