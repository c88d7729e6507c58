// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod credentials;
pub mod token;
pub mod user;

pub use credentials::Credentials;
pub use token::{RefreshedToken, TokenPair};
pub use user::{LocalUser, RemoteUserRecord, UserId};
