// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote-JWT: delegate authentication to a remote token service
//!
//! Credentials are exchanged with the remote service for an access/refresh
//! pair; the user named by the access token is fetched from the same service
//! and mirrored into a local user store.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::UserSynchronizer;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub synchronizer: UserSynchronizer,
}
