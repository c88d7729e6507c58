// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote-JWT API Server
//!
//! Serves token endpoints that authenticate against a remote auth service
//! and mirror users into the local store.

use remote_jwt::{
    config::Config,
    db::InMemoryUserStore,
    services::{StrategyRegistry, UserSynchronizer},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        base_url = %config.base_url,
        "Starting Remote-JWT API"
    );

    let store = Arc::new(InMemoryUserStore::new(config.unique_fields.clone()));
    let registry = StrategyRegistry::default();

    // Unknown mapping strategy names fail here, before serving
    let synchronizer = UserSynchronizer::new(&config, store, &registry)?;

    let state = Arc::new(AppState {
        config: config.clone(),
        synchronizer,
    });

    let app = remote_jwt::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("remote_jwt=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
