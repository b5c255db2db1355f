// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CPC Backend API Server
//!
//! Accepts membership applications for the club and signs members in
//! through Google or GitHub.

use cpc_backend::{config::Config, db::Database, services::OAuthBroker, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        environment = config.environment.as_str(),
        "Starting CPC Backend"
    );

    let db = Database::connect(&config)
        .await
        .expect("Failed to connect to document store");
    tracing::info!(backend = db.backend_name(), "Document store ready");

    let oauth = OAuthBroker::from_config(&config).expect("Failed to initialize OAuth broker");
    let enabled: Vec<_> = oauth.providers().map(|p| p.as_str()).collect();
    tracing::info!(providers = ?enabled, "OAuth providers initialized");

    let port = config.port;
    let state = Arc::new(AppState::new(config, db, oauth));

    // Build router
    let app = cpc_backend::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
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

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cpc_backend=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
