// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod applications;
pub mod auth;

use crate::db::StoreStatus;
use crate::error::AppError;
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, Method, Uri};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Request bodies above this are rejected before reaching a handler.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Dev frontends that may always call the API.
const DEV_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub port: u16,
    pub uptime_seconds: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub success: bool,
    pub message: &'static str,
    pub timestamp: String,
    pub environment: &'static str,
    pub version: &'static str,
    pub database: StoreStatus,
    pub server: ServerInfo,
}

/// Health check response
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "CPC Backend is running",
        timestamp: now_rfc3339(),
        environment: state.config.environment.as_str(),
        version: env!("CARGO_PKG_VERSION"),
        database: state.db.status().await,
        server: ServerInfo {
            port: state.config.port,
            uptime_seconds: state.started_at.elapsed().as_secs(),
        },
    })
}

/// Smoke-test endpoint for frontend wiring.
async fn api_test() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "message": "API is working!",
        "timestamp": now_rfc3339(),
    }))
}

/// JSON 404 for unknown routes.
async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("Cannot {} {}", method, uri.path()))
}

/// Origins allowed to make credentialed requests.
fn allowed_origins(state: &AppState) -> Vec<String> {
    let mut origins = vec![state.config.frontend_url.clone()];
    origins.extend(state.config.cors_origins.iter().cloned());
    origins.extend(DEV_ORIGINS.iter().map(|o| o.to_string()));
    origins.sort();
    origins.dedup();
    origins
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let origins = allowed_origins(&state);
    tracing::debug!(?origins, "CORS origins configured");

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origins.iter().any(|o| o == origin_str)
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/test", get(api_test))
        .merge(applications::routes(state.clone()))
        .merge(auth::routes())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
