// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::response::Response;
use cpc_backend::config::Config;
use cpc_backend::db::{Database, FirestoreDb};
use cpc_backend::middleware::auth::SESSION_COOKIE;
use cpc_backend::models::{Identity, Provider};
use cpc_backend::routes::create_router;
use cpc_backend::services::OAuthBroker;
use cpc_backend::AppState;
use serde_json::Value;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Build an app over an explicit store and broker.
#[allow(dead_code)]
pub fn create_app_with(
    config: Config,
    db: Database,
    oauth: OAuthBroker,
) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, db, oauth));
    (create_router(state.clone()), state)
}

/// Create a test app over the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let oauth = OAuthBroker::from_config(&config).expect("broker");
    create_app_with(config, Database::in_memory(), oauth)
}

/// Create a test app whose store fails every operation.
#[allow(dead_code)]
pub fn create_offline_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::default();
    let oauth = OAuthBroker::from_config(&config).expect("broker");
    create_app_with(config, Database::Firestore(FirestoreDb::new_mock()), oauth)
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

/// Identity as a provider would hand it back.
#[allow(dead_code)]
pub fn test_identity(email: Option<&str>) -> Identity {
    Identity {
        provider: Provider::GitHub,
        provider_id: "583231".to_string(),
        name: "Octo Cat".to_string(),
        email: email.map(str::to_string),
        avatar: Some("https://avatars.githubusercontent.com/u/583231?v=4".to_string()),
        username: Some("octocat".to_string()),
        access_token: "gho_test_token".to_string(),
    }
}

/// Establish a session directly in the store and return the Cookie header value.
#[allow(dead_code)]
pub async fn login(state: &AppState, identity: &Identity) -> String {
    let session_id = state
        .sessions
        .create(identity)
        .await
        .expect("create session");
    format!("{}={}", SESSION_COOKIE, session_id)
}

/// JSON POST request.
#[allow(dead_code)]
pub fn post_json(uri: &str, body: &Value) -> axum::http::Request<Body> {
    axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Plain GET request, optionally carrying a session cookie.
#[allow(dead_code)]
pub fn get(uri: &str, cookie: Option<&str>) -> axum::http::Request<Body> {
    let mut builder = axum::http::Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::empty()).unwrap()
}
