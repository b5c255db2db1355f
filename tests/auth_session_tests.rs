// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication tests.
//!
//! These tests verify that:
//! 1. /me and /check report the session state
//! 2. Guarded routes reject requests without a session
//! 3. Logout clears the session and the cookie
//! 4. Only configured providers are advertised or startable

use axum::http::{header, StatusCode};
use cpc_backend::config::Config;
use cpc_backend::db::{Database, MemoryDb};
use cpc_backend::middleware::auth::SESSION_COOKIE;
use cpc_backend::services::OAuthBroker;
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{
    body_json, create_app_with, create_offline_app, create_test_app, create_test_app_with_config,
    get, login, post_json, test_identity,
};

#[tokio::test]
async fn test_me_without_session() {
    let (app, _) = create_test_app();

    let response = app.oneshot(get("/api/auth/me", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "No active session");
    assert_eq!(body["data"]["isAuthenticated"], false);
}

#[tokio::test]
async fn test_me_with_unknown_cookie() {
    let (app, _) = create_test_app();

    let cookie = format!("{}=deadbeef", SESSION_COOKIE);
    let response = app
        .oneshot(get("/api/auth/me", Some(&cookie)))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["data"]["isAuthenticated"], false);
}

#[tokio::test]
async fn test_me_with_session() {
    let (app, state) = create_test_app();
    let cookie = login(&state, &test_identity(Some("octo@example.com"))).await;

    let response = app
        .clone()
        .oneshot(get("/api/auth/me", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "User is authenticated");
    assert_eq!(body["data"]["isAuthenticated"], true);
    assert_eq!(body["data"]["provider"], "github");
    assert_eq!(body["data"]["name"], "Octo Cat");
    assert_eq!(body["data"]["username"], "octocat");
    assert_eq!(body["data"]["hasApplication"], false);
    // Provider credential stays server-side
    assert!(body["data"].get("accessToken").is_none());

    let submit = app
        .clone()
        .oneshot(post_json(
            "/api/applications",
            &json!({
                "name": "Octo Cat",
                "email": "Octo@Example.com",
                "level": "beginner",
                "goals": "Learn to solve contest problems",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(submit.status(), StatusCode::CREATED);

    let response = app
        .oneshot(get("/api/auth/me", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["hasApplication"], true);
}

#[tokio::test]
async fn test_check_reports_session_state() {
    let (app, state) = create_test_app();

    let response = app
        .clone()
        .oneshot(get("/api/auth/check", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["isAuthenticated"], false);
    assert!(body["data"]["timestamp"].is_string());

    let cookie = login(&state, &test_identity(None)).await;
    let response = app
        .oneshot(get("/api/auth/check", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["isAuthenticated"], true);
}

#[tokio::test]
async fn test_guarded_route_requires_session() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(get("/api/applications/mine", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Authentication required. Please login first.");
}

#[tokio::test]
async fn test_guarded_route_with_session() {
    let (app, state) = create_test_app();
    let cookie = login(&state, &test_identity(Some("nobody@example.com"))).await;

    let response = app
        .oneshot(get("/api/applications/mine", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_logout_clears_session() {
    let (app, state) = create_test_app();
    let cookie = login(&state, &test_identity(Some("octo@example.com"))).await;

    let response = app
        .clone()
        .oneshot(get("/api/auth/logout", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("removal cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
    assert!(set_cookie.contains("Max-Age=0"));

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Successfully logged out");

    // The old cookie no longer authenticates
    let response = app
        .oneshot(get("/api/applications/mine", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_without_session() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(get("/api/auth/logout", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_some());
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_providers_lists_configured() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(get("/api/auth/providers", None))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(
        body["data"],
        json!([
            { "name": "google", "displayName": "Google", "url": "/api/auth/google", "icon": "google" },
            { "name": "github", "displayName": "GitHub", "url": "/api/auth/github", "icon": "github" },
        ])
    );
}

#[tokio::test]
async fn test_disabled_provider() {
    let config = Config {
        github: None,
        ..Config::default()
    };
    let (app, _) = create_test_app_with_config(config);

    let response = app
        .clone()
        .oneshot(get("/api/auth/providers", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["google"]);

    let response = app
        .clone()
        .oneshot(get("/api/auth/github", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Authentication provider github is not configured");
    assert_eq!(body["error"], "Provider not available");

    let response = app
        .oneshot(get("/api/auth/twitter", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Endpoint not found");
}

#[tokio::test]
async fn test_begin_auth_redirects_to_provider() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(get("/api/auth/google", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(location.contains("state="));
    assert!(location.contains("response_type=code"));
}

#[tokio::test]
async fn test_session_store_down_is_unauthenticated() {
    let (app, _) = create_offline_app();
    let cookie = format!("{}=abc", SESSION_COOKIE);

    let response = app
        .clone()
        .oneshot(get("/api/auth/check", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["isAuthenticated"], false);

    let response = app
        .clone()
        .oneshot(get("/api/auth/me", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["isAuthenticated"], false);

    let response = app
        .oneshot(get("/api/applications/mine", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_fails_when_session_cannot_be_cleared() {
    let (app, _) = create_offline_app();
    let cookie = format!("{}=abc", SESSION_COOKIE);

    let response = app
        .oneshot(get("/api/auth/logout", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Error during logout");
}

#[tokio::test]
async fn test_logout_succeeds_when_destroy_fails() {
    let memory = MemoryDb::default();
    let config = Config::default();
    let oauth = OAuthBroker::from_config(&config).unwrap();
    let (app, state) = create_app_with(config, Database::Memory(memory.clone()), oauth);
    let cookie = login(&state, &test_identity(Some("octo@example.com"))).await;

    memory.set_fail_session_deletes(true);

    let response = app
        .clone()
        .oneshot(get("/api/auth/logout", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_some());
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Successfully logged out");

    // The record survives but no longer carries an identity
    let response = app
        .oneshot(get("/api/applications/mine", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
