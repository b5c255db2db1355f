// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth authentication and session routes.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{self, SessionContext};
use crate::models::{IdentityView, Provider};
use crate::services::oauth::{CallbackParams, ProviderError};
use crate::time_utils::now_rfc3339;
use crate::AppState;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", get(logout))
        .route("/api/auth/check", get(check))
        .route("/api/auth/providers", get(providers))
        .route("/api/auth/{provider}", get(auth_start))
        .route("/api/auth/{provider}/callback", get(auth_callback))
}

fn parse_provider(raw: &str) -> Result<Provider> {
    raw.parse()
        .map_err(|()| AppError::NotFound(format!("Unknown authentication provider: {}", raw)))
}

/// Plain `302 Found` browser redirect.
fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Send the browser to the join page with a failure signal.
fn failure_redirect(state: &AppState, error: &str, provider: Provider) -> Response {
    found(format!(
        "{}/join?error={}&provider={}",
        state.config.frontend_url, error, provider
    ))
}

/// Start OAuth flow - redirect to the provider's consent page.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> Result<Response> {
    let provider = parse_provider(&provider)?;

    match state.oauth.begin_auth(provider) {
        Ok(url) => Ok(found(url)),
        Err(ProviderError::NotConfigured(p)) => {
            tracing::warn!(provider = %p, "Login attempted with disabled provider");
            Err(AppError::ProviderUnavailable(p.to_string()))
        }
        Err(e) => Err(AppError::Internal(anyhow::anyhow!(e))),
    }
}

/// OAuth callback - establish the session and send the browser back to the frontend.
///
/// Never answers with JSON: every outcome is a redirect.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    query: std::result::Result<Query<CallbackParams>, QueryRejection>,
    jar: CookieJar,
) -> Result<Response> {
    let provider = parse_provider(&provider)?;

    let Query(params) = match query {
        Ok(query) => query,
        Err(rejection) => {
            tracing::warn!(provider = %provider, error = %rejection, "Malformed OAuth callback query");
            return Ok(failure_redirect(&state, "auth_failed", provider));
        }
    };

    let identity = match state.oauth.complete_auth(provider, params).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(provider = %provider, error = %e, "OAuth login failed");
            return Ok(failure_redirect(&state, "auth_failed", provider));
        }
    };

    let session_id = match state.sessions.create(&identity).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(provider = %provider, error = %e, "Failed to establish session");
            return Ok(failure_redirect(&state, "callback_failed", provider));
        }
    };

    tracing::info!(provider = %provider, provider_id = %identity.provider_id, "User authenticated");

    let jar = jar.add(auth::session_cookie(session_id, &state.config));
    let home = format!("{}/", state.config.frontend_url);

    Ok((jar, found(home)).into_response())
}

/// Get current user info.
async fn me(State(state): State<Arc<AppState>>, session: SessionContext) -> Response {
    let Some(identity) = session.identity() else {
        return Json(json!({
            "success": false,
            "message": "No active session",
            "data": { "isAuthenticated": false },
        }))
        .into_response();
    };

    let has_application = match identity.email.as_deref() {
        Some(email) => state
            .applications
            .find_by_email(email)
            .await
            .map(|app| app.is_some())
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Application lookup failed for /me");
                false
            }),
        None => false,
    };

    Json(json!({
        "success": true,
        "message": "User is authenticated",
        "data": IdentityView::new(identity, has_application),
    }))
    .into_response()
}

/// Logout - destroy the server-side session and clear the cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>)> {
    let name = session
        .identity()
        .map(|i| i.name.clone())
        .unwrap_or_else(|| "User".to_string());

    auth::logout(&state, &session).await.map_err(|e| {
        tracing::error!(error = %e, "Logout error");
        AppError::Failed {
            message: "Error during logout",
            detail: None,
        }
    })?;

    tracing::info!(user = %name, "User logged out");

    let jar = jar.add(auth::removal_cookie(&state.config));
    Ok((
        jar,
        Json(json!({
            "success": true,
            "message": "Successfully logged out",
        })),
    ))
}

/// Lightweight authentication probe.
async fn check(session: SessionContext) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "data": {
            "isAuthenticated": session.is_authenticated(),
            "timestamp": now_rfc3339(),
        },
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub name: String,
    pub display_name: String,
    pub url: String,
    pub icon: String,
}

/// List the providers enabled at startup.
async fn providers(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let data: Vec<ProviderInfo> = state
        .oauth
        .providers()
        .map(|p| ProviderInfo {
            name: p.as_str().to_string(),
            display_name: p.display_name().to_string(),
            url: format!("/api/auth/{}", p),
            icon: p.as_str().to_string(),
        })
        .collect();

    Json(json!({ "success": true, "data": data }))
}
