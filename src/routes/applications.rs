// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Membership application routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::{require_auth, AuthUser};
use crate::models::{Application, ApplicationSummary};
use crate::services::validation::ApplicationPayload;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    middleware,
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/api/applications/mine", get(get_own_application))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route(
            "/api/applications",
            get(list_applications).post(submit_application),
        )
        .merge(protected)
}

#[derive(Serialize)]
struct SubmitResponse {
    success: bool,
    message: &'static str,
    data: ApplicationSummary,
}

/// Submit a new application.
async fn submit_application(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ApplicationPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>)> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection, "Rejected malformed application body");
        AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let summary = state.submissions.submit(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            message: "Application submitted successfully!",
            data: summary,
        }),
    ))
}

#[derive(Serialize)]
struct ListResponse {
    success: bool,
    count: usize,
    data: Vec<Application>,
}

/// List every application, newest first (diagnostic).
async fn list_applications(State(state): State<Arc<AppState>>) -> Result<Json<ListResponse>> {
    let applications = state.applications.list_all().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to list applications");
        AppError::Failed {
            message: "Error fetching applications",
            detail: None,
        }
    })?;

    Ok(Json(ListResponse {
        success: true,
        count: applications.len(),
        data: applications,
    }))
}

#[derive(Serialize)]
struct OwnApplicationResponse {
    success: bool,
    data: Option<Application>,
}

/// The signed-in user's own application, matched by session email.
async fn get_own_application(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(identity)): Extension<AuthUser>,
) -> Result<Json<OwnApplicationResponse>> {
    let data = match identity.email.as_deref() {
        Some(email) => state.applications.find_by_email(email).await?,
        None => None,
    };

    Ok(Json(OwnApplicationResponse {
        success: true,
        data,
    }))
}
