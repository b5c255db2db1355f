// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication: request context, route guard, cookies, logout.

use crate::config::Config;
use crate::error::AppError;
use crate::models::Identity;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "cpc.sid";

/// Session state of the current request, passed explicitly to handlers.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    session_id: Option<String>,
    identity: Option<Identity>,
}

impl SessionContext {
    pub fn new(session_id: Option<String>, identity: Option<Identity>) -> Self {
        Self {
            session_id,
            identity,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}

impl FromRequestParts<Arc<AppState>> for SessionContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(session_id) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
            return Ok(Self::default());
        };

        // Identity is trusted as stored; no per-request check against the provider.
        // A store outage degrades to anonymous but keeps the id for logout.
        let identity = match state.sessions.load(&session_id).await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::error!(error = %e, "Session lookup failed, treating request as unauthenticated");
                None
            }
        };

        Ok(Self {
            session_id: Some(session_id),
            identity,
        })
    }
}

/// Authenticated identity, inserted by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

/// Middleware that requires a logged-in session.
pub async fn require_auth(
    session: SessionContext,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(identity) = session.identity().cloned() else {
        tracing::debug!(path = %request.uri().path(), "Rejected unauthenticated request");
        return Err(AppError::Unauthorized);
    };

    request.extensions_mut().insert(AuthUser(identity));

    Ok(next.run(request).await)
}

/// End the session: clear the identity, then destroy the record.
///
/// Failure to clear the identity is an error. Failure to destroy the record
/// afterwards is only logged.
pub async fn logout(state: &AppState, session: &SessionContext) -> Result<(), AppError> {
    let Some(session_id) = session.session_id() else {
        return Ok(());
    };

    state.sessions.logout(session_id).await?;

    if let Err(e) = state.sessions.destroy(session_id).await {
        tracing::error!(error = %e, "Session destroy failed during logout");
    }

    Ok(())
}

/// Cookies must cross sites in production (frontend and API on different hosts).
fn cookie_policy(config: &Config) -> (bool, SameSite) {
    if config.environment.is_production() {
        (true, SameSite::None)
    } else {
        (false, SameSite::Lax)
    }
}

/// Cookie carrying a freshly created session id.
pub fn session_cookie(session_id: String, config: &Config) -> Cookie<'static> {
    let (secure, same_site) = cookie_policy(config);

    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(same_site)
        .max_age(time::Duration::hours(config.session_ttl_hours))
        .build()
}

/// Cookie that tells the browser to discard the session id.
pub fn removal_cookie(config: &Config) -> Cookie<'static> {
    let (secure, same_site) = cookie_policy(config);

    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(same_site)
        .max_age(time::Duration::ZERO)
        .build()
}
