// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CPC Backend: membership applications and OAuth sessions
//!
//! This crate provides the backend API for the competitive programming club:
//! it accepts membership applications, stores them in a document store, and
//! signs members in through Google or GitHub.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{ApplicationStore, Database};
use services::{OAuthBroker, SessionStore, SubmissionService};
use std::time::Instant;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub applications: ApplicationStore,
    pub submissions: SubmissionService,
    pub oauth: OAuthBroker,
    pub sessions: SessionStore,
    pub started_at: Instant,
}

impl AppState {
    /// Wire services over a connected store.
    pub fn new(config: Config, db: Database, oauth: OAuthBroker) -> Self {
        let applications = ApplicationStore::new(db.clone());
        let submissions =
            SubmissionService::new(applications.clone(), config.expose_error_details());
        let sessions = SessionStore::new(
            db.clone(),
            chrono::Duration::hours(config.session_ttl_hours),
        );

        Self {
            config,
            db,
            applications,
            submissions,
            oauth,
            sessions,
            started_at: Instant::now(),
        }
    }
}
