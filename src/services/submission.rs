// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application submission pipeline: validate → sanitize → persist → respond.

use crate::db::ApplicationStore;
use crate::error::AppError;
use crate::models::{ApplicationSummary, NewApplication};
use crate::services::validation::{self, ApplicationPayload};

const SUBMIT_FAILED: &str = "Failed to submit application. Please try again.";

#[derive(Clone)]
pub struct SubmissionService {
    store: ApplicationStore,
    /// Attach underlying failure details to 500 responses (non-production only)
    expose_error_details: bool,
}

impl SubmissionService {
    pub fn new(store: ApplicationStore, expose_error_details: bool) -> Self {
        Self {
            store,
            expose_error_details,
        }
    }

    /// Submit a raw payload.
    ///
    /// Errors map to: `MissingFields` / `Validation` (400), `DuplicateKey` (409),
    /// and `Failed` (500) for anything else.
    pub async fn submit(&self, payload: ApplicationPayload) -> Result<ApplicationSummary, AppError> {
        let missing = payload.missing_fields();
        if !missing.is_empty() {
            tracing::warn!(missing = ?missing, "Application rejected: missing fields");
            return Err(AppError::MissingFields(missing));
        }

        let sanitized = ApplicationPayload {
            name: payload.name.as_deref().map(validation::sanitize),
            // Surrounding whitespace is normalization, not a shape error
            email: payload.email.map(|e| e.trim().to_string()),
            level: payload.level,
            goals: payload.goals.as_deref().map(validation::sanitize),
        };

        let report = validation::validate(&sanitized);
        if !report.is_valid {
            tracing::warn!(errors = ?report.errors, "Application rejected: invalid fields");
            return Err(AppError::Validation(report.errors));
        }

        let candidate = NewApplication {
            name: sanitized.name.unwrap_or_default(),
            email: sanitized.email.unwrap_or_default(),
            level: sanitized.level.unwrap_or_default(),
            goals: sanitized.goals.unwrap_or_default(),
        }
        .normalized();

        match self.store.create(candidate).await {
            Ok(application) => {
                tracing::info!(
                    application_id = %application.id,
                    level = %application.level,
                    "Application submitted"
                );
                Ok(ApplicationSummary::from(&application))
            }
            Err(AppError::DuplicateKey(email)) => {
                tracing::warn!("Application rejected: email already registered");
                Err(AppError::DuplicateKey(email))
            }
            Err(AppError::Validation(messages)) => {
                tracing::warn!(errors = ?messages, "Application rejected by store schema");
                Err(AppError::Validation(messages))
            }
            Err(e) => {
                tracing::error!(error = %e, "Application submission failed");
                Err(AppError::Failed {
                    message: SUBMIT_FAILED,
                    detail: self.expose_error_details.then(|| e.to_string()),
                })
            }
        }
    }
}
