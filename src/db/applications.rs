// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application persistence with schema checks at the store boundary.

use crate::db::Database;
use crate::error::AppError;
use crate::models::{Application, ExperienceLevel, NewApplication};
use chrono::Utc;
use ring::rand::{SecureRandom, SystemRandom};
use validator::{Validate, ValidationErrors};

/// Bytes of randomness in an application id (hex-encoded to 24 chars).
const ID_BYTES: usize = 12;

/// Persistence for the `applications` collection.
#[derive(Clone)]
pub struct ApplicationStore {
    db: Database,
    rng: SystemRandom,
}

impl ApplicationStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            rng: SystemRandom::new(),
        }
    }

    /// Normalize, validate, and insert a new application.
    ///
    /// Fails with `Validation` (one message per violated field, in field order)
    /// or `DuplicateKey` when the normalized email already exists.
    pub async fn create(&self, candidate: NewApplication) -> Result<Application, AppError> {
        let candidate = candidate.normalized();
        candidate
            .validate()
            .map_err(|errors| AppError::Validation(schema_messages(&errors)))?;

        let level: ExperienceLevel = candidate.level.parse().map_err(|()| {
            AppError::Validation(vec![format!(
                "{} is not a valid experience level",
                candidate.level
            )])
        })?;

        let now = Utc::now();
        let application = Application {
            id: self.new_id()?,
            name: candidate.name,
            email: candidate.email,
            level,
            goals: candidate.goals,
            created_at: now,
            updated_at: now,
        };

        self.db.insert_application(&application).await?;

        tracing::debug!(
            application_id = %application.id,
            backend = self.db.backend_name(),
            "Application stored"
        );

        Ok(application)
    }

    /// Every application, newest first.
    pub async fn list_all(&self) -> Result<Vec<Application>, AppError> {
        self.db.list_applications().await
    }

    /// Look up an application by email (normalized before lookup).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Application>, AppError> {
        self.db
            .get_application_by_email(&email.trim().to_lowercase())
            .await
    }

    fn new_id(&self) -> Result<String, AppError> {
        let mut bytes = [0u8; ID_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate application id")))?;
        Ok(hex::encode(bytes))
    }
}

/// Flatten validator output into messages, ordered by field declaration.
fn schema_messages(errors: &ValidationErrors) -> Vec<String> {
    let by_field = errors.field_errors();

    NewApplication::FIELDS
        .iter()
        .filter_map(|field| by_field.get(*field))
        .flat_map(|errs| errs.iter())
        .map(|err| {
            err.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value ({})", err.code))
        })
        .collect()
}
