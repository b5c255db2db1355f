// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Applications (document id = URL-encoded normalized email)
//! - Sessions (document id = hashed session id)

use crate::db::{collections, SessionRecord};
use crate::error::AppError;
use crate::models::{Application, ExperienceLevel};
use chrono::{DateTime, Utc};
use firestore::errors::FirestoreError;
use serde::{Deserialize, Serialize};

/// Application as stored in Firestore. Timestamps use native Firestore
/// timestamps so `created_at` orders chronologically.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApplicationDocument {
    id: String,
    name: String,
    email: String,
    level: ExperienceLevel,
    goals: String,
    #[serde(with = "firestore::serialize_as_timestamp")]
    created_at: DateTime<Utc>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    updated_at: DateTime<Utc>,
}

impl From<&Application> for ApplicationDocument {
    fn from(app: &Application) -> Self {
        Self {
            id: app.id.clone(),
            name: app.name.clone(),
            email: app.email.clone(),
            level: app.level,
            goals: app.goals.clone(),
            created_at: app.created_at,
            updated_at: app.updated_at,
        }
    }
}

impl From<ApplicationDocument> for Application {
    fn from(doc: ApplicationDocument) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            email: doc.email,
            level: doc.level,
            goals: doc.goals,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionDocument {
    data: Option<String>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    created_at: DateTime<Utc>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    expires_at: DateTime<Utc>,
}

/// Document id for an application. Emails may legally contain `/`, which
/// Firestore does not allow in ids.
fn application_doc_id(email: &str) -> String {
    urlencoding::encode(email).into_owned()
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Cheap round trip used by the health check.
    pub async fn ping(&self) -> Result<(), AppError> {
        let _: Vec<ApplicationDocument> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::APPLICATIONS)
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Application Operations ──────────────────────────────────

    /// Create an application document.
    ///
    /// Uses a create-only write keyed by the normalized email, so Firestore
    /// itself rejects a second application for the same address even when two
    /// requests race.
    pub async fn insert_application(&self, application: &Application) -> Result<(), AppError> {
        let doc = ApplicationDocument::from(application);

        let result: Result<ApplicationDocument, FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::APPLICATIONS)
            .document_id(application_doc_id(&application.email))
            .object(&doc)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(FirestoreError::DataConflictError(_)) => {
                Err(AppError::DuplicateKey(application.email.clone()))
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// List every application ordered by creation time, newest first.
    pub async fn list_applications(&self) -> Result<Vec<Application>, AppError> {
        let docs: Vec<ApplicationDocument> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::APPLICATIONS)
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(docs.into_iter().map(Application::from).collect())
    }

    /// Get an application by its normalized email.
    pub async fn get_application_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Application>, AppError> {
        let doc: Option<ApplicationDocument> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::APPLICATIONS)
            .obj()
            .one(&application_doc_id(email))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(doc.map(Application::from))
    }

    // ─── Session Operations ──────────────────────────────────────

    pub async fn get_session(&self, key: &str) -> Result<Option<SessionRecord>, AppError> {
        let doc: Option<SessionDocument> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SESSIONS)
            .obj()
            .one(key)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(doc.map(|d| SessionRecord {
            data: d.data,
            created_at: d.created_at,
            expires_at: d.expires_at,
        }))
    }

    /// Create or replace a session document.
    pub async fn set_session(&self, key: &str, record: &SessionRecord) -> Result<(), AppError> {
        let doc = SessionDocument {
            data: record.data.clone(),
            created_at: record.created_at,
            expires_at: record.expires_at,
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SESSIONS)
            .document_id(key)
            .object(&doc)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn delete_session(&self, key: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::SESSIONS)
            .document_id(key)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
