// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore, with an in-memory fallback for development and tests).

pub mod applications;
pub mod firestore;
pub mod memory;

pub use applications::ApplicationStore;
pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::config::Config;
use crate::error::AppError;
use crate::models::Application;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Collection names as constants.
pub mod collections {
    pub const APPLICATIONS: &str = "applications";
    /// Server-side sessions (keyed by SHA-256 of the session id)
    pub const SESSIONS: &str = "sessions";
}

/// Stored session. `data` is opaque to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Store connectivity as reported by `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub status: &'static str,
    pub connected: bool,
    pub backend: &'static str,
}

/// Handle to whichever document store backs this process.
#[derive(Clone)]
pub enum Database {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl Database {
    /// Connect to Firestore when a project is configured, otherwise fall back
    /// to the in-memory store.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        match &config.firestore_project_id {
            Some(project_id) => Ok(Database::Firestore(FirestoreDb::new(project_id).await?)),
            None => {
                tracing::warn!(
                    "FIRESTORE_PROJECT_ID not set, using in-memory store (data is not persisted)"
                );
                Ok(Database::in_memory())
            }
        }
    }

    pub fn in_memory() -> Self {
        Database::Memory(MemoryDb::default())
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Database::Firestore(_) => "firestore",
            Database::Memory(_) => "memory",
        }
    }

    pub async fn status(&self) -> StoreStatus {
        let connected = match self {
            Database::Firestore(db) => match db.ping().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "Store health check failed");
                    false
                }
            },
            Database::Memory(_) => true,
        };

        StoreStatus {
            status: if connected { "connected" } else { "disconnected" },
            connected,
            backend: self.backend_name(),
        }
    }

    // ─── Applications ────────────────────────────────────────────

    /// Insert a new application. Fails with `DuplicateKey` if the email is taken;
    /// the check and the write are a single atomic store operation.
    pub async fn insert_application(&self, application: &Application) -> Result<(), AppError> {
        match self {
            Database::Firestore(db) => db.insert_application(application).await,
            Database::Memory(db) => db.insert_application(application),
        }
    }

    /// All applications, newest first.
    pub async fn list_applications(&self) -> Result<Vec<Application>, AppError> {
        match self {
            Database::Firestore(db) => db.list_applications().await,
            Database::Memory(db) => Ok(db.list_applications()),
        }
    }

    pub async fn get_application_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Application>, AppError> {
        match self {
            Database::Firestore(db) => db.get_application_by_email(email).await,
            Database::Memory(db) => Ok(db.get_application_by_email(email)),
        }
    }

    // ─── Sessions ────────────────────────────────────────────────

    pub async fn get_session(&self, key: &str) -> Result<Option<SessionRecord>, AppError> {
        match self {
            Database::Firestore(db) => db.get_session(key).await,
            Database::Memory(db) => Ok(db.get_session(key)),
        }
    }

    pub async fn set_session(&self, key: &str, record: &SessionRecord) -> Result<(), AppError> {
        match self {
            Database::Firestore(db) => db.set_session(key, record).await,
            Database::Memory(db) => {
                db.set_session(key, record);
                Ok(())
            }
        }
    }

    pub async fn delete_session(&self, key: &str) -> Result<(), AppError> {
        match self {
            Database::Firestore(db) => db.delete_session(key).await,
            Database::Memory(db) => db.delete_session(key),
        }
    }

    /// Drop session records that expired before `now`.
    ///
    /// Firestore relies on a TTL policy on the `sessions.expires_at` field
    /// instead of scanning the collection on every login.
    pub async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        match self {
            Database::Firestore(_) => Ok(()),
            Database::Memory(db) => {
                db.purge_expired_sessions(now);
                Ok(())
            }
        }
    }
}
