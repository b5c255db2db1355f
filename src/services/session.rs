// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side session storage.
//!
//! The browser only holds a random session id. Records are stored under the
//! SHA-256 of that id, so a leaked store does not leak usable cookies.

use chrono::{Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};

use crate::db::{Database, SessionRecord};
use crate::error::AppError;
use crate::models::Identity;

const SESSION_ID_BYTES: usize = 32;

#[derive(Clone)]
pub struct SessionStore {
    db: Database,
    ttl: Duration,
    rng: SystemRandom,
}

fn storage_key(session_id: &str) -> String {
    hex::encode(Sha256::digest(session_id.as_bytes()))
}

impl SessionStore {
    pub fn new(db: Database, ttl: Duration) -> Self {
        Self {
            db,
            ttl,
            rng: SystemRandom::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session holding `identity`. Returns the id to put in the cookie.
    pub async fn create(&self, identity: &Identity) -> Result<String, AppError> {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate session id")))?;
        let session_id = hex::encode(bytes);

        let data = serde_json::to_string(identity)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Session serialization failed: {}", e)))?;

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Session lifetime out of range")))?;
        let record = SessionRecord {
            data: Some(data),
            created_at: now,
            expires_at,
        };
        self.db.set_session(&storage_key(&session_id), &record).await?;

        // Abandoned sessions are never read again, so expire them here
        if let Err(e) = self.db.purge_expired_sessions(now).await {
            tracing::warn!(error = %e, "Failed to purge expired sessions");
        }

        Ok(session_id)
    }

    /// Identity for a session id, if the session exists, is live, and is logged in.
    pub async fn load(&self, session_id: &str) -> Result<Option<Identity>, AppError> {
        let key = storage_key(session_id);
        let Some(record) = self.db.get_session(&key).await? else {
            return Ok(None);
        };

        if record.expires_at <= Utc::now() {
            tracing::debug!("Session expired, removing");
            if let Err(e) = self.db.delete_session(&key).await {
                tracing::warn!(error = %e, "Failed to remove expired session");
            }
            return Ok(None);
        }

        let Some(data) = record.data else {
            return Ok(None);
        };

        match serde_json::from_str(&data) {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable session data");
                Ok(None)
            }
        }
    }

    /// Remove the identity from a session, leaving the record in place.
    pub async fn logout(&self, session_id: &str) -> Result<(), AppError> {
        let key = storage_key(session_id);
        if let Some(mut record) = self.db.get_session(&key).await? {
            record.data = None;
            self.db.set_session(&key, &record).await?;
        }
        Ok(())
    }

    /// Delete the session record entirely.
    pub async fn destroy(&self, session_id: &str) -> Result<(), AppError> {
        self.db.delete_session(&storage_key(session_id)).await
    }
}
