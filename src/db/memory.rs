// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store used when no Firestore project is configured.

use crate::db::SessionRecord;
use crate::error::AppError;
use crate::models::Application;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone)]
struct StoredApplication {
    /// Insertion order, breaks ties between equal timestamps
    sequence: u64,
    application: Application,
}

/// DashMap-backed store. Clones share the same underlying maps.
#[derive(Clone, Default)]
pub struct MemoryDb {
    /// Keyed by normalized email, which is the uniqueness constraint
    applications: Arc<DashMap<String, StoredApplication>>,
    sessions: Arc<DashMap<String, SessionRecord>>,
    sequence: Arc<AtomicU64>,
    /// When set, session deletes fail (exercises logout error handling)
    fail_session_deletes: Arc<AtomicBool>,
}

impl MemoryDb {
    pub fn insert_application(&self, application: &Application) -> Result<(), AppError> {
        // The entry holds the shard lock, so concurrent inserts for the same
        // email cannot both observe a vacant slot.
        match self.applications.entry(application.email.clone()) {
            Entry::Occupied(_) => Err(AppError::DuplicateKey(application.email.clone())),
            Entry::Vacant(slot) => {
                slot.insert(StoredApplication {
                    sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
                    application: application.clone(),
                });
                Ok(())
            }
        }
    }

    pub fn list_applications(&self) -> Vec<Application> {
        let mut stored: Vec<StoredApplication> = self
            .applications
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        stored.sort_by(|a, b| {
            b.application
                .created_at
                .cmp(&a.application.created_at)
                .then(b.sequence.cmp(&a.sequence))
        });

        stored.into_iter().map(|s| s.application).collect()
    }

    pub fn get_application_by_email(&self, email: &str) -> Option<Application> {
        self.applications
            .get(email)
            .map(|entry| entry.application.clone())
    }

    pub fn get_session(&self, key: &str) -> Option<SessionRecord> {
        self.sessions.get(key).map(|entry| entry.value().clone())
    }

    pub fn set_session(&self, key: &str, record: &SessionRecord) {
        self.sessions.insert(key.to_string(), record.clone());
    }

    pub fn delete_session(&self, key: &str) -> Result<(), AppError> {
        if self.fail_session_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Database(
                "Session delete rejected by store".to_string(),
            ));
        }
        self.sessions.remove(key);
        Ok(())
    }

    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) {
        self.sessions.retain(|_, record| record.expires_at > now);
    }

    /// Make every following session delete fail until switched off again.
    pub fn set_fail_session_deletes(&self, fail: bool) {
        self.fail_session_deletes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored applications.
    pub fn application_count(&self) -> usize {
        self.applications.len()
    }
}
