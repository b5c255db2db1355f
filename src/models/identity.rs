// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticated user identity, held only in session state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Supported OAuth identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    #[serde(rename = "github")]
    GitHub,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Google, Provider::GitHub];

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::GitHub => "github",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Google => "Google",
            Provider::GitHub => "GitHub",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|p| p.as_str() == s).ok_or(())
    }
}

/// Canonical identity produced from a provider profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub provider: Provider,
    /// Unique within the provider's namespace
    pub provider_id: String,
    pub name: String,
    /// May be withheld by the provider
    pub email: Option<String>,
    pub avatar: Option<String>,
    /// GitHub login; always `None` for Google
    pub username: Option<String>,
    /// Provider credential, kept for the session lifetime and never returned to clients
    pub access_token: String,
}

/// Client-safe identity view returned by `/api/auth/me`.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    pub is_authenticated: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub provider: Provider,
    pub name: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub username: Option<String>,
    pub has_application: bool,
}

impl IdentityView {
    pub fn new(identity: &Identity, has_application: bool) -> Self {
        Self {
            is_authenticated: true,
            provider: identity.provider,
            name: identity.name.clone(),
            email: identity.email.clone(),
            avatar: identity.avatar.clone(),
            username: identity.username.clone(),
            has_application,
        }
    }
}
