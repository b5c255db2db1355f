// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod oauth;
pub mod session;
pub mod submission;
pub mod validation;

pub use oauth::{OAuthBroker, ProviderError};
pub use session::SessionStore;
pub use submission::SubmissionService;
