// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod application;
pub mod identity;

pub use application::{Application, ApplicationSummary, ExperienceLevel, NewApplication};
pub use identity::{Identity, IdentityView, Provider};
