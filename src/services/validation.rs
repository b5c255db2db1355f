// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Field-level checks for application payloads.
//!
//! These run before anything touches the store. The store repeats the same
//! rules on its own (see `NewApplication`).

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::models::ExperienceLevel;

/// Deliberately permissive: `local@domain.tld` with no whitespace anywhere.
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("valid email regex"));

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid script regex")
});

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

pub const NAME_LENGTH: (usize, usize) = (2, 100);
pub const GOALS_LENGTH: (usize, usize) = (10, 1000);

/// Raw submission payload as received from the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub level: Option<String>,
    pub goals: Option<String>,
}

impl ApplicationPayload {
    /// Names of required fields that are absent or empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("level", &self.level),
            ("goals", &self.goals),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
        .map(|(field, _)| field)
        .collect()
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

fn trimmed_len_within(value: Option<&str>, (min, max): (usize, usize)) -> bool {
    value
        .map(|v| v.trim().chars().count())
        .is_some_and(|len| (min..=max).contains(&len))
}

pub fn is_valid_name(name: Option<&str>) -> bool {
    trimmed_len_within(name, NAME_LENGTH)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn is_valid_level(level: Option<&str>) -> bool {
    level.is_some_and(|l| l.parse::<ExperienceLevel>().is_ok())
}

pub fn is_valid_goals(goals: Option<&str>) -> bool {
    trimmed_len_within(goals, GOALS_LENGTH)
}

/// Check every field independently and collect one message per failing field.
pub fn validate(payload: &ApplicationPayload) -> ValidationReport {
    let mut errors = Vec::new();

    if !is_valid_name(payload.name.as_deref()) {
        errors.push("Name must be between 2 and 100 characters".to_string());
    }
    if !payload.email.as_deref().is_some_and(is_valid_email) {
        errors.push("Please provide a valid email address".to_string());
    }
    if !is_valid_level(payload.level.as_deref()) {
        errors.push("Please select a valid experience level".to_string());
    }
    if !is_valid_goals(payload.goals.as_deref()) {
        errors.push("Learning goals must be between 10 and 1000 characters".to_string());
    }

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Strip script blocks, then any remaining tags, then surrounding whitespace.
pub fn sanitize(input: &str) -> String {
    let without_scripts = SCRIPT_BLOCK.replace_all(input, "");
    HTML_TAG.replace_all(&without_scripts, "").trim().to_string()
}
