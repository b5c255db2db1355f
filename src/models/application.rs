// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Membership application model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::{Validate, ValidationError};

use crate::services::validation;

/// Self-reported competitive programming experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 3] = [
        ExperienceLevel::Beginner,
        ExperienceLevel::Intermediate,
        ExperienceLevel::Advanced,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "beginner",
            ExperienceLevel::Intermediate => "intermediate",
            ExperienceLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = ();

    /// Case-sensitive: only the exact lowercase names are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or(())
    }
}

/// A stored membership application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Store-assigned identifier
    pub id: String,
    pub name: String,
    /// Normalized (trimmed, lowercase) and unique across all applications
    pub email: String,
    pub level: ExperienceLevel,
    pub goals: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Redacted view echoed back after a submission (goals omitted).
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub level: ExperienceLevel,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl From<&Application> for ApplicationSummary {
    fn from(app: &Application) -> Self {
        Self {
            id: app.id.clone(),
            name: app.name.clone(),
            email: app.email.clone(),
            level: app.level,
            created_at: app.created_at,
        }
    }
}

/// Candidate record handed to the store. Schema rules are checked at the
/// persistence boundary regardless of what the caller already validated.
#[derive(Debug, Clone, Validate)]
pub struct NewApplication {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(custom(function = "validate_email_shape"))]
    pub email: String,
    #[validate(custom(function = "validate_level"))]
    pub level: String,
    #[validate(length(
        min = 10,
        max = 1000,
        message = "Goals must be between 10 and 1000 characters"
    ))]
    pub goals: String,
}

impl NewApplication {
    /// Field order used when reporting schema violations.
    pub const FIELDS: [&'static str; 4] = ["name", "email", "level", "goals"];

    /// Apply the storage normalization rules: trim text, trim and lowercase email.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            level: self.level,
            goals: self.goals.trim().to_string(),
        }
    }
}

fn validate_email_shape(email: &str) -> Result<(), ValidationError> {
    if validation::is_valid_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("email")
            .with_message(Cow::Borrowed("Please enter a valid email address")))
    }
}

fn validate_level(level: &str) -> Result<(), ValidationError> {
    match level.parse::<ExperienceLevel>() {
        Ok(_) => Ok(()),
        Err(()) => Err(ValidationError::new("level").with_message(Cow::Owned(format!(
            "{} is not a valid experience level",
            level
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, email: &str, level: &str, goals: &str) -> NewApplication {
        NewApplication {
            name: name.to_string(),
            email: email.to_string(),
            level: level.to_string(),
            goals: goals.to_string(),
        }
    }

    #[test]
    fn test_level_parsing_is_case_sensitive() {
        assert_eq!(
            "advanced".parse::<ExperienceLevel>(),
            Ok(ExperienceLevel::Advanced)
        );
        assert!("Advanced".parse::<ExperienceLevel>().is_err());
        assert!("expert".parse::<ExperienceLevel>().is_err());
    }

    #[test]
    fn test_normalized_trims_and_lowercases() {
        let app = candidate("  Ada  ", "  Ada@Example.COM ", "beginner", "  learn graphs  ")
            .normalized();
        assert_eq!(app.name, "Ada");
        assert_eq!(app.email, "ada@example.com");
        assert_eq!(app.goals, "learn graphs");
    }

    #[test]
    fn test_schema_accepts_valid_candidate() {
        let app = candidate("Ada", "ada@example.com", "intermediate", "Learn dynamic programming");
        assert!(app.validate().is_ok());
    }

    #[test]
    fn test_schema_reports_each_field() {
        let app = candidate("A", "not-an-email", "expert", "short");
        let errors = app.validate().unwrap_err();
        let fields = errors.field_errors();

        for field in NewApplication::FIELDS {
            assert!(fields.get(field).is_some(), "missing error for {}", field);
        }
        let level_message = fields.get("level").unwrap()[0].message.clone().unwrap();
        assert_eq!(level_message, "expert is not a valid experience level");
    }

    #[test]
    fn test_schema_counts_characters_not_bytes() {
        // 100 multi-byte characters is still within the name limit
        let app = candidate(&"é".repeat(100), "a@b.co", "beginner", "ten chars!");
        assert!(app.validate().is_ok());
    }
}
