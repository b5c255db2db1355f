// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything is resolved once at startup. OAuth providers whose credentials
//! are absent are simply disabled rather than failing startup.

use std::env;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
/// One year. Longer lifetimes overflow timestamp arithmetic.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Deployment environment (controls error detail exposure and cookie flags).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }
}

/// OAuth client credentials for one provider.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// Server port
    pub port: u16,
    /// Frontend origin for CORS and post-auth redirects
    pub frontend_url: String,
    /// Public base URL of this API, used to build OAuth callback URLs
    pub backend_url: String,
    /// Additional allowed CORS origins
    pub cors_origins: Vec<String>,
    /// Firestore project. `None` selects the in-memory store.
    pub firestore_project_id: Option<String>,
    /// HMAC key for the OAuth state parameter (raw bytes)
    pub session_secret: Vec<u8>,
    pub session_ttl_hours: i64,
    pub google: Option<OAuthCredentials>,
    pub github: Option<OAuthCredentials>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            environment: Environment::Test,
            port: DEFAULT_PORT,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            backend_url: format!("http://localhost:{}", DEFAULT_PORT),
            cors_origins: Vec::new(),
            firestore_project_id: None,
            session_secret: b"test_session_secret_32_bytes_min".to_vec(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            google: Some(OAuthCredentials {
                client_id: "test-google-client".to_string(),
                client_secret: "test-google-secret".to_string(),
            }),
            github: Some(OAuthCredentials {
                client_id: "test-github-client".to_string(),
                client_secret: "test-github-secret".to_string(),
            }),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment = var("APP_ENV")
            .map(|v| Environment::parse(&v))
            .unwrap_or(Environment::Development);

        let port = var("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let frontend_url = var("FRONTEND_URL")
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let backend_url = var("BACKEND_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let cors_origins = var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().trim_end_matches('/').to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let firestore_project_id = var("FIRESTORE_PROJECT_ID");
        if firestore_project_id.is_none() && environment.is_production() {
            return Err(ConfigError::Missing("FIRESTORE_PROJECT_ID"));
        }

        let session_secret = match var("SESSION_SECRET") {
            Some(secret) => secret.into_bytes(),
            None if environment.is_production() => {
                return Err(ConfigError::Missing("SESSION_SECRET"))
            }
            None => random_secret()?,
        };

        let session_ttl_hours = match var("SESSION_TTL_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|h| (1..=MAX_SESSION_TTL_HOURS).contains(h))
                .ok_or(ConfigError::Invalid("SESSION_TTL_HOURS", raw))?,
            None => DEFAULT_SESSION_TTL_HOURS,
        };

        let credentials = |id_key: &str, secret_key: &str| match (var(id_key), var(secret_key)) {
            (Some(client_id), Some(client_secret)) => Some(OAuthCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        Ok(Self {
            environment,
            port,
            frontend_url,
            backend_url,
            cors_origins,
            firestore_project_id,
            session_secret,
            session_ttl_hours,
            google: credentials("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            github: credentials("GITHUB_CLIENT_ID", "GITHUB_CLIENT_SECRET"),
        })
    }

    /// Whether failure details may be echoed back to API clients.
    pub fn expose_error_details(&self) -> bool {
        !self.environment.is_production()
    }
}

/// Per-process secret for development when SESSION_SECRET is not set.
fn random_secret() -> Result<Vec<u8>, ConfigError> {
    use ring::rand::{SecureRandom, SystemRandom};

    let mut secret = vec![0u8; 32];
    SystemRandom::new()
        .fill(&mut secret)
        .map_err(|_| ConfigError::Random)?;
    Ok(secret)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),

    #[error("Failed to generate random session secret")]
    Random,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup(&[])).expect("Config should load");

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.port, 5000);
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.backend_url, "http://localhost:5000");
        assert!(config.firestore_project_id.is_none());
        assert_eq!(config.session_secret.len(), 32);
        assert!(config.google.is_none());
        assert!(config.github.is_none());
        assert!(config.expose_error_details());
    }

    #[test]
    fn test_provider_requires_both_credentials() {
        let config = Config::from_lookup(lookup(&[
            ("GOOGLE_CLIENT_ID", "gid"),
            ("GITHUB_CLIENT_ID", "hid"),
            ("GITHUB_CLIENT_SECRET", "hsecret"),
        ]))
        .unwrap();

        assert!(config.google.is_none());
        let github = config.github.expect("GitHub should be enabled");
        assert_eq!(github.client_id, "hid");
        assert_eq!(github.client_secret, "hsecret");
    }

    #[test]
    fn test_production_requires_store_and_secret() {
        let err = Config::from_lookup(lookup(&[("APP_ENV", "production")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("FIRESTORE_PROJECT_ID")));

        let err = Config::from_lookup(lookup(&[
            ("APP_ENV", "production"),
            ("FIRESTORE_PROJECT_ID", "cpc"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SESSION_SECRET")));

        let config = Config::from_lookup(lookup(&[
            ("APP_ENV", "production"),
            ("FIRESTORE_PROJECT_ID", "cpc"),
            ("SESSION_SECRET", "s3cret"),
            ("BACKEND_URL", "https://api.example.com/"),
        ]))
        .unwrap();
        assert!(!config.expose_error_details());
        assert_eq!(config.backend_url, "https://api.example.com");
    }

    #[test]
    fn test_cors_origins_and_ttl() {
        let config = Config::from_lookup(lookup(&[
            ("CORS_ORIGINS", "https://a.example.com/, ,https://b.example.com"),
            ("SESSION_TTL_HOURS", "48"),
        ]))
        .unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example.com", "https://b.example.com"]
        );
        assert_eq!(config.session_ttl_hours, 48);

        let err = Config::from_lookup(lookup(&[("SESSION_TTL_HOURS", "zero")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("SESSION_TTL_HOURS", _)));
    }

    #[test]
    fn test_session_ttl_is_capped() {
        let config = Config::from_lookup(lookup(&[("SESSION_TTL_HOURS", "8760")])).unwrap();
        assert_eq!(config.session_ttl_hours, MAX_SESSION_TTL_HOURS);

        for raw in ["8761", "100000000000", "0", "-5"] {
            let err = Config::from_lookup(lookup(&[("SESSION_TTL_HOURS", raw)])).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid("SESSION_TTL_HOURS", ref v) if v == raw),
                "{raw} should be rejected"
            );
        }
    }
}
