// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth login through Google and GitHub.
//!
//! Handles:
//! - Building the provider consent URL with a signed `state`
//! - Exchanging the authorization code for an access token
//! - Fetching the provider profile and normalizing it into an [`Identity`]
//!
//! The broker holds no session state; callers store the identity.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::Url;
use serde::Deserialize;
use sha2::Sha256;
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::config::{Config, OAuthCredentials};
use crate::models::{Identity, Provider};

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a login attempt may sit at the provider before the state expires.
const STATE_TTL_MILLIS: u128 = 10 * 60 * 1000;
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("cpc-backend/", env!("CARGO_PKG_VERSION"));

/// OAuth failure categories. None of these reach API clients as JSON; the
/// callback route turns them into a redirect.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider {0} is not configured")]
    NotConfigured(Provider),

    #[error("Authorization denied by provider: {0}")]
    Denied(String),

    #[error("Invalid or expired state parameter")]
    InvalidState,

    #[error("Missing authorization code")]
    MissingCode,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Profile fetch failed: {0}")]
    Profile(String),

    #[error("Internal OAuth error: {0}")]
    Internal(String),
}

/// Provider endpoint URLs (overridable for tests).
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub profile_url: String,
    /// GitHub only: the email list endpoint
    pub emails_url: Option<String>,
}

impl ProviderEndpoints {
    pub fn defaults(provider: Provider) -> Self {
        match provider {
            Provider::Google => Self {
                authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token_url: "https://oauth2.googleapis.com/token".to_string(),
                profile_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
                emails_url: None,
            },
            Provider::GitHub => Self {
                authorize_url: "https://github.com/login/oauth/authorize".to_string(),
                token_url: "https://github.com/login/oauth/access_token".to_string(),
                profile_url: "https://api.github.com/user".to_string(),
                emails_url: Some("https://api.github.com/user/emails".to_string()),
            },
        }
    }
}

/// Scopes requested from each provider.
pub fn scopes(provider: Provider) -> &'static [&'static str] {
    match provider {
        Provider::Google => &["profile", "email"],
        // GitHub does not expose email without this scope
        Provider::GitHub => &["user:email"],
    }
}

/// Configured client for one provider.
#[derive(Debug, Clone)]
struct ProviderClient {
    credentials: OAuthCredentials,
    redirect_uri: String,
    endpoints: ProviderEndpoints,
}

/// Query parameters the provider sends back to the callback route.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// ─── Provider wire formats ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Google OpenID Connect userinfo payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// GitHub `/user` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// GitHub `/user/emails` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubEmail {
    pub email: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone)]
pub struct GitHubProfile {
    pub user: GitHubUser,
    pub emails: Vec<GitHubEmail>,
}

/// Provider profile, tagged by provider.
#[derive(Debug, Clone)]
pub enum ProviderProfile {
    Google(GoogleProfile),
    GitHub(GitHubProfile),
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ProviderProfile {
    /// Normalize into the canonical identity.
    pub fn into_identity(self, access_token: String) -> Identity {
        match self {
            ProviderProfile::Google(profile) => {
                let email = if profile.email_verified == Some(true) {
                    non_empty(profile.email)
                } else {
                    None
                };
                let name = non_empty(profile.name)
                    .or_else(|| email.clone())
                    .unwrap_or_else(|| profile.sub.clone());

                Identity {
                    provider: Provider::Google,
                    provider_id: profile.sub,
                    name,
                    email,
                    avatar: non_empty(profile.picture),
                    username: None,
                    access_token,
                }
            }
            ProviderProfile::GitHub(GitHubProfile { user, emails }) => {
                let email = emails
                    .iter()
                    .find(|e| e.verified && e.primary)
                    .or_else(|| emails.iter().find(|e| e.verified))
                    .map(|e| e.email.clone())
                    .or_else(|| non_empty(user.email));
                let avatar = non_empty(user.avatar_url)
                    .unwrap_or_else(|| format!("https://avatars.githubusercontent.com/u/{}?v=4", user.id));

                Identity {
                    provider: Provider::GitHub,
                    provider_id: user.id.to_string(),
                    name: non_empty(user.name).unwrap_or_else(|| user.login.clone()),
                    email,
                    avatar: Some(avatar),
                    username: Some(user.login),
                    access_token,
                }
            }
        }
    }
}

// ─── Broker ──────────────────────────────────────────────────────────────────

/// OAuth broker for the enabled providers.
#[derive(Clone)]
pub struct OAuthBroker {
    http: reqwest::Client,
    clients: BTreeMap<Provider, ProviderClient>,
    state_key: Vec<u8>,
}

impl OAuthBroker {
    /// Build clients for every provider with credentials; the rest stay disabled.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::Internal(e.to_string()))?;

        let mut clients = BTreeMap::new();
        for (provider, credentials) in [
            (Provider::Google, &config.google),
            (Provider::GitHub, &config.github),
        ] {
            match credentials {
                Some(credentials) => {
                    clients.insert(
                        provider,
                        ProviderClient {
                            credentials: credentials.clone(),
                            redirect_uri: format!(
                                "{}/api/auth/{}/callback",
                                config.backend_url, provider
                            ),
                            endpoints: ProviderEndpoints::defaults(provider),
                        },
                    );
                }
                None => tracing::warn!(
                    provider = %provider,
                    "OAuth credentials not configured, provider disabled"
                ),
            }
        }

        Ok(Self {
            http,
            clients,
            state_key: config.session_secret.clone(),
        })
    }

    /// Point a configured provider at different endpoints.
    pub fn with_endpoints(mut self, provider: Provider, endpoints: ProviderEndpoints) -> Self {
        if let Some(client) = self.clients.get_mut(&provider) {
            client.endpoints = endpoints;
        }
        self
    }

    /// Enabled providers in a stable order.
    pub fn providers(&self) -> impl Iterator<Item = Provider> + '_ {
        self.clients.keys().copied()
    }

    pub fn is_enabled(&self, provider: Provider) -> bool {
        self.clients.contains_key(&provider)
    }

    fn client(&self, provider: Provider) -> Result<&ProviderClient, ProviderError> {
        self.clients
            .get(&provider)
            .ok_or(ProviderError::NotConfigured(provider))
    }

    /// Consent URL to redirect the browser to.
    pub fn begin_auth(&self, provider: Provider) -> Result<String, ProviderError> {
        let client = self.client(provider)?;
        let state = sign_state(provider, now_millis()?, &self.state_key)?;
        let scope = scopes(provider).join(" ");

        let mut params = vec![
            ("client_id", client.credentials.client_id.as_str()),
            ("redirect_uri", client.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state.as_str()),
        ];
        if provider == Provider::Google {
            // Fresh token on every login instead of silent re-consent
            params.push(("access_type", "offline"));
            params.push(("prompt", "consent"));
        }

        let url = Url::parse_with_params(&client.endpoints.authorize_url, &params)
            .map_err(|e| ProviderError::Internal(format!("Invalid authorize URL: {}", e)))?;

        tracing::info!(provider = %provider, "Starting OAuth flow");

        Ok(url.into())
    }

    /// Finish a login from the provider callback.
    pub async fn complete_auth(
        &self,
        provider: Provider,
        params: CallbackParams,
    ) -> Result<Identity, ProviderError> {
        let client = self.client(provider)?;

        if let Some(error) = params.error {
            return Err(ProviderError::Denied(error));
        }

        let state = params.state.ok_or(ProviderError::InvalidState)?;
        if !verify_state(&state, provider, now_millis()?, &self.state_key) {
            return Err(ProviderError::InvalidState);
        }

        let code = params
            .code
            .filter(|c| !c.is_empty())
            .ok_or(ProviderError::MissingCode)?;

        let access_token = self.exchange_code(client, &code).await?;

        let profile = match provider {
            Provider::Google => {
                ProviderProfile::Google(self.get_json(&client.endpoints.profile_url, &access_token).await?)
            }
            Provider::GitHub => {
                let user: GitHubUser = self
                    .get_json(&client.endpoints.profile_url, &access_token)
                    .await?;
                let emails = match &client.endpoints.emails_url {
                    Some(url) => self
                        .get_json::<Vec<GitHubEmail>>(url, &access_token)
                        .await
                        .unwrap_or_else(|e| {
                            tracing::warn!(error = %e, "Failed to fetch GitHub emails, continuing without");
                            Vec::new()
                        }),
                    None => Vec::new(),
                };
                ProviderProfile::GitHub(GitHubProfile { user, emails })
            }
        };

        let identity = profile.into_identity(access_token);
        tracing::info!(
            provider = %provider,
            provider_id = %identity.provider_id,
            "OAuth successful"
        );
        Ok(identity)
    }

    async fn exchange_code(
        &self,
        client: &ProviderClient,
        code: &str,
    ) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(&client.endpoints.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", client.credentials.client_id.as_str()),
                ("client_secret", client.credentials.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", client.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::TokenExchange(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::TokenExchange(format!("HTTP {}: {}", status, body)));
        }

        // GitHub reports failures as 200 with an `error` field
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::TokenExchange(format!("JSON parse error: {}", e)))?;

        match (token.access_token, token.error) {
            (Some(access_token), None) if !access_token.is_empty() => Ok(access_token),
            (_, Some(error)) => Err(ProviderError::TokenExchange(format!(
                "{}: {}",
                error,
                token.error_description.unwrap_or_default()
            ))),
            _ => Err(ProviderError::TokenExchange(
                "No access token in response".to_string(),
            )),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, ProviderError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::Profile(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Profile(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Profile(format!("JSON parse error: {}", e)))
    }
}

// ─── Signed state ────────────────────────────────────────────────────────────

fn now_millis() -> Result<u128, ProviderError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .map_err(|e| ProviderError::Internal(format!("System time error: {}", e)))
}

fn state_signature(payload: &str, secret: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Encode `provider|timestamp_hex|signature_hex` as URL-safe base64.
fn sign_state(provider: Provider, timestamp: u128, secret: &[u8]) -> Result<String, ProviderError> {
    let payload = format!("{}|{:x}", provider, timestamp);
    let signature = state_signature(&payload, secret)
        .ok_or_else(|| ProviderError::Internal("HMAC init failed".to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Check signature, provider binding, and age of a state parameter.
fn verify_state(state: &str, provider: Provider, now: u128, secret: &[u8]) -> bool {
    let Some(state_str) = URL_SAFE_NO_PAD
        .decode(state)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    else {
        return false;
    };

    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    let [state_provider, timestamp_hex, signature_hex] = parts[..] else {
        return false;
    };

    let payload = format!("{}|{}", state_provider, timestamp_hex);
    let Some(expected) = state_signature(&payload, secret) else {
        return false;
    };
    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return false;
    }

    if state_provider != provider.as_str() {
        tracing::warn!(
            expected = %provider,
            actual = state_provider,
            "OAuth state issued for a different provider"
        );
        return false;
    }

    match u128::from_str_radix(timestamp_hex, 16) {
        Ok(issued) => issued <= now && now - issued <= STATE_TTL_MILLIS,
        Err(_) => false,
    }
}
