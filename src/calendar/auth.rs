//! OAuth credentials for the remote calendar
//!
//! Reads a client secret from `credentials.json` and caches the issued token
//! in `token.json` next to it. Interactive consent is not handled here; a
//! missing or unrefreshable token leaves the adapter unauthenticated and
//! callers fall back to local storage.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, ValetError};

const CLIENT_SECRET_FILE: &str = "credentials.json";
const TOKEN_FILE: &str = "token.json";

/// Tokens are refreshed this long before their recorded expiry.
const EXPIRY_SLACK_SECS: i64 = 60;

const REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the adapter stands with the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No client secret on disk; the adapter is disabled
    Unconfigured,
    /// Client secret present but no usable token
    Unauthenticated,
    Authenticated,
    /// Token past its expiry; a refresh will be attempted on next use
    TokenExpired,
}

/// OAuth client secret, Google download shape: the app block sits under
/// either `installed` or `web`.
#[derive(Debug, Clone, Deserialize)]
struct ClientSecretFile {
    installed: Option<AppSecret>,
    web: Option<AppSecret>,
}

#[derive(Debug, Clone, Deserialize)]
struct AppSecret {
    client_id: String,
    client_secret: String,
    token_uri: String,
}

/// Cached token as persisted in `token.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedToken {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        Utc::now() + chrono::Duration::seconds(EXPIRY_SLACK_SECS) >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: i64,
}

/// Holds the client secret and the token cache, refreshing on demand.
pub struct Authenticator {
    secret: AppSecret,
    token_path: PathBuf,
    token: Option<CachedToken>,
    http: reqwest::blocking::Client,
}

impl Authenticator {
    /// Load from a credentials directory. `Ok(None)` means no client secret
    /// is present and the adapter should stay disabled.
    pub fn load(credentials_dir: &Path) -> Result<Option<Self>> {
        let secret_path = credentials_dir.join(CLIENT_SECRET_FILE);
        if !secret_path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&secret_path)?;
        let file: ClientSecretFile = serde_json::from_str(&raw)?;
        let secret = file.installed.or(file.web).ok_or_else(|| {
            ValetError::Config(format!(
                "{} has neither an 'installed' nor a 'web' section",
                secret_path.display()
            ))
        })?;

        let token_path = credentials_dir.join(TOKEN_FILE);
        let token = match fs::read_to_string(&token_path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(token) => Some(token),
                Err(e) => {
                    warn!(path = %token_path.display(), error = %e, "unreadable token cache, ignoring");
                    None
                }
            },
            Err(_) => None,
        };

        let http = reqwest::blocking::Client::builder()
            .timeout(REFRESH_TIMEOUT)
            .build()?;

        Ok(Some(Self {
            secret,
            token_path,
            token,
            http,
        }))
    }

    pub fn state(&self) -> AuthState {
        match &self.token {
            None => AuthState::Unauthenticated,
            Some(token) if token.is_expired() => AuthState::TokenExpired,
            Some(_) => AuthState::Authenticated,
        }
    }

    /// A valid access token, refreshing first when the cached one has
    /// expired. Failure to refresh drops the cached token entirely.
    pub fn access_token(&mut self) -> Result<String> {
        let token = self.token.as_ref().ok_or_else(|| {
            ValetError::Calendar("no cached token; remote calendar is not authenticated".to_string())
        })?;

        if !token.is_expired() {
            return Ok(token.access_token.clone());
        }

        let refresh_token = match token.refresh_token.clone() {
            Some(rt) => rt,
            None => {
                self.token = None;
                return Err(ValetError::Calendar(
                    "token expired and no refresh token is cached".to_string(),
                ));
            }
        };

        match self.refresh(&refresh_token) {
            Ok(token) => {
                let access = token.access_token.clone();
                self.persist(&token);
                self.token = Some(token);
                Ok(access)
            }
            Err(e) => {
                debug!(error = %e, "token refresh failed");
                self.token = None;
                Err(ValetError::Calendar(format!("token refresh failed: {e}")))
            }
        }
    }

    fn refresh(&self, refresh_token: &str) -> Result<CachedToken> {
        let response = self
            .http
            .post(self.secret.token_uri.as_str())
            .form(&[
                ("client_id", self.secret.client_id.as_str()),
                ("client_secret", self.secret.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()?
            .error_for_status()?;

        let body: RefreshResponse = response.json()?;
        Ok(CachedToken {
            access_token: body.access_token,
            refresh_token: Some(refresh_token.to_string()),
            expires_at: Utc::now() + chrono::Duration::seconds(body.expires_in),
        })
    }

    // Cache write failures are logged, not fatal: the token still works for
    // this process.
    fn persist(&self, token: &CachedToken) {
        let result = serde_json::to_string_pretty(token)
            .map_err(ValetError::from)
            .and_then(|raw| fs::write(&self.token_path, raw).map_err(ValetError::from));
        if let Err(e) = result {
            warn!(path = %self.token_path.display(), error = %e, "failed to persist token cache");
        }
    }
}
