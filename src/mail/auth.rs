//! OAuth token lifecycle for the Gmail adapter.
//!
//! One token file represents the authenticated identity. The file is an
//! opaque JSON blob refreshed in place when the access token expires.
//! Token state and the file write sit behind a single async mutex, so a
//! refresh is single-flight: concurrent requests either perform the one
//! refresh or observe its result, never racing writes to the file.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::{GMAIL_SCOPES, GoogleConfig};
use crate::error::AuthError;

/// Google's OAuth consent endpoint.
pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
/// Google's token endpoint.
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the recorded expiry to absorb clock skew.
const EXPIRY_SLACK_SECS: i64 = 30;

/// Persisted token material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenState {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl TokenState {
    fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_SLACK_SECS) >= self.expires_at
    }
}

/// Wire format of Google's token endpoint responses.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Token store — loads, refreshes, and persists the OAuth token file.
pub struct TokenStore {
    google: GoogleConfig,
    http: reqwest::Client,
    token_url: String,
    state: Mutex<Option<TokenState>>,
}

impl TokenStore {
    pub fn new(google: GoogleConfig, http: reqwest::Client) -> Self {
        Self {
            google,
            http,
            token_url: TOKEN_URL.to_string(),
            state: Mutex::new(None),
        }
    }

    /// Override the token endpoint (tests, alternate deployments).
    pub fn with_token_url(google: GoogleConfig, http: reqwest::Client, token_url: &str) -> Self {
        Self {
            token_url: token_url.to_string(),
            ..Self::new(google, http)
        }
    }

    /// Build the consent URL the user is redirected to at login.
    pub fn authorize_url(&self, redirect_uri: &str) -> String {
        let mut url = reqwest::Url::parse(AUTH_URL).expect("constant URL parses");
        url.query_pairs_mut()
            .append_pair("client_id", &self.google.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &GMAIL_SCOPES.join(" "))
            .append_pair("access_type", "offline")
            .append_pair("include_granted_scopes", "true");
        url.into()
    }

    /// Exchange an authorization code for tokens and persist them.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<(), AuthError> {
        use secrecy::ExposeSecret;

        let mut guard = self.state.lock().await;

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", &self.google.client_id),
                ("client_secret", self.google.client_secret.expose_secret()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Exchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Exchange(format!("{status}: {body}")));
        }

        let parsed: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Exchange(format!("malformed token response: {e}")))?;

        let state = TokenState {
            access_token: parsed.access_token,
            refresh_token: parsed.refresh_token,
            expires_at: Utc::now() + Duration::seconds(parsed.expires_in),
        };
        self.persist(&state).await?;
        tracing::info!("OAuth code exchanged, token persisted");
        *guard = Some(state);
        Ok(())
    }

    /// Return a valid access token, refreshing and re-persisting if expired.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let mut guard = self.state.lock().await;

        // Lazy-load from the token file on first use after startup.
        if guard.is_none() {
            *guard = self.read_token_file().await?;
        }
        let Some(state) = guard.as_mut() else {
            return Err(AuthError::NotAuthenticated);
        };

        if state.is_expired() {
            let refresh_token = state
                .refresh_token
                .clone()
                .ok_or(AuthError::RefreshUnavailable)?;
            let refreshed = self.refresh(&refresh_token).await?;

            state.access_token = refreshed.access_token;
            state.expires_at = Utc::now() + Duration::seconds(refreshed.expires_in);
            if let Some(rotated) = refreshed.refresh_token {
                state.refresh_token = Some(rotated);
            }
            let snapshot = state.clone();
            self.persist(&snapshot).await?;
            tracing::info!("Access token refreshed in place");
        }

        Ok(state.access_token.clone())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenEndpointResponse, AuthError> {
        use secrecy::ExposeSecret;

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.google.client_id.as_str()),
                ("client_secret", self.google.client_secret.expose_secret()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Refresh(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Refresh(format!("{status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Refresh(format!("malformed token response: {e}")))
    }

    async fn read_token_file(&self) -> Result<Option<TokenState>, AuthError> {
        let path = &self.google.token_path;
        if !path.exists() {
            return Ok(None);
        }
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn persist(&self, state: &TokenState) -> Result<(), AuthError> {
        let path = &self.google.token_path;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let serialized = serde_json::to_string_pretty(state)?;
        tokio::fs::write(path, serialized).await?;
        Ok(())
    }
}
