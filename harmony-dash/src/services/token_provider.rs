//! Client-credentials token provider
//!
//! Issues `POST {accounts_base}/api/token` with a Basic auth header and
//! caches the resulting bearer token for one hour in an injected `TtlCache`.
//!
//! Concurrent callers that all miss the cache each request a fresh token.
//! The cache write is idempotent (an equivalent token overwrites the old
//! one), so no single-flight deduplication is performed.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use harmony_common::config::{is_valid_secret, ClientCredentials};
use harmony_common::TtlCache;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

const TOKEN_PATH: &str = "/api/token";
/// Key under which the current credential is cached
pub const TOKEN_CACHE_KEY: &str = "catalog_token";
const TOKEN_TIMEOUT_SECS: u64 = 10;

/// How long an issued token is reused before a new one is requested
pub const TOKEN_TTL: Duration = Duration::from_secs(3600);

/// Cache holding the current bearer credential
pub type TokenCache = TtlCache<&'static str, Credential>;

/// Token issuance errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Token endpoint rejected request {0}: {1}")]
    Rejected(u16, String),

    #[error("Malformed token response: {0}")]
    Malformed(String),

    #[error("Invalid client credentials: {0}")]
    InvalidCredentials(String),
}

/// Bearer credential for the catalog API
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    value: String,
    expires_at: Instant,
}

impl Credential {
    pub fn new(value: impl Into<String>, expires_at: Instant) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Build the `Authorization` header value for the client-credentials grant
pub fn basic_auth_header(credentials: &ClientCredentials) -> String {
    let raw = format!("{}:{}", credentials.client_id, credentials.client_secret);
    format!("Basic {}", BASE64.encode(raw.as_bytes()))
}

/// Obtains and caches bearer credentials
pub struct TokenProvider {
    http_client: reqwest::Client,
    token_url: String,
    credentials: ClientCredentials,
    cache: Arc<TokenCache>,
}

impl TokenProvider {
    pub fn new(
        credentials: ClientCredentials,
        accounts_base_url: &str,
        cache: Arc<TokenCache>,
    ) -> Result<Self, TokenError> {
        if !is_valid_secret(&credentials.client_id) || !is_valid_secret(&credentials.client_secret) {
            return Err(TokenError::InvalidCredentials(
                "client id and secret must not be blank".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TOKEN_TIMEOUT_SECS))
            .build()
            .map_err(|e| TokenError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            token_url: format!("{}{}", accounts_base_url.trim_end_matches('/'), TOKEN_PATH),
            credentials,
            cache,
        })
    }

    /// Return the cached credential, requesting a new one on miss
    ///
    /// A cache hit performs no network call.
    pub async fn get_token(&self) -> Result<Credential, TokenError> {
        if let Some(credential) = self.cache.get(&TOKEN_CACHE_KEY).await {
            tracing::debug!("Using cached bearer token");
            return Ok(credential);
        }

        let credential = self.request_token().await?;
        self.cache
            .insert_with_ttl(TOKEN_CACHE_KEY, credential.clone(), TOKEN_TTL)
            .await;

        Ok(credential)
    }

    /// Drop the cached credential so the next call requests a new one
    pub async fn invalidate(&self) {
        if self.cache.remove(&TOKEN_CACHE_KEY).await.is_some() {
            tracing::info!("Cached bearer token invalidated");
        }
    }

    async fn request_token(&self) -> Result<Credential, TokenError> {
        tracing::debug!(url = %self.token_url, "Requesting bearer token");

        let response = self
            .http_client
            .post(&self.token_url)
            .header(reqwest::header::AUTHORIZATION, basic_auth_header(&self.credentials))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| TokenError::NetworkError(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Token request rejected");
            return Err(TokenError::Rejected(status.as_u16(), error_text));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TokenError::NetworkError(e.to_string()))?;
        let parsed: TokenResponse =
            serde_json::from_slice(&body).map_err(|e| TokenError::Malformed(e.to_string()))?;

        let access_token = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| TokenError::Malformed("missing access_token".to_string()))?;

        tracing::info!("Obtained new bearer token");

        Ok(Credential::new(access_token, Instant::now() + TOKEN_TTL))
    }
}
