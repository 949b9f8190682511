//! Music catalog API client
//!
//! Two read-only queries, each exactly one outbound request with no retry:
//! - artist search (`GET /search?type=artist&limit=1`)
//! - artist top tracks (`GET /artists/{id}/top-tracks?country=..`)

use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

use crate::models::{ArtistSummary, RawTrack, SearchResponse, TopTracksResponse};
use crate::services::token_provider::Credential;

/// Catalog client errors
///
/// `ArtistNotFound` is an expected outcome (empty search result); every
/// other variant is an upstream failure.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Artist not found: {0}")]
    ArtistNotFound(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::ArtistNotFound(_))
    }
}

/// Catalog API client
pub struct CatalogClient {
    http_client: reqwest::Client,
    api_base_url: String,
    market: String,
}

impl CatalogClient {
    pub fn new(api_base_url: &str, market: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            market: market.to_string(),
        })
    }

    /// Search for an artist by display name, returning the top hit
    pub async fn search_artist(
        &self,
        token: &Credential,
        name: &str,
    ) -> Result<ArtistSummary, CatalogError> {
        let url = format!("{}/search", self.api_base_url);
        let query = [("q", name), ("type", "artist"), ("limit", "1")];

        tracing::debug!(artist = %name, "Searching catalog for artist");

        let response: SearchResponse = self.get_json(&url, &query, token).await?;

        match response.artists.items.into_iter().next() {
            Some(artist) => {
                tracing::debug!(artist = %name, artist_id = %artist.id, "Artist search hit");
                Ok(artist)
            }
            None => Err(CatalogError::ArtistNotFound(name.to_string())),
        }
    }

    /// Top tracks for an artist in the configured market, in upstream order
    pub async fn top_tracks(
        &self,
        token: &Credential,
        artist_id: &str,
    ) -> Result<Vec<RawTrack>, CatalogError> {
        let url = format!("{}/artists/{}/top-tracks", self.api_base_url, artist_id);
        let query = [("country", self.market.as_str())];

        tracing::debug!(artist_id = %artist_id, "Fetching top tracks");

        let response: TopTracksResponse = self.get_json(&url, &query, token).await?;
        Ok(response.tracks)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        token: &Credential,
    ) -> Result<T, CatalogError> {
        let response = self
            .http_client
            .get(url)
            .query(query)
            .bearer_auth(token.value())
            .send()
            .await
            .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))
    }
}
