//! Dashboard aggregator
//!
//! Fans per-artist work out over a bounded pool and collects the records.
//!
//! # Unit of work (one per artist name)
//! 1. Artist cache hit → return the cached record, no network access
//! 2. Search the catalog; no hit → omit the artist
//! 3. Fetch top tracks, keep the first three in upstream order
//! 4. Store the record in the artist cache and return it
//!
//! # Run semantics
//! - One bearer token is obtained per run and shared by every unit
//! - At most `concurrency` units are in flight (default 5)
//! - Results come back in completion order, not input order
//! - The first upstream error aborts the run; units still in flight are
//!   dropped with the pool

use futures::stream::{self, StreamExt};
use harmony_common::config::{ClientCredentials, TomlConfig};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::error::{DashError, DashResult};
use crate::models::ArtistRecord;
use crate::services::artist_cache::ArtistCache;
use crate::services::catalog_client::{CatalogClient, CatalogError};
use crate::services::token_provider::{Credential, TokenCache, TokenProvider, TOKEN_TTL};

/// Width of the per-run fetch pool
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Tracks kept per artist
pub const TOP_TRACK_LIMIT: usize = 3;

/// Result of one unit of work
#[derive(Debug)]
enum UnitOutcome {
    Cached(ArtistRecord),
    Fetched(ArtistRecord),
    Omitted,
}

/// Aggregates artist records for the dashboard
pub struct Aggregator {
    token_provider: Arc<TokenProvider>,
    catalog: Arc<CatalogClient>,
    cache: Arc<ArtistCache>,
    concurrency: usize,
    default_artists: Vec<String>,
}

impl Aggregator {
    pub fn new(
        token_provider: Arc<TokenProvider>,
        catalog: Arc<CatalogClient>,
        cache: Arc<ArtistCache>,
    ) -> Self {
        Self {
            token_provider,
            catalog,
            cache,
            concurrency: DEFAULT_CONCURRENCY,
            default_artists: Vec::new(),
        }
    }

    /// Override the pool width (values below 1 are clamped to 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_default_artists(mut self, artists: Vec<String>) -> Self {
        self.default_artists = artists;
        self
    }

    /// Wire up token provider, catalog client and caches from configuration
    ///
    /// Call once per process; the caches live as long as the aggregator.
    pub fn from_config(config: &TomlConfig, credentials: ClientCredentials) -> DashResult<Self> {
        config.validate()?;

        let token_cache = Arc::new(TokenCache::new(TOKEN_TTL));
        let token_provider = TokenProvider::new(credentials, &config.accounts_base_url, token_cache)?;
        let catalog = CatalogClient::new(
            &config.api_base_url,
            &config.market,
            config.request_timeout(),
        )
        .map_err(|e| DashError::Setup(e.to_string()))?;
        let cache = ArtistCache::with_ttl(config.cache_ttl());

        Ok(Self::new(Arc::new(token_provider), Arc::new(catalog), Arc::new(cache))
            .with_concurrency(config.concurrency)
            .with_default_artists(config.artists.clone()))
    }

    pub fn token_provider(&self) -> &Arc<TokenProvider> {
        &self.token_provider
    }

    pub fn cache(&self) -> &Arc<ArtistCache> {
        &self.cache
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `fetch_all` over the configured default artist list
    pub async fn fetch_dashboard(&self) -> DashResult<Vec<ArtistRecord>> {
        self.fetch_all(self.default_artists.as_slice()).await
    }

    /// Fetch records for every name, in completion order
    ///
    /// Artists missing from the catalog are omitted. Any other upstream
    /// failure aborts the whole run.
    pub async fn fetch_all<S: AsRef<str>>(&self, names: &[S]) -> DashResult<Vec<ArtistRecord>> {
        let run_id = Uuid::new_v4();
        let start_time = Instant::now();

        tracing::info!(
            run_id = %run_id,
            artists = names.len(),
            concurrency = self.concurrency,
            "Starting dashboard aggregation"
        );

        let token = self.token_provider.get_token().await?;

        let unit_futures: Vec<_> = names
            .iter()
            .map(|name| self.fetch_artist(run_id, name.as_ref(), &token))
            .collect();
        let mut units = stream::iter(unit_futures).buffer_unordered(self.concurrency);

        let mut records = Vec::with_capacity(names.len());
        let (mut cached, mut fetched, mut omitted) = (0usize, 0usize, 0usize);

        while let Some(outcome) = units.next().await {
            match outcome {
                Ok(UnitOutcome::Cached(record)) => {
                    cached += 1;
                    records.push(record);
                }
                Ok(UnitOutcome::Fetched(record)) => {
                    fetched += 1;
                    records.push(record);
                }
                Ok(UnitOutcome::Omitted) => omitted += 1,
                Err(e) => {
                    tracing::error!(
                        run_id = %run_id,
                        error = %e,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Dashboard aggregation aborted"
                    );
                    return Err(e);
                }
            }
        }

        tracing::info!(
            run_id = %run_id,
            records = records.len(),
            cached,
            fetched,
            omitted,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Dashboard aggregation completed"
        );

        Ok(records)
    }

    async fn fetch_artist(
        &self,
        run_id: Uuid,
        name: &str,
        token: &Credential,
    ) -> DashResult<UnitOutcome> {
        if let Some(record) = self.cache.get(name).await {
            tracing::debug!(run_id = %run_id, artist = %name, "Artist cache hit");
            return Ok(UnitOutcome::Cached(record));
        }

        let artist = match self.catalog.search_artist(token, name).await {
            Ok(artist) => artist,
            Err(CatalogError::ArtistNotFound(_)) => {
                tracing::info!(run_id = %run_id, artist = %name, "No artist with this name in catalog, skipping");
                return Ok(UnitOutcome::Omitted);
            }
            Err(source) => {
                return Err(DashError::Catalog {
                    artist: name.to_string(),
                    source,
                })
            }
        };

        let tracks = self
            .catalog
            .top_tracks(token, &artist.id)
            .await
            .map_err(|source| DashError::Catalog {
                artist: name.to_string(),
                source,
            })?;

        let record = ArtistRecord::assemble(name, &artist, &tracks, TOP_TRACK_LIMIT);
        self.cache.put(name, record.clone()).await;

        tracing::debug!(
            run_id = %run_id,
            artist = %name,
            tracks = record.top_tracks.len(),
            "Fetched artist from catalog"
        );

        Ok(UnitOutcome::Fetched(record))
    }
}
