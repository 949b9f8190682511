//! Error types for harmony-dash
//!
//! `ArtistNotFound` never reaches this level: the aggregator omits the
//! artist instead. Everything here aborts the aggregation run.

use thiserror::Error;

use crate::services::catalog_client::CatalogError;
use crate::services::token_provider::TokenError;

/// Aggregation run error
#[derive(Debug, Error)]
pub enum DashError {
    /// Bearer token could not be obtained
    #[error("Token request failed: {0}")]
    Token(#[from] TokenError),

    /// Search or top-tracks call failed for one artist
    #[error("Catalog request for '{artist}' failed: {source}")]
    Catalog {
        artist: String,
        #[source]
        source: CatalogError,
    },

    /// HTTP client could not be constructed
    #[error("Client setup failed: {0}")]
    Setup(String),

    /// harmony-common error (configuration)
    #[error("Common error: {0}")]
    Common(#[from] harmony_common::Error),
}

/// Result type for aggregation runs
pub type DashResult<T> = Result<T, DashError>;
