//! Service components for the artist dashboard

pub mod aggregator;
pub mod artist_cache;
pub mod catalog_client;
pub mod token_provider;

pub use aggregator::Aggregator;
pub use artist_cache::ArtistCache;
pub use catalog_client::{CatalogClient, CatalogError};
pub use token_provider::{Credential, TokenCache, TokenError, TokenProvider};
