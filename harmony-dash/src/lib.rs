//! harmony-dash library interface
//!
//! Token provider, catalog client, artist cache and the bounded fan-out
//! aggregator behind the artist dashboard. Rendering, routing and sessions
//! belong to the caller; this crate only turns artist names into records.

pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{DashError, DashResult};
pub use crate::models::{ArtistRecord, TrackSummary};
pub use crate::services::Aggregator;
