//! # Harmony Common Library
//!
//! Shared code for the Harmony dashboard crates:
//! - Error and result types
//! - TOML / environment configuration loading
//! - TTL cache service shared by the token and artist caches

pub mod cache;
pub mod config;
pub mod error;

pub use cache::TtlCache;
pub use error::{Error, Result};
