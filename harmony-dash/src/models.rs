//! Data model for the artist dashboard
//!
//! Upstream response shapes (`ArtistSummary`, `RawTrack`, envelopes) are
//! deserialized leniently where the catalog may omit data (missing image
//! lists are treated as empty), but the envelopes themselves are strict: a
//! search body without `artists.items` or a top-tracks body without `tracks`
//! fails to parse.
//! `ArtistRecord` / `TrackSummary` are what the rendering layer consumes.

use serde::{Deserialize, Serialize};

/// Image reference as returned by the catalog API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// First hit of an artist search (`artists.items[0]`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArtistSummary {
    /// Catalog artist id, used for the top-tracks lookup
    pub id: String,
    /// Canonical artist name according to the catalog
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl ArtistSummary {
    pub fn primary_image_url(&self) -> Option<String> {
        self.images.first().map(|i| i.url.clone())
    }
}

/// Album attached to a top track
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawAlbum {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// Track object from the top-tracks endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawTrack {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub album: RawAlbum,
}

/// `GET /search` response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub artists: ArtistPage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistPage {
    pub items: Vec<ArtistSummary>,
}

/// `GET /artists/{id}/top-tracks` response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct TopTracksResponse {
    pub tracks: Vec<RawTrack>,
}

/// One track as shown on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub name: String,
    pub album_image_url: Option<String>,
}

impl From<&RawTrack> for TrackSummary {
    fn from(track: &RawTrack) -> Self {
        Self {
            name: track.name.clone(),
            album_image_url: track.album.images.first().map(|i| i.url.clone()),
        }
    }
}

/// One artist card on the dashboard
///
/// `name` is the display name that was queried (and the cache key), not the
/// catalog's canonical spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRecord {
    pub name: String,
    pub image_url: Option<String>,
    pub top_tracks: Vec<TrackSummary>,
}

impl ArtistRecord {
    /// Assemble a record from upstream data, keeping at most `limit` tracks
    /// in the order the catalog returned them
    pub fn assemble(name: &str, artist: &ArtistSummary, tracks: &[RawTrack], limit: usize) -> Self {
        Self {
            name: name.to_string(),
            image_url: artist.primary_image_url(),
            top_tracks: tracks.iter().take(limit).map(TrackSummary::from).collect(),
        }
    }
}
