//! Test Helper Utilities
//!
//! In-process mock of the upstream token and catalog endpoints, bound to an
//! ephemeral localhost port. Counts every request and tracks how many
//! catalog requests are being served at the same time.

#![allow(dead_code)]

use axum::{
    extract::{Form, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use harmony_common::config::{ClientCredentials, TomlConfig};
use harmony_dash::services::{
    token_provider::TOKEN_TTL, Aggregator, ArtistCache, CatalogClient, TokenCache, TokenProvider,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_CLIENT_ID: &str = "test-id";
pub const TEST_CLIENT_SECRET: &str = "test-secret";
/// base64("test-id:test-secret")
pub const EXPECTED_BASIC_AUTH: &str = "Basic dGVzdC1pZDp0ZXN0LXNlY3JldA==";
pub const MOCK_TOKEN: &str = "mock-token";

/// How the mock token endpoint answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    Issue,
    Reject,
    MissingField,
    NotJson,
}

#[derive(Debug, Clone)]
pub struct MockArtist {
    pub id: String,
    pub track_count: usize,
    pub image: Option<String>,
}

pub struct MockState {
    artists: HashMap<String, MockArtist>,
    failing_searches: HashSet<String>,
    malformed_searches: HashSet<String>,
    malformed_top_tracks: HashSet<String>,
    token_mode: TokenMode,
    delay: Duration,
    pub token_requests: AtomicUsize,
    pub search_requests: AtomicUsize,
    pub top_track_requests: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub countries: Mutex<Vec<String>>,
}

/// Increments the in-flight gauge for the lifetime of one catalog request
struct InFlightGuard<'a>(&'a MockState);

impl<'a> InFlightGuard<'a> {
    fn enter(state: &'a MockState) -> Self {
        let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(state)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MockUpstreamBuilder {
    artists: HashMap<String, MockArtist>,
    failing_searches: HashSet<String>,
    malformed_searches: HashSet<String>,
    malformed_top_tracks: HashSet<String>,
    token_mode: TokenMode,
    delay: Duration,
}

impl MockUpstreamBuilder {
    /// Register an artist; its top tracks are named "Track 1" .. "Track n"
    pub fn artist(mut self, name: &str, id: &str, track_count: usize) -> Self {
        self.artists.insert(
            name.to_string(),
            MockArtist {
                id: id.to_string(),
                track_count,
                image: Some(format!("https://img.test/artists/{}.jpg", id)),
            },
        );
        self
    }

    /// Search for this name answers HTTP 500
    pub fn failing_search(mut self, name: &str) -> Self {
        self.failing_searches.insert(name.to_string());
        self
    }

    /// Search for this name answers 200 with no `items` array
    pub fn malformed_search(mut self, name: &str) -> Self {
        self.malformed_searches.insert(name.to_string());
        self
    }

    /// Top tracks for this artist id answer 200 with no `tracks` array
    pub fn malformed_top_tracks(mut self, id: &str) -> Self {
        self.malformed_top_tracks.insert(id.to_string());
        self
    }

    pub fn token_mode(mut self, mode: TokenMode) -> Self {
        self.token_mode = mode;
        self
    }

    /// Delay applied to every catalog response
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn start(self) -> MockUpstream {
        let state = Arc::new(MockState {
            artists: self.artists,
            failing_searches: self.failing_searches,
            malformed_searches: self.malformed_searches,
            malformed_top_tracks: self.malformed_top_tracks,
            token_mode: self.token_mode,
            delay: self.delay,
            token_requests: AtomicUsize::new(0),
            search_requests: AtomicUsize::new(0),
            top_track_requests: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            countries: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/token", post(token_handler))
            .route("/search", get(search_handler))
            .route("/artists/:id/top-tracks", get(top_tracks_handler))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Should bind ephemeral port");
        let addr = listener.local_addr().expect("Should have local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock server failed");
        });

        MockUpstream {
            base_url: format!("http://{}", addr),
            state,
        }
    }
}

pub struct MockUpstream {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockUpstream {
    pub fn builder() -> MockUpstreamBuilder {
        MockUpstreamBuilder {
            artists: HashMap::new(),
            failing_searches: HashSet::new(),
            malformed_searches: HashSet::new(),
            malformed_top_tracks: HashSet::new(),
            token_mode: TokenMode::Issue,
            delay: Duration::ZERO,
        }
    }

    pub fn token_requests(&self) -> usize {
        self.state.token_requests.load(Ordering::SeqCst)
    }

    pub fn search_requests(&self) -> usize {
        self.state.search_requests.load(Ordering::SeqCst)
    }

    pub fn top_track_requests(&self) -> usize {
        self.state.top_track_requests.load(Ordering::SeqCst)
    }

    /// Catalog requests (search + top tracks) combined
    pub fn catalog_requests(&self) -> usize {
        self.search_requests() + self.top_track_requests()
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn countries(&self) -> Vec<String> {
        self.state.countries.lock().unwrap().clone()
    }

    pub fn token_provider(&self) -> TokenProvider {
        self.token_provider_with_cache(Arc::new(TokenCache::new(TOKEN_TTL)))
    }

    pub fn token_provider_with_cache(&self, cache: Arc<TokenCache>) -> TokenProvider {
        TokenProvider::new(credentials(), &self.base_url, cache).expect("Should build token provider")
    }

    pub fn catalog_client(&self) -> CatalogClient {
        CatalogClient::new(&self.base_url, "US", Duration::from_secs(10))
            .expect("Should build catalog client")
    }

    /// Aggregator with fresh caches pointed at this mock
    pub fn aggregator(&self) -> Aggregator {
        self.aggregator_with_cache(Arc::new(ArtistCache::new()))
    }

    pub fn aggregator_with_cache(&self, cache: Arc<ArtistCache>) -> Aggregator {
        Aggregator::new(
            Arc::new(self.token_provider()),
            Arc::new(self.catalog_client()),
            cache,
        )
    }

    /// Config whose endpoints point at this mock
    pub fn config(&self) -> TomlConfig {
        TomlConfig {
            accounts_base_url: self.base_url.clone(),
            api_base_url: self.base_url.clone(),
            ..TomlConfig::default()
        }
    }
}

pub fn credentials() -> ClientCredentials {
    ClientCredentials {
        client_id: TEST_CLIENT_ID.to_string(),
        client_secret: TEST_CLIENT_SECRET.to_string(),
    }
}

fn authorized(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false)
}

fn error_body(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({"error": {"status": status.as_u16(), "message": message}})),
    )
}

async fn token_handler(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, String) {
    state.token_requests.fetch_add(1, Ordering::SeqCst);

    if !authorized(&headers, EXPECTED_BASIC_AUTH) {
        return (StatusCode::UNAUTHORIZED, r#"{"error":"invalid_client"}"#.to_string());
    }
    if form.get("grant_type").map(String::as_str) != Some("client_credentials") {
        return (StatusCode::BAD_REQUEST, r#"{"error":"unsupported_grant_type"}"#.to_string());
    }

    match state.token_mode {
        TokenMode::Issue => (
            StatusCode::OK,
            json!({"access_token": MOCK_TOKEN, "token_type": "Bearer", "expires_in": 3600})
                .to_string(),
        ),
        TokenMode::Reject => (StatusCode::BAD_REQUEST, r#"{"error":"invalid_client"}"#.to_string()),
        TokenMode::MissingField => (
            StatusCode::OK,
            json!({"token_type": "Bearer", "expires_in": 3600}).to_string(),
        ),
        TokenMode::NotJson => (StatusCode::OK, "<html>maintenance</html>".to_string()),
    }
}

async fn search_handler(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    state.search_requests.fetch_add(1, Ordering::SeqCst);
    let _guard = InFlightGuard::enter(&state);
    tokio::time::sleep(state.delay).await;

    if !authorized(&headers, &format!("Bearer {}", MOCK_TOKEN)) {
        return error_body(StatusCode::UNAUTHORIZED, "Invalid access token");
    }
    if params.get("type").map(String::as_str) != Some("artist")
        || params.get("limit").map(String::as_str) != Some("1")
    {
        return error_body(StatusCode::BAD_REQUEST, "Expected type=artist&limit=1");
    }

    let query = params.get("q").cloned().unwrap_or_default();
    if state.failing_searches.contains(&query) {
        return error_body(StatusCode::INTERNAL_SERVER_ERROR, "Upstream exploded");
    }
    if state.malformed_searches.contains(&query) {
        return (StatusCode::OK, Json(json!({"artists": {}})));
    }

    let items = match state.artists.get(&query) {
        Some(artist) => vec![json!({
            "id": artist.id,
            "name": query,
            "images": artist.image.iter().map(|url| json!({"url": url})).collect::<Vec<_>>(),
        })],
        None => vec![],
    };

    (StatusCode::OK, Json(json!({"artists": {"items": items}})))
}

async fn top_tracks_handler(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    state.top_track_requests.fetch_add(1, Ordering::SeqCst);
    let _guard = InFlightGuard::enter(&state);
    tokio::time::sleep(state.delay).await;

    if !authorized(&headers, &format!("Bearer {}", MOCK_TOKEN)) {
        return error_body(StatusCode::UNAUTHORIZED, "Invalid access token");
    }

    let country = params.get("country").cloned().unwrap_or_default();
    state.countries.lock().unwrap().push(country);

    let Some(artist) = state.artists.values().find(|a| a.id == id) else {
        return error_body(StatusCode::NOT_FOUND, "non existing id");
    };
    if state.malformed_top_tracks.contains(&id) {
        return (StatusCode::OK, Json(json!({"items": []})));
    }

    let tracks: Vec<Value> = (1..=artist.track_count)
        .map(|i| {
            json!({
                "id": format!("{}-t{}", artist.id, i),
                "name": format!("Track {}", i),
                "album": {
                    "name": format!("Album {}", i),
                    "images": [{"url": format!("https://img.test/albums/{}-{}.jpg", artist.id, i)}],
                },
            })
        })
        .collect();

    (StatusCode::OK, Json(json!({"tracks": tracks})))
}
