//! API Handlers
//!
//! HTTP request handlers for the cache and content endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::cache::{FileStore, MemoryStore, NullStore, TtlCache};
use crate::config::{Config, StoreBackend};
use crate::error::{CacheError, Result};
use crate::keys::{cache_key, query_qualifier, validate_query, Resource};
use crate::models::{
    validate_key, GetResponse, HealthResponse, InvalidateResponse, SetRequest, SetResponse,
    StatsResponse,
};
use crate::source::{FetchSource, HttpSource};

/// Application state shared across all handlers.
///
/// The cache does its own locking, so handlers share it through a plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Shared TTL cache
    pub cache: Arc<TtlCache>,
    /// Upstream content source for read-through requests
    pub source: Option<Arc<dyn FetchSource>>,
}

impl AppState {
    /// Creates a new AppState with the given cache and no upstream.
    pub fn new(cache: TtlCache) -> Self {
        Self {
            cache: Arc::new(cache),
            source: None,
        }
    }

    /// Attaches the upstream used by `/content`.
    pub fn with_source(mut self, source: Arc<dyn FetchSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens the configured store and, when `upstream_url` is set, an HTTP source.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = match config.backend {
            StoreBackend::Memory => TtlCache::new(MemoryStore::with_quota(config.quota_bytes)),
            StoreBackend::File => TtlCache::new(FileStore::open(&config.cache_dir)?),
            StoreBackend::None => TtlCache::new(NullStore),
        };

        let mut state = Self::new(cache);
        if let Some(url) = &config.upstream_url {
            let source = HttpSource::new(url.as_str(), config.upstream_timeout())?;
            state = state.with_source(Arc::new(source));
        }
        Ok(state)
    }
}

/// Handler for PUT /set
///
/// Stores any JSON value under a key.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.set(&req.key, &req.value);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Returns the cached value, or 404 when it is absent or expired.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    match state.cache.get::<Value>(&key) {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Invalidates a key. Succeeds whether or not anything was cached.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.invalidate(&key);

    Ok(Json(InvalidateResponse::new(key)))
}

/// Handler for GET /content/:resource
///
/// Serves a resource listing through the cache, fetching it from the
/// upstream on a miss. Only the query parameters the resource accepts are
/// allowed. Upstream failures are returned and not cached.
pub async fn content_handler(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Result<Json<Value>> {
    let resource: Resource = resource.parse()?;
    validate_query(resource, &query)?;

    let source = state.source.as_ref().ok_or_else(|| {
        CacheError::SourceUnavailable("no upstream content service configured".to_string())
    })?;

    let key = cache_key(resource, query_qualifier(&query).as_deref());
    if let Some(error_msg) = validate_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let value = state
        .cache
        .get_or_compute(&key, || {
            info!(%resource, key = %key, "cache miss, fetching from upstream");
            source.fetch(resource, &query)
        })
        .await?;

    debug!(key = %key, "content served");
    Ok(Json(value))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats();
    Json(StatsResponse::new(&stats, state.cache.ttl_ms()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
