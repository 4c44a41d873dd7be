//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_QUOTA_BYTES;

/// Which persistent store backs the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process map, lost on restart
    Memory,
    /// One file per key under `cache_dir`
    File,
    /// No store: the cache always misses
    None,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "file" => Ok(StoreBackend::File),
            "none" => Ok(StoreBackend::None),
            other => Err(format!("unknown cache backend: {}", other)),
        }
    }
}

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// The entry TTL is fixed and deliberately absent here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store backing the cache
    pub backend: StoreBackend,
    /// Root directory for the file backend
    pub cache_dir: PathBuf,
    /// Byte quota for the memory backend
    pub quota_bytes: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Base URL of the content backend, if any
    pub upstream_url: Option<String>,
    /// Timeout for upstream requests in seconds
    pub upstream_timeout: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - `memory`, `file` or `none` (default: memory)
    /// - `CACHE_DIR` - File backend directory (default: .campus-cache)
    /// - `CACHE_QUOTA_BYTES` - Memory backend quota (default: 5 MiB)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `UPSTREAM_URL` - Content backend base URL (default: unset)
    /// - `UPSTREAM_TIMEOUT_SECS` - Upstream request timeout (default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: parse_var("CACHE_BACKEND").unwrap_or(defaults.backend),
            cache_dir: env::var("CACHE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            quota_bytes: parse_var("CACHE_QUOTA_BYTES").unwrap_or(defaults.quota_bytes),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            upstream_url: env::var("UPSTREAM_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            upstream_timeout: parse_var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or(defaults.upstream_timeout),
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            cache_dir: PathBuf::from(".campus-cache"),
            quota_bytes: DEFAULT_QUOTA_BYTES,
            server_port: 3000,
            upstream_url: None,
            upstream_timeout: 10,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
