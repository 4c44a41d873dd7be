//! Campus Cache - read-through TTL cache for the association site
//!
//! Caches content listings (partners, lecturers, events, gallery, ...) as
//! JSON envelopes in a persistent key-value store, with a fixed one-hour TTL
//! and lazy expiry, and serves them through a small HTTP gateway.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod keys;
pub mod models;
pub mod source;

pub use api::AppState;
pub use cache::{KvStore, TtlCache};
pub use config::Config;
pub use source::FetchSource;
