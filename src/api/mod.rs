//! API Module
//!
//! HTTP handlers and routing for the cache gateway.
//!
//! # Endpoints
//! - `PUT /set` - Cache a JSON value under a key
//! - `GET /get/:key` - Retrieve a cached value
//! - `DELETE /del/:key` - Invalidate a key
//! - `GET /content/:resource` - Read-through listing from the upstream
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
