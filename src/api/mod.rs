//! API Module
//!
//! HTTP handlers and routing for the key-value REST API.
//!
//! # Endpoints
//! - `POST /kv` - Create or update a key (`{"key": ..., "value": ...}`)
//! - `GET /kv/:key` - Read a key
//! - `DELETE /kv/:key` - Delete a key
//! - `GET /stats` - Cache and pool statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
