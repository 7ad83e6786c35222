//! kvcache - A cache-aside key-value server
//!
//! A bounded LRU cache in front of a SQLite table reached through a
//! fixed-size connection pool, exposed over HTTP.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod loadgen;
pub mod models;
pub mod service;

pub use api::AppState;
pub use config::Config;
pub use error::{KvError, Result};
pub use service::KvService;
