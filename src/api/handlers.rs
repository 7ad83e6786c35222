//! API Handlers
//!
//! HTTP request handlers translating routes into service operations.
//!
//! Service calls block on the connection pool and on SQLite, so every handler
//! runs its call on tokio's blocking thread pool.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;

use crate::config::Config;
use crate::db::{Connection, SqliteConnection};
use crate::error::{KvError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, PutRequest, PutResponse, StatsResponse,
};
use crate::service::KvService;

/// Application state shared across all handlers.
pub struct AppState<C: Connection> {
    pub service: Arc<KvService<C>>,
}

impl<C: Connection> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<C: Connection> AppState<C> {
    pub fn new(service: KvService<C>) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

impl AppState<SqliteConnection> {
    /// Opens the SQLite-backed service described by the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(KvService::from_config(config)?))
    }
}

async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| KvError::Internal(format!("worker task failed: {}", e)))?
}

/// Handler for POST /kv
///
/// Creates or overwrites a key. Responds 201 once the backend has the value.
pub async fn put_handler<C: Connection + 'static>(
    State(state): State<AppState<C>>,
    Json(req): Json<PutRequest>,
) -> Result<(StatusCode, Json<PutResponse>)> {
    let (key, value) = req.into_pair()?;

    let service = state.service.clone();
    let stored_key = key.clone();
    run_blocking(move || service.put(Bytes::from(stored_key), Bytes::from(value))).await?;

    Ok((StatusCode::CREATED, Json(PutResponse::new(key))))
}

/// Handler for GET /kv/:key
pub async fn get_handler<C: Connection + 'static>(
    State(state): State<AppState<C>>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let service = state.service.clone();
    let lookup_key = key.clone();
    let found = run_blocking(move || service.get(lookup_key.as_bytes())).await?;

    match found {
        Some(value) => Ok(Json(GetResponse::new(key, &value))),
        None => Err(KvError::NotFound(key)),
    }
}

/// Handler for DELETE /kv/:key
///
/// Succeeds whether or not the key existed.
pub async fn delete_handler<C: Connection + 'static>(
    State(state): State<AppState<C>>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let service = state.service.clone();
    let delete_key = key.clone();
    run_blocking(move || service.delete(delete_key.as_bytes())).await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /stats
pub async fn stats_handler<C: Connection + 'static>(
    State(state): State<AppState<C>>,
) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.service.stats()))
}

/// Handler for GET /health
pub async fn health_handler<C: Connection + 'static>(
    State(state): State<AppState<C>>,
) -> Json<HealthResponse> {
    Json(HealthResponse::new(state.service.pool().is_closed()))
}
