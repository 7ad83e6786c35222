//! API Routes
//!
//! Configures the Axum router with all key-value endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_handler, health_handler, put_handler, stats_handler, AppState,
};
use crate::db::Connection;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /kv` - Create or update a key
/// - `GET /kv/:key` - Read a key
/// - `DELETE /kv/:key` - Delete a key
/// - `GET /stats` - Cache and pool statistics
/// - `GET /health` - Health check
pub fn create_router<C: Connection + 'static>(state: AppState<C>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/kv", post(put_handler::<C>))
        .route("/kv/:key", get(get_handler::<C>).delete(delete_handler::<C>))
        .route("/stats", get(stats_handler::<C>))
        .route("/health", get(health_handler::<C>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
