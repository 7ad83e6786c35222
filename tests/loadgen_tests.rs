//! Load generator run against a live server on an ephemeral port.

use std::time::Duration;

use kvcache::loadgen::{self, LoadConfig};
use kvcache::{api::create_router, AppState, Config};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_loadgen_against_live_server() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        db_path: dir.path().join("kv.db").to_string_lossy().into_owned(),
        pool_size: 4,
        cache_capacity: 32,
        ..Config::default()
    };
    let state = AppState::from_config(&config).unwrap();
    let service = state.service.clone();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });

    let report = loadgen::run(LoadConfig {
        host: "127.0.0.1".to_string(),
        port,
        clients: 4,
        duration: Duration::from_millis(500),
        read_ratio: 0.5,
        key_space: 50,
        think_time: Duration::ZERO,
    })
    .await
    .unwrap();

    server.abort();

    let total = report.total();
    assert!(total.requests() > 0);
    // Writes never fail against a healthy server
    assert!(report.writes.requests() > 0);
    assert_eq!(report.writes.failures, 0);
    assert!(report.throughput() > 0.0);
    // Every leased connection came back
    assert_eq!(service.stats().pool.leased, 0);
    assert!(service.stats().cache.entries <= 32);
}
