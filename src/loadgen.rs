//! Load Generator
//!
//! Drives a running server with a configurable read/write mix from many
//! concurrent clients and reports throughput and latency per operation kind.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{ensure, Context};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::StatusCode;
use serde_json::json;
use tracing::debug;

/// Per-request timeout applied by every client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// == Load Config ==
#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub host: String,
    pub port: u16,
    /// Number of concurrent clients
    pub clients: usize,
    /// How long each client keeps issuing requests
    pub duration: Duration,
    /// Probability that an operation is a read, in [0, 1]
    pub read_ratio: f64,
    /// Keys are drawn uniformly from `key1..=key<key_space>`
    pub key_space: u32,
    /// Pause between consecutive requests of one client
    pub think_time: Duration,
}

impl LoadConfig {
    fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.clients > 0, "clients must be at least 1");
        ensure!(self.key_space > 0, "key space must be at least 1");
        ensure!(
            (0.0..=1.0).contains(&self.read_ratio),
            "read ratio must be between 0 and 1, got {}",
            self.read_ratio
        );
        Ok(())
    }

    fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Read,
    Write,
}

/// Draws the next operation kind for the configured read ratio.
pub fn pick_op<R: Rng>(rng: &mut R, read_ratio: f64) -> OpKind {
    if rng.gen::<f64>() < read_ratio {
        OpKind::Read
    } else {
        OpKind::Write
    }
}

// == Counters ==
#[derive(Debug, Default)]
struct OpCounters {
    successes: AtomicU64,
    failures: AtomicU64,
    latency_us: AtomicU64,
}

impl OpCounters {
    fn record(&self, ok: bool, latency: Duration) {
        if ok {
            self.successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        // Saturate instead of wrapping the running total
        let _ = self
            .latency_us
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |total| {
                Some(total.saturating_add(micros))
            });
    }

    fn summary(&self) -> OpSummary {
        OpSummary {
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            total_latency: Duration::from_micros(self.latency_us.load(Ordering::Relaxed)),
        }
    }
}

#[derive(Debug, Default)]
struct LoadStats {
    reads: OpCounters,
    writes: OpCounters,
}

impl LoadStats {
    fn counters(&self, op: OpKind) -> &OpCounters {
        match op {
            OpKind::Read => &self.reads,
            OpKind::Write => &self.writes,
        }
    }
}

// == Report ==
/// Aggregate outcome of one operation kind.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OpSummary {
    pub successes: u64,
    pub failures: u64,
    pub total_latency: Duration,
}

impl OpSummary {
    pub fn requests(&self) -> u64 {
        self.successes + self.failures
    }

    pub fn avg_latency_ms(&self) -> f64 {
        match self.requests() {
            0 => 0.0,
            n => self.total_latency.as_secs_f64() * 1000.0 / n as f64,
        }
    }

    fn merge(&self, other: &OpSummary) -> OpSummary {
        OpSummary {
            successes: self.successes + other.successes,
            failures: self.failures + other.failures,
            total_latency: self.total_latency + other.total_latency,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub elapsed: Duration,
    pub clients: usize,
    pub reads: OpSummary,
    pub writes: OpSummary,
}

impl LoadReport {
    pub fn total(&self) -> OpSummary {
        self.reads.merge(&self.writes)
    }

    /// Requests per second over the whole run.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.total().requests() as f64 / secs
        }
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total();
        writeln!(f, "RESULTS:")?;
        writeln!(f, " Total time (s): {:.3}", self.elapsed.as_secs_f64())?;
        writeln!(f, " Clients: {}", self.clients)?;
        writeln!(
            f,
            " Requests: {}  Success: {} Fail: {}",
            total.requests(),
            total.successes,
            total.failures
        )?;
        writeln!(f, " Throughput (req/s): {:.1}", self.throughput())?;
        writeln!(f, " Avg latency (ms): {:.3}", total.avg_latency_ms())?;
        writeln!(
            f,
            " Reads: {} (avg {:.3} ms)  Writes: {} (avg {:.3} ms)",
            self.reads.requests(),
            self.reads.avg_latency_ms(),
            self.writes.requests(),
            self.writes.avg_latency_ms()
        )
    }
}

// == Run ==
/// Runs `config.clients` concurrent clients until the deadline and collects the results.
pub async fn run(config: LoadConfig) -> anyhow::Result<LoadReport> {
    config.validate()?;

    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;
    let config = Arc::new(config);
    let stats = Arc::new(LoadStats::default());

    let started = Instant::now();
    let deadline = started + config.duration;

    let handles: Vec<_> = (0..config.clients)
        .map(|id| {
            tokio::spawn(run_client(
                id,
                client.clone(),
                config.clone(),
                stats.clone(),
                deadline,
            ))
        })
        .collect();

    for handle in handles {
        handle.await.context("client task panicked")?;
    }

    Ok(LoadReport {
        elapsed: started.elapsed(),
        clients: config.clients,
        reads: stats.reads.summary(),
        writes: stats.writes.summary(),
    })
}

async fn run_client(
    id: usize,
    client: reqwest::Client,
    config: Arc<LoadConfig>,
    stats: Arc<LoadStats>,
    deadline: Instant,
) {
    let mut rng = StdRng::from_entropy();
    let base = config.base_url();

    while Instant::now() < deadline {
        let op = pick_op(&mut rng, config.read_ratio);
        let n = rng.gen_range(1..=config.key_space);
        let key = format!("key{}", n);

        let started = Instant::now();
        let ok = match op {
            OpKind::Read => client
                .get(format!("{}/kv/{}", base, key))
                .send()
                .await
                .map(|resp| resp.status() == StatusCode::OK),
            OpKind::Write => client
                .post(format!("{}/kv", base))
                .json(&json!({
                    "key": key,
                    "value": format!("value_from_client_{}_{}", id, n),
                }))
                .send()
                .await
                .map(|resp| matches!(resp.status(), StatusCode::OK | StatusCode::CREATED)),
        };

        let ok = ok.unwrap_or_else(|err| {
            debug!("client {} request failed: {}", id, err);
            false
        });
        stats.counters(op).record(ok, started.elapsed());

        if !config.think_time.is_zero() {
            tokio::time::sleep(config.think_time).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LoadConfig {
        LoadConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            clients: 4,
            duration: Duration::from_secs(1),
            read_ratio: 0.9,
            key_space: 1000,
            think_time: Duration::ZERO,
        }
    }

    #[test]
    fn test_validate() {
        assert!(config().validate().is_ok());
        assert!(LoadConfig { clients: 0, ..config() }.validate().is_err());
        assert!(LoadConfig { key_space: 0, ..config() }.validate().is_err());
        assert!(LoadConfig { read_ratio: 1.5, ..config() }.validate().is_err());
    }

    #[test]
    fn test_pick_op_extremes() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(pick_op(&mut rng, 1.0), OpKind::Read);
            assert_eq!(pick_op(&mut rng, 0.0), OpKind::Write);
        }
    }

    #[test]
    fn test_report_math() {
        let report = LoadReport {
            elapsed: Duration::from_secs(2),
            clients: 2,
            reads: OpSummary {
                successes: 6,
                failures: 2,
                total_latency: Duration::from_millis(16),
            },
            writes: OpSummary {
                successes: 2,
                failures: 0,
                total_latency: Duration::from_millis(4),
            },
        };

        assert_eq!(report.total().requests(), 10);
        assert_eq!(report.throughput(), 5.0);
        assert!((report.reads.avg_latency_ms() - 2.0).abs() < 1e-9);
        assert!((report.total().avg_latency_ms() - 2.0).abs() < 1e-9);

        let text = report.to_string();
        assert!(text.contains("Requests: 10  Success: 8 Fail: 2"));
    }

    #[test]
    fn test_latency_total_saturates() {
        let counters = OpCounters::default();
        counters.record(true, Duration::MAX);
        counters.record(false, Duration::from_millis(1));

        let summary = counters.summary();
        assert_eq!(summary.requests(), 2);
        assert_eq!(summary.total_latency, Duration::from_micros(u64::MAX));
    }

    #[test]
    fn test_empty_summary_latency() {
        assert_eq!(OpSummary::default().avg_latency_ms(), 0.0);
    }
}
