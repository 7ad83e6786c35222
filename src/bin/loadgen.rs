use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kvcache::loadgen::{self, LoadConfig};

#[derive(Parser)]
#[command(name = "kvcache-loadgen")]
#[command(about = "Drive a kvcache server with a read/write mix and report latency", long_about = None)]
struct Args {
    /// Server host
    #[arg(default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(default_value = "8080")]
    port: u16,

    /// Number of concurrent clients
    #[arg(short, long, default_value = "50")]
    clients: usize,

    /// Run time in seconds
    #[arg(short, long, default_value = "60")]
    duration: u64,

    /// Fraction of operations that are reads
    #[arg(short, long, default_value = "0.9")]
    read_ratio: f64,

    /// Number of distinct keys
    #[arg(short, long, default_value = "1000")]
    key_space: u32,

    /// Pause between requests of one client, in milliseconds
    #[arg(short, long, default_value = "0")]
    think_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kvcache=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = LoadConfig {
        host: args.host,
        port: args.port,
        clients: args.clients,
        duration: Duration::from_secs(args.duration),
        read_ratio: args.read_ratio,
        key_space: args.key_space,
        think_time: Duration::from_millis(args.think_ms),
    };

    println!(
        "Running {} clients against {}:{} for {}s (read ratio {})",
        config.clients,
        config.host,
        config.port,
        config.duration.as_secs(),
        config.read_ratio
    );

    let report = loadgen::run(config).await?;
    print!("{}", report);
    Ok(())
}
