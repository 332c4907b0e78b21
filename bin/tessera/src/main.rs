//! Tessera - Rosetta middleware for a multi-shard account-model chain.
//!
//! # Usage
//!
//! ```bash
//! # Start with default config
//! tessera --network-config ./config/devnet.json
//!
//! # Start with environment overrides
//! OBSERVER_URL=http://observer:8080 ROSETTA_PORT=8091 tessera --network-config ./config/mainnet.json
//! ```

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use tessera_api::{AppState, ServerConfig, serve_with_shutdown};
use tessera_core::config::NetworkConfig;
use tessera_core::metrics::init_metrics;
use tessera_core::ports::NetworkProvider;
use tessera_observer::{ObserverClient, ObserverClientConfig};

/// Tessera CLI - Rosetta gateway to a sharded chain.
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(about = "Tessera - Rosetta read-and-submit middleware")]
#[command(version)]
struct Cli {
    /// Observer node REST URL.
    #[arg(long, env = "OBSERVER_URL", default_value = "http://127.0.0.1:8080")]
    observer_url: String,

    /// Path to the network configuration file (JSON).
    #[arg(long, env = "NETWORK_CONFIG")]
    network_config: String,

    /// Rosetta server port.
    #[arg(long, env = "ROSETTA_PORT", default_value = "8091")]
    rosetta_port: u16,

    /// Prometheus metrics port.
    #[arg(long, env = "METRICS_PORT", default_value = "9090")]
    metrics_port: u16,

    /// Run without network access: reads are served from configuration,
    /// submissions are rejected.
    #[arg(long, env = "OFFLINE")]
    offline: bool,

    /// Observer request timeout, in seconds.
    #[arg(long, env = "OBSERVER_TIMEOUT_SECS", default_value = "30")]
    observer_timeout_secs: u64,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    // Prometheus metrics exporter (optional - failures don't crash the app)
    let metrics_enabled = match format!("0.0.0.0:{}", cli.metrics_port).parse::<std::net::SocketAddr>()
    {
        Ok(metrics_addr) => match PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()
        {
            Ok(()) => {
                init_metrics();
                true
            }
            Err(e) => {
                warn!(
                    "⚠️  Failed to start metrics exporter: {}. Continuing without metrics.",
                    e
                );
                false
            }
        },
        Err(e) => {
            warn!("⚠️  Invalid metrics address: {}. Continuing without metrics.", e);
            false
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 🚀 STARTUP
    // ─────────────────────────────────────────────────────────────────────────
    info!("🚀 Starting Tessera");
    debug!(observer_url = %cli.observer_url, "Observer endpoint");

    let network = load_network_config(&cli.network_config)?;
    info!(
        num_shards = network.num_shards,
        observed_shard = network.observed_actual_shard,
        currency = %network.native_currency_symbol,
        custom_currencies = network.custom_currencies.len(),
        "🔗 Network configuration loaded"
    );
    if cli.offline {
        warn!("⚠️  Offline mode: submissions will be rejected");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 📡 OBSERVER CONNECTION
    // ─────────────────────────────────────────────────────────────────────────
    let observer_config = ObserverClientConfig {
        url: cli.observer_url.clone(),
        offline: cli.offline,
        request_timeout: Duration::from_secs(cli.observer_timeout_secs),
    };

    let provider: Arc<dyn NetworkProvider> = Arc::new(
        ObserverClient::new(observer_config, network).context("Failed to build observer client")?,
    );

    if !cli.offline {
        match provider.get_node_status().await {
            Ok(status) => info!(
                head = status.latest_block.nonce,
                synced = status.synced,
                "📡 Observer reachable"
            ),
            Err(e) => warn!(error = %e, "⚠️  Observer not reachable yet, continuing"),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // ⚡ SERVER START
    // ─────────────────────────────────────────────────────────────────────────
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let server_config = ServerConfig {
        host: "0.0.0.0".to_string(),
        port: cli.rosetta_port,
    };
    let state = AppState::new(provider);

    let rosetta_port = cli.rosetta_port;
    let server_handle = tokio::spawn(async move {
        let shutdown_signal = async move {
            while !*shutdown_rx.borrow() {
                if shutdown_rx.changed().await.is_err() {
                    break;
                }
            }
        };

        if let Err(e) = serve_with_shutdown(state, server_config, shutdown_signal).await {
            error!(error = %e, "❌ Server error");
        }
    });

    // ─────────────────────────────────────────────────────────────────────────
    // ✅ READY
    // ─────────────────────────────────────────────────────────────────────────
    info!("✅ Tessera ready");
    info!("   ⚡ Rosetta:  http://localhost:{}", rosetta_port);
    if metrics_enabled {
        info!("   📊 Metrics:  http://localhost:{}/metrics", cli.metrics_port);
    } else {
        info!("   📊 Metrics:  disabled");
    }
    info!("   Press Ctrl+C to stop");

    shutdown_signal().await;

    // ─────────────────────────────────────────────────────────────────────────
    // 🛑 SHUTDOWN
    // ─────────────────────────────────────────────────────────────────────────
    info!("🛑 Shutting down...");
    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(Duration::from_secs(10), server_handle).await {
        Ok(_) => debug!("Server stopped"),
        Err(_) => warn!("⚠️  Server shutdown timed out"),
    }

    info!("🛑 Shutdown complete");
    Ok(())
}

/// Load and validate the network configuration file.
fn load_network_config(path: &str) -> Result<NetworkConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read network config at {path}"))?;
    let config: NetworkConfig = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse network config at {path}"))?;

    anyhow::ensure!(config.num_shards > 0, "num_shards must be positive");
    anyhow::ensure!(
        config.observed_actual_shard < config.num_shards,
        "observed_actual_shard {} out of range for {} shards",
        config.observed_actual_shard,
        config.num_shards
    );
    anyhow::ensure!(!config.address_hrp.is_empty(), "address_hrp must be set");

    Ok(config)
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
