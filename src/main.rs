//! Lambda HTTP proxy
//!
//! Exposes AWS Lambda functions over plain HTTP.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────────┐
//!                     │                    LAMBDA HTTP PROXY                      │
//!                     │                                                           │
//!   Client Request    │  ┌─────────┐    ┌──────────┐    ┌────────────┐            │
//!   ──────────────────┼─▶│  http   │───▶│ request  │───▶│  dispatch  │            │
//!                     │  │ server  │    │ decoding │    │            │            │
//!                     │  └─────────┘    └──────────┘    └─────┬──────┘            │
//!                     │                                       │                   │
//!                     │                                       ▼                   │
//!                     │                                ┌────────────┐   Invoke    │
//!                     │                                │ invocation │─────────────┼──▶ AWS Lambda
//!                     │                                │  (mapper)  │◀────────────┼───
//!                     │                                └─────┬──────┘             │
//!                     │                                      ▼                    │
//!   Client Response   │                                ┌────────────┐             │
//!   ◀─────────────────┼────────────────────────────────│   render   │             │
//!                     │                                │default/simple            │
//!                     │                                └────────────┘             │
//!                     │  config (reload) · observability · lifecycle              │
//!                     └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use lambda_http_proxy::config::{load_config, watcher::ConfigWatcher, ProxyConfig};
use lambda_http_proxy::lifecycle::{signals, Shutdown};
use lambda_http_proxy::observability::{logging, metrics};
use lambda_http_proxy::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "lambda-http-proxy")]
#[command(about = "Expose AWS Lambda functions over HTTP", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults apply without one.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the configuration file when it changes.
    #[arg(long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "lambda-http-proxy starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        default_region = %config.lambda.default_region,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.clone());
            (Some(watcher.run()?), updates)
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let server = HttpServer::new(config);
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
