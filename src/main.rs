//! Product API server.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                   PRODUCT API                     │
//!                      │                                                   │
//!   Client Request     │  ┌─────────┐   ┌───────────┐   ┌──────────────┐  │
//!   ───────────────────┼─▶│  http   │──▶│ admission │──▶│   product    │  │
//!                      │  │ server  │   │   gate    │   │   service    │  │
//!                      │  └─────────┘   └───────────┘   └──────┬───────┘  │
//!                      │                                       │          │
//!                      │                                       ▼          │
//!   Client Response    │  ┌──────────┐                  ┌──────────────┐  │
//!   ◀──────────────────┼──│ envelope │◀─────────────────│    store     │◀─┼── PostgreSQL
//!                      │  └──────────┘                  └──────────────┘  │
//!                      │                                                   │
//!                      │  config · observability · security · lifecycle    │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use product_api::config::watcher::ConfigWatcher;
use product_api::config::{load_config, load_from_env};
use product_api::lifecycle::{build_store, wait_for_signal};
use product_api::observability::{logging, metrics};
use product_api::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "product-api")]
#[command(about = "Product catalogue REST API", long_about = None)]
struct Args {
    /// TOML configuration file. Without it, defaults plus environment are used.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path),
        None => load_from_env(),
    }?;

    if let Err(e) = logging::init_logging(&config.observability.log_level) {
        eprintln!("failed to initialise logging: {e}");
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "product-api starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = ?config.database.backend,
        admission_enabled = config.admission.enabled,
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

    let store = build_store(&config.database).await?;

    let (policy_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.admission.clone());
            match watcher.run() {
                Ok(handle) => (updates, Some(handle)),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload disabled");
                    (updates, None)
                }
            }
        }
        None => (mpsc::unbounded_channel().1, None),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, store)?;
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, policy_updates, server_shutdown));

    wait_for_signal().await;
    shutdown.trigger();

    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}
