//! Storefront edge.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                   STOREFRONT EDGE                    │
//!   Client Request    │  ┌──────────┐   ┌────────────┐   ┌───────────────┐   │
//!   ──────────────────┼─▶│  server  │──▶│ middleware │──▶│    handler    │   │
//!                     │  │ req-id,  │   │ route, CORS│   │ token per     │   │
//!                     │  │ tracing  │   │ OPTIONS,405│   │ auth mode     │   │
//!                     │  └──────────┘   └────────────┘   └───┬───────┬───┘   │
//!                     │                                      │       │       │
//!                     │                        ┌─────────────▼─┐   ┌─▼─────┐ │    Identity
//!                     │                        │  TokenCache   │──▶│fetcher│─┼──▶ Provider
//!                     │                        └───────────────┘   └───────┘ │
//!                     │                                      │               │
//!   Client Response   │  ┌────────────┐   ┌─────────────┐   ┌▼────────────┐  │
//!   ◀─────────────────┼──│ CORS + JSON│◀──│ translator  │◀──│  forwarder  │◀─┼──▶ Backend
//!                     │  └────────────┘   └─────────────┘   └─────────────┘  │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use storefront_edge::config::loader::{apply_env_overrides, load_config, validate};
use storefront_edge::config::ProxyConfig;
use storefront_edge::lifecycle::signals::wait_for_signal;
use storefront_edge::observability::{logging, metrics};
use storefront_edge::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "storefront-edge")]
#[command(about = "Credential-caching reverse proxy for the storefront backends", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

fn load(cli: &Cli) -> Result<ProxyConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let mut config = ProxyConfig::default();
            apply_env_overrides(&mut config, |key| std::env::var(key).ok());
            config
        }
    };

    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("storefront-edge: configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.check {
        if let Err(e) = validate(&config) {
            eprintln!("storefront-edge: configuration error: {}", e);
            return ExitCode::FAILURE;
        }
        println!("configuration OK ({} routes)", config.effective_routes().len());
        return ExitCode::SUCCESS;
    }

    logging::init_logging(&config.observability);

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Edge terminated with error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ProxyConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("storefront-edge v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;
    Ok(())
}
