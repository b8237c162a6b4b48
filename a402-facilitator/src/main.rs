//! x402 Facilitator HTTP server with AVM settlement.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p a402-facilitator --release
//!
//! # Run with custom config path
//! CONFIG=/path/to/config.toml cargo run -p a402-facilitator
//!
//! # Configure logging level
//! RUST_LOG=info cargo run -p a402-facilitator
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to TOML configuration file (default: `config.toml`)
//! - `HOST` / `PORT` — Override the bind address
//! - `RUST_LOG` — Log level filter (default: `info`)
//! - `ALGOD_MAINNET_URL` / `ALGOD_TESTNET_URL` — Algod endpoint overrides

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use tower_http::cors;
use tracing_subscriber::EnvFilter;

use a402::facilitator::X402Facilitator;
use a402_avm::exact::register::register_exact_avm_facilitator;
use a402_avm::networks::normalize_network;
use a402_avm::signers::FacilitatorAlgorandSigner;

use a402_facilitator::config::FacilitatorConfig;
use a402_facilitator::handlers::{FacilitatorState, facilitator_router};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Facilitator failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = FacilitatorConfig::load()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        networks = config.avm.networks.len(),
        "Loaded configuration"
    );

    let mut facilitator = X402Facilitator::new();

    if config.avm.networks.is_empty() {
        tracing::warn!("No AVM networks configured — facilitator will report no supported kinds");
    } else {
        let mut signer = FacilitatorAlgorandSigner::new();
        if let Some(url) = &config.avm.algod_url {
            signer = signer.with_algod_url(url.clone());
        }

        let mut accounts = 0usize;
        for mnemonic in &config.avm.fee_payer_mnemonics {
            let mnemonic = mnemonic.trim();
            if mnemonic.is_empty() || mnemonic.starts_with('$') {
                tracing::warn!("Skipping fee payer mnemonic: unresolved (missing env var?)");
                continue;
            }
            signer = signer.with_account_from_mnemonic(mnemonic)?;
            accounts += 1;
        }

        let mut networks = Vec::new();
        for network in &config.avm.networks {
            match normalize_network(network) {
                Ok(caip2) => networks.push(caip2.to_owned()),
                Err(e) => tracing::warn!(network = %network, "Skipping network: {e}"),
            }
        }

        tracing::info!(
            networks = ?networks,
            fee_payers = accounts,
            "Registered AVM exact scheme"
        );
        register_exact_avm_facilitator(&mut facilitator, Arc::new(signer), networks);
    }

    let state: FacilitatorState = Arc::new(facilitator);

    let app = Router::new()
        .merge(facilitator_router(Arc::clone(&state)))
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        );

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Facilitator listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Facilitator shut down gracefully");
    Ok(())
}

/// Waits for Ctrl-C or SIGTERM (Unix) to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down..."),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down..."),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.expect("failed to listen for Ctrl-C");
        tracing::info!("Received Ctrl-C, shutting down...");
    }
}
