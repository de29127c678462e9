//! Duel Server - authoritative two-player fighting game server
//!
//! Clients speak newline-delimited JSON over TCP. The server owns all
//! simulation state and steps it at a fixed tick rate:
//! - two arena slots, with late joiners waiting in a FIFO queue
//! - movement, gravity, jumping and melee combat
//! - delta position broadcasts and eviction of dead connections

mod app;
mod config;
mod game;
mod matchmaking;
mod net;
mod util;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    init_tracing(&config.log_level);

    info!("Starting Duel Server");
    info!(
        addr = %config.server_addr,
        tick_rate = config.tick_rate,
        "Configuration loaded"
    );

    let state = AppState::new(config.clone());

    // Bind failure is fatal
    let listener = TcpListener::bind(config.server_addr).await?;
    info!("Server listening on {}", config.server_addr);

    let game_match = state.game_match();
    tokio::spawn(async move {
        game_match.run().await;
    });

    tokio::select! {
        result = net::serve(listener, state) => {
            if let Err(e) = result {
                error!(error = %e, "Listener failed");
                return Err(e);
            }
        }
        _ = shutdown_signal() => {}
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
