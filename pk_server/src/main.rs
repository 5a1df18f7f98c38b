//! Pirate King game server.
//!
//! Seats WebSocket connections into games run by the `pirate_king` engine.

use std::sync::Arc;

use anyhow::{Context, Error};
use log::{info, warn};
use pico_args::Arguments;
use pirate_king::GameManager;
use pk_server::{api, config::ServerConfig, logging, metrics};

const HELP: &str = "\
Run a Pirate King game server

USAGE:
  pk_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --seats      N           Players per game, 3 to 8    [default: env GAME_SEATS or 3]
  --rounds     N           Rounds per game             [default: env GAME_MAX_ROUNDS or 10]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  GAME_SEATS               Players per game
  GAME_MAX_ROUNDS          Rounds per game
  GAME_SEED                Fixed shuffle seed
  METRICS_BIND             Prometheus scrape address, disabled when unset
  RUST_LOG                 Log filter [default: info]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let config = ServerConfig::from_env(
        pargs.opt_value_from_str("--bind")?,
        pargs.opt_value_from_str("--seats")?,
        pargs.opt_value_from_str("--rounds")?,
    )?;

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("unexpected arguments: {remaining:?}\n\n{HELP}");
    }

    logging::init();
    info!("Starting game server at {}", config.bind);

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(Error::msg)?;
        info!("Metrics available at http://{metrics_bind}/metrics");
    }

    let game_manager = Arc::new(GameManager::new(config.game_settings()));
    info!(
        "Games seat {} players for {} rounds",
        config.seats, config.max_rounds
    );

    let app = api::create_router(api::AppState::new(
        Arc::clone(&game_manager),
        config.seats,
    ));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(game_manager))
        .await
        .context("Server error")?;

    info!("Server stopped");

    Ok(())
}

/// Graceful shutdown signal. Running games are closed so their
/// connections wind down.
async fn shutdown_signal(game_manager: Arc<GameManager>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }

    info!("Shutting down server...");
    game_manager.close_all().await;
}
