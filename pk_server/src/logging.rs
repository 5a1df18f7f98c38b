//! Structured logging setup and event helpers.
//!
//! The engine crate logs through the `log` facade; the subscriber installed
//! here picks those records up alongside the server's own `tracing` events.

use pirate_king::{GameId, entities::PlayerId};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`, defaulting to `info`.
///
/// # Example
///
/// ```no_run
/// use pk_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,tower_http=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a game lifecycle event
///
/// # Arguments
///
/// * `game_id` - Game the event belongs to
/// * `event` - Short event name, e.g. `created` or `aborted`
/// * `detail` - Free-form detail
///
/// # Example
///
/// ```
/// use pk_server::logging::log_game_event;
/// use uuid::Uuid;
///
/// log_game_event(Uuid::nil(), "created", "3 players");
/// ```
pub fn log_game_event(game_id: GameId, event: &str, detail: &str) {
    tracing::info!(
        game_id = %game_id,
        event = event,
        "GAME: {}",
        detail
    );
}

/// Log a websocket connection event. Disconnects of seated players are
/// raised to `warn` because they end the game.
pub fn log_connection_event(username: &str, player: Option<PlayerId>, event: &str) {
    let player = player.map(|p| p.0);
    if event == "seat_lost" {
        tracing::warn!(username = username, player = player, event = event, "Connection lost");
    } else {
        tracing::info!(username = username, player = player, event = event, "Connection event");
    }
}
