//! Prometheus metrics for the game server.
//!
//! Recording is always on; the exporter only runs when a scrape address is
//! configured. Without it the `metrics` facade drops every sample.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use pk_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::game_started();
//! metrics::websocket_connection_opened();
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Errors
///
/// Returns a message if the exporter cannot be installed, typically because
/// the address is in use or a recorder is already set.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Count a new WebSocket connection.
pub fn websocket_connection_opened() {
    metrics::counter!("websocket_connections_total").increment(1);
    metrics::gauge!("websocket_connections_active").increment(1.0);
}

pub fn websocket_connection_closed() {
    metrics::gauge!("websocket_connections_active").decrement(1.0);
}

pub fn websocket_messages_sent() {
    metrics::counter!("websocket_messages_sent").increment(1);
}

pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

/// Increment the counter of client frames dropped without effect.
///
/// `reason` is one of `unparseable`, `rejected` or `inbox_full`.
pub fn websocket_messages_dropped(reason: &'static str) {
    metrics::counter!("websocket_messages_dropped_total",
        "reason" => reason
    )
    .increment(1);
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Count a newly created game.
pub fn game_started() {
    metrics::counter!("games_created_total").increment(1);
    metrics::gauge!("active_games").increment(1.0);
}

/// Count an ended game, labelled `completed` or `aborted`.
pub fn game_ended(outcome: &'static str) {
    metrics::counter!("games_finished_total",
        "outcome" => outcome
    )
    .increment(1);
    metrics::gauge!("active_games").decrement(1.0);
}

/// Set the number of connections waiting for a game.
pub fn waiting_players(count: usize) {
    metrics::gauge!("waiting_players").set(count as f64);
}
