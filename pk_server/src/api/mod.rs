//! HTTP/WebSocket API for the game server.
//!
//! # Endpoints Overview
//!
//! - `GET /health` - Server health status
//! - `GET /api/games` - Running games
//! - `GET /ws?username=<name>` - Join the waiting room and play
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use pk_server::api::{AppState, create_router};
//! use pirate_king::{GameManager, GameSettings};
//! use std::sync::Arc;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let manager = Arc::new(GameManager::new(GameSettings::default()));
//! let app = create_router(AppState::new(manager, 3));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively. Browser clients are served from
//! anywhere.

pub mod room;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use pirate_king::{GameManager, table::GameSummary};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub use room::{Seat, Ticket, WaitingRoom};

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub game_manager: Arc<GameManager>,
    pub room: Arc<WaitingRoom>,
}

impl AppState {
    /// State whose waiting room starts a game every `seats` connections.
    pub fn new(game_manager: Arc<GameManager>, seats: usize) -> Self {
        let room = Arc::new(WaitingRoom::new(Arc::clone(&game_manager), seats));
        Self { game_manager, room }
    }
}

/// Create the API router with all endpoints and middleware.
///
/// ```text
/// GET  /health              - Health check
/// GET  /api/games           - List running games
/// GET  /ws?username=<name>  - WebSocket
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/games", get(list_games))
        .route("/ws", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.1.0","active_games":2}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "active_games": state.game_manager.active_game_count().await,
    });

    (StatusCode::OK, Json(response))
}

async fn list_games(State(state): State<AppState>) -> Json<Vec<GameSummary>> {
    Json(state.game_manager.list_games().await)
}
