//! WebSocket game server for the `pirate_king` engine.
//!
//! Connections gather in a waiting room, get seated into games once enough
//! are present, and relay their game's publications and their own intents.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
