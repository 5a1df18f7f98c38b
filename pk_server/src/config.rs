//! Server configuration management.
//!
//! Every environment variable the server reads is read here, once, at startup.

use pirate_king::{GameSettings, MAX_PLAYERS, MAX_ROUNDS, MIN_PLAYERS};
use std::net::SocketAddr;

pub const DEFAULT_BIND: &str = "127.0.0.1:6969";

/// Complete server configuration loaded from the environment and CLI flags
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP/WebSocket bind address
    pub bind: SocketAddr,
    /// Prometheus scrape endpoint, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Connections gathered in the waiting room before a game starts
    pub seats: usize,
    /// Rounds played per game
    pub max_rounds: u32,
    /// Fixed shuffle seed, for reproducible games
    pub seed: Option<u64>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `seats_override` - Optional seat count override (from CLI args)
    /// * `rounds_override` - Optional round count override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a set variable does not parse
    /// or the resulting values are out of range.
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        seats_override: Option<usize>,
        rounds_override: Option<u32>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env("SERVER_BIND")?.unwrap_or_else(default_bind),
        };

        let seats = match seats_override {
            Some(seats) => seats,
            None => parse_env("GAME_SEATS")?.unwrap_or(MIN_PLAYERS),
        };
        let max_rounds = match rounds_override {
            Some(rounds) => rounds,
            None => parse_env("GAME_MAX_ROUNDS")?.unwrap_or(MAX_ROUNDS),
        };

        let config = ServerConfig {
            bind,
            metrics_bind: parse_env("METRICS_BIND")?,
            seats,
            max_rounds,
            seed: parse_env("GAME_SEED")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the offending variable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.seats) {
            return Err(ConfigError::Invalid {
                var: "GAME_SEATS".to_string(),
                reason: format!("Must be between {MIN_PLAYERS} and {MAX_PLAYERS}"),
            });
        }

        if self.max_rounds == 0 {
            return Err(ConfigError::Invalid {
                var: "GAME_MAX_ROUNDS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }

    /// Settings handed to every game the server creates.
    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            max_rounds: self.max_rounds,
            first_dealer: None,
            seed: self.seed,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6969))
}

/// Parse an optional variable. Set but malformed is an error.
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => {
            v.trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::Invalid {
                    var: key.to_string(),
                    reason: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}
