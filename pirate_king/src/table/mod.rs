//! Running games as async actors.
//!
//! Each game runs in its own Tokio task that owns the round state and is the
//! only writer of it. Connection tasks talk to a game through a
//! [`GameHandle`]: bids and card plays go into a bounded inbox sized to the
//! seat count, acks go straight to the game's [`SyncBarrier`], and
//! publications come back over a watch channel.
//!
//! ## Example
//!
//! ```no_run
//! use pirate_king::{GameManager, GameSettings, entities::Player};
//!
//! # async fn demo() -> Result<(), pirate_king::GameError> {
//! let manager = GameManager::new(GameSettings::default());
//! let players = vec![
//!     Player::new(1, "anne"),
//!     Player::new(2, "calico"),
//!     Player::new(3, "mary"),
//! ];
//! let game = manager.create_game(players).await?;
//! let mut publications = game.subscribe();
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod barrier;
pub mod manager;
pub mod messages;

pub use actor::{GameActor, GameHandle, PublicationReceiver};
pub use barrier::{AckOutcome, SyncBarrier};
pub use manager::GameManager;
pub use messages::{GameId, GameMessage, GameSummary, Intent, PlayerIntent, Publication};
