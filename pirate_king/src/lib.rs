//! # Pirate King
//!
//! Server-side engine for a trick-taking card game for 3 to 8 players:
//! bidding, trick play with special suit-less cards, and scoring over a run
//! of rounds where round `n` deals `n` cards to every seat.
//!
//! ## Architecture
//!
//! A round moves through a fixed cycle of phases:
//!
//! - **Starting**: reset per-round state, build and shuffle a fresh deck
//! - **Dealing**: deal `round` cards to every seat
//! - **StartBidding/Bidding**: collect one bid per seat
//! - **StartPlaying/Playing**: collect one card per seat into the trick
//! - **Resolving**: award the trick, loop back to StartPlaying until the
//!   round's tricks are all taken
//! - **CalculateScores**: score the round, rotate the dealer, start the next
//!   round or end the game
//!
//! Every published state is acknowledged by all seats before a gated phase
//! moves on.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, legality rules, trick resolution, scoring and the
//!   phase reducer
//! - [`table`]: Game actors, the acknowledgment barrier and the game manager

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    Action, GameError, GameSettings, GameStateMachine, IllegalAction, Phase, PublishedState,
    RoundState,
    constants::{self, MAX_PLAYERS, MAX_ROUNDS, MIN_PLAYERS},
    entities,
};

/// Game actors and their registry.
pub mod table;
pub use table::{GameHandle, GameId, GameManager, Intent, PlayerIntent, Publication};
