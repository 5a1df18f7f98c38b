//! Rules engine: cards, legality, trick resolution, scoring and the phase
//! reducer that composes them.

pub mod constants;
pub mod deck;
pub mod entities;
pub mod errors;
pub mod legality;
pub mod resolver;
pub mod scoring;
pub mod state_machine;
pub mod views;

pub use deck::Deck;
pub use errors::{GameError, IllegalAction};
pub use state_machine::{Action, GameSettings, GameStateMachine, Phase, RoundState};
pub use views::PublishedState;
