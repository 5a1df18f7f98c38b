//! Error types for the game engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    entities::{Bid, LeadingSuit, PlayerId},
    state_machine::Phase,
};

/// Why an intent was rejected. Rejections never mutate state and the
/// sender may resubmit.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum IllegalAction {
    #[error("not accepted during {0}")]
    WrongPhase(Phase),
    #[error("already bid this round")]
    AlreadyBid,
    #[error("bid of {bid} is outside 0..={max}")]
    BidOutOfRange { bid: Bid, max: Bid },
    #[error("not your turn")]
    NotYourTurn,
    #[error("no card at index {index} (hand has {hand_size})")]
    CardIndexOutOfRange { index: usize, hand_size: usize },
    #[error("must follow {0}")]
    MustFollowSuit(LeadingSuit),
}

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("illegal action: {0}")]
    IllegalAction(#[from] IllegalAction),
    #[error("deck is empty")]
    EmptyDeck,
    /// A trick reached resolution with no cards in it.
    #[error("no cards to resolve in the trick")]
    EmptyTrick,
    #[error("player {0} is not seated in this game")]
    UnknownPlayer(PlayerId),
    #[error("lost connection to player {0}")]
    SeatLost(PlayerId),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("game is closed")]
    GameClosed,
    #[error("game inbox is full")]
    InboxFull,
}

impl GameError {
    /// Fatal errors end the game task. Everything else only drops the
    /// offending intent.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::EmptyDeck | Self::EmptyTrick | Self::SeatLost(_) | Self::GameClosed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit;

    #[test]
    fn test_fatal_classification() {
        assert!(GameError::EmptyDeck.is_fatal());
        assert!(GameError::EmptyTrick.is_fatal());
        assert!(GameError::SeatLost(PlayerId(1)).is_fatal());
        assert!(!GameError::UnknownPlayer(PlayerId(1)).is_fatal());
        assert!(!GameError::from(IllegalAction::NotYourTurn).is_fatal());
        assert!(!GameError::InboxFull.is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = GameError::from(IllegalAction::MustFollowSuit(LeadingSuit::Suit(
            Suit::TreasureChest,
        )));
        assert_eq!(err.to_string(), "illegal action: must follow Treasure Chest");

        let err = IllegalAction::BidOutOfRange { bid: 4, max: 3 };
        assert_eq!(err.to_string(), "bid of 4 is outside 0..=3");
    }
}
