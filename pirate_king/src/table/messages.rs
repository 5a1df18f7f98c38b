//! Game actor message types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::game::{
    PublishedState, RoundState,
    entities::{Bid, PlayerId, TigressPlay, Username},
    state_machine::Action,
};

pub type GameId = Uuid;

/// Inbound intent as sent by a client.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Intent {
    #[serde(rename = "BID")]
    Bid { bid: Bid },
    #[serde(rename = "PLAY_CARD")]
    PlayCard {
        card_index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tigress: Option<TigressPlay>,
    },
    /// Barrier acknowledgment. Carries the sequence number of the
    /// publication being acked when the client knows it.
    #[serde(rename = "ack")]
    Ack {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seq: Option<u64>,
    },
}

impl Intent {
    /// The reducer action for this intent. Acks have none.
    #[must_use]
    pub fn action(self) -> Option<Action> {
        match self {
            Self::Bid { bid } => Some(Action::Bid(bid)),
            Self::PlayCard {
                card_index,
                tigress,
            } => Some(Action::PlayCard {
                card_index,
                tigress,
            }),
            Self::Ack { .. } => None,
        }
    }
}

/// An intent tagged with the seat that sent it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlayerIntent {
    pub player: PlayerId,
    pub intent: Intent,
}

impl PlayerIntent {
    pub fn new(player: PlayerId, intent: Intent) -> Self {
        Self { player, intent }
    }
}

/// Messages consumed by a [`super::GameActor`].
#[derive(Debug)]
pub enum GameMessage {
    Action { player: PlayerId, action: Action },
}

/// One published state, numbered within its game.
///
/// `snapshot` is the full round state the view was taken from. It stays on
/// the server side of the wire.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Publication {
    pub game_id: GameId,
    pub seq: u64,
    pub state: PublishedState,
    #[serde(skip)]
    pub snapshot: Option<Arc<RoundState>>,
}

/// Listing entry for a running game.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSummary {
    pub game_id: GameId,
    pub players: Vec<Username>,
    pub phase: Option<String>,
    pub round: Option<u32>,
}
