//! Public, phase-shaped views of a round.
//!
//! Each phase publishes only the fields clients need for it. Hands are
//! published in full: every client sees every hand, and rendering only the
//! local player's cards is left to the client.

use serde::{Deserialize, Serialize};

use super::{
    entities::{Bids, Hands, PlayerId, ScoreSheet, Trick, TricksWon},
    state_machine::{Phase, RoundState},
};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishedState {
    Starting {
        round: u32,
        tricks_won: TricksWon,
    },
    Dealing {
        dealer: PlayerId,
        round: u32,
        hands: Hands,
    },
    StartBidding,
    Bidding {
        bids: Bids,
    },
    StartPlaying {
        first_player: PlayerId,
    },
    Playing {
        previous_player: Option<PlayerId>,
        current_player: PlayerId,
        trick: Trick,
        seated_player_count: usize,
    },
    Resolving {
        trick_winner: Option<PlayerId>,
        hands: Hands,
    },
    CalculateScores {
        score_sheet: ScoreSheet,
    },
    GameOver {
        score_sheet: ScoreSheet,
    },
    /// The game ended early on a fatal error.
    Aborted {
        reason: String,
    },
}

impl PublishedState {
    #[must_use]
    pub fn from_state(state: &RoundState) -> Self {
        match state.phase {
            Phase::Starting => Self::Starting {
                round: state.round,
                tricks_won: state.tricks_won.clone(),
            },
            Phase::Dealing => Self::Dealing {
                dealer: state.dealer_id(),
                round: state.round,
                hands: state.hands.clone(),
            },
            Phase::StartBidding => Self::StartBidding,
            Phase::Bidding => Self::Bidding {
                bids: state.bids.clone(),
            },
            Phase::StartPlaying => Self::StartPlaying {
                first_player: state.current_player(),
            },
            Phase::Playing => Self::Playing {
                previous_player: state.previous_player(),
                current_player: state.current_player(),
                trick: state.trick.clone(),
                seated_player_count: state.seated_count(),
            },
            Phase::Resolving => Self::Resolving {
                trick_winner: state.trick_winner,
                hands: state.hands.clone(),
            },
            Phase::CalculateScores => Self::CalculateScores {
                score_sheet: state.score_sheet.clone(),
            },
            Phase::GameOver => Self::GameOver {
                score_sheet: state.score_sheet.clone(),
            },
        }
    }

    /// Wire name of the phase, `ABORTED` for an aborted game.
    #[must_use]
    pub fn phase_name(&self) -> &'static str {
        match self {
            Self::Starting { .. } => "STARTING",
            Self::Dealing { .. } => "DEALING",
            Self::StartBidding => "START_BIDDING",
            Self::Bidding { .. } => "BIDDING",
            Self::StartPlaying { .. } => "START_PLAYING",
            Self::Playing { .. } => "PLAYING",
            Self::Resolving { .. } => "RESOLVING",
            Self::CalculateScores { .. } => "CALCULATE_SCORES",
            Self::GameOver { .. } => "GAME_OVER",
            Self::Aborted { .. } => "ABORTED",
        }
    }

    /// Whether no further publications follow this one.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::GameOver { .. } | Self::Aborted { .. })
    }
}
