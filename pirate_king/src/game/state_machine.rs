//! Round state and the phase reducer.
//!
//! [`GameStateMachine`] never mutates a [`RoundState`] in place: every call
//! takes the current state by reference and returns the next one. The
//! collections inside a round state are persistent maps and vectors, so the
//! copy made at the start of each call shares structure with its parent.

use log::{debug, info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, sync::Arc};

use super::{
    constants::{DECK_SIZE, MAX_PLAYERS, MAX_ROUNDS, MIN_PLAYERS},
    deck::Deck,
    entities::{
        Bid, Bids, Hand, Hands, LeadingSuit, Player, PlayerId, ScoreSheet, TigressPlay, Trick,
        TrickSeq, TricksWon,
    },
    errors::{GameError, IllegalAction},
    legality, resolver, scoring,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Starting,
    Dealing,
    StartBidding,
    Bidding,
    StartPlaying,
    Playing,
    Resolving,
    CalculateScores,
    GameOver,
}

impl Phase {
    /// Whether a publication in this phase must be acknowledged by every
    /// seat before the game moves on. Bidding and playing only gate the
    /// publication that completes them.
    #[must_use]
    pub const fn is_gated(self) -> bool {
        !matches!(self, Self::StartBidding | Self::StartPlaying | Self::GameOver)
    }

    /// Phases that consume player intents.
    #[must_use]
    pub const fn accepts_intents(self) -> bool {
        matches!(self, Self::Bidding | Self::Playing)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Starting => "STARTING",
            Self::Dealing => "DEALING",
            Self::StartBidding => "START_BIDDING",
            Self::Bidding => "BIDDING",
            Self::StartPlaying => "START_PLAYING",
            Self::Playing => "PLAYING",
            Self::Resolving => "RESOLVING",
            Self::CalculateScores => "CALCULATE_SCORES",
            Self::GameOver => "GAME_OVER",
        };
        write!(f, "{repr}")
    }
}

/// A player action the reducer understands.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Action {
    Bid(Bid),
    PlayCard {
        card_index: usize,
        tigress: Option<TigressPlay>,
    },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bid(bid) => write!(f, "bid {bid}"),
            Self::PlayCard {
                card_index,
                tigress: None,
            } => write!(f, "play card {card_index}"),
            Self::PlayCard {
                card_index,
                tigress: Some(play),
            } => write!(f, "play card {card_index} as {play:?}"),
        }
    }
}

/// Everything that changes during a round, plus the cumulative score sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundState {
    pub round: u32,
    pub phase: Phase,
    /// Seating order. Fixed for the life of the game.
    pub players: Arc<[Player]>,
    /// Seat index of the dealer.
    pub dealer: usize,
    pub current_player_idx: usize,
    pub previous_player_idx: Option<usize>,
    pub leading_suit: Option<LeadingSuit>,
    pub trick: Trick,
    /// Tricks captured so far this round.
    pub trick_seq: TrickSeq,
    pub tricks_won: TricksWon,
    pub bids: Bids,
    pub hands: Hands,
    pub trick_winner: Option<PlayerId>,
    pub score_sheet: ScoreSheet,
}

impl RoundState {
    #[must_use]
    pub fn seated_count(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn seat_of(&self, player: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == player)
    }

    #[must_use]
    pub fn is_seated(&self, player: PlayerId) -> bool {
        self.seat_of(player).is_some()
    }

    #[must_use]
    pub fn current_player(&self) -> PlayerId {
        self.players[self.current_player_idx].id
    }

    #[must_use]
    pub fn previous_player(&self) -> Option<PlayerId> {
        self.previous_player_idx.map(|idx| self.players[idx].id)
    }

    #[must_use]
    pub fn dealer_id(&self) -> PlayerId {
        self.players[self.dealer].id
    }

    #[must_use]
    pub fn hand(&self, player: PlayerId) -> Option<&Hand> {
        self.hands.get(&player)
    }

    #[must_use]
    pub fn tricks_won_by(&self, player: PlayerId) -> usize {
        self.tricks_won.get(&player).map_or(0, |tricks| tricks.len())
    }

    /// Total tricks captured this round across every seat.
    #[must_use]
    pub fn tricks_captured(&self) -> usize {
        self.tricks_won.values().map(|tricks| tricks.len()).sum()
    }

    #[must_use]
    pub fn is_round_over(&self) -> bool {
        self.tricks_captured() == self.round as usize
    }

    #[must_use]
    pub fn all_bids_in(&self) -> bool {
        self.players.iter().all(|p| self.bids.contains_key(&p.id))
    }

    #[must_use]
    pub fn is_trick_complete(&self) -> bool {
        self.trick.len() == self.seated_count()
    }

    fn next_seat(&self, seat: usize) -> usize {
        (seat + 1) % self.seated_count()
    }
}

/// Per-game options.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameSettings {
    pub max_rounds: u32,
    /// Seat index of the first dealer. Picked at random when unset.
    pub first_dealer: Option<usize>,
    /// Seed for shuffles and the first-dealer pick. Uses OS entropy when unset.
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            max_rounds: MAX_ROUNDS,
            first_dealer: None,
            seed: None,
        }
    }
}

impl GameSettings {
    /// Checks the settings against the number of seats they will run with.
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidSettings`] when the seat count is outside
    /// `MIN_PLAYERS..=MAX_PLAYERS`, there are no rounds, or the first dealer
    /// does not name a seat.
    pub fn validate(&self, seats: usize) -> Result<(), GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&seats) {
            return Err(GameError::InvalidSettings(format!(
                "need {MIN_PLAYERS}..={MAX_PLAYERS} players, got {seats}"
            )));
        }
        if self.max_rounds == 0 {
            return Err(GameError::InvalidSettings(
                "max_rounds must be at least 1".to_string(),
            ));
        }
        if let Some(dealer) = self.first_dealer
            && dealer >= seats
        {
            return Err(GameError::InvalidSettings(format!(
                "first dealer seat {dealer} out of range for {seats} players"
            )));
        }
        Ok(())
    }
}

/// Composes the deck, legality rules, trick resolver and score calculator
/// into the per-phase reducer.
#[derive(Debug)]
pub struct GameStateMachine {
    settings: GameSettings,
    players: Arc<[Player]>,
    deck: Deck,
    rng: StdRng,
}

impl GameStateMachine {
    /// # Errors
    ///
    /// [`GameError::InvalidSettings`] if the settings don't fit the players
    /// or two players share an id.
    pub fn new(settings: GameSettings, players: Vec<Player>) -> Result<Self, GameError> {
        settings.validate(players.len())?;

        let mut ids = HashSet::with_capacity(players.len());
        if let Some(dup) = players.iter().find(|p| !ids.insert(p.id)) {
            return Err(GameError::InvalidSettings(format!(
                "player id {} is seated twice",
                dup.id
            )));
        }

        let cards_needed = settings.max_rounds as usize * players.len();
        if cards_needed > DECK_SIZE {
            warn!(
                "{} players over {} rounds need {cards_needed} cards but the deck has {DECK_SIZE}; \
                 the deal will fail with an empty deck",
                players.len(),
                settings.max_rounds
            );
        }

        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            settings,
            players: players.into(),
            deck: Deck::new(),
            rng,
        })
    }

    #[must_use]
    pub fn players(&self) -> &Arc<[Player]> {
        &self.players
    }

    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Round one, about to start. The first dealer is fixed by the settings
    /// or drawn at random.
    pub fn initial_state(&mut self) -> RoundState {
        let seats = self.players.len();
        let dealer = self
            .settings
            .first_dealer
            .unwrap_or_else(|| self.rng.random_range(0..seats));
        RoundState {
            round: 1,
            phase: Phase::Starting,
            players: Arc::clone(&self.players),
            dealer,
            current_player_idx: (dealer + 1) % seats,
            previous_player_idx: None,
            leading_suit: None,
            trick: Trick::new(),
            trick_seq: 0,
            tricks_won: TricksWon::new(),
            bids: Bids::new(),
            hands: Hands::new(),
            trick_winner: None,
            score_sheet: self.players.iter().map(|p| (p.id, 0)).collect(),
        }
    }

    /// Runs the entry action of `state.phase` and returns the state to
    /// publish for it.
    ///
    /// # Errors
    ///
    /// * [`GameError::EmptyDeck`] - dealing ran out of cards
    /// * [`GameError::EmptyTrick`] - resolving a trick nobody played into
    pub fn enter(&mut self, state: &RoundState) -> Result<RoundState, GameError> {
        let mut next = state.clone();
        match state.phase {
            Phase::Starting => {
                info!("starting round {} (dealer {})", next.round, next.dealer_id());
                next.trick = Trick::new();
                next.trick_seq = 0;
                next.tricks_won = TricksWon::new();
                next.bids = Bids::new();
                next.hands = Hands::new();
                next.leading_suit = None;
                next.trick_winner = None;
                next.previous_player_idx = None;
                next.current_player_idx = next.next_seat(next.dealer);

                self.deck = Deck::new();
                self.deck.shuffle_with(&mut self.rng);
            }
            Phase::Dealing => {
                for player in self.players.iter() {
                    let mut hand = Hand::new();
                    for _ in 0..next.round {
                        hand.push_back(self.deck.deal()?);
                    }
                    next.hands.insert(player.id, hand);
                }
                debug!(
                    "dealt {} cards to {} players, {} left in deck",
                    next.round,
                    self.players.len(),
                    self.deck.len()
                );
            }
            Phase::StartPlaying => {
                next.previous_player_idx = None;
            }
            Phase::Resolving => {
                let winner = resolver::resolve(&next.trick, next.leading_suit)
                    .ok_or(GameError::EmptyTrick)?;
                let seq = next.trick_seq + 1;
                resolver::determine_tricks(&mut next.tricks_won, winner, &next.trick, seq);
                debug!("trick {seq} of round {} won by {winner}", next.round);

                next.trick_seq = seq;
                next.trick_winner = Some(winner);
                if let Some(seat) = next.seat_of(winner) {
                    next.current_player_idx = seat;
                }
                next.leading_suit = None;
                next.trick = Trick::new();
            }
            Phase::CalculateScores => {
                next.score_sheet = scoring::apply(&next);
                info!("round {} scored: {:?}", next.round, next.score_sheet);
            }
            Phase::StartBidding | Phase::Bidding | Phase::Playing | Phase::GameOver => {}
        }
        Ok(next)
    }

    /// Applies a player's action.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownPlayer`] for a player not at this table and
    /// [`GameError::IllegalAction`] when the rules reject the action. The
    /// input state is left untouched either way.
    pub fn apply(
        &self,
        state: &RoundState,
        player: PlayerId,
        action: Action,
    ) -> Result<RoundState, GameError> {
        if !state.is_seated(player) {
            return Err(GameError::UnknownPlayer(player));
        }

        let mut next = state.clone();
        match action {
            Action::Bid(bid) => {
                if state.phase != Phase::Bidding {
                    return Err(IllegalAction::WrongPhase(state.phase).into());
                }
                legality::check_bid(state, player, bid)?;
                next.bids.insert(player, bid);
            }
            Action::PlayCard {
                card_index,
                tigress,
            } => {
                if state.phase != Phase::Playing {
                    return Err(IllegalAction::WrongPhase(state.phase).into());
                }
                let (leading_suit, card) =
                    legality::check_play(state, player, card_index, tigress)?;

                if let Some(hand) = next.hands.get_mut(&player) {
                    hand.remove(card_index);
                }
                next.trick.push(player, card);
                next.leading_suit = Some(leading_suit);
                next.previous_player_idx = Some(state.current_player_idx);
                if !next.is_trick_complete() {
                    next.current_player_idx = next.next_seat(state.current_player_idx);
                }
            }
        }
        Ok(next)
    }

    /// Whether the interactive part of the current phase is done.
    #[must_use]
    pub fn is_phase_complete(state: &RoundState) -> bool {
        match state.phase {
            Phase::Bidding => state.all_bids_in(),
            Phase::Playing => state.is_trick_complete(),
            _ => true,
        }
    }

    /// Follows the edge out of the current phase.
    #[must_use]
    pub fn next_phase(&self, state: &RoundState) -> RoundState {
        let mut next = state.clone();
        next.phase = match state.phase {
            Phase::Starting => Phase::Dealing,
            Phase::Dealing => Phase::StartBidding,
            Phase::StartBidding => Phase::Bidding,
            Phase::Bidding => Phase::StartPlaying,
            Phase::StartPlaying => Phase::Playing,
            Phase::Playing => Phase::Resolving,
            Phase::Resolving if state.is_round_over() => Phase::CalculateScores,
            Phase::Resolving => Phase::StartPlaying,
            Phase::CalculateScores => {
                next.round += 1;
                if next.round > self.settings.max_rounds {
                    Phase::GameOver
                } else {
                    next.dealer = next.next_seat(state.dealer);
                    Phase::Starting
                }
            }
            Phase::GameOver => Phase::GameOver,
        };
        next
    }
}
