//! Round scoring.

use im::OrdMap;

use super::{
    entities::{Bid, Card, CapturedTricks, PlayerId, Score, ScoreSheet, SpecialKind},
    state_machine::RoundState,
};

/// Points per trick for a made bid.
const MADE_BID_POINTS: Score = 20;

/// Points per round (zero bid) or per trick of difference (missed bid).
const MISS_POINTS: Score = 10;

/// Bonus points carried by a player's captured cards.
///
/// Suited cards always add their bonus. A Pirate only adds its bonus once a
/// Skull King has been seen earlier in the same scan, in trick order.
#[must_use]
pub fn bonus(captured: &CapturedTricks) -> Score {
    let mut skull_king_seen = false;
    let mut total = 0;
    for card in captured.values().flatten() {
        match card {
            Card::Standard(card) => total += card.bonus,
            Card::Special(card) => match card.kind {
                SpecialKind::SkullKing => skull_king_seen = true,
                SpecialKind::Pirate if skull_king_seen => total += card.bonus,
                _ => {}
            },
        }
    }
    total
}

/// Score delta for one player in one round.
#[must_use]
pub fn score_for(bid: Bid, captured: &CapturedTricks, round: u32) -> Score {
    let bid = bid as Score;
    let tricks = captured.len() as Score;
    let round = round as Score;

    match (bid, tricks) {
        (0, 0) => round * MISS_POINTS,
        (0, _) => -round * MISS_POINTS,
        (b, t) if b == t => b * MADE_BID_POINTS + bonus(captured),
        (b, t) => -(b - t).abs() * MISS_POINTS,
    }
}

/// Deltas for every player who bid this round.
#[must_use]
pub fn round_deltas(state: &RoundState) -> OrdMap<PlayerId, Score> {
    let none = CapturedTricks::new();
    state
        .bids
        .iter()
        .map(|(player, bid)| {
            let captured = state.tricks_won.get(player).unwrap_or(&none);
            (*player, score_for(*bid, captured, state.round))
        })
        .collect()
}

/// The score sheet with this round's deltas added.
#[must_use]
pub fn apply(state: &RoundState) -> ScoreSheet {
    let mut sheet = state.score_sheet.clone();
    for (player, delta) in round_deltas(state) {
        let total = sheet.get(&player).copied().unwrap_or(0) + delta;
        sheet.insert(player, total);
    }
    sheet
}
