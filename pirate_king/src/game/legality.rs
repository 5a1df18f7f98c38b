//! Bid and card-play legality.
//!
//! Everything here is a pure check against a [`RoundState`]; the reducer in
//! [`super::state_machine`] commits the result.

use super::{
    entities::{Bid, Card, Hand, LeadingSuit, PlayerId, TigressPlay},
    errors::IllegalAction,
    state_machine::RoundState,
};

/// A player may bid once per round.
#[must_use]
pub fn validate_bid(state: &RoundState, player: PlayerId) -> bool {
    !state.bids.contains_key(&player)
}

/// Bids range from zero up to the number of cards dealt this round.
///
/// # Errors
///
/// [`IllegalAction::BidOutOfRange`] when `bid > round`.
pub fn validate_bid_amount(state: &RoundState, bid: Bid) -> Result<(), IllegalAction> {
    if bid > state.round {
        return Err(IllegalAction::BidOutOfRange {
            bid,
            max: state.round,
        });
    }
    Ok(())
}

/// # Errors
///
/// [`IllegalAction::AlreadyBid`] or [`IllegalAction::BidOutOfRange`].
pub fn check_bid(state: &RoundState, player: PlayerId, bid: Bid) -> Result<(), IllegalAction> {
    if !validate_bid(state, player) {
        return Err(IllegalAction::AlreadyBid);
    }
    validate_bid_amount(state, bid)
}

/// What a card would establish if it were the first substantive card of the
/// trick.
#[must_use]
pub fn derive_leading_suit(card: &Card) -> LeadingSuit {
    match card {
        Card::Standard(card) => LeadingSuit::Suit(card.suit),
        Card::Special(card) if card.leads_as_pirate() => LeadingSuit::NonePirate,
        Card::Special(_) => LeadingSuit::NoneEscape,
    }
}

/// The leading suit after `card` is played onto a trick whose leading suit
/// is `current`. Only an empty or escape-led trick takes a new lead.
#[must_use]
pub fn next_leading_suit(current: Option<LeadingSuit>, card: &Card) -> LeadingSuit {
    match current {
        None | Some(LeadingSuit::NoneEscape) => derive_leading_suit(card),
        Some(lead) => lead,
    }
}

/// Follow-suit rule. Special cards may always be played, and a suited card
/// that doesn't follow is fine as long as the hand has nothing that does.
#[must_use]
pub fn is_legal(leading: LeadingSuit, hand: &Hand, card: &Card) -> bool {
    let LeadingSuit::Suit(lead) = leading else {
        return true;
    };
    match card.suit() {
        None => true,
        Some(suit) if suit == lead => true,
        Some(_) => !hand.iter().any(|held| held.suit() == Some(lead)),
    }
}

/// Checks that `player` may play the card at `card_index`, applying any
/// Tigress declaration first.
///
/// Returns the leading suit the trick will have afterwards and the card as
/// it will be played.
///
/// # Errors
///
/// [`IllegalAction::NotYourTurn`], [`IllegalAction::CardIndexOutOfRange`]
/// or [`IllegalAction::MustFollowSuit`].
pub fn check_play(
    state: &RoundState,
    player: PlayerId,
    card_index: usize,
    tigress: Option<TigressPlay>,
) -> Result<(LeadingSuit, Card), IllegalAction> {
    if state.current_player() != player || state.trick.contains(player) {
        return Err(IllegalAction::NotYourTurn);
    }

    let empty = Hand::new();
    let hand = state.hand(player).unwrap_or(&empty);
    let card = hand
        .get(card_index)
        .copied()
        .ok_or(IllegalAction::CardIndexOutOfRange {
            index: card_index,
            hand_size: hand.len(),
        })?;
    let card = match (card, tigress) {
        (Card::Special(special), Some(play)) => Card::Special(special.declare(play)),
        (card, _) => card,
    };

    let leading = next_leading_suit(state.leading_suit, &card);
    if !is_legal(leading, hand, &card) {
        return Err(IllegalAction::MustFollowSuit(leading));
    }
    Ok((leading, card))
}

/// Boolean form of [`check_play`] that records the leading suit on success,
/// for callers that only want a yes or no.
pub fn validate_play(state: &mut RoundState, player: PlayerId, card_index: usize) -> bool {
    match check_play(state, player, card_index, None) {
        Ok((leading, _)) => {
            state.leading_suit = Some(leading);
            true
        }
        Err(_) => false,
    }
}
