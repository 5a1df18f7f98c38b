//! Property-based tests for the deck, legality rules, trick resolution and
//! scoring.

use pirate_king::{
    constants::DECK_SIZE,
    entities::{Card, CapturedTricks, Hand, LeadingSuit, PlayerId, SpecialCard, Suit, Trick},
    game::{Deck, legality, resolver, scoring},
};
use proptest::prelude::*;

fn suit_strategy() -> impl Strategy<Value = Suit> {
    prop_oneof![
        Just(Suit::Parrot),
        Just(Suit::PirateMap),
        Just(Suit::TreasureChest),
        Just(Suit::JollyRoger),
    ]
}

fn card_strategy() -> impl Strategy<Value = Card> {
    prop_oneof![
        6 => (suit_strategy(), 1u8..=14).prop_map(|(suit, number)| Card::standard(suit, number)),
        1 => Just(Card::from(SpecialCard::escape())),
        1 => Just(Card::from(SpecialCard::pirate())),
        1 => Just(Card::from(SpecialCard::tigress())),
        1 => Just(Card::from(SpecialCard::skull_king())),
    ]
}

fn trick_strategy() -> impl Strategy<Value = Trick> {
    prop::collection::vec(card_strategy(), 1..=8).prop_map(|cards| {
        cards
            .into_iter()
            .enumerate()
            .map(|(i, card)| (PlayerId(i as u32 + 1), card))
            .collect()
    })
}

/// Leading suit as the reducer would have established it, card by card.
fn leading_suit_of(trick: &Trick) -> Option<LeadingSuit> {
    trick.iter().fold(None, |lead, play| {
        Some(legality::next_leading_suit(lead, &play.card))
    })
}

proptest! {
    #[test]
    fn test_deal_fails_only_past_deck_size(seed in any::<u64>(), extra in 1usize..10) {
        use rand::{SeedableRng, rngs::StdRng};

        let mut deck = Deck::new();
        deck.shuffle_with(&mut StdRng::seed_from_u64(seed));
        for _ in 0..DECK_SIZE {
            prop_assert!(deck.deal().is_ok());
        }
        for _ in 0..extra {
            prop_assert!(deck.deal().is_err());
        }
    }

    #[test]
    fn test_winner_played_in_trick(trick in trick_strategy()) {
        let lead = leading_suit_of(&trick);
        let winner = resolver::resolve(&trick, lead).unwrap();
        prop_assert!(trick.contains(winner));
    }

    #[test]
    fn test_winner_holds_top_priority(trick in trick_strategy()) {
        let lead = leading_suit_of(&trick);
        let winner = resolver::resolve(&trick, lead).unwrap();
        let top = trick.iter().map(|play| play.card.priority()).max().unwrap();
        let winning = trick.iter().find(|play| play.player == winner).unwrap();
        prop_assert_eq!(winning.card.priority(), top);
    }

    #[test]
    fn test_skull_king_always_wins(mut cards in prop::collection::vec(card_strategy(), 0..7), at in 0usize..8) {
        cards.retain(|card| card.priority() < 4);
        let at = at.min(cards.len());
        cards.insert(at, SpecialCard::skull_king().into());
        let trick: Trick = cards
            .into_iter()
            .enumerate()
            .map(|(i, card)| (PlayerId(i as u32 + 1), card))
            .collect();
        let winner = resolver::resolve(&trick, leading_suit_of(&trick)).unwrap();
        prop_assert_eq!(winner, PlayerId(at as u32 + 1));
    }

    #[test]
    fn test_some_card_is_always_legal(
        hand in prop::collection::vec(card_strategy(), 1..10),
        suit in suit_strategy(),
    ) {
        let hand: Hand = hand.into_iter().collect();
        let lead = LeadingSuit::Suit(suit);
        prop_assert!(hand.iter().any(|card| legality::is_legal(lead, &hand, card)));
    }

    #[test]
    fn test_holding_lead_forbids_other_suits(
        hand in prop::collection::vec(card_strategy(), 1..10),
        suit in suit_strategy(),
    ) {
        let hand: Hand = hand.into_iter().collect();
        let holds_lead = hand.iter().any(|card| card.suit() == Some(suit));
        for card in hand.iter() {
            let off_suit = card.suit().is_some_and(|s| s != suit);
            let legal = legality::is_legal(LeadingSuit::Suit(suit), &hand, card);
            prop_assert_eq!(legal, !(holds_lead && off_suit));
        }
    }

    #[test]
    fn test_made_bid_never_negative(bid in 1u32..=10, round in 1u32..=10) {
        let captured: CapturedTricks = (1..=bid)
            .map(|seq| (seq, vec![Card::standard(Suit::Parrot, 2)]))
            .collect();
        prop_assert_eq!(scoring::score_for(bid, &captured, round), bid as i32 * 20);
    }

    #[test]
    fn test_missed_bid_costs_ten_per_trick(bid in 1u32..=10, tricks in 0u32..=10) {
        prop_assume!(bid != tricks);
        let captured: CapturedTricks = (1..=tricks)
            .map(|seq| (seq, vec![Card::standard(Suit::Parrot, 2)]))
            .collect();
        let expected = -((bid as i32 - tricks as i32).abs() * 10);
        prop_assert_eq!(scoring::score_for(bid, &captured, 10), expected);
    }
}
