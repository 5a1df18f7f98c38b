use rand::{Rng, seq::SliceRandom};

use super::{
    constants::{DECK_SIZE, ESCAPE_COUNT, MAX_CARD_NUMBER, PIRATE_COUNT, SKULL_KING_COUNT, TIGRESS_COUNT},
    entities::{Card, SpecialCard, Suit},
    errors::GameError,
};

/// The card population for one round. A fresh deck is built and shuffled
/// every round; cards only ever leave it through [`Deck::deal`].
#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    #[must_use]
    pub fn new() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for suit in Suit::ALL {
            for number in 1..=MAX_CARD_NUMBER {
                cards.push(Card::standard(suit, number));
            }
        }
        let specials = [
            (SpecialCard::pirate(), PIRATE_COUNT),
            (SpecialCard::escape(), ESCAPE_COUNT),
            (SpecialCard::tigress(), TIGRESS_COUNT),
            (SpecialCard::skull_king(), SKULL_KING_COUNT),
        ];
        for (card, count) in specials {
            cards.extend(std::iter::repeat_n(Card::Special(card), count));
        }
        Self { cards }
    }

    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::rng());
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Removes and returns the last card.
    ///
    /// # Errors
    ///
    /// [`GameError::EmptyDeck`] once every card has been dealt.
    pub fn deal(&mut self) -> Result<Card, GameError> {
        self.cards.pop().ok_or(GameError::EmptyDeck)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::SpecialKind;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_deck_initialization() {
        let deck = Deck::new();
        assert_eq!(deck.len(), 68);

        let count = |kind| {
            deck.cards
                .iter()
                .filter(|card| card.special_kind() == Some(kind))
                .count()
        };
        assert_eq!(count(SpecialKind::Pirate), 5);
        assert_eq!(count(SpecialKind::Escape), 5);
        assert_eq!(count(SpecialKind::Tigress), 1);
        assert_eq!(count(SpecialKind::SkullKing), 1);
        assert_eq!(count(SpecialKind::Kraken), 0);
    }

    #[test]
    fn test_each_suit_has_fourteen_cards() {
        let deck = Deck::new();
        for suit in Suit::ALL {
            let numbers: Vec<u8> = deck
                .cards
                .iter()
                .filter(|card| card.suit() == Some(suit))
                .map(Card::number)
                .collect();
            assert_eq!(numbers, (1..=14).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_deck_shuffle_keeps_cards() {
        let mut deck = Deck::new();
        deck.shuffle_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(deck.len(), 68);

        let mut sorted = deck.cards.clone();
        let mut fresh = Deck::new().cards;
        let key = |card: &Card| format!("{card}");
        sorted.sort_by_key(key);
        fresh.sort_by_key(key);
        assert_eq!(sorted, fresh);
    }

    #[test]
    fn test_seeded_shuffles_match() {
        let mut a = Deck::new();
        let mut b = Deck::new();
        a.shuffle_with(&mut StdRng::seed_from_u64(42));
        b.shuffle_with(&mut StdRng::seed_from_u64(42));
        assert_eq!(a.cards, b.cards);
    }

    #[test]
    fn test_deal_pops_last_card() {
        let mut deck = Deck::new();
        let expected = *deck.cards.last().unwrap();
        assert_eq!(deck.deal().unwrap(), expected);
        assert_eq!(deck.len(), 67);
    }

    #[test]
    fn test_deal_past_end_is_empty_deck() {
        let mut deck = Deck::new();
        for _ in 0..68 {
            deck.deal().unwrap();
        }
        assert!(deck.is_empty());
        assert_eq!(deck.deal(), Err(GameError::EmptyDeck));
    }
}
