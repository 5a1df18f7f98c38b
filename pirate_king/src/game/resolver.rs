use super::entities::{LeadingSuit, PlayerId, Trick, TrickSeq, TricksWon};

/// Picks the winner of a complete trick.
///
/// Cards are walked in play order. A strictly higher priority takes the
/// trick outright. On equal priority a card only takes over if it is of the
/// leading suit and outnumbers the best card so far, so among equal specials
/// (or off-suit cards) the first one played keeps the trick.
///
/// Returns `None` for an empty trick.
#[must_use]
pub fn resolve(trick: &Trick, leading_suit: Option<LeadingSuit>) -> Option<PlayerId> {
    let lead = match leading_suit {
        Some(LeadingSuit::Suit(suit)) => Some(suit),
        _ => None,
    };

    let mut best = None;
    for play in trick.iter() {
        let (priority, number) = (play.card.priority(), play.card.number());
        best = match best {
            None => Some((priority, number, play.player)),
            Some((top, _, _)) if priority > top => Some((priority, number, play.player)),
            Some((top, high, _))
                if priority == top && lead.is_some() && play.card.suit() == lead && number > high =>
            {
                Some((priority, number, play.player))
            }
            keep => keep,
        };
    }
    best.map(|(_, _, winner)| winner)
}

/// Files a won trick under the winner, keyed by its sequence in the round.
pub fn determine_tricks(tricks_won: &mut TricksWon, winner: PlayerId, trick: &Trick, seq: TrickSeq) {
    let mut captured = tricks_won.get(&winner).cloned().unwrap_or_default();
    captured.insert(seq, trick.cards());
    tricks_won.insert(winner, captured);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Card, SpecialCard, Suit, TigressPlay};

    fn trick(plays: Vec<(u32, Card)>) -> Trick {
        plays.into_iter().map(|(id, card)| (PlayerId(id), card)).collect()
    }

    fn lead(suit: Suit) -> Option<LeadingSuit> {
        Some(LeadingSuit::Suit(suit))
    }

    #[test]
    fn test_highest_priority_wins() {
        let trick = trick(vec![
            (1, Card::standard(Suit::Parrot, 5)),
            (2, Card::standard(Suit::PirateMap, 2)),
            (3, Card::standard(Suit::TreasureChest, 3)),
            (4, Card::standard(Suit::JollyRoger, 3)),
        ]);
        assert_eq!(resolve(&trick, lead(Suit::Parrot)), Some(PlayerId(4)));
    }

    #[test]
    fn test_off_suit_cards_never_take_over() {
        let same_priority = trick(vec![
            (1, Card::standard(Suit::TreasureChest, 5)),
            (2, Card::standard(Suit::Parrot, 2)),
            (3, Card::standard(Suit::PirateMap, 2)),
        ]);
        assert_eq!(resolve(&same_priority, lead(Suit::TreasureChest)), Some(PlayerId(1)));

        let higher_off_suit = trick(vec![
            (1, Card::standard(Suit::TreasureChest, 2)),
            (2, Card::standard(Suit::Parrot, 14)),
        ]);
        assert_eq!(resolve(&higher_off_suit, lead(Suit::TreasureChest)), Some(PlayerId(1)));
    }

    #[test]
    fn test_higher_number_of_lead_wins() {
        let trick = trick(vec![
            (1, Card::standard(Suit::PirateMap, 5)),
            (2, Card::standard(Suit::PirateMap, 7)),
        ]);
        assert_eq!(resolve(&trick, lead(Suit::PirateMap)), Some(PlayerId(2)));
    }

    #[test]
    fn test_skull_king_beats_escapes() {
        let trick = trick(vec![
            (1, SpecialCard::escape().into()),
            (2, SpecialCard::skull_king().into()),
            (3, SpecialCard::tigress().declare(TigressPlay::Escape).into()),
        ]);
        assert_eq!(resolve(&trick, Some(LeadingSuit::NoneEscape)), Some(PlayerId(2)));
    }

    #[test]
    fn test_first_pirate_keeps_trick() {
        let trick = trick(vec![
            (2, Card::standard(Suit::Parrot, 9)),
            (3, SpecialCard::pirate().into()),
            (1, SpecialCard::pirate().into()),
        ]);
        assert_eq!(resolve(&trick, lead(Suit::Parrot)), Some(PlayerId(3)));
    }

    #[test]
    fn test_declared_tigress_ties_with_pirate() {
        let trick = trick(vec![
            (1, SpecialCard::tigress().declare(TigressPlay::Pirate).into()),
            (2, SpecialCard::pirate().into()),
        ]);
        assert_eq!(resolve(&trick, Some(LeadingSuit::NonePirate)), Some(PlayerId(1)));
    }

    #[test]
    fn test_all_escapes_go_to_first() {
        let trick = trick(vec![
            (3, SpecialCard::escape().into()),
            (1, SpecialCard::escape().into()),
            (2, SpecialCard::escape().into()),
        ]);
        assert_eq!(resolve(&trick, Some(LeadingSuit::NoneEscape)), Some(PlayerId(3)));
    }

    #[test]
    fn test_empty_trick_has_no_winner() {
        assert_eq!(resolve(&Trick::new(), None), None);
    }

    #[test]
    fn test_determine_tricks_files_by_sequence() {
        let mut won = TricksWon::new();
        let first = trick(vec![(1, Card::standard(Suit::Parrot, 3))]);
        let second = trick(vec![(1, Card::standard(Suit::Parrot, 4))]);
        determine_tricks(&mut won, PlayerId(1), &first, 1);
        determine_tricks(&mut won, PlayerId(1), &second, 2);

        let captured = won.get(&PlayerId(1)).unwrap();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured.get(&2), Some(&second.cards()));
        assert!(won.get(&PlayerId(2)).is_none());
    }
}
