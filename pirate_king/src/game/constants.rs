/// Number of rounds in a full game. Round `n` deals `n` cards to every seat.
pub const MAX_ROUNDS: u32 = 10;

/// Fewest seats a game can start with.
pub const MIN_PLAYERS: usize = 3;

/// Most seats a game can start with.
pub const MAX_PLAYERS: usize = 8;

/// Highest number printed on a suited card.
pub const MAX_CARD_NUMBER: u8 = 14;

/// Priority of the three plain suits.
pub const PLAIN_SUIT_PRIORITY: u8 = 1;

/// Priority of the trump suit (Jolly Roger).
pub const TRUMP_SUIT_PRIORITY: u8 = 2;

/// Bonus for capturing the 14 of a plain suit.
pub const PLAIN_FOURTEEN_BONUS: i32 = 10;

/// Bonus for capturing the 14 of the trump suit.
pub const TRUMP_FOURTEEN_BONUS: i32 = 20;

pub const PIRATE_COUNT: usize = 5;
pub const ESCAPE_COUNT: usize = 5;
pub const TIGRESS_COUNT: usize = 1;
pub const SKULL_KING_COUNT: usize = 1;

/// Cards in a freshly built deck: four suits of 14 plus the special cards.
pub const DECK_SIZE: usize = 4 * MAX_CARD_NUMBER as usize
    + PIRATE_COUNT
    + ESCAPE_COUNT
    + TIGRESS_COUNT
    + SKULL_KING_COUNT;

/// Max length of a username. Longer names are truncated.
pub const MAX_USERNAME_LENGTH: usize = 16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_size() {
        assert_eq!(DECK_SIZE, 68);
    }

    #[test]
    fn test_smallest_table_fits_every_round() {
        assert!(MAX_ROUNDS as usize * MIN_PLAYERS <= DECK_SIZE);
    }
}
