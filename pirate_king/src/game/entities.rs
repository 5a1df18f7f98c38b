use im::{OrdMap, Vector};
use serde::{Deserialize, Deserializer, Serialize, de};
use std::fmt;

use super::constants::{
    MAX_USERNAME_LENGTH, PLAIN_FOURTEEN_BONUS, PLAIN_SUIT_PRIORITY, TRUMP_FOURTEEN_BONUS,
    TRUMP_SUIT_PRIORITY,
};

/// Card number on a suited card (1..=14). Special cards have none.
pub type Number = u8;

/// Rank of a card when resolving a trick. Higher wins outright.
pub type Priority = u8;

/// Points a card is worth to whoever captures it, on a made bid.
pub type Bonus = i32;

/// Points on the score sheet. Round deltas can be negative.
pub type Score = i32;

/// Number of tricks a player expects to take in a round.
pub type Bid = u32;

/// Sequence key of a captured trick within a round (1-based).
pub type TrickSeq = u32;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Parrot,
    #[serde(rename = "Pirate Map")]
    PirateMap,
    #[serde(rename = "Treasure Chest")]
    TreasureChest,
    /// Trump suit.
    #[serde(rename = "Jolly Roger")]
    JollyRoger,
}

impl Suit {
    pub const ALL: [Suit; 4] = [
        Suit::Parrot,
        Suit::PirateMap,
        Suit::TreasureChest,
        Suit::JollyRoger,
    ];

    #[must_use]
    pub const fn priority(self) -> Priority {
        match self {
            Self::JollyRoger => TRUMP_SUIT_PRIORITY,
            _ => PLAIN_SUIT_PRIORITY,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Parrot => "Parrot",
            Self::PirateMap => "Pirate Map",
            Self::TreasureChest => "Treasure Chest",
            Self::JollyRoger => "Jolly Roger",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct StandardCard {
    pub suit: Suit,
    pub number: Number,
    pub bonus: Bonus,
    pub priority: Priority,
}

impl StandardCard {
    /// Builds a suited card, deriving its priority from the suit and its
    /// bonus from the number (only a 14 carries one).
    #[must_use]
    pub const fn new(suit: Suit, number: Number) -> Self {
        let priority = suit.priority();
        let bonus = match (number, priority) {
            (14, TRUMP_SUIT_PRIORITY) => TRUMP_FOURTEEN_BONUS,
            (14, _) => PLAIN_FOURTEEN_BONUS,
            _ => 0,
        };
        Self {
            suit,
            number,
            bonus,
            priority,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum SpecialKind {
    Escape,
    Pirate,
    Tigress,
    #[serde(rename = "Skull King")]
    SkullKing,
    // Expansion cards. The base deck never deals these, but leading-suit
    // derivation already knows how they lead.
    Kraken,
    #[serde(rename = "White Whale")]
    WhiteWhale,
    Mermaid,
}

impl SpecialKind {
    /// Kinds that impose no suit on the rest of the trick when led.
    #[must_use]
    pub const fn beats_everything(self) -> bool {
        matches!(
            self,
            Self::Pirate | Self::SkullKing | Self::Kraken | Self::WhiteWhale | Self::Mermaid
        )
    }
}

impl fmt::Display for SpecialKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Escape => "Escape",
            Self::Pirate => "Pirate",
            Self::Tigress => "Tigress",
            Self::SkullKing => "Skull King",
            Self::Kraken => "Kraken",
            Self::WhiteWhale => "White Whale",
            Self::Mermaid => "Mermaid",
        };
        write!(f, "{repr}")
    }
}

/// How the Tigress is played. The client declares it and the server
/// takes the declaration at face value.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TigressPlay {
    Escape,
    Pirate,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct SpecialCard {
    #[serde(rename = "type")]
    pub kind: SpecialKind,
    pub priority: Priority,
    pub bonus: Bonus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared: Option<TigressPlay>,
}

impl SpecialCard {
    #[must_use]
    pub const fn new(kind: SpecialKind, priority: Priority, bonus: Bonus) -> Self {
        Self {
            kind,
            priority,
            bonus,
            declared: None,
        }
    }

    #[must_use]
    pub const fn escape() -> Self {
        Self::new(SpecialKind::Escape, 0, 0)
    }

    #[must_use]
    pub const fn pirate() -> Self {
        Self::new(SpecialKind::Pirate, 3, 30)
    }

    /// As dealt, the Tigress behaves like an escape until declared.
    #[must_use]
    pub const fn tigress() -> Self {
        Self::new(SpecialKind::Tigress, 0, 0)
    }

    #[must_use]
    pub const fn skull_king() -> Self {
        Self::new(SpecialKind::SkullKing, 4, 40)
    }

    /// Applies a Tigress declaration. Any other card is returned unchanged.
    #[must_use]
    pub fn declare(self, play: TigressPlay) -> Self {
        if self.kind != SpecialKind::Tigress {
            return self;
        }
        let priority = match play {
            TigressPlay::Escape => Self::escape().priority,
            TigressPlay::Pirate => Self::pirate().priority,
        };
        Self {
            priority,
            declared: Some(play),
            ..self
        }
    }

    /// Whether this card, when led, leaves the trick without a suit to follow
    /// in the pirate-like sense (as opposed to the escape-like sense).
    #[must_use]
    pub fn leads_as_pirate(&self) -> bool {
        self.kind.beats_everything() || self.declared == Some(TigressPlay::Pirate)
    }
}

/// Any card in the deck.
///
/// Serialized without a tag: suited cards carry `suit` and `number`,
/// special cards carry `type`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Card {
    Standard(StandardCard),
    Special(SpecialCard),
}

impl Card {
    #[must_use]
    pub const fn standard(suit: Suit, number: Number) -> Self {
        Self::Standard(StandardCard::new(suit, number))
    }

    #[must_use]
    pub const fn priority(&self) -> Priority {
        match self {
            Self::Standard(card) => card.priority,
            Self::Special(card) => card.priority,
        }
    }

    #[must_use]
    pub const fn bonus(&self) -> Bonus {
        match self {
            Self::Standard(card) => card.bonus,
            Self::Special(card) => card.bonus,
        }
    }

    #[must_use]
    pub const fn suit(&self) -> Option<Suit> {
        match self {
            Self::Standard(card) => Some(card.suit),
            Self::Special(_) => None,
        }
    }

    /// Number used for tie-breaks. Special cards count as 0.
    #[must_use]
    pub const fn number(&self) -> Number {
        match self {
            Self::Standard(card) => card.number,
            Self::Special(_) => 0,
        }
    }

    #[must_use]
    pub const fn special_kind(&self) -> Option<SpecialKind> {
        match self {
            Self::Standard(_) => None,
            Self::Special(card) => Some(card.kind),
        }
    }
}

impl From<StandardCard> for Card {
    fn from(value: StandardCard) -> Self {
        Self::Standard(value)
    }
}

impl From<SpecialCard> for Card {
    fn from(value: SpecialCard) -> Self {
        Self::Special(value)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Standard(card) => write!(f, "{} of {}", card.number, card.suit),
            Self::Special(SpecialCard {
                kind,
                declared: Some(play),
                ..
            }) => write!(f, "{kind} (as {play:?})"),
            Self::Special(card) => write!(f, "{}", card.kind),
        }
    }
}

/// What the first substantive card of a trick asks the others to follow.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum LeadingSuit {
    Suit(Suit),
    /// A pirate-like card led; nothing has to be followed.
    NonePirate,
    /// Only escape-like cards so far; the next real card sets the suit.
    NoneEscape,
}

impl fmt::Display for LeadingSuit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Suit(suit) => write!(f, "{suit}"),
            Self::NonePirate => write!(f, "none (pirate)"),
            Self::NoneEscape => write!(f, "none (escape)"),
        }
    }
}

/// Serializes as a bare number. JSON object keys carry it as a string, so
/// deserializing accepts either form.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PlayerIdVisitor;

        impl de::Visitor<'_> for PlayerIdVisitor {
            type Value = PlayerId;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a player id as a number or a numeric string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<PlayerId, E> {
                u32::try_from(v)
                    .map(PlayerId)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<PlayerId, E> {
                u32::try_from(v)
                    .map(PlayerId)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<PlayerId, E> {
                v.parse()
                    .map(PlayerId)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(PlayerIdVisitor)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Self {
        let mut username: String = s
            .trim()
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .collect();
        if let Some((idx, _)) = username.char_indices().nth(MAX_USERNAME_LENGTH) {
            username.truncate(idx);
        }
        Self(username)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<&str> for Username {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A seated player. Identity and seat order are fixed for the game.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: Username,
}

impl Player {
    pub fn new(id: u32, username: &str) -> Self {
        Self {
            id: PlayerId(id),
            username: Username::new(username),
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.id)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Play {
    pub player: PlayerId,
    pub card: Card,
}

/// Cards played in the current trick, in play order.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Trick(Vector<Play>);

impl Trick {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, player: PlayerId, card: Card) {
        debug_assert!(!self.contains(player), "{player} already played this trick");
        self.0.push_back(Play { player, card });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, player: PlayerId) -> bool {
        self.0.iter().any(|play| play.player == player)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Play> {
        self.0.iter()
    }

    /// Cards in play order, as they get stored once captured.
    #[must_use]
    pub fn cards(&self) -> Vec<Card> {
        self.0.iter().map(|play| play.card).collect()
    }
}

impl FromIterator<(PlayerId, Card)> for Trick {
    fn from_iter<I: IntoIterator<Item = (PlayerId, Card)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(player, card)| Play { player, card })
                .collect(),
        )
    }
}

pub type Hand = Vector<Card>;
pub type Hands = OrdMap<PlayerId, Hand>;
pub type Bids = OrdMap<PlayerId, Bid>;
pub type CapturedTricks = OrdMap<TrickSeq, Vec<Card>>;
pub type TricksWon = OrdMap<PlayerId, CapturedTricks>;
pub type ScoreSheet = OrdMap<PlayerId, Score>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_card_stats() {
        let plain = StandardCard::new(Suit::Parrot, 14);
        assert_eq!(plain.priority, 1);
        assert_eq!(plain.bonus, 10);

        let trump = StandardCard::new(Suit::JollyRoger, 14);
        assert_eq!(trump.priority, 2);
        assert_eq!(trump.bonus, 20);

        let low = StandardCard::new(Suit::JollyRoger, 13);
        assert_eq!(low.bonus, 0);
    }

    #[test]
    fn test_special_card_stats() {
        assert_eq!(SpecialCard::escape().priority, 0);
        assert_eq!(SpecialCard::pirate().priority, 3);
        assert_eq!(SpecialCard::pirate().bonus, 30);
        assert_eq!(SpecialCard::skull_king().priority, 4);
        assert_eq!(SpecialCard::tigress().priority, 0);
    }

    #[test]
    fn test_tigress_declaration() {
        let pirate_like = SpecialCard::tigress().declare(TigressPlay::Pirate);
        assert_eq!(pirate_like.priority, 3);
        assert!(pirate_like.leads_as_pirate());
        assert_eq!(pirate_like.kind, SpecialKind::Tigress);

        let escape_like = SpecialCard::tigress().declare(TigressPlay::Escape);
        assert_eq!(escape_like.priority, 0);
        assert!(!escape_like.leads_as_pirate());
    }

    #[test]
    fn test_declare_ignored_for_other_kinds() {
        let pirate = SpecialCard::pirate();
        assert_eq!(pirate.declare(TigressPlay::Escape), pirate);
    }

    #[test]
    fn test_card_serialization_shape() {
        let card = Card::standard(Suit::PirateMap, 7);
        let json = serde_json::to_value(card).unwrap();
        assert_eq!(json["suit"], "Pirate Map");
        assert_eq!(json["number"], 7);

        let special = Card::from(SpecialCard::skull_king());
        let json = serde_json::to_value(special).unwrap();
        assert_eq!(json["type"], "Skull King");
        assert!(json.get("declared").is_none());

        let back: Card = serde_json::from_value(json).unwrap();
        assert_eq!(back, special);
    }

    #[test]
    fn test_player_id_from_number_or_key() {
        assert_eq!(serde_json::from_str::<PlayerId>("3").unwrap(), PlayerId(3));
        assert_eq!(serde_json::from_str::<PlayerId>("\"3\"").unwrap(), PlayerId(3));
        assert!(serde_json::from_str::<PlayerId>("-1").is_err());
        assert!(serde_json::from_str::<PlayerId>("\"three\"").is_err());

        let bids: Bids = serde_json::from_str(r#"{"1":0,"2":3}"#).unwrap();
        assert_eq!(bids.get(&PlayerId(2)), Some(&3));
    }

    #[test]
    fn test_username_sanitized() {
        let username = Username::new("  jack sparrow ");
        assert_eq!(username.as_str(), "jack_sparrow");

        let long = Username::new(&"x".repeat(40));
        assert_eq!(long.as_str().len(), MAX_USERNAME_LENGTH);
    }

    #[test]
    fn test_trick_keeps_play_order() {
        let mut trick = Trick::new();
        trick.push(PlayerId(3), Card::standard(Suit::Parrot, 2));
        trick.push(PlayerId(1), Card::standard(Suit::Parrot, 9));
        let order: Vec<PlayerId> = trick.iter().map(|play| play.player).collect();
        assert_eq!(order, vec![PlayerId(3), PlayerId(1)]);
        assert!(trick.contains(PlayerId(1)));
        assert!(!trick.contains(PlayerId(2)));
    }
}
