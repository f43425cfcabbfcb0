use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize};
use std::{
    collections::HashSet,
    fmt::{self},
    hash::{Hash, Hasher},
    mem::discriminant,
    str::FromStr,
};

use super::{
    constants,
    errors::{ActionError, IllegalAction, ParseCardError, RoundError},
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Heart,
    Spade,
    Club,
    Diamond,
}

impl Suit {
    pub const ALL: [Self; 4] = [Self::Heart, Self::Spade, Self::Club, Self::Diamond];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Heart => "H",
            Self::Spade => "S",
            Self::Club => "C",
            Self::Diamond => "D",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for Suit {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "H" => Ok(Self::Heart),
            "S" => Ok(Self::Spade),
            "C" => Ok(Self::Club),
            "D" => Ok(Self::Diamond),
            _ => Err(ParseCardError(s.to_string())),
        }
    }
}

/// Card values, ordered deuce low to ace high. The discriminant is the
/// value's pip count (ace = 14).
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[repr(u8)]
pub enum Value {
    Two = 2,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Value {
    pub const ALL: [Self; 13] = [
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Five,
        Self::Six,
        Self::Seven,
        Self::Eight,
        Self::Nine,
        Self::Ten,
        Self::Jack,
        Self::Queen,
        Self::King,
        Self::Ace,
    ];

    #[must_use]
    pub fn pips(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Ten => "T".to_string(),
            Self::Jack => "J".to_string(),
            Self::Queen => "Q".to_string(),
            Self::King => "K".to_string(),
            Self::Ace => "A".to_string(),
            v => v.pips().to_string(),
        };
        write!(f, "{repr}")
    }
}

impl FromStr for Value {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = match s.to_ascii_uppercase().as_str() {
            "T" | "10" => Self::Ten,
            "J" => Self::Jack,
            "Q" => Self::Queen,
            "K" => Self::King,
            "A" => Self::Ace,
            digit => {
                let pips: u8 = digit.parse().map_err(|_| ParseCardError(s.to_string()))?;
                Self::ALL
                    .into_iter()
                    .find(|v| v.pips() == pips)
                    .ok_or_else(|| ParseCardError(s.to_string()))?
            }
        };
        Ok(value)
    }
}

/// A card is a value and a suit. Written as value then suit initial,
/// e.g. `AH` for the ace of hearts and `TS` for the ten of spades.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.0, self.1)
    }
}

impl FromStr for Card {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() < 2 || !s.is_ascii() {
            return Err(ParseCardError(s.to_string()));
        }
        let (value, suit) = s.split_at(s.len() - 1);
        Ok(Self(value.parse()?, suit.parse()?))
    }
}

/// Hand categories, weakest first.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum HandRank {
    HighCard,
    Pair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::Pair => "pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
            Self::RoyalFlush => "royal flush",
        };
        write!(f, "{repr}")
    }
}

/// A 52-card deck dealt front to back without replacement. A fresh deck
/// is built and shuffled for every round.
#[derive(Debug)]
pub struct Deck {
    cards: Vec<Card>,
    pub deck_idx: usize,
}

impl Deck {
    /// Deterministic shuffle, for replays and tests.
    #[must_use]
    pub fn new_shuffled(seed: u64) -> Self {
        let mut deck = Self::default();
        deck.cards.shuffle(&mut StdRng::seed_from_u64(seed));
        deck
    }

    #[must_use]
    pub fn shuffled() -> Self {
        let mut deck = Self::default();
        deck.cards.shuffle(&mut rand::rng());
        deck
    }

    /// A prearranged deck that deals `cards` in the given order.
    #[must_use]
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards, deck_idx: 0 }
    }

    pub fn deal_card(&mut self) -> Result<Card, RoundError> {
        let card = *self
            .cards
            .get(self.deck_idx)
            .ok_or(RoundError::DeckExhausted)?;
        self.deck_idx += 1;
        Ok(card)
    }

    pub fn burn_card(&mut self) -> Result<(), RoundError> {
        self.deal_card().map(|_| ())
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cards.len() - self.deck_idx
    }
}

impl Default for Deck {
    fn default() -> Self {
        let cards = Value::ALL
            .into_iter()
            .flat_map(|value| Suit::ALL.into_iter().map(move |suit| Card(value, suit)))
            .collect();
        Self { cards, deck_idx: 0 }
    }
}

/// Whole chips. Stacks, bets, and pots are all counted in chips.
pub type Chips = u32;

/// Player identifiers travel over a line-based protocol, so whitespace
/// is replaced and the length is capped.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(s: &str) -> Self {
        let mut id: String = s
            .trim()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        if id.len() > constants::MAX_PLAYER_ID_LENGTH {
            let mut end = constants::MAX_PLAYER_ID_LENGTH;
            while !id.is_char_boundary(end) {
                end -= 1;
            }
            id.truncate(end);
        }
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Seat ordinal at the table, 0..N-1 clockwise.
pub type SeatIndex = usize;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Blinds {
    pub small: Chips,
    pub big: Chips,
}

impl Default for Blinds {
    fn default() -> Self {
        Self {
            small: constants::DEFAULT_SMALL_BLIND,
            big: constants::DEFAULT_BIG_BLIND,
        }
    }
}

impl fmt::Display for Blinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}/{}", self.small, self.big)
    }
}

/// The four betting streets.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Street {
    Preflop,
    Flop,
    Turn,
    River,
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Preflop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
        };
        write!(f, "{repr}")
    }
}

/// A player decision. `Raise` carries the total the player's street
/// commitment is raised to, not the increment.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Action {
    AllIn,
    Call,
    Check,
    Fold,
    Raise(Chips),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::AllIn => write!(f, "goes all-in"),
            Self::Call => write!(f, "calls"),
            Self::Check => write!(f, "checks"),
            Self::Fold => write!(f, "folds"),
            Self::Raise(amount) => write!(f, "raises to ${amount}"),
        }
    }
}

/// Parses the text form used on the wire: `FOLD`, `CHECK`, `CALL`,
/// `ALL_IN`, or `RAISE <amount>`.
impl FromStr for Action {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| ActionError::Protocol("empty action".to_string()))?
            .to_ascii_uppercase();
        let action = match verb.as_str() {
            "FOLD" => Self::Fold,
            "CHECK" => Self::Check,
            "CALL" => Self::Call,
            "ALL_IN" | "ALLIN" | "ALL-IN" => Self::AllIn,
            "RAISE" => {
                let amount = words
                    .next()
                    .ok_or_else(|| ActionError::Protocol("raise needs an amount".to_string()))?;
                let amount: i64 = amount
                    .parse()
                    .map_err(|_| ActionError::Protocol(format!("bad raise amount {amount:?}")))?;
                if amount < 0 {
                    return Err(IllegalAction::NegativeAmount(amount).into());
                }
                let amount = Chips::try_from(amount)
                    .map_err(|_| ActionError::Protocol(format!("raise of {amount} is too large")))?;
                Self::Raise(amount)
            }
            other => return Err(ActionError::Protocol(format!("unknown action {other:?}"))),
        };
        match words.next() {
            Some(extra) => Err(ActionError::Protocol(format!("unexpected {extra:?}"))),
            None => Ok(action),
        }
    }
}

/// An action tagged with the player it came from, as delivered by the
/// network layer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerAction {
    pub player_id: PlayerId,
    pub action: Action,
}

impl PlayerAction {
    #[must_use]
    pub fn new(player_id: PlayerId, action: Action) -> Self {
        Self { player_id, action }
    }

    pub fn parse(player_id: PlayerId, text: &str) -> Result<Self, ActionError> {
        Ok(Self::new(player_id, text.parse()?))
    }
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.player_id, self.action)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum ActionChoice {
    AllIn,
    Call(Chips),
    Check,
    Fold,
    Raise(Chips),
}

// Ordering used when presenting choices; not a conversion anyone should
// rely on in reverse.
#[allow(clippy::from_over_into)]
impl Into<usize> for ActionChoice {
    fn into(self) -> usize {
        match self {
            Self::Fold => 0,
            Self::Check => 1,
            Self::Call(_) => 2,
            Self::Raise(_) => 3,
            Self::AllIn => 4,
        }
    }
}

impl fmt::Display for ActionChoice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::AllIn => "all-in".to_string(),
            Self::Call(amount) => format!("call (== ${amount})"),
            Self::Check => "check".to_string(),
            Self::Fold => "fold".to_string(),
            Self::Raise(amount) => format!("raise (>= ${amount})"),
        };
        write!(f, "{repr}")
    }
}

// Choices compare by variant only. The amounts inside `Call` and
// `Raise` are informational; bets are validated by the round engine.
impl Eq for ActionChoice {}

impl Hash for ActionChoice {
    fn hash<H: Hasher>(&self, state: &mut H) {
        discriminant(self).hash(state);
    }
}

impl PartialEq for ActionChoice {
    fn eq(&self, other: &Self) -> bool {
        discriminant(self) == discriminant(other)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ActionChoices(pub HashSet<ActionChoice>);

impl ActionChoices {
    pub fn contains(&self, action: &Action) -> bool {
        let action_choice = match action {
            Action::AllIn => ActionChoice::AllIn,
            Action::Call => ActionChoice::Call(0),
            Action::Check => ActionChoice::Check,
            Action::Fold => ActionChoice::Fold,
            Action::Raise(_) => ActionChoice::Raise(0),
        };
        self.0.contains(&action_choice)
    }

    /// Choices in presentation order: fold, check, call, raise, all-in.
    #[must_use]
    pub fn sorted(&self) -> Vec<ActionChoice> {
        let mut choices: Vec<ActionChoice> = self.0.iter().cloned().collect();
        choices.sort_by_key(|choice| Into::<usize>::into(choice.clone()));
        choices
    }
}

impl fmt::Display for ActionChoices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let choices = self.sorted();
        let num_options = choices.len();
        let repr = choices
            .iter()
            .enumerate()
            .map(|(i, action_choice)| {
                let repr = action_choice.to_string();
                match i {
                    0 if num_options == 1 => repr,
                    0 if num_options == 2 => format!("{repr} "),
                    0 if num_options >= 3 => format!("{repr}, "),
                    i if i == num_options - 1 && num_options != 1 => format!("or {repr}"),
                    _ => format!("{repr}, "),
                }
            })
            .collect::<String>();
        write!(f, "{repr}")
    }
}

impl<I> From<I> for ActionChoices
where
    I: IntoIterator<Item = ActionChoice>,
{
    fn from(iter: I) -> Self {
        Self(iter.into_iter().collect::<HashSet<_>>())
    }
}

/// A seated player for the duration of one round. Only `chips` survives
/// into the next round.
#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub seat_idx: SeatIndex,
    pub chips: Chips,
    pub cards: Vec<Card>,
    pub folded: bool,
    pub all_in: bool,
    /// Chips committed on the current street.
    pub sink: Chips,
    /// Chips committed over the whole round.
    pub committed: Chips,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, seat_idx: SeatIndex, chips: Chips) -> Self {
        Self {
            id,
            seat_idx,
            chips,
            cards: Vec::with_capacity(constants::HOLE_CARDS),
            folded: false,
            all_in: false,
            sink: 0,
            committed: 0,
        }
    }

    /// Whether the player still gets asked for actions.
    #[must_use]
    pub fn can_act(&self) -> bool {
        !self.folded && !self.all_in
    }

    #[must_use]
    pub fn owes(&self, current_bet: Chips) -> Chips {
        current_bet.saturating_sub(self.sink)
    }

    pub fn reset(&mut self) {
        self.cards.clear();
        self.folded = false;
        self.all_in = false;
        self.sink = 0;
        self.committed = 0;
    }
}
