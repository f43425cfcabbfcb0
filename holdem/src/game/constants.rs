//! Table-wide defaults.

use super::entities::Chips;

/// Seats at a table. Six players use at most 20 cards in a round
/// (12 hole cards, 5 board cards, 3 burns).
pub const MAX_PLAYERS: usize = 6;

/// Upper bound on seats a table may be configured with. Ten players use
/// 28 cards, well inside a single deck.
pub const MAX_CONFIGURABLE_PLAYERS: usize = 10;

pub const MAX_PLAYER_ID_LENGTH: usize = 32;

pub const DEFAULT_SMALL_BLIND: Chips = 1;
pub const DEFAULT_BIG_BLIND: Chips = 2;

/// A fresh player sits down with a hundred big blinds.
pub const DEFAULT_STARTING_STACK: Chips = 100 * DEFAULT_BIG_BLIND;

pub const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 30;

/// Seconds on the pre-round countdown once two seats are occupied.
pub const DEFAULT_COUNTDOWN_SECS: u64 = 10;

/// Seconds added to a running countdown for every player that sits down.
pub const DEFAULT_JOIN_EXTENSION_SECS: u64 = 2;

pub const HOLE_CARDS: usize = 2;
pub const BOARD_CARDS: usize = 5;
pub const HAND_SIZE: usize = 5;
