//! Error types for hand evaluation, player actions, and round execution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{Chips, PlayerId};

/// Errors raised while classifying or resolving hands.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum EvalError {
    #[error("invalid hand size: got {0} cards")]
    InvalidHandSize(usize),
}

/// Betting-rule violations. These are always recoverable: the engine
/// rejects the action and prompts the same player again.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum IllegalAction {
    #[error("amount {0} is negative")]
    NegativeAmount(i64),
    #[error("raise to ${amount} doesn't exceed the current bet of ${current_bet}")]
    RaiseTooSmall { amount: Chips, current_bet: Chips },
    #[error("need ${needed} but only ${available} left")]
    InsufficientChips { needed: Chips, available: Chips },
    #[error("can't check while owing ${owed}")]
    CannotCheck { owed: Chips },
}

/// Errors surfaced to whoever delivered a player action.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum ActionError {
    #[error("malformed action: {0}")]
    Protocol(String),
    #[error("not {0}'s turn")]
    TurnViolation(PlayerId),
    #[error("illegal action: {0}")]
    Illegal(#[from] IllegalAction),
}

/// Errors that end a round. Apart from `NotEnoughPlayers` and
/// `TooManyChips`, which are raised before any chips move, these abort the round and refund every
/// player's commitment.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum RoundError {
    #[error("deck exhausted")]
    DeckExhausted,
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("need 2+ players with chips")]
    NotEnoughPlayers,
    #[error("${0} in play is more than a pot can hold")]
    TooManyChips(u64),
    #[error("unequal all-in commitments need a side pot")]
    SidePotRequired,
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("invalid card: {0:?}")]
pub struct ParseCardError(pub String);
