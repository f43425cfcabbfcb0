//! Round states for the hold'em FSM.
//!
//! Each state is a phase of a single round; the data shared across
//! phases lives in [`RoundData`](super::state_machine::RoundData).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::game::{errors::RoundError, state_machine::Payout};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum RoundPhase {
    Forming,
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    Settled,
    Aborted,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Forming => "forming",
            Self::Preflop => "pre-flop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
            Self::Settled => "settled",
            Self::Aborted => "aborted",
        };
        write!(f, "{repr}")
    }
}

/// Ties a state type to its phase tag.
pub trait Phase {
    const PHASE: RoundPhase;
}

/// Players snapshotted, nothing posted or dealt yet.
#[derive(Debug)]
pub struct Forming;

/// Blinds posted, every card for the round dealt, pre-flop betting next.
#[derive(Debug)]
pub struct Preflop;

/// Flop revealed.
#[derive(Debug)]
pub struct Flop;

/// Turn revealed.
#[derive(Debug)]
pub struct Turn;

/// River revealed.
#[derive(Debug)]
pub struct River;

/// Betting is over; the pot gets awarded.
#[derive(Debug)]
pub struct Showdown;

#[derive(Debug)]
pub struct Settled {
    pub payouts: Vec<Payout>,
}

/// The round hit a fatal error and every commitment was refunded.
#[derive(Debug)]
pub struct Aborted {
    pub error: RoundError,
}

macro_rules! impl_phase {
    ($($state:ident),+) => {
        $(
            impl Phase for $state {
                const PHASE: RoundPhase = RoundPhase::$state;
            }
        )+
    };
}

impl_phase!(Forming, Preflop, Flop, Turn, River, Showdown, Settled, Aborted);
