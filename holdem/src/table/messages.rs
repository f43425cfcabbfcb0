//! Table actor message types.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::game::entities::{Chips, PlayerId};

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// A player sat down or stood up
    SeatsChanged,

    /// Get every known stack, seated or not
    GetStacks {
        response: oneshot::Sender<Vec<(PlayerId, Chips)>>,
    },

    /// Stop the actor once the current round, if any, finishes
    Close,

    /// Internal: countdown reached zero
    StartRound,

    /// Internal: countdown gave up
    CountdownCancelled,
}

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("table is closed")]
pub struct TableClosed;
