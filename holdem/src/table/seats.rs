//! Seat occupancy, shared between connections and the table actor.

use log::debug;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{Mutex, PoisonError},
};
use thiserror::Error;

use crate::game::entities::{PlayerId, SeatIndex};

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum SeatError {
    #[error("player id is empty")]
    EmptyId,
    #[error("{0} is already seated")]
    DuplicateId(PlayerId),
    #[error("{0} isn't seated")]
    NotSeated(PlayerId),
    #[error("table is full")]
    TableFull,
}

/// Occupied seats in seat order.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeatSnapshot(pub Vec<(SeatIndex, PlayerId)>);

impl SeatSnapshot {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `seat,id;` per occupied seat, e.g. `0,alice;3,bob;`.
impl fmt::Display for SeatSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (seat, player_id) in &self.0 {
            write!(f, "{seat},{player_id};")?;
        }
        Ok(())
    }
}

/// Every access takes the one lock, so the countdown can read
/// occupancy while connections sit down and stand up.
#[derive(Debug)]
pub struct SeatTable {
    seats: Mutex<Vec<Option<PlayerId>>>,
}

impl SeatTable {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            seats: Mutex::new(vec![None; capacity]),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().len()
    }

    /// Sit `player_id` in a random open seat.
    pub fn assign(&self, player_id: PlayerId) -> Result<SeatIndex, SeatError> {
        if player_id.is_empty() {
            return Err(SeatError::EmptyId);
        }
        let mut seats = self.lock();
        if seats.iter().flatten().any(|id| id == &player_id) {
            return Err(SeatError::DuplicateId(player_id));
        }
        let open: Vec<SeatIndex> = seats
            .iter()
            .enumerate()
            .filter_map(|(seat, id)| id.is_none().then_some(seat))
            .collect();
        let seat = *open.choose(&mut rand::rng()).ok_or(SeatError::TableFull)?;
        debug!("seated {player_id} in seat {seat}");
        seats[seat] = Some(player_id);
        Ok(seat)
    }

    pub fn release(&self, player_id: &PlayerId) -> Result<SeatIndex, SeatError> {
        let mut seats = self.lock();
        let seat = seats
            .iter()
            .position(|id| id.as_ref() == Some(player_id))
            .ok_or_else(|| SeatError::NotSeated(player_id.clone()))?;
        seats[seat] = None;
        debug!("{player_id} left seat {seat}");
        Ok(seat)
    }

    #[must_use]
    pub fn occupied(&self) -> usize {
        self.lock().iter().flatten().count()
    }

    #[must_use]
    pub fn snapshot(&self) -> SeatSnapshot {
        let seats = self.lock();
        SeatSnapshot(
            seats
                .iter()
                .enumerate()
                .filter_map(|(seat, id)| id.clone().map(|id| (seat, id)))
                .collect(),
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Option<PlayerId>>> {
        self.seats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
