//! Pre-round countdown.
//!
//! Counts down once a second while at least two seats are filled, grows
//! when players sit down mid-count, and gives up if the table drops
//! below two.

use log::debug;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, interval_at},
};

use super::{messages::TableMessage, seats::SeatTable};

/// Players needed for a round.
pub const MIN_SEATED: usize = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tick {
    Running(u64),
    Cancelled,
    Fire,
}

#[derive(Clone, Debug)]
pub struct Countdown {
    remaining: u64,
    occupied: usize,
    extension: u64,
}

impl Countdown {
    #[must_use]
    pub fn new(secs: u64, occupied: usize, extension: u64) -> Self {
        Self {
            remaining: secs,
            occupied,
            extension,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Advance one second given the current number of occupied seats.
    pub fn tick(&mut self, occupied: usize) -> Tick {
        if occupied < MIN_SEATED {
            return Tick::Cancelled;
        }
        if occupied > self.occupied {
            let joined = (occupied - self.occupied) as u64;
            self.remaining += joined * self.extension;
        }
        self.occupied = occupied;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            Tick::Fire
        } else {
            Tick::Running(self.remaining)
        }
    }
}

/// A running countdown task. Sends exactly one of
/// [`TableMessage::StartRound`] or [`TableMessage::CountdownCancelled`]
/// unless cancelled first.
#[derive(Debug)]
pub struct CountdownHandle {
    task: JoinHandle<()>,
}

impl CountdownHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }
}

pub fn spawn(
    mut countdown: Countdown,
    seats: Arc<SeatTable>,
    sender: mpsc::Sender<TableMessage>,
) -> CountdownHandle {
    let task = tokio::spawn(async move {
        let period = Duration::from_secs(1);
        let mut ticker = interval_at(Instant::now() + period, period);
        let message = loop {
            ticker.tick().await;
            match countdown.tick(seats.occupied()) {
                Tick::Running(remaining) => debug!("round starts in {remaining}s"),
                Tick::Cancelled => break TableMessage::CountdownCancelled,
                Tick::Fire => break TableMessage::StartRound,
            }
        };
        sender.send(message).await.ok();
    });
    CountdownHandle { task }
}
