//! Table module: one hold'em table run by an async actor.
//!
//! This module implements:
//! - TableActor: owns the chip ledger, dealer rotation, and round lifecycle
//! - SeatTable: seat occupancy shared with connection tasks
//! - Countdown: the pre-round timer
//!
//! ## Architecture
//!
//! The actor runs in its own Tokio task with an mpsc message inbox. Each
//! round is spawned as a separate task; the actor keeps answering seat
//! changes while it plays and folds the outcome back into the ledger.
//!
//! ## Example
//!
//! ```no_run
//! use holdem::table::{TableActor, TableConfig};
//! use holdem::game::entities::PlayerId;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (events, mut rx) = mpsc::unbounded_channel();
//!     let (actor, handle) = TableActor::new(TableConfig::default(), events);
//!     tokio::spawn(actor.run());
//!
//!     handle.join(PlayerId::new("alice")).await.unwrap();
//!     while let Some(event) = rx.recv().await {
//!         println!("{event}");
//!     }
//! }
//! ```

pub mod actor;
pub mod config;
pub mod countdown;
pub mod messages;
pub mod seats;

pub use actor::{TableActor, TableHandle};
pub use config::{InvalidConfig, TableConfig};
pub use messages::{TableClosed, TableMessage};
pub use seats::{SeatError, SeatSnapshot, SeatTable};
