//! # Holdem
//!
//! A multi-seat Texas Hold'em round engine using a type-safe finite state
//! machine (FSM) design.
//!
//! Players act from independent connections; the engine waits on exactly
//! one of them at a time, applies betting rules street by street, and
//! ranks seven-card hands at showdown. The round is an FSM using
//! `enum_dispatch` for zero-cost trait dispatch.
//!
//! ## Architecture
//!
//! A round moves through these phases:
//!
//! - **Forming**: snapshot seated players, post blinds, deal every card
//! - **Preflop/Flop/Turn/River**: one betting round each, revealing the
//!   board as it goes
//! - **Showdown**: rank the remaining hands and split the pot
//! - **Settled**: pot paid out, hand state cleared
//! - **Aborted**: an impossible state was hit and every bet refunded
//!
//! ## Core Modules
//!
//! - [`game`]: cards, hand evaluation, the action channel, and the round FSM
//! - [`table`]: seating, the pre-round countdown, and the table actor
//!
//! ## Example
//!
//! ```
//! use holdem::functional::{argmax, best_hand};
//! use holdem::entities::Card;
//!
//! let board = ["AD", "7C", "2D", "2C", "9H"];
//! let hand = |hole: [&str; 2]| {
//!     let cards: Vec<Card> = hole
//!         .iter()
//!         .chain(&board)
//!         .map(|c| c.parse().unwrap())
//!         .collect();
//!     best_hand(&cards).unwrap().hand
//! };
//!
//! let winners = argmax(&[hand(["AH", "AS"]), hand(["KH", "KS"])]);
//! assert_eq!(winners, vec![0]);
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    ActionChannel, ActionError, Delivery, EvalError, GameEvent, IllegalAction, Payout, Round,
    RoundError, RoundOutcome, RoundPhase, RoundSetup, RoundState, RoundStateManagement,
    constants::{self, MAX_PLAYERS},
    entities, functional,
};

/// Seating, countdown, and the table actor.
pub mod table;
pub use table::{TableActor, TableConfig, TableHandle};
