//! Hold'em engine: cards, hand evaluation, and the round FSM.
//!
//! - [`functional`]: hand classification, showdown resolution, pot splits
//! - [`channel`]: the turn handoff between connections and the engine
//! - [`state_machine`]: one round from blinds to settlement

pub mod channel;
pub mod constants;
pub mod entities;
pub mod errors;
pub mod functional;
pub mod state_machine;
pub mod states;

pub use channel::{ActionChannel, Delivery};
pub use errors::{ActionError, EvalError, IllegalAction, RoundError};
pub use state_machine::{
    GameEvent, Payout, Round, RoundData, RoundOutcome, RoundSetup, RoundState,
    RoundStateManagement,
};
pub use states::RoundPhase;
