//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::game::{
    constants::{
        DEFAULT_ACTION_TIMEOUT_SECS, DEFAULT_BIG_BLIND, DEFAULT_COUNTDOWN_SECS,
        DEFAULT_JOIN_EXTENSION_SECS, DEFAULT_SMALL_BLIND, DEFAULT_STARTING_STACK,
        MAX_CONFIGURABLE_PLAYERS, MAX_PLAYERS,
    },
    entities::{Blinds, Chips},
};

#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("invalid {field}: {reason}")]
pub struct InvalidConfig {
    pub field: &'static str,
    pub reason: String,
}

impl InvalidConfig {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Table configuration
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct TableConfig {
    /// Number of seats (default: 6)
    pub max_players: usize,

    pub small_blind: Chips,
    pub big_blind: Chips,

    /// Stack a player gets the first time they sit down
    pub starting_stack: Chips,

    /// How long a player has to act before being checked or folded
    pub action_timeout_secs: u64,

    /// Pre-round countdown length
    pub countdown_secs: u64,

    /// Seconds added to a running countdown per player that sits down
    pub join_extension_secs: u64,

    /// Seeds deck shuffles and the first dealer pick. Unseeded tables
    /// use the thread RNG.
    pub seed: Option<u64>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_players: MAX_PLAYERS,
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            starting_stack: DEFAULT_STARTING_STACK,
            action_timeout_secs: DEFAULT_ACTION_TIMEOUT_SECS,
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            join_extension_secs: DEFAULT_JOIN_EXTENSION_SECS,
            seed: None,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if !(2..=MAX_CONFIGURABLE_PLAYERS).contains(&self.max_players) {
            return Err(InvalidConfig::new(
                "max_players",
                format!("must be between 2 and {MAX_CONFIGURABLE_PLAYERS}"),
            ));
        }

        if self.small_blind == 0 {
            return Err(InvalidConfig::new("small_blind", "must be positive"));
        }

        if self.big_blind < self.small_blind {
            return Err(InvalidConfig::new(
                "big_blind",
                "must be at least the small blind",
            ));
        }

        if self.starting_stack < self.big_blind {
            return Err(InvalidConfig::new(
                "starting_stack",
                "must cover the big blind",
            ));
        }

        let table_total = u64::from(self.starting_stack) * self.max_players as u64;
        if table_total > u64::from(Chips::MAX) {
            return Err(InvalidConfig::new(
                "starting_stack",
                format!(
                    "{} seats of ${} exceed the ${} a pot can hold",
                    self.max_players,
                    self.starting_stack,
                    Chips::MAX
                ),
            ));
        }

        if self.action_timeout_secs == 0 {
            return Err(InvalidConfig::new("action_timeout_secs", "must be positive"));
        }

        if self.countdown_secs == 0 {
            return Err(InvalidConfig::new("countdown_secs", "must be positive"));
        }

        Ok(())
    }

    #[must_use]
    pub fn blinds(&self) -> Blinds {
        Blinds {
            small: self.small_blind,
            big: self.big_blind,
        }
    }

    #[must_use]
    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }
}
