//! Turn handoff between connection tasks and the round engine.
//!
//! The engine names the one player it is waiting on and sleeps until
//! that player's action lands in a single slot or the turn deadline
//! passes. While a round runs, folds from anyone else are queued instead
//! of dropped, since they come from disconnects and must not stall the
//! round. Between rounds there is nothing to fold out of, so they're
//! ignored.

use log::debug;
use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
};
use tokio::{
    sync::Notify,
    time::{Instant, timeout_at},
};

use super::{
    entities::{Action, PlayerAction, PlayerId},
    errors::ActionError,
};

/// How a posted action was taken in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Delivery {
    /// Filled the slot for the player whose turn it is.
    Accepted,
    /// A fold from someone else, applied without waiting for their turn.
    DisconnectFold,
    /// A fold posted while no round is running.
    Ignored,
}

/// What the engine gets back while waiting on a turn.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Mail {
    Action(Action),
    /// The expected player sent something that isn't an action at all.
    Rejected(ActionError),
    Fold(PlayerId),
}

#[derive(Debug, Default)]
struct Mailbox {
    in_round: bool,
    expected: Option<PlayerId>,
    slot: Option<Result<Action, ActionError>>,
    /// At most one entry per player.
    folds: VecDeque<PlayerId>,
}

#[derive(Debug, Default)]
pub struct ActionChannel {
    mailbox: Mutex<Mailbox>,
    notify: Notify,
}

impl ActionChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an action from a connection.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::TurnViolation`] when the action isn't a fold
    /// and its sender isn't the player being waited on. The action is
    /// dropped.
    pub fn post(&self, player_action: PlayerAction) -> Result<Delivery, ActionError> {
        let PlayerAction { player_id, action } = player_action;
        let delivery = {
            let mut mailbox = self.lock();
            if mailbox.expected.as_ref() == Some(&player_id) {
                mailbox.expected = None;
                mailbox.slot = Some(Ok(action));
                Delivery::Accepted
            } else if action == Action::Fold {
                if !mailbox.in_round {
                    debug!("ignored fold from {player_id} between rounds");
                    return Ok(Delivery::Ignored);
                }
                if !mailbox.folds.contains(&player_id) {
                    mailbox.folds.push_back(player_id);
                }
                Delivery::DisconnectFold
            } else {
                debug!("dropped out-of-turn action from {player_id}: {action:?}");
                return Err(ActionError::TurnViolation(player_id));
            }
        };
        self.notify.notify_one();
        Ok(delivery)
    }

    /// Hand a line that couldn't be read as an action to the engine, which
    /// rejects it and prompts the same player again.
    ///
    /// # Errors
    ///
    /// Gives `reason` back when `player_id` isn't the player being waited
    /// on. Nobody is re-prompted then.
    pub fn reject(&self, player_id: &PlayerId, reason: ActionError) -> Result<(), ActionError> {
        {
            let mut mailbox = self.lock();
            if mailbox.expected.as_ref() != Some(player_id) {
                return Err(reason);
            }
            mailbox.expected = None;
            mailbox.slot = Some(Err(reason));
        }
        self.notify.notify_one();
        Ok(())
    }

    /// Player currently being waited on, if any.
    #[must_use]
    pub fn expected(&self) -> Option<PlayerId> {
        self.lock().expected.clone()
    }

    /// Open the slot for `player_id`. Anything left in the slot from an
    /// earlier prompt is discarded.
    pub(crate) fn expect(&self, player_id: PlayerId) {
        let mut mailbox = self.lock();
        mailbox.expected = Some(player_id);
        mailbox.slot = None;
    }

    pub(crate) fn close_turn(&self) {
        let mut mailbox = self.lock();
        mailbox.expected = None;
        mailbox.slot = None;
    }

    /// Start taking folds from players who aren't being waited on. Folds
    /// already queued for this round are kept.
    pub(crate) fn open_round(&self) {
        let mut mailbox = self.lock();
        mailbox.in_round = true;
        mailbox.expected = None;
        mailbox.slot = None;
    }

    /// Forget everything, including queued folds, and ignore folds until
    /// the next round opens.
    pub(crate) fn close_round(&self) {
        *self.lock() = Mailbox::default();
    }

    /// Wait for the next piece of mail. Queued folds come out before the
    /// slot. Returns `None` once `deadline` passes with nothing delivered.
    pub(crate) async fn next(&self, deadline: Instant) -> Option<Mail> {
        loop {
            if let Some(mail) = self.take() {
                return Some(mail);
            }
            // `notify_one` stores a permit when nobody is waiting, so a post
            // landing between `take` and here still wakes us.
            timeout_at(deadline, self.notify.notified()).await.ok()?;
        }
    }

    fn take(&self) -> Option<Mail> {
        let mut mailbox = self.lock();
        if let Some(player_id) = mailbox.folds.pop_front() {
            return Some(Mail::Fold(player_id));
        }
        mailbox.slot.take().map(|slot| match slot {
            Ok(action) => Mail::Action(action),
            Err(reason) => Mail::Rejected(reason),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Mailbox> {
        self.mailbox.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;

    fn id(s: &str) -> PlayerId {
        PlayerId::new(s)
    }

    fn post(channel: &ActionChannel, who: &str, action: Action) -> Result<Delivery, ActionError> {
        channel.post(PlayerAction::new(id(who), action))
    }

    #[tokio::test]
    async fn test_expected_player_fills_slot() {
        let channel = ActionChannel::new();
        channel.expect(id("alice"));
        assert_eq!(post(&channel, "alice", Action::Call), Ok(Delivery::Accepted));
        assert_eq!(channel.expected(), None);

        let deadline = Instant::now() + Duration::from_secs(1);
        assert_eq!(channel.next(deadline).await, Some(Mail::Action(Action::Call)));
    }

    #[tokio::test]
    async fn test_out_of_turn_action_is_rejected() {
        let channel = ActionChannel::new();
        channel.expect(id("alice"));
        assert_eq!(
            post(&channel, "bob", Action::Raise(10)),
            Err(ActionError::TurnViolation(id("bob")))
        );
        // Only one action per prompt.
        assert_eq!(post(&channel, "alice", Action::Check), Ok(Delivery::Accepted));
        assert_eq!(
            post(&channel, "alice", Action::Call),
            Err(ActionError::TurnViolation(id("alice")))
        );
    }

    #[tokio::test]
    async fn test_disconnect_folds_come_first() {
        let channel = ActionChannel::new();
        channel.open_round();
        channel.expect(id("alice"));
        assert_eq!(post(&channel, "alice", Action::Check), Ok(Delivery::Accepted));
        assert_eq!(post(&channel, "bob", Action::Fold), Ok(Delivery::DisconnectFold));

        let deadline = Instant::now() + Duration::from_secs(1);
        assert_eq!(channel.next(deadline).await, Some(Mail::Fold(id("bob"))));
        assert_eq!(channel.next(deadline).await, Some(Mail::Action(Action::Check)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_times_out() {
        let channel = ActionChannel::new();
        channel.expect(id("alice"));
        let start = Instant::now();
        let deadline = start + Duration::from_secs(30);
        assert_eq!(channel.next(deadline).await, None);
        assert!(Instant::now() >= deadline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wakes_on_post_from_another_task() {
        let channel = Arc::new(ActionChannel::new());
        channel.expect(id("alice"));

        let poster = Arc::clone(&channel);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            poster.post(PlayerAction::new(id("alice"), Action::Fold))
        });

        let deadline = Instant::now() + Duration::from_secs(30);
        assert_eq!(channel.next(deadline).await, Some(Mail::Action(Action::Fold)));
    }

    #[tokio::test]
    async fn test_close_round_clears_queued_folds() {
        let channel = ActionChannel::new();
        channel.open_round();
        assert_eq!(post(&channel, "bob", Action::Fold), Ok(Delivery::DisconnectFold));
        channel.close_round();
        channel.open_round();
        let deadline = Instant::now() + Duration::from_millis(10);
        assert_eq!(channel.next(deadline).await, None);
    }

    #[tokio::test]
    async fn test_folds_between_rounds_are_ignored() {
        let channel = ActionChannel::new();
        for _ in 0..100_000 {
            assert_eq!(post(&channel, "bob", Action::Fold), Ok(Delivery::Ignored));
        }
        assert!(channel.lock().folds.is_empty());

        channel.open_round();
        let deadline = Instant::now() + Duration::from_millis(10);
        assert_eq!(channel.next(deadline).await, None);
    }

    #[tokio::test]
    async fn test_repeated_folds_queue_once() {
        let channel = ActionChannel::new();
        channel.open_round();
        channel.expect(id("alice"));
        for _ in 0..1_000 {
            assert_eq!(post(&channel, "bob", Action::Fold), Ok(Delivery::DisconnectFold));
        }
        assert_eq!(post(&channel, "carol", Action::Fold), Ok(Delivery::DisconnectFold));
        assert_eq!(
            channel.lock().folds,
            VecDeque::from([id("bob"), id("carol")])
        );
    }

    #[tokio::test]
    async fn test_reject_goes_to_the_expected_player_only() {
        let channel = ActionChannel::new();
        channel.open_round();
        channel.expect(id("alice"));
        let garbage = ActionError::Protocol("unknown command \"HELLO\"".to_string());

        assert_eq!(channel.reject(&id("bob"), garbage.clone()), Err(garbage.clone()));
        assert_eq!(channel.reject(&id("alice"), garbage.clone()), Ok(()));
        assert_eq!(channel.expected(), None);
        // The slot is spent until the engine prompts again.
        assert_eq!(
            post(&channel, "alice", Action::Check),
            Err(ActionError::TurnViolation(id("alice")))
        );

        let deadline = Instant::now() + Duration::from_secs(1);
        assert_eq!(channel.next(deadline).await, Some(Mail::Rejected(garbage)));
    }
}
