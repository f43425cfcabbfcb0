//! Table actor implementation with async message handling.
//!
//! The actor owns the chip ledger, the dealer rotation, and the round
//! counter. Rounds run on their own task so seating and stack queries are
//! answered while a hand is in play.

use log::{debug, error, info, warn};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{collections::HashMap, sync::Arc};
use tokio::{
    sync::{mpsc, oneshot},
    task::{JoinError, JoinHandle},
};

use super::{
    config::TableConfig,
    countdown::{self, Countdown, CountdownHandle, MIN_SEATED},
    messages::{TableClosed, TableMessage},
    seats::{SeatError, SeatSnapshot, SeatTable},
};
use crate::game::{
    ActionChannel, ActionError, Delivery, GameEvent, Round, RoundError, RoundOutcome, RoundSetup,
    entities::{Action, Chips, Deck, Player, PlayerAction, PlayerId, SeatIndex},
    functional::next_dealer,
};

/// Table actor handle for seating players and delivering their actions
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    seats: Arc<SeatTable>,
    actions: Arc<ActionChannel>,
}

impl TableHandle {
    /// Sit a player down in a random open seat.
    pub async fn join(&self, player_id: PlayerId) -> Result<SeatIndex, SeatError> {
        let seat = self.seats.assign(player_id)?;
        self.seats_changed().await;
        Ok(seat)
    }

    /// Stand a player up. If they're in a round, they fold right away.
    pub async fn leave(&self, player_id: &PlayerId) -> Result<SeatIndex, SeatError> {
        let seat = self.seats.release(player_id)?;
        // Folds are taken from anyone, so this can't be refused.
        self.actions
            .post(PlayerAction::new(player_id.clone(), Action::Fold))
            .ok();
        self.seats_changed().await;
        Ok(seat)
    }

    pub fn act(&self, action: PlayerAction) -> Result<Delivery, ActionError> {
        self.actions.post(action)
    }

    /// Pass on a line from `player_id` that couldn't be parsed. If it's
    /// their turn they get a rejection and a fresh prompt.
    ///
    /// # Errors
    ///
    /// Gives `reason` back when it isn't `player_id`'s turn.
    pub fn reject(&self, player_id: &PlayerId, reason: ActionError) -> Result<(), ActionError> {
        self.actions.reject(player_id, reason)
    }

    #[must_use]
    pub fn seats(&self) -> SeatSnapshot {
        self.seats.snapshot()
    }

    pub async fn stacks(&self) -> Result<Vec<(PlayerId, Chips)>, TableClosed> {
        let (response, rx) = oneshot::channel();
        self.sender
            .send(TableMessage::GetStacks { response })
            .await
            .map_err(|_| TableClosed)?;
        rx.await.map_err(|_| TableClosed)
    }

    pub async fn close(&self) -> Result<(), TableClosed> {
        self.sender
            .send(TableMessage::Close)
            .await
            .map_err(|_| TableClosed)
    }

    async fn seats_changed(&self) {
        if self.sender.send(TableMessage::SeatsChanged).await.is_err() {
            debug!("seat change after the table closed");
        }
    }
}

/// Table actor managing a single hold'em table
pub struct TableActor {
    config: TableConfig,

    seats: Arc<SeatTable>,

    actions: Arc<ActionChannel>,

    /// Where every round and countdown event goes
    events: mpsc::UnboundedSender<GameEvent>,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Handed to countdown tasks so they can report back
    sender: mpsc::Sender<TableMessage>,

    countdown: Option<CountdownHandle>,

    round: Option<JoinHandle<RoundOutcome>>,

    /// Stacks by player, kept after they leave so a returning player gets
    /// their chips back.
    ledger: HashMap<PlayerId, Chips>,

    next_round_id: u64,

    /// Dealer seat of the last round played
    dealer_seat: Option<SeatIndex>,

    rng: StdRng,

    is_closed: bool,
}

impl TableActor {
    /// Create a new table actor and the handle used to talk to it.
    pub fn new(
        config: TableConfig,
        events: mpsc::UnboundedSender<GameEvent>,
    ) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let seats = Arc::new(SeatTable::new(config.max_players));
        let actions = Arc::new(ActionChannel::new());
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let handle = TableHandle {
            sender: sender.clone(),
            seats: Arc::clone(&seats),
            actions: Arc::clone(&actions),
        };
        let actor = Self {
            config,
            seats,
            actions,
            events,
            inbox,
            sender,
            countdown: None,
            round: None,
            ledger: HashMap::new(),
            next_round_id: 1,
            dealer_seat: None,
            rng,
            is_closed: false,
        };
        (actor, handle)
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        info!(
            "table open with {} seats, blinds {}",
            self.config.max_players,
            self.config.blinds()
        );

        loop {
            tokio::select! {
                Some(message) = self.inbox.recv() => {
                    self.handle_message(message);
                }

                result = round_finished(&mut self.round) => {
                    self.round = None;
                    self.finish_round(result);
                }
            }

            if self.is_closed && self.round.is_none() {
                break;
            }
        }

        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
        info!("table closed");
    }

    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::SeatsChanged => self.maybe_start_countdown(),

            TableMessage::GetStacks { response } => {
                let _ = response.send(self.stacks());
            }

            TableMessage::Close => {
                self.is_closed = true;
                if let Some(countdown) = self.countdown.take() {
                    countdown.cancel();
                }
            }

            TableMessage::StartRound => {
                self.countdown = None;
                self.start_round();
            }

            TableMessage::CountdownCancelled => {
                self.countdown = None;
                info!("countdown cancelled, fewer than {MIN_SEATED} players seated");
                self.emit(GameEvent::CountdownCancelled);
                // Someone may have sat back down since the task gave up.
                self.maybe_start_countdown();
            }
        }
    }

    fn emit(&self, event: GameEvent) {
        self.events.send(event).ok();
    }

    fn stacks(&self) -> Vec<(PlayerId, Chips)> {
        let mut stacks: Vec<(PlayerId, Chips)> = self
            .ledger
            .iter()
            .map(|(id, chips)| (id.clone(), *chips))
            .collect();
        stacks.sort();
        stacks
    }

    /// Start the countdown if nothing is running and enough players sit.
    fn maybe_start_countdown(&mut self) {
        if self.is_closed || self.round.is_some() || self.countdown.is_some() {
            return;
        }
        let occupied = self.seats.occupied();
        if occupied < MIN_SEATED {
            return;
        }

        let secs = self.config.countdown_secs;
        info!("{occupied} players seated, next round in {secs}s");
        self.emit(GameEvent::CountdownStarted { secs });
        let countdown = Countdown::new(secs, occupied, self.config.join_extension_secs);
        self.countdown = Some(countdown::spawn(
            countdown,
            Arc::clone(&self.seats),
            self.sender.clone(),
        ));
    }

    fn start_round(&mut self) {
        if self.is_closed || self.round.is_some() {
            return;
        }
        // Open before the seat snapshot so a player who leaves in between
        // still has their fold queued.
        self.actions.open_round();

        let starting_stack = self.config.starting_stack;
        let mut players = Vec::new();
        for (seat, player_id) in self.seats.snapshot().0 {
            let chips = *self
                .ledger
                .entry(player_id.clone())
                .or_insert(starting_stack);
            if chips == 0 {
                info!("{player_id} has no chips, sitting out");
                continue;
            }
            players.push(Player::new(player_id, seat, chips));
        }

        let occupied: Vec<SeatIndex> = players.iter().map(|p| p.seat_idx).collect();
        let Some(dealer_seat) = next_dealer(self.dealer_seat, &occupied, &mut self.rng) else {
            info!("nobody to deal to");
            self.actions.close_round();
            return;
        };
        let setup = RoundSetup {
            round_id: self.next_round_id,
            dealer_seat,
            blinds: self.config.blinds(),
            action_timeout: self.config.action_timeout(),
        };
        let deck = Deck::new_shuffled(self.rng.random());

        match Round::new(
            setup,
            players,
            deck,
            Arc::clone(&self.actions),
            self.events.clone(),
        ) {
            Ok(round) => {
                self.next_round_id += 1;
                self.round = Some(tokio::spawn(round.play()));
            }
            Err(RoundError::NotEnoughPlayers) => {
                info!("need {MIN_SEATED}+ players with chips to start a round");
                self.actions.close_round();
            }
            Err(e) => {
                error!("couldn't form round {}: {e}", self.next_round_id);
                self.actions.close_round();
            }
        }
    }

    fn finish_round(&mut self, result: Result<RoundOutcome, JoinError>) {
        match result {
            Ok(outcome) => {
                match &outcome.result {
                    Ok(payouts) => debug!("round {} paid {payouts:?}", outcome.round_id),
                    Err(e) => warn!("round {} refunded: {e}", outcome.round_id),
                }
                self.dealer_seat = Some(outcome.dealer_seat);
                self.ledger.extend(outcome.stacks);
            }
            Err(e) => error!("round task failed: {e}"),
        }
        self.maybe_start_countdown();
    }
}

async fn round_finished(
    round: &mut Option<JoinHandle<RoundOutcome>>,
) -> Result<RoundOutcome, JoinError> {
    match round {
        Some(task) => task.await,
        None => std::future::pending().await,
    }
}
