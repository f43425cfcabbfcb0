//! Round state machine.
//!
//! A [`Round`] is one hand of hold'em, from posting blinds to awarding the
//! pot. Each phase is a distinct type so only legal transitions compile;
//! [`RoundState`] erases the phase for the driver loop in [`Round::play`].

use enum_dispatch::enum_dispatch;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, fmt, sync::Arc, time::Duration};
use tokio::{sync::mpsc::UnboundedSender, time::Instant};

use super::{
    channel::{ActionChannel, Mail},
    constants::{BOARD_CARDS, HOLE_CARDS},
    entities::{
        Action, ActionChoice, ActionChoices, Blinds, Card, Chips, Deck, HandRank, Player,
        PlayerId, SeatIndex, Street,
    },
    errors::{ActionError, IllegalAction, RoundError},
    functional::{self, clockwise_from},
    states::{Aborted, Flop, Forming, Phase, Preflop, River, RoundPhase, Settled, Showdown, Turn},
};

/// Chips awarded to one player when a round settles.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Payout {
    pub player_id: PlayerId,
    pub amount: Chips,
}

impl fmt::Display for Payout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} won ${}", self.player_id, self.amount)
    }
}

/// Everything the engine tells the outside world. `HoleCardsDealt` is
/// private to its player; everything else is public.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum GameEvent {
    RoundStarted {
        round_id: u64,
        dealer_seat: SeatIndex,
    },
    HoleCardsDealt {
        player_id: PlayerId,
        cards: Vec<Card>,
    },
    /// Carries only the cards the street adds to the board.
    StreetRevealed {
        street: Street,
        cards: Vec<Card>,
    },
    PotUpdated {
        amount: Chips,
    },
    TurnRequested {
        player_id: PlayerId,
        legal_actions: ActionChoices,
        min_raise: Chips,
    },
    ActionTaken {
        player_id: PlayerId,
        action: Action,
    },
    ActionRejected {
        player_id: PlayerId,
        reason: ActionError,
    },
    PlayerAutoFolded {
        player_id: PlayerId,
    },
    ShowdownHand {
        player_id: PlayerId,
        rank: HandRank,
        cards: Vec<Card>,
    },
    RoundSettled {
        round_id: u64,
        winners: Vec<Payout>,
    },
    RoundAborted {
        round_id: u64,
        reason: RoundError,
    },
    CountdownStarted {
        secs: u64,
    },
    CountdownCancelled,
}

impl GameEvent {
    /// The only player allowed to see this event, if it's private.
    #[must_use]
    pub fn recipient(&self) -> Option<&PlayerId> {
        match self {
            Self::HoleCardsDealt { player_id, .. } => Some(player_id),
            _ => None,
        }
    }
}

fn join_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::RoundStarted {
                round_id,
                dealer_seat,
            } => format!("round {round_id} started, dealer in seat {dealer_seat}"),
            Self::HoleCardsDealt { player_id, cards } => {
                format!("{player_id} was dealt {}", join_cards(cards))
            }
            Self::StreetRevealed { street, cards } => format!("{street}: {}", join_cards(cards)),
            Self::PotUpdated { amount } => format!("pot is ${amount}"),
            Self::TurnRequested {
                player_id,
                legal_actions,
                ..
            } => format!("{player_id}'s turn: {legal_actions}"),
            Self::ActionTaken { player_id, action } => format!("{player_id} {action}"),
            Self::ActionRejected { player_id, reason } => {
                format!("rejected {player_id}'s action: {reason}")
            }
            Self::PlayerAutoFolded { player_id } => format!("{player_id} timed out and folded"),
            Self::ShowdownHand {
                player_id,
                rank,
                cards,
            } => format!("{player_id} shows {rank} ({})", join_cards(cards)),
            Self::RoundSettled { round_id, winners } => {
                let winners = winners
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("round {round_id} settled: {winners}")
            }
            Self::RoundAborted { round_id, reason } => {
                format!("round {round_id} aborted and refunded: {reason}")
            }
            Self::CountdownStarted { secs } => format!("next round starts in {secs}s"),
            Self::CountdownCancelled => "countdown cancelled, waiting for players".to_string(),
        };
        write!(f, "{repr}")
    }
}

/// Per-round parameters decided by whoever starts the round.
#[derive(Clone, Debug)]
pub struct RoundSetup {
    pub round_id: u64,
    pub dealer_seat: SeatIndex,
    pub blinds: Blinds,
    pub action_timeout: Duration,
}

/// What a finished round hands back to the table.
#[derive(Debug)]
pub struct RoundOutcome {
    pub round_id: u64,
    pub dealer_seat: SeatIndex,
    /// Every participant's stack after settlement or refund.
    pub stacks: Vec<(PlayerId, Chips)>,
    pub result: Result<Vec<Payout>, RoundError>,
}

/// Data shared across every phase of a round.
#[derive(Debug)]
pub struct RoundData {
    pub round_id: u64,
    pub dealer_seat: SeatIndex,
    pub blinds: Blinds,
    /// Participants sorted by seat. Positions relative to the dealer are
    /// offsets into this list, so empty seats are skipped.
    pub players: Vec<Player>,
    pub pot: Chips,
    pub current_bet: Chips,
    pub last_aggressor: Option<SeatIndex>,
    /// The whole board, dealt before pre-flop betting. Only the first
    /// `revealed` cards are public.
    board: Vec<Card>,
    revealed: usize,
    deck: Deck,
    dealer_idx: usize,
    action_timeout: Duration,
    actions: Arc<ActionChannel>,
    events: UnboundedSender<GameEvent>,
    /// Stacks plus pot when the round formed. Must match at settlement.
    total_chips: u64,
}

impl RoundData {
    /// Community cards revealed so far.
    #[must_use]
    pub fn board(&self) -> &[Card] {
        &self.board[..self.revealed]
    }

    /// Players that haven't folded.
    #[must_use]
    pub fn contenders(&self) -> usize {
        self.players.iter().filter(|p| !p.folded).count()
    }

    fn emit(&self, event: GameEvent) {
        // Nobody listening is fine; the round still has to finish.
        self.events.send(event).ok();
    }

    /// Index of the player `k` occupied seats left of the dealer.
    fn offset(&self, k: usize) -> usize {
        (self.dealer_idx + k) % self.players.len()
    }

    fn chip_total(&self) -> u64 {
        self.players
            .iter()
            .map(|p| u64::from(p.chips))
            .sum::<u64>()
            + u64::from(self.pot)
    }

    fn commit(&mut self, idx: usize, amount: Chips) {
        let player = &mut self.players[idx];
        let amount = amount.min(player.chips);
        player.chips -= amount;
        player.sink += amount;
        player.committed += amount;
        if player.chips == 0 {
            player.all_in = true;
        }
        self.pot += amount;
    }

    fn post_blinds_and_deal(&mut self) -> Result<(), RoundError> {
        self.emit(GameEvent::RoundStarted {
            round_id: self.round_id,
            dealer_seat: self.dealer_seat,
        });

        let blinds = [
            (self.offset(1), self.blinds.small),
            (self.offset(2), self.blinds.big),
        ];
        for (idx, blind) in blinds {
            self.commit(idx, blind);
            debug!(
                "{} posts ${} blind",
                self.players[idx].id, self.players[idx].sink
            );
        }
        self.current_bet = self.players.iter().map(|p| p.sink).max().unwrap_or(0);
        self.emit(GameEvent::PotUpdated { amount: self.pot });

        let n = self.players.len();
        for _ in 0..HOLE_CARDS {
            for idx in clockwise_from(self.offset(1), n) {
                let card = self.deck.deal_card()?;
                self.players[idx].cards.push(card);
            }
        }
        for player in &self.players {
            self.emit(GameEvent::HoleCardsDealt {
                player_id: player.id.clone(),
                cards: player.cards.clone(),
            });
        }

        // Flop, turn, and river, each behind a burn card.
        for count in [3, 1, 1] {
            self.deck.burn_card()?;
            for _ in 0..count {
                let card = self.deck.deal_card()?;
                self.board.push(card);
            }
        }
        debug_assert_eq!(self.board.len(), BOARD_CARDS);
        Ok(())
    }

    #[must_use]
    pub fn action_choices(&self, idx: usize) -> ActionChoices {
        let player = &self.players[idx];
        let owed = player.owes(self.current_bet);
        let mut choices = vec![ActionChoice::Fold];
        if owed == 0 {
            choices.push(ActionChoice::Check);
        } else {
            choices.push(ActionChoice::Call(owed.min(player.chips)));
        }
        if player.chips > owed {
            choices.push(ActionChoice::Raise(self.current_bet + 1));
        }
        if player.chips > 0 {
            choices.push(ActionChoice::AllIn);
        }
        choices.into()
    }

    /// Apply `action` for the player at `idx`. Returns whether it reopened
    /// the betting.
    fn apply_action(&mut self, idx: usize, action: &Action) -> Result<bool, IllegalAction> {
        let current_bet = self.current_bet;
        let player = &self.players[idx];
        let owed = player.owes(current_bet);
        let (sink, chips) = (player.sink, player.chips);
        let reopened = match *action {
            Action::Fold => {
                self.players[idx].folded = true;
                false
            }
            Action::Check => {
                if owed > 0 {
                    return Err(IllegalAction::CannotCheck { owed });
                }
                false
            }
            Action::Call => {
                self.commit(idx, owed);
                false
            }
            Action::Raise(amount) => {
                if amount <= current_bet {
                    return Err(IllegalAction::RaiseTooSmall {
                        amount,
                        current_bet,
                    });
                }
                let needed = amount - sink;
                if needed > chips {
                    return Err(IllegalAction::InsufficientChips {
                        needed,
                        available: chips,
                    });
                }
                self.commit(idx, needed);
                true
            }
            Action::AllIn => {
                self.commit(idx, chips);
                self.players[idx].sink > current_bet
            }
        };
        if reopened {
            self.current_bet = self.players[idx].sink;
            self.last_aggressor = Some(self.players[idx].seat_idx);
        }
        if matches!(action, Action::Call | Action::Raise(_) | Action::AllIn) {
            self.emit(GameEvent::PotUpdated { amount: self.pot });
        }
        Ok(reopened)
    }

    fn fold_out_of_turn(&mut self, player_id: &PlayerId) {
        let Some(player) = self
            .players
            .iter_mut()
            .find(|p| &p.id == player_id && !p.folded)
        else {
            return;
        };
        player.folded = true;
        info!("{player_id} folded out of turn");
        self.emit(GameEvent::ActionTaken {
            player_id: player_id.clone(),
            action: Action::Fold,
        });
    }

    /// Prompt the player at `idx` until they give a legal action, fold, or
    /// run out the clock. Re-prompts share the original deadline. Returns
    /// whether the betting was reopened.
    async fn take_turn(&mut self, idx: usize) -> bool {
        let deadline = Instant::now() + self.action_timeout;
        let player_id = self.players[idx].id.clone();
        loop {
            // Open the slot before prompting so a quick reply isn't refused.
            self.actions.expect(player_id.clone());
            self.emit(GameEvent::TurnRequested {
                player_id: player_id.clone(),
                legal_actions: self.action_choices(idx),
                min_raise: self.current_bet + 1,
            });

            let action = loop {
                match self.actions.next(deadline).await {
                    Some(Mail::Action(action)) => break Some(Ok(action)),
                    Some(Mail::Rejected(reason)) => break Some(Err(reason)),
                    Some(Mail::Fold(folder)) => {
                        self.fold_out_of_turn(&folder);
                        if self.players[idx].folded || self.contenders() < 2 {
                            self.actions.close_turn();
                            return false;
                        }
                    }
                    None => break None,
                }
            };

            let Some(action) = action else {
                self.actions.close_turn();
                return self.time_out(idx);
            };
            let reason = match action {
                Ok(action) => match self.apply_action(idx, &action) {
                    Ok(reopened) => {
                        debug!("{player_id} {action}");
                        self.emit(GameEvent::ActionTaken { player_id, action });
                        return reopened;
                    }
                    Err(reason) => {
                        debug!("rejected {player_id}'s {action:?}: {reason}");
                        ActionError::from(reason)
                    }
                },
                Err(reason) => {
                    debug!("rejected {player_id}'s line: {reason}");
                    reason
                }
            };
            self.emit(GameEvent::ActionRejected {
                player_id: player_id.clone(),
                reason,
            });
        }
    }

    /// Act for a player whose clock ran out: check if nothing is owed,
    /// otherwise fold.
    fn time_out(&mut self, idx: usize) -> bool {
        let player_id = self.players[idx].id.clone();
        if self.players[idx].owes(self.current_bet) > 0 {
            warn!("{player_id} timed out, folding");
            self.players[idx].folded = true;
            self.emit(GameEvent::PlayerAutoFolded { player_id });
        } else {
            warn!("{player_id} timed out, checking");
            self.emit(GameEvent::ActionTaken {
                player_id,
                action: Action::Check,
            });
        }
        false
    }

    /// Run one street's betting starting at the player at `first`.
    ///
    /// Every player who can act is asked once in seat order. A raise (or an
    /// all-in above the current bet) puts everyone else who can still act
    /// back in line, in seat order after the raiser. Betting ends when the
    /// line empties or fewer than two players remain.
    async fn run_betting(&mut self, first: usize) {
        let n = self.players.len();
        let mut line: VecDeque<usize> = clockwise_from(first, n)
            .filter(|&i| self.players[i].can_act())
            .collect();
        while let Some(idx) = line.pop_front() {
            if self.contenders() < 2 {
                break;
            }
            let player = &self.players[idx];
            if !player.can_act() {
                continue;
            }
            let others_can_act = self
                .players
                .iter()
                .enumerate()
                .any(|(i, p)| i != idx && p.can_act());
            if player.owes(self.current_bet) == 0 && !others_can_act {
                continue;
            }
            if self.take_turn(idx).await {
                line = clockwise_from(idx + 1, n)
                    .filter(|&i| i != idx && self.players[i].can_act())
                    .collect();
            }
        }
    }

    /// Close out a street: hand back any bet nobody matched and clear the
    /// street's commitments.
    fn end_street(&mut self) -> Result<(), RoundError> {
        if self.contenders() >= 2 {
            let short = self
                .players
                .iter()
                .find(|p| p.can_act() && p.sink != self.current_bet);
            if let Some(player) = short {
                return Err(RoundError::InvariantViolation(format!(
                    "{} left the street with ${} of ${} committed",
                    player.id, player.sink, self.current_bet
                )));
            }
        }

        self.return_uncalled();
        for player in &mut self.players {
            player.sink = 0;
        }
        self.current_bet = 0;
        self.last_aggressor = None;
        Ok(())
    }

    fn return_uncalled(&mut self) {
        let mut sinks: Vec<(usize, Chips)> = self
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| (i, p.sink))
            .collect();
        sinks.sort_by(|a, b| b.1.cmp(&a.1));
        let Some(&(top_idx, top)) = sinks.first() else {
            return;
        };
        let second = sinks.get(1).map_or(0, |s| s.1);
        // Folded chips stay in the pot.
        if top <= second || self.players[top_idx].folded {
            return;
        }

        let excess = top - second;
        let player = &mut self.players[top_idx];
        player.chips += excess;
        player.sink -= excess;
        player.committed -= excess;
        player.all_in = false;
        self.pot -= excess;
        debug!("returned uncalled ${excess} to {}", player.id);
        self.emit(GameEvent::PotUpdated { amount: self.pot });
    }

    fn reveal(&mut self, street: Street) {
        let shown = self.revealed;
        self.revealed = match street {
            Street::Preflop => 0,
            Street::Flop => 3,
            Street::Turn => 4,
            Street::River => BOARD_CARDS,
        };
        let cards = self.board[shown..self.revealed].to_vec();
        debug!("round {} {street}: {}", self.round_id, join_cards(&cards));
        self.emit(GameEvent::StreetRevealed { street, cards });
    }

    /// Decide the winners and their shares without moving any chips.
    fn payouts(&self) -> Result<Vec<(usize, Chips)>, RoundError> {
        let n = self.players.len();
        // Clockwise from the seat left of the dealer, which is also the
        // order odd chips are handed out in.
        let contenders: Vec<usize> = clockwise_from(self.offset(1), n)
            .filter(|&i| !self.players[i].folded)
            .collect();

        let winners = if let [sole] = contenders.as_slice() {
            vec![*sole]
        } else {
            let mut shown = Vec::with_capacity(contenders.len());
            for &idx in &contenders {
                let player = &self.players[idx];
                let cards: Vec<Card> = player.cards.iter().chain(&self.board).copied().collect();
                let best = functional::best_hand(&cards)
                    .map_err(|e| RoundError::InvariantViolation(e.to_string()))?;
                shown.push((idx, best));
            }
            let hands: Vec<_> = shown.iter().map(|(_, best)| best.hand.clone()).collect();
            let winners: Vec<usize> = functional::argmax(&hands)
                .into_iter()
                .map(|k| contenders[k])
                .collect();

            // Without side pots, a winner who put in less than someone
            // they beat can't be paid correctly. Nothing is shown then.
            let max_committed = contenders
                .iter()
                .map(|&i| self.players[i].committed)
                .max()
                .unwrap_or(0);
            if winners
                .iter()
                .any(|&i| self.players[i].committed < max_committed)
            {
                return Err(RoundError::SidePotRequired);
            }
            for (idx, best) in shown {
                self.emit(GameEvent::ShowdownHand {
                    player_id: self.players[idx].id.clone(),
                    rank: best.hand.rank,
                    cards: best.cards.to_vec(),
                });
            }
            winners
        };

        let shares = functional::split_pot(self.pot, winners.len());
        let payouts: Vec<(usize, Chips)> = winners.into_iter().zip(shares).collect();
        let paid: u64 = payouts.iter().map(|&(_, amount)| u64::from(amount)).sum();
        if paid != u64::from(self.pot) {
            return Err(RoundError::InvariantViolation(format!(
                "paid out ${paid} from a ${} pot",
                self.pot
            )));
        }
        Ok(payouts)
    }

    fn refund(&mut self) {
        for player in &mut self.players {
            player.chips += player.committed;
            self.pot = self.pot.saturating_sub(player.committed);
            player.reset();
        }
        self.pot = 0;
        self.board.clear();
        self.revealed = 0;
        self.actions.close_turn();
    }
}

/// A round with data and logic for running one hand end-to-end.
#[derive(Debug)]
pub struct Round<T> {
    pub data: RoundData,
    pub state: T,
}

#[enum_dispatch]
pub trait RoundStateManagement {
    fn phase(&self) -> RoundPhase;
    fn data(&self) -> &RoundData;
}

impl<T: Phase> RoundStateManagement for Round<T> {
    fn phase(&self) -> RoundPhase {
        T::PHASE
    }

    fn data(&self) -> &RoundData {
        &self.data
    }
}

impl<T: Phase> Round<T> {
    fn into_state<N>(self, state: N) -> RoundState
    where
        Round<N>: Into<RoundState>,
    {
        Round {
            data: self.data,
            state,
        }
        .into()
    }

    fn abort(mut self, error: RoundError) -> RoundState {
        error!(
            "round {} aborted during {}: {error}",
            self.data.round_id,
            T::PHASE
        );
        self.data.refund();
        self.data.emit(GameEvent::RoundAborted {
            round_id: self.data.round_id,
            reason: error.clone(),
        });
        self.into_state(Aborted { error })
    }

    /// Bet out the current street, then either reveal `street` and move
    /// to `next`, or skip to the showdown if only one player is left.
    async fn bet_into<N>(mut self, first: usize, street: Street, next: N) -> RoundState
    where
        Round<N>: Into<RoundState>,
    {
        self.data.run_betting(first).await;
        if let Err(error) = self.data.end_street() {
            return self.abort(error);
        }
        if self.data.contenders() < 2 {
            return self.into_state::<Showdown>(Showdown);
        }
        self.data.reveal(street);
        self.into_state::<N>(next)
    }
}

impl Round<Forming> {
    /// Form a round from a snapshot of seated players. Players without
    /// chips sit the round out.
    ///
    /// # Errors
    ///
    /// - [`RoundError::NotEnoughPlayers`] with fewer than two players that
    ///   have chips
    /// - [`RoundError::InvariantViolation`] if nobody sits in `dealer_seat`
    /// - [`RoundError::TooManyChips`] if the stacks together don't fit in
    ///   a single pot
    pub fn new(
        setup: RoundSetup,
        mut players: Vec<Player>,
        deck: Deck,
        actions: Arc<ActionChannel>,
        events: UnboundedSender<GameEvent>,
    ) -> Result<Self, RoundError> {
        players.retain(|p| p.chips > 0);
        if players.len() < 2 {
            return Err(RoundError::NotEnoughPlayers);
        }
        players.sort_by_key(|p| p.seat_idx);
        for player in &mut players {
            player.reset();
        }
        let dealer_idx = players
            .iter()
            .position(|p| p.seat_idx == setup.dealer_seat)
            .ok_or_else(|| {
                RoundError::InvariantViolation(format!(
                    "no player in dealer seat {}",
                    setup.dealer_seat
                ))
            })?;

        let total_chips: u64 = players.iter().map(|p| u64::from(p.chips)).sum();
        if total_chips > u64::from(Chips::MAX) {
            return Err(RoundError::TooManyChips(total_chips));
        }
        info!(
            "round {} forming with {} players, dealer in seat {}",
            setup.round_id,
            players.len(),
            setup.dealer_seat
        );
        actions.open_round();
        Ok(Self {
            data: RoundData {
                round_id: setup.round_id,
                dealer_seat: setup.dealer_seat,
                blinds: setup.blinds,
                players,
                pot: 0,
                current_bet: 0,
                last_aggressor: None,
                board: Vec::with_capacity(BOARD_CARDS),
                revealed: 0,
                deck,
                dealer_idx,
                action_timeout: setup.action_timeout,
                actions,
                events,
                total_chips,
            },
            state: Forming,
        })
    }

    /// Drive the round to completion.
    pub async fn play(self) -> RoundOutcome {
        let mut state = RoundState::from(self);
        while !state.is_terminal() {
            state = state.step().await;
            debug!("round {} is at {}", state.data().round_id, state.phase());
        }
        state.data().actions.close_round();
        state.into_outcome()
    }

    fn open(mut self) -> RoundState {
        match self.data.post_blinds_and_deal() {
            Ok(()) => self.into_state(Preflop),
            Err(error) => self.abort(error),
        }
    }
}

impl Round<River> {
    async fn bet_to_showdown(mut self) -> RoundState {
        let first = self.data.offset(1);
        self.data.run_betting(first).await;
        match self.data.end_street() {
            Ok(()) => self.into_state(Showdown),
            Err(error) => self.abort(error),
        }
    }
}

impl Round<Showdown> {
    fn settle(mut self) -> RoundState {
        if self.data.chip_total() != self.data.total_chips {
            let error = RoundError::InvariantViolation(format!(
                "started with ${} in play, ended with ${}",
                self.data.total_chips,
                self.data.chip_total()
            ));
            return self.abort(error);
        }
        let payouts = match self.data.payouts() {
            Ok(payouts) => payouts,
            Err(error) => return self.abort(error),
        };

        let payouts: Vec<Payout> = payouts
            .into_iter()
            .map(|(idx, amount)| {
                let player = &mut self.data.players[idx];
                player.chips += amount;
                Payout {
                    player_id: player.id.clone(),
                    amount,
                }
            })
            .collect();
        self.data.pot = 0;
        for player in &mut self.data.players {
            player.reset();
        }
        self.data.board.clear();
        self.data.revealed = 0;

        let winners = payouts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        info!("round {} settled: {winners}", self.data.round_id);
        self.data.emit(GameEvent::RoundSettled {
            round_id: self.data.round_id,
            winners: payouts.clone(),
        });
        self.into_state(Settled { payouts })
    }
}

#[enum_dispatch(RoundStateManagement)]
#[derive(Debug)]
pub enum RoundState {
    Forming(Round<Forming>),
    Preflop(Round<Preflop>),
    Flop(Round<Flop>),
    Turn(Round<Turn>),
    River(Round<River>),
    Showdown(Round<Showdown>),
    Settled(Round<Settled>),
    Aborted(Round<Aborted>),
}

impl RoundState {
    /// Advance one phase. Terminal states step to themselves.
    pub async fn step(self) -> Self {
        match self {
            Self::Forming(round) => round.open(),
            Self::Preflop(round) => {
                let first = round.data.offset(3);
                round.bet_into(first, Street::Flop, Flop).await
            }
            Self::Flop(round) => {
                let first = round.data.offset(1);
                round.bet_into(first, Street::Turn, Turn).await
            }
            Self::Turn(round) => {
                let first = round.data.offset(1);
                round.bet_into(first, Street::River, River).await
            }
            Self::River(round) => round.bet_to_showdown().await,
            Self::Showdown(round) => round.settle(),
            terminal @ (Self::Settled(_) | Self::Aborted(_)) => terminal,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled(_) | Self::Aborted(_))
    }

    fn into_data(self) -> RoundData {
        match self {
            Self::Forming(round) => round.data,
            Self::Preflop(round) => round.data,
            Self::Flop(round) => round.data,
            Self::Turn(round) => round.data,
            Self::River(round) => round.data,
            Self::Showdown(round) => round.data,
            Self::Settled(round) => round.data,
            Self::Aborted(round) => round.data,
        }
    }

    #[must_use]
    pub fn into_outcome(self) -> RoundOutcome {
        let phase = self.phase();
        let (data, result) = match self {
            Self::Settled(round) => (round.data, Ok(round.state.payouts)),
            Self::Aborted(round) => (round.data, Err(round.state.error)),
            other => {
                let error = RoundError::InvariantViolation(format!("round stopped at {phase}"));
                (other.into_data(), Err(error))
            }
        };
        RoundOutcome {
            round_id: data.round_id,
            dealer_seat: data.dealer_seat,
            stacks: data
                .players
                .iter()
                .map(|p| (p.id.clone(), p.chips))
                .collect(),
            result,
        }
    }
}
