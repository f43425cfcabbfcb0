//! Line protocol spoken with clients.
//!
//! Every message is one line of upper-case words. Clients send their id
//! as the first line, then `ACTION <action>` or `DISCONNECT`. The server
//! turns table events into lines such as `FLOP AD 7C 2D` or `POT 12`.

use holdem::{
    ActionError, GameEvent,
    entities::{Action, ActionChoice, Card, PlayerId, Street},
    table::SeatSnapshot,
};
use std::str::FromStr;

/// A line sent by a seated client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClientLine {
    Action(Action),
    Disconnect,
}

impl FromStr for ClientLine {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("DISCONNECT") {
            return Ok(Self::Disconnect);
        }
        match s.split_once(char::is_whitespace) {
            Some((verb, rest)) if verb.eq_ignore_ascii_case("ACTION") => {
                Ok(Self::Action(rest.parse()?))
            }
            _ => Err(ActionError::Protocol(format!("unknown command {s:?}"))),
        }
    }
}

/// Everything broadcast to connections.
#[derive(Clone, Debug)]
pub enum Outbound {
    Game(GameEvent),
    Disconnected(PlayerId),
    Seats(SeatSnapshot),
}

fn cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn action_word(action: &Action) -> String {
    match action {
        Action::AllIn => "ALL_IN".to_string(),
        Action::Call => "CALL".to_string(),
        Action::Check => "CHECK".to_string(),
        Action::Fold => "FOLD".to_string(),
        Action::Raise(amount) => format!("RAISE {amount}"),
    }
}

fn choice_word(choice: &ActionChoice) -> String {
    match choice {
        ActionChoice::AllIn => "ALL_IN".to_string(),
        ActionChoice::Call(amount) => format!("CALL:{amount}"),
        ActionChoice::Check => "CHECK".to_string(),
        ActionChoice::Fold => "FOLD".to_string(),
        ActionChoice::Raise(amount) => format!("RAISE:{amount}"),
    }
}

fn street_word(street: Street) -> &'static str {
    match street {
        Street::Preflop => "PREFLOP",
        Street::Flop => "FLOP",
        Street::Turn => "TURN",
        Street::River => "RIVER",
    }
}

/// The line `me` should see for `outbound`, if any. Hole cards, turn
/// prompts, and rejections only go to the player they concern.
#[must_use]
pub fn render(outbound: &Outbound, me: &PlayerId) -> Option<String> {
    let event = match outbound {
        Outbound::Game(event) => event,
        Outbound::Disconnected(player_id) => {
            return Some(format!("PLAYER_DISCONNECTED {player_id}"));
        }
        Outbound::Seats(snapshot) => return Some(format!("SEATINFO {snapshot}")),
    };
    if event.recipient().is_some_and(|recipient| recipient != me) {
        return None;
    }

    let line = match event {
        GameEvent::RoundStarted {
            round_id,
            dealer_seat,
        } => format!("ROUND_START {round_id} {dealer_seat}"),
        GameEvent::HoleCardsDealt { cards: hole, .. } => format!("HAND {}", cards(hole)),
        GameEvent::StreetRevealed {
            street,
            cards: dealt,
        } => format!("{} {}", street_word(*street), cards(dealt)),
        GameEvent::PotUpdated { amount } => format!("POT {amount}"),
        GameEvent::TurnRequested {
            player_id,
            legal_actions,
            min_raise,
        } => {
            if player_id != me {
                return None;
            }
            let choices = legal_actions
                .sorted()
                .iter()
                .map(choice_word)
                .collect::<Vec<_>>()
                .join(" ");
            format!("YOUR_TURN {choices} MIN_RAISE {min_raise}")
        }
        GameEvent::ActionTaken { player_id, action } => {
            format!("ACTION {player_id} {}", action_word(action))
        }
        GameEvent::ActionRejected { player_id, reason } => {
            if player_id != me {
                return None;
            }
            format!("REJECTED {reason}")
        }
        GameEvent::PlayerAutoFolded { player_id } => format!("AUTO_FOLD {player_id}"),
        GameEvent::ShowdownHand {
            player_id,
            rank,
            cards: best,
        } => format!(
            "SHOWDOWN {player_id} {} {}",
            rank.to_string().to_ascii_uppercase().replace(' ', "_"),
            cards(best)
        ),
        GameEvent::RoundSettled { winners, .. } => {
            let winners = winners
                .iter()
                .map(|payout| format!("{},{};", payout.player_id, payout.amount))
                .collect::<String>();
            format!("WINNER {winners}")
        }
        GameEvent::RoundAborted { round_id, reason } => {
            format!("ROUND_ABORTED {round_id} {reason}")
        }
        GameEvent::CountdownStarted { secs } => format!("COUNTDOWN {secs}"),
        GameEvent::CountdownCancelled => "COUNTDOWN CANCELLED".to_string(),
    };
    Some(line)
}
