//! Full rounds driven through the action channel.
//!
//! Each test scripts who gets prompted and what arrives in reply, and
//! uses a prearranged deck where the cards matter. The dealer sits in
//! seat 0. Hole cards go out one at a time starting left of the dealer,
//! then the flop, turn, and river are each dealt behind a burn card.

use holdem::game::{
    ActionChannel, ActionError, Delivery, GameEvent, IllegalAction, Payout, Round, RoundError,
    RoundOutcome, RoundSetup,
    entities::{Action, Blinds, Card, Chips, Deck, HandRank, Player, PlayerAction, PlayerId, Street},
};
use std::{collections::VecDeque, sync::Arc, time::Duration};
use tokio::{sync::mpsc, time::Instant};

const STACK: Chips = 200;

fn cards(s: &str) -> Vec<Card> {
    s.split_whitespace().map(|c| c.parse().unwrap()).collect()
}

fn id(s: &str) -> PlayerId {
    PlayerId::new(s)
}

struct Scenario {
    players: Vec<(&'static str, Chips)>,
    blinds: Blinds,
    deck: Deck,
    /// Who should be prompted next, and the actions posted in reply. An
    /// empty reply lets the clock run out.
    script: Vec<(&'static str, Vec<(&'static str, Action)>)>,
}

impl Scenario {
    fn new(players: &[&'static str], deck: Deck) -> Self {
        Self {
            players: players.iter().map(|&name| (name, STACK)).collect(),
            blinds: Blinds::default(),
            deck,
            script: vec![],
        }
    }

    fn act(mut self, who: &'static str, action: Action) -> Self {
        self.script.push((who, vec![(who, action)]));
        self
    }

    fn stall(mut self, who: &'static str) -> Self {
        self.script.push((who, vec![]));
        self
    }

    /// `gone` folds out of turn while `who` is deciding, then `who` acts.
    fn disconnect(mut self, who: &'static str, gone: &'static str, action: Action) -> Self {
        self.script
            .push((who, vec![(gone, Action::Fold), (who, action)]));
        self
    }

    async fn play(self) -> (RoundOutcome, Vec<GameEvent>) {
        let start_total: Chips = self.players.iter().map(|(_, chips)| chips).sum();
        let channel = Arc::new(ActionChannel::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let players = self
            .players
            .iter()
            .enumerate()
            .map(|(seat, &(name, chips))| Player::new(id(name), seat, chips))
            .collect();
        let setup = RoundSetup {
            round_id: 1,
            dealer_seat: 0,
            blinds: self.blinds,
            action_timeout: Duration::from_secs(30),
        };
        let round = Round::new(setup, players, self.deck, Arc::clone(&channel), tx).unwrap();
        let task = tokio::spawn(round.play());

        let mut script = VecDeque::from(self.script);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            if let GameEvent::TurnRequested { player_id, .. } = &event {
                let (who, replies) = script
                    .pop_front()
                    .unwrap_or_else(|| panic!("unscripted turn for {player_id}"));
                assert_eq!(player_id.as_str(), who);
                for (sender, action) in replies {
                    channel
                        .post(PlayerAction::new(id(sender), action))
                        .unwrap();
                }
            }
            events.push(event);
        }
        assert!(script.is_empty(), "unused script: {script:?}");

        let outcome = task.await.unwrap();
        let end_total: Chips = outcome.stacks.iter().map(|(_, chips)| chips).sum();
        assert_eq!(start_total, end_total);
        (outcome, events)
    }
}

fn revealed(events: &[GameEvent]) -> Vec<(Street, Vec<Card>)> {
    events
        .iter()
        .filter_map(|event| match event {
            GameEvent::StreetRevealed { street, cards } => Some((*street, cards.clone())),
            _ => None,
        })
        .collect()
}

fn stack(outcome: &RoundOutcome, name: &str) -> Chips {
    outcome
        .stacks
        .iter()
        .find(|(player_id, _)| player_id.as_str() == name)
        .map(|(_, chips)| *chips)
        .unwrap()
}

fn payout(name: &str, amount: Chips) -> Payout {
    Payout {
        player_id: id(name),
        amount,
    }
}

// === Showdown Tests ===

#[tokio::test]
async fn test_aces_full_beats_kings_up() {
    // bob is left of the dealer and gets the first card.
    let deck = Deck::from_cards(cards("KH AH KS AS 3S AD 7C 2D 4S 2C 5S 9H"));
    let mut scenario = Scenario::new(&["alice", "bob"], deck)
        .act("bob", Action::Call)
        .act("alice", Action::Check);
    for _ in 0..3 {
        scenario = scenario
            .act("bob", Action::Check)
            .act("alice", Action::Check);
    }
    let (outcome, events) = scenario.play().await;

    assert_eq!(
        revealed(&events),
        vec![
            (Street::Flop, cards("AD 7C 2D")),
            (Street::Turn, cards("2C")),
            (Street::River, cards("9H")),
        ]
    );
    let shown: Vec<(String, HandRank)> = events
        .iter()
        .filter_map(|event| match event {
            GameEvent::ShowdownHand {
                player_id, rank, ..
            } => Some((player_id.to_string(), *rank)),
            _ => None,
        })
        .collect();
    assert_eq!(
        shown,
        vec![
            ("bob".to_string(), HandRank::TwoPair),
            ("alice".to_string(), HandRank::FullHouse),
        ]
    );
    assert_eq!(outcome.result, Ok(vec![payout("alice", 4)]));
    assert_eq!(stack(&outcome, "alice"), 202);
    assert_eq!(stack(&outcome, "bob"), 198);
}

#[tokio::test]
async fn test_tied_board_straight_splits_odd_chip_clockwise() {
    // Blinds of 1/1 so a folded small blind leaves an odd pot of 3.
    let deck = Deck::from_cards(cards("6C 4H 2H 7C 5D 3D 9S TC JD QH 8S KS 8D AC"));
    let mut scenario = Scenario::new(&["alice", "bob", "carol"], deck)
        .act("alice", Action::Call)
        .act("bob", Action::Fold)
        .act("carol", Action::Check);
    for _ in 0..3 {
        scenario = scenario
            .act("carol", Action::Check)
            .act("alice", Action::Check);
    }
    scenario.blinds = Blinds { small: 1, big: 1 };
    let (outcome, _events) = scenario.play().await;

    // carol sits closer to the dealer's left, so she gets the odd chip.
    assert_eq!(
        outcome.result,
        Ok(vec![payout("carol", 2), payout("alice", 1)])
    );
    assert_eq!(stack(&outcome, "alice"), 200);
    assert_eq!(stack(&outcome, "bob"), 199);
    assert_eq!(stack(&outcome, "carol"), 201);
}

// === Early Finish Tests ===

#[tokio::test]
async fn test_fold_to_one_on_flop_skips_turn_and_river() {
    let (outcome, events) = Scenario::new(&["alice", "bob", "carol"], Deck::new_shuffled(11))
        .act("alice", Action::Call)
        .act("bob", Action::Call)
        .act("carol", Action::Check)
        .act("bob", Action::Raise(10))
        .act("carol", Action::Fold)
        .act("alice", Action::Fold)
        .play()
        .await;

    let streets: Vec<Street> = revealed(&events).into_iter().map(|(s, _)| s).collect();
    assert_eq!(streets, vec![Street::Flop]);
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, GameEvent::ShowdownHand { .. }))
    );
    // bob's unanswered raise comes back; he wins the pre-flop pot.
    assert_eq!(outcome.result, Ok(vec![payout("bob", 6)]));
    assert_eq!(stack(&outcome, "bob"), 204);
}

#[tokio::test]
async fn test_disconnect_fold_during_someone_elses_turn() {
    let (outcome, events) = Scenario::new(&["alice", "bob", "carol"], Deck::new_shuffled(12))
        .act("alice", Action::Call)
        .disconnect("bob", "carol", Action::Fold)
        .play()
        .await;

    assert!(events.contains(&GameEvent::ActionTaken {
        player_id: id("carol"),
        action: Action::Fold
    }));
    assert!(revealed(&events).is_empty());
    // carol's big blind stays in the pot.
    assert_eq!(outcome.result, Ok(vec![payout("alice", 5)]));
    assert_eq!(stack(&outcome, "carol"), 198);
}

#[tokio::test]
async fn test_raise_reopens_action_for_earlier_players() {
    let (outcome, events) = Scenario::new(&["alice", "bob", "carol"], Deck::new_shuffled(17))
        .act("alice", Action::Call)
        .act("bob", Action::Call)
        .act("carol", Action::Raise(6))
        .act("alice", Action::Call)
        .act("bob", Action::Fold)
        .act("carol", Action::Raise(10))
        .act("alice", Action::Fold)
        .play()
        .await;

    assert_eq!(revealed(&events).len(), 1);
    assert_eq!(outcome.result, Ok(vec![payout("carol", 14)]));
    assert_eq!(stack(&outcome, "carol"), 208);
    assert_eq!(stack(&outcome, "alice"), 194);
}

// === Timeout Tests ===

#[tokio::test(start_paused = true)]
async fn test_timeout_folds_when_owing() {
    let start = Instant::now();
    let (outcome, events) = Scenario::new(&["alice", "bob"], Deck::new_shuffled(13))
        .stall("bob")
        .play()
        .await;

    assert!(events.contains(&GameEvent::PlayerAutoFolded {
        player_id: id("bob")
    }));
    assert_eq!(start.elapsed(), Duration::from_secs(30));
    assert_eq!(stack(&outcome, "alice"), 201);
    assert_eq!(stack(&outcome, "bob"), 199);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_checks_when_nothing_owed() {
    let mut scenario = Scenario::new(&["alice", "bob"], Deck::new_shuffled(14))
        .act("bob", Action::Call)
        .stall("alice");
    for _ in 0..3 {
        scenario = scenario.act("bob", Action::Check).stall("alice");
    }
    let (outcome, events) = scenario.play().await;

    assert!(
        !events
            .iter()
            .any(|e| matches!(e, GameEvent::PlayerAutoFolded { .. }))
    );
    let auto_checks = events
        .iter()
        .filter(|e| {
            matches!(e, GameEvent::ActionTaken { player_id, action: Action::Check }
                if player_id.as_str() == "alice")
        })
        .count();
    assert_eq!(auto_checks, 4);
    assert_eq!(revealed(&events).len(), 3);
    assert!(outcome.result.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_reprompt_keeps_original_deadline() {
    let start = Instant::now();
    let (_outcome, events) = Scenario::new(&["alice", "bob"], Deck::new_shuffled(15))
        .act("bob", Action::Raise(1))
        .stall("bob")
        .play()
        .await;

    assert!(events.contains(&GameEvent::PlayerAutoFolded {
        player_id: id("bob")
    }));
    assert_eq!(start.elapsed(), Duration::from_secs(30));
}

// === Legality Tests ===

#[tokio::test]
async fn test_illegal_actions_are_rejected_and_reprompted() {
    let (outcome, events) = Scenario::new(&["alice", "bob"], Deck::new_shuffled(16))
        .act("bob", Action::Raise(2))
        .act("bob", Action::Check)
        .act("bob", Action::Raise(500))
        .act("bob", Action::Fold)
        .play()
        .await;

    let rejections: Vec<ActionError> = events
        .iter()
        .filter_map(|event| match event {
            GameEvent::ActionRejected { reason, .. } => Some(reason.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        rejections,
        vec![
            ActionError::Illegal(IllegalAction::RaiseTooSmall {
                amount: 2,
                current_bet: 2
            }),
            ActionError::Illegal(IllegalAction::CannotCheck { owed: 1 }),
            ActionError::Illegal(IllegalAction::InsufficientChips {
                needed: 499,
                available: 199
            }),
        ]
    );
    assert_eq!(stack(&outcome, "alice"), 201);
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_reply_is_rejected_and_reprompted() {
    let channel = Arc::new(ActionChannel::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let players = vec![
        Player::new(id("alice"), 0, STACK),
        Player::new(id("bob"), 1, STACK),
    ];
    let setup = RoundSetup {
        round_id: 1,
        dealer_seat: 0,
        blinds: Blinds::default(),
        action_timeout: Duration::from_secs(30),
    };
    let deck = Deck::new_shuffled(17);
    let round = Round::new(setup, players, deck, Arc::clone(&channel), tx).unwrap();
    let start = Instant::now();
    let task = tokio::spawn(round.play());

    let garbage = ActionError::Protocol("unknown command \"HELLO\"".to_string());
    let mut prompts = 0;
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        if let GameEvent::TurnRequested { player_id, .. } = &event {
            assert_eq!(player_id, &id("bob"));
            prompts += 1;
            if prompts == 1 {
                tokio::time::sleep(Duration::from_secs(10)).await;
                channel.reject(&id("bob"), garbage.clone()).unwrap();
            } else {
                channel
                    .post(PlayerAction::new(id("bob"), Action::Fold))
                    .unwrap();
            }
        }
        events.push(event);
    }

    assert_eq!(prompts, 2);
    assert!(events.contains(&GameEvent::ActionRejected {
        player_id: id("bob"),
        reason: garbage,
    }));
    assert_eq!(task.await.unwrap().result, Ok(vec![payout("alice", 3)]));
    // Well inside bob's 30 seconds.
    assert_eq!(start.elapsed(), Duration::from_secs(10));
    // Folds after the round are no longer queued.
    assert_eq!(
        channel.post(PlayerAction::new(id("bob"), Action::Fold)),
        Ok(Delivery::Ignored)
    );
}

// === Side Pot Guard Tests ===

#[tokio::test]
async fn test_short_all_in_winner_aborts_and_refunds() {
    // alice holds aces; bob and carol miss the board.
    let deck = Deck::from_cards(cards("2C 3C AH 7D 8D AS 5S AD KC QH 6S 4S 6H 9H"));
    let mut scenario = Scenario::new(&["alice", "bob", "carol"], deck)
        .act("alice", Action::AllIn)
        .act("bob", Action::Raise(100))
        .act("carol", Action::Call);
    for _ in 0..3 {
        scenario = scenario
            .act("bob", Action::Check)
            .act("carol", Action::Check);
    }
    scenario.players[0].1 = 50;
    let (outcome, events) = scenario.play().await;

    assert_eq!(outcome.result, Err(RoundError::SidePotRequired));
    assert!(events.contains(&GameEvent::RoundAborted {
        round_id: 1,
        reason: RoundError::SidePotRequired
    }));
    // No hands are shown for a round that gets refunded.
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, GameEvent::ShowdownHand { .. }))
    );
    assert_eq!(stack(&outcome, "alice"), 50);
    assert_eq!(stack(&outcome, "bob"), STACK);
    assert_eq!(stack(&outcome, "carol"), STACK);
}

#[tokio::test]
async fn test_short_all_in_loser_pays_the_winner() {
    // Same hands, but carol holds the aces this time.
    let deck = Deck::from_cards(cards("2C AH 3C 7D AS 8D 5S AD KC QH 6S 4S 6H 9H"));
    let mut scenario = Scenario::new(&["alice", "bob", "carol"], deck)
        .act("alice", Action::AllIn)
        .act("bob", Action::Raise(100))
        .act("carol", Action::Call);
    for _ in 0..3 {
        scenario = scenario
            .act("bob", Action::Check)
            .act("carol", Action::Check);
    }
    scenario.players[0].1 = 50;
    let (outcome, events) = scenario.play().await;

    assert_eq!(outcome.result, Ok(vec![payout("carol", 250)]));
    let shown = events
        .iter()
        .filter(|e| matches!(e, GameEvent::ShowdownHand { .. }))
        .count();
    assert_eq!(shown, 3);
    assert_eq!(stack(&outcome, "alice"), 0);
    assert_eq!(stack(&outcome, "bob"), 100);
    assert_eq!(stack(&outcome, "carol"), 350);
}
