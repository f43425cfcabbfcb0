use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use holdem::{
    ActionChannel, Round, RoundSetup,
    entities::{Blinds, Card, Deck, Player, PlayerId},
    functional::{argmax, best_hand, eval, split_pot},
};
use std::{sync::Arc, time::Duration};
use tokio::{runtime::Runtime, sync::mpsc};

fn cards(s: &str) -> Vec<Card> {
    s.split_whitespace().map(|c| c.parse().unwrap()).collect()
}

fn players(n: usize) -> Vec<Player> {
    (0..n)
        .map(|seat| Player::new(PlayerId::new(&format!("player{seat}")), seat, 200))
        .collect()
}

fn setup() -> RoundSetup {
    RoundSetup {
        round_id: 1,
        dealer_seat: 0,
        blinds: Blinds::default(),
        action_timeout: Duration::from_secs(30),
    }
}

/// Paused clock, so timeouts fire as soon as the round goes idle.
fn paused_runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

/// Benchmark classifying exactly five cards
fn bench_eval_5_cards(c: &mut Criterion) {
    let hand = cards("AS KS QS JS TS");

    c.bench_function("eval_5_cards", |b| {
        b.iter(|| eval(&hand));
    });
}

/// Benchmark best-of-21 selection from hole cards plus a full board
fn bench_best_hand_7_cards(c: &mut Criterion) {
    let hand = cards("AS KS QS JS TS 2H 3D");

    c.bench_function("best_hand_7_cards", |b| {
        b.iter(|| best_hand(&hand));
    });
}

/// Benchmark best-hand selection across 100 seeded deals
fn bench_best_hand_100_deals(c: &mut Criterion) {
    let deals: Vec<Vec<Card>> = (0..100)
        .map(|seed| {
            let mut deck = Deck::new_shuffled(seed);
            (0..7).filter_map(|_| deck.deal_card().ok()).collect()
        })
        .collect();

    c.bench_function("best_hand_100_deals", |b| {
        b.iter(|| deals.iter().map(|hand| best_hand(hand)).collect::<Vec<_>>());
    });
}

/// Benchmark picking winners among a full table of hands
fn bench_hand_comparison(c: &mut Criterion) {
    let hands: Vec<_> = (0..10)
        .map(|seed| {
            let mut deck = Deck::new_shuffled(seed);
            let hand: Vec<Card> = (0..7).filter_map(|_| deck.deal_card().ok()).collect();
            best_hand(&hand).unwrap().hand
        })
        .collect();

    c.bench_function("hand_comparison_10_hands", |b| {
        b.iter(|| argmax(&hands));
    });
}

fn bench_split_pot(c: &mut Criterion) {
    c.bench_function("split_pot_odd_chips", |b| {
        b.iter(|| split_pot(1_001, 7));
    });
}

/// Benchmark forming a round with different player counts
fn bench_round_forming(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_forming");

    for n_players in [2, 6, 10].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{n_players}_players")),
            n_players,
            |b, &n| {
                b.iter_batched(
                    || (players(n), Deck::new_shuffled(7)),
                    |(players, deck)| {
                        let (tx, _rx) = mpsc::unbounded_channel();
                        Round::new(setup(), players, deck, Arc::new(ActionChannel::new()), tx)
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

/// Benchmark a whole round where nobody ever answers
fn bench_round_on_timeouts(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_on_timeouts");
    let rt = paused_runtime();

    for n_players in [2, 10].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{n_players}_players")),
            n_players,
            |b, &n| {
                b.iter_batched(
                    || players(n),
                    |players| {
                        rt.block_on(async {
                            let (tx, _rx) = mpsc::unbounded_channel();
                            let channel = Arc::new(ActionChannel::new());
                            let round = Round::new(
                                setup(),
                                players,
                                Deck::new_shuffled(7),
                                channel,
                                tx,
                            )
                            .unwrap();
                            round.play().await
                        })
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(
    hand_evaluation,
    bench_eval_5_cards,
    bench_best_hand_7_cards,
    bench_best_hand_100_deals,
    bench_hand_comparison,
    bench_split_pot,
);

criterion_group!(round_operations, bench_round_forming, bench_round_on_timeouts);

criterion_main!(hand_evaluation, round_operations);
