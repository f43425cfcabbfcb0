//! Hand evaluation, showdown comparison, and pot arithmetic.
//!
//! Everything here is pure: no I/O, no shared state.

use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{
    constants::HAND_SIZE,
    entities::{Card, Chips, HandRank, SeatIndex, Value},
    errors::EvalError,
};

/// A classified five-card hand. `values` is the tie-break key for hands of
/// the same rank, most significant first, so the derived ordering compares
/// two hands correctly across and within categories.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct SubHand {
    pub rank: HandRank,
    pub values: Vec<Value>,
}

/// The best five cards out of a player's hole and board cards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BestHand {
    pub hand: SubHand,
    pub cards: [Card; HAND_SIZE],
}

/// Classify exactly five cards.
///
/// Tie-break keys per category:
/// - straight and straight flush: the top card, with the wheel (A-2-3-4-5)
///   keyed as a five
/// - royal flush: empty, every royal flush ties
/// - everything else: values grouped by multiplicity, then by value, so
///   the trips of a full house precede its pair and kickers come last in
///   descending order
pub fn eval(cards: &[Card]) -> Result<SubHand, EvalError> {
    let cards: &[Card; HAND_SIZE] = cards
        .try_into()
        .map_err(|_| EvalError::InvalidHandSize(cards.len()))?;

    let is_flush = cards.iter().all(|card| card.1 == cards[0].1);
    let straight = straight_high(cards);
    let (counts, grouped): (Vec<usize>, Vec<Value>) = group_values(cards).into_iter().unzip();

    let (rank, values) = match (is_flush, straight, counts.as_slice()) {
        (true, Some(Value::Ace), _) => (HandRank::RoyalFlush, vec![]),
        (true, Some(high), _) => (HandRank::StraightFlush, vec![high]),
        (_, _, [4, 1]) => (HandRank::FourOfAKind, grouped),
        (_, _, [3, 2]) => (HandRank::FullHouse, grouped),
        (true, None, _) => (HandRank::Flush, grouped),
        (false, Some(high), _) => (HandRank::Straight, vec![high]),
        (_, _, [3, 1, 1]) => (HandRank::ThreeOfAKind, grouped),
        (_, _, [2, 2, 1]) => (HandRank::TwoPair, grouped),
        (_, _, [2, 1, 1, 1]) => (HandRank::Pair, grouped),
        _ => (HandRank::HighCard, grouped),
    };
    Ok(SubHand { rank, values })
}

/// Pick the best five-card hand out of five to seven cards by evaluating
/// every five-card subset. Among equally strong subsets the first one
/// found is kept.
pub fn best_hand(cards: &[Card]) -> Result<BestHand, EvalError> {
    if !(HAND_SIZE..=7).contains(&cards.len()) {
        return Err(EvalError::InvalidHandSize(cards.len()));
    }

    let mut best: Option<BestHand> = None;
    for subset in five_card_subsets(cards) {
        let hand = eval(&subset)?;
        if best.as_ref().is_none_or(|b| hand > b.hand) {
            best = Some(BestHand {
                hand,
                cards: subset,
            });
        }
    }
    best.ok_or(EvalError::InvalidHandSize(cards.len()))
}

/// All C(n, 5) subsets of `cards`, in lexicographic index order.
#[must_use]
pub fn five_card_subsets(cards: &[Card]) -> Vec<[Card; HAND_SIZE]> {
    let n = cards.len();
    let mut subsets = Vec::new();
    if n < HAND_SIZE {
        return subsets;
    }
    for i in 0..(n - 4) {
        for j in (i + 1)..(n - 3) {
            for k in (j + 1)..(n - 2) {
                for l in (k + 1)..(n - 1) {
                    for m in (l + 1)..n {
                        subsets.push([cards[i], cards[j], cards[k], cards[l], cards[m]]);
                    }
                }
            }
        }
    }
    subsets
}

/// Get the indices of the strongest hands. More than one index means a
/// tie. Indices come back in ascending order.
#[must_use]
pub fn argmax(hands: &[SubHand]) -> Vec<usize> {
    let Some(max) = hands.iter().max() else {
        return vec![];
    };
    hands
        .iter()
        .enumerate()
        .filter_map(|(idx, hand)| (hand == max).then_some(idx))
        .collect()
}

/// Split `pot` among `num_winners` winners listed clockwise from the seat
/// left of the dealer. The odd chips go one at a time to the earliest
/// winners in that order.
#[must_use]
pub fn split_pot(pot: Chips, num_winners: usize) -> Vec<Chips> {
    let Ok(n) = Chips::try_from(num_winners) else {
        return vec![];
    };
    if n == 0 {
        return vec![];
    }
    let share = pot / n;
    let remainder = pot % n;
    (0..n)
        .map(|i| if i < remainder { share + 1 } else { share })
        .collect()
}

/// Positions `0..n` in clockwise order starting at `start`.
pub fn clockwise_from(start: usize, n: usize) -> impl Iterator<Item = usize> {
    (0..n).map(move |offset| (start + offset) % n)
}

/// Choose the dealer seat for the next round: a random occupied seat on
/// the first round, otherwise the first occupied seat clockwise of the
/// previous dealer seat, whether or not that seat is still occupied.
pub fn next_dealer<R: Rng + ?Sized>(
    previous: Option<SeatIndex>,
    occupied: &[SeatIndex],
    rng: &mut R,
) -> Option<SeatIndex> {
    match previous {
        None => occupied.choose(rng).copied(),
        Some(previous) => occupied
            .iter()
            .copied()
            .filter(|&seat| seat > previous)
            .min()
            .or_else(|| occupied.iter().copied().min()),
    }
}

fn straight_high(cards: &[Card; HAND_SIZE]) -> Option<Value> {
    let mut values: Vec<Value> = cards.iter().map(|card| card.0).collect();
    values.sort_unstable_by(|a, b| b.cmp(a));
    values.dedup();
    if values.len() != HAND_SIZE {
        return None;
    }
    if values[0].pips() - values[4].pips() == 4 {
        return Some(values[0]);
    }
    // The wheel: the ace plays low and the straight is five-high.
    if values == [Value::Ace, Value::Five, Value::Four, Value::Three, Value::Two] {
        return Some(Value::Five);
    }
    None
}

/// `(count, value)` pairs sorted by count, then value, both descending.
fn group_values(cards: &[Card]) -> Vec<(usize, Value)> {
    let mut counts: BTreeMap<Value, usize> = BTreeMap::new();
    for card in cards {
        *counts.entry(card.0).or_default() += 1;
    }
    let mut groups: Vec<(usize, Value)> = counts
        .into_iter()
        .map(|(value, count)| (count, value))
        .collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));
    groups
}
