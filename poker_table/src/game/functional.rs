//! Hand ranking.

use super::entities::{Card, Rank, SubHand, Value};

const HAND_SIZE: usize = 5;

/// Rank exactly the given cards (at most five) as a single hand.
fn rank_cards(cards: &[Card]) -> SubHand {
    let mut counts = [0u8; 15];
    let mut counted = 0;
    for Card(value, _) in cards {
        // Values past the ace can't be ranked and are skipped.
        if let Some(count) = counts.get_mut(usize::from(*value)) {
            *count += 1;
            counted += 1;
        }
    }

    // (count, value) pairs, largest group first and high values breaking ties.
    let mut groups: Vec<(u8, Value)> = counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(value, count)| (*count, value as Value))
        .collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));

    let mut values: Vec<Value> = groups
        .iter()
        .flat_map(|(count, value)| std::iter::repeat_n(*value, usize::from(*count)))
        .collect();

    let complete = counted == HAND_SIZE;
    let is_flush = complete && cards.iter().all(|card| card.1 == cards[0].1);
    let is_straight = if complete && groups.len() == HAND_SIZE {
        let high = groups[0].1;
        let low = groups[HAND_SIZE - 1].1;
        if high - low == 4 {
            true
        } else if values == [14, 5, 4, 3, 2] {
            // The wheel: the ace plays low.
            values = vec![5, 4, 3, 2, 1];
            true
        } else {
            false
        }
    } else {
        false
    };

    let top = groups.first().map_or(0, |group| group.0);
    let second = groups.get(1).map_or(0, |group| group.0);
    let rank = match (is_straight, is_flush, top, second) {
        (true, true, _, _) => Rank::StraightFlush,
        (_, _, 4, _) => Rank::FourOfAKind,
        (_, _, 3, 2) => Rank::FullHouse,
        (_, true, _, _) => Rank::Flush,
        (true, _, _, _) => Rank::Straight,
        (_, _, 3, _) => Rank::ThreeOfAKind,
        (_, _, 2, 2) => Rank::TwoPair,
        (_, _, 2, _) => Rank::OnePair,
        _ => Rank::HighCard,
    };
    SubHand { rank, values }
}

/// Advance `indices` to the next k-combination of `0..n` in
/// lexicographic order. Returns `false` once every combination has been
/// visited.
fn next_combination(indices: &mut [usize], n: usize) -> bool {
    let k = indices.len();
    let Some(i) = (0..k).rev().find(|&i| indices[i] < n - k + i) else {
        return false;
    };
    indices[i] += 1;
    for j in i + 1..k {
        indices[j] = indices[j - 1] + 1;
    }
    true
}

/// Best five-card hand that can be made from `cards`. With five or
/// fewer cards the cards are ranked as they are.
#[must_use]
pub fn eval(cards: &[Card]) -> SubHand {
    if cards.len() <= HAND_SIZE {
        return rank_cards(cards);
    }

    let mut indices: Vec<usize> = (0..HAND_SIZE).collect();
    let mut hand = [cards[0]; HAND_SIZE];
    let mut best: Option<SubHand> = None;
    loop {
        for (slot, idx) in hand.iter_mut().zip(&indices) {
            *slot = cards[*idx];
        }
        let candidate = rank_cards(&hand);
        if best.as_ref().is_none_or(|best| candidate > *best) {
            best = Some(candidate);
        }
        if !next_combination(&mut indices, cards.len()) {
            break;
        }
    }
    best.unwrap_or_else(|| rank_cards(&[]))
}

/// Indices of every hand tied for best.
#[must_use]
pub fn argmax(hands: &[SubHand]) -> Vec<usize> {
    let Some(best) = hands.iter().max() else {
        return Vec::new();
    };
    hands
        .iter()
        .enumerate()
        .filter(|(_, hand)| *hand == best)
        .map(|(idx, _)| idx)
        .collect()
}
