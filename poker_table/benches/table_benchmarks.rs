use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use poker_table::{
    GameSettings, HandPhase, PhaseRules, Table,
    entities::{Action, Card, GameId, PlayerId, Suit},
    functional::{argmax, eval},
};

/// Helper to create a seeded table with N players seated
fn setup_table_with_players(n_players: usize) -> Table {
    let settings = GameSettings {
        seed: Some(42),
        ..GameSettings::default()
    };
    let mut table = Table::new(GameId::new_v4(), settings);
    for seat_idx in 0..n_players {
        let player_id = PlayerId::new(&format!("player{seat_idx}"));
        // Benchmarks only seat players on open seats
        let _ = table.seat(player_id, "", seat_idx, 10_000);
    }
    table
}

/// Play one hand where everyone checks or calls down to showdown
fn play_hand(table: &mut Table) {
    if table.start_hand().is_err() {
        return;
    }
    loop {
        match table.phase() {
            HandPhase::NoHand(_) => return,
            HandPhase::Settlement(_) => {
                let _ = table.settle_hand();
                return;
            }
            phase if !phase.accepts_actions() => {
                if table.advance_street().is_err() {
                    return;
                }
            }
            _ => {
                let Some(player_id) = table.turn().map(|turn| turn.player_id.clone()) else {
                    return;
                };
                if table.act(&player_id, Action::Check).is_err()
                    && table.act(&player_id, Action::Call).is_err()
                {
                    let _ = table.act(&player_id, Action::Fold);
                }
            }
        }
    }
}

/// Benchmark hand evaluation with 5 cards (no combinations)
fn bench_hand_eval_5_cards(c: &mut Criterion) {
    let cards = vec![
        Card(14, Suit::Spade),
        Card(13, Suit::Spade),
        Card(12, Suit::Heart),
        Card(7, Suit::Club),
        Card(2, Suit::Diamond),
    ];

    c.bench_function("hand_eval_5_cards", |b| {
        b.iter(|| eval(&cards));
    });
}

/// Benchmark hand evaluation with 7 cards (hole cards + board)
fn bench_hand_eval_7_cards(c: &mut Criterion) {
    let cards = vec![
        Card(14, Suit::Spade),  // Hole: Ace of Spades
        Card(13, Suit::Spade),  // Hole: King of Spades
        Card(12, Suit::Spade),  // Board: Queen of Spades
        Card(11, Suit::Spade),  // Board: Jack of Spades
        Card(10, Suit::Spade),  // Board: 10 of Spades (royal flush)
        Card(2, Suit::Heart),   // Board: 2 of Hearts
        Card(3, Suit::Diamond), // Board: 3 of Diamonds
    ];

    c.bench_function("hand_eval_7_cards", |b| {
        b.iter(|| eval(&cards));
    });
}

/// Benchmark comparing several showdown hands
fn bench_hand_comparison(c: &mut Criterion) {
    let hands = vec![
        eval(&[
            Card(14, Suit::Spade),
            Card(9, Suit::Heart),
            Card(7, Suit::Diamond),
            Card(5, Suit::Club),
            Card(3, Suit::Spade),
        ]),
        eval(&[
            Card(13, Suit::Spade),
            Card(13, Suit::Heart),
            Card(9, Suit::Diamond),
            Card(5, Suit::Club),
            Card(3, Suit::Spade),
        ]),
        eval(&[
            Card(8, Suit::Club),
            Card(8, Suit::Heart),
            Card(8, Suit::Diamond),
            Card(4, Suit::Club),
            Card(4, Suit::Spade),
        ]),
        eval(&[
            Card(6, Suit::Heart),
            Card(5, Suit::Heart),
            Card(4, Suit::Heart),
            Card(3, Suit::Heart),
            Card(2, Suit::Heart),
        ]),
    ];

    c.bench_function("hand_comparison_4_hands", |b| {
        b.iter(|| argmax(&hands));
    });
}

/// Benchmark view generation with different player counts
fn bench_view_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_generation");

    for n_players in [2, 6, 10].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{n_players}_players")),
            n_players,
            |b, &n| {
                let mut table = setup_table_with_players(n);
                let _ = table.start_hand();
                let viewer = PlayerId::new("player0");
                b.iter(|| table.view_for(Some(&viewer)));
            },
        );
    }

    group.finish();
}

/// Benchmark a complete hand from deal to payout
fn bench_full_hand(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_hand");

    for n_players in [2, 10].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{n_players}_players")),
            n_players,
            |b, &n| {
                b.iter_batched(
                    || setup_table_with_players(n),
                    |mut table| {
                        play_hand(&mut table);
                        table
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(
    hand_evaluation,
    bench_hand_eval_5_cards,
    bench_hand_eval_7_cards,
    bench_hand_comparison,
);

criterion_group!(table_operations, bench_view_generation, bench_full_hand);

criterion_main!(hand_evaluation, table_operations);
