use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use itertools::Itertools as _;
use rand::SeedableRng;
use rand::rngs::StdRng;

use twenty_fourty_eight_patterns::board::{Board, BoardShape, Direction, test_utils};
use twenty_fourty_eight_patterns::search::{Advisor, HeuristicWeights, evaluate};

/// Random boards across the whole range of fill levels.
fn generate_boards(count: usize) -> Vec<Board<4>> {
    let mut rng = StdRng::seed_from_u64(1848);

    (0..16)
        .cartesian_product(0..count)
        .map(|(filled, _)| test_utils::random_board::<4>(&mut rng, filled))
        .collect()
}

fn bench_slide(c: &mut Criterion) {
    const COUNT: usize = 100;

    let mut group = c.benchmark_group("slide");

    let boards = generate_boards(COUNT);
    group.throughput(Throughput::Elements((boards.len() * 4) as u64));

    group.bench_function("all_directions", |b| {
        b.iter(|| {
            for board in &boards {
                for direction in Direction::ALL {
                    black_box(board.slide(direction));
                }
            }
        });
    });

    let shape = {
        let mut mask = [[true; 4]; 4];
        mask[0][0] = false;
        mask[3][3] = false;
        BoardShape::new(mask).unwrap()
    };

    group.bench_function("all_directions_masked", |b| {
        b.iter(|| {
            for board in &boards {
                for direction in Direction::ALL {
                    black_box(board.slide_within(&shape, direction));
                }
            }
        });
    });
}

fn bench_heuristic(c: &mut Criterion) {
    const COUNT: usize = 100;

    let mut group = c.benchmark_group("heuristic");

    let boards = generate_boards(COUNT);
    let weights = HeuristicWeights::default();

    group.throughput(Throughput::Elements(boards.len() as u64));
    group.bench_function("evaluate", |b| {
        b.iter(|| {
            for board in &boards {
                black_box(evaluate(board, &weights));
            }
        });
    });
}

fn bench_advisor(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2048);
    let board = test_utils::random_board::<4>(&mut rng, 8);

    let mut group = c.benchmark_group("advisor");

    for depth in [2, 4] {
        group.bench_function(format!("best_move_depth_{depth}"), |b| {
            let mut advisor = Advisor::with_depth(depth);
            b.iter(|| black_box(advisor.best_move(&board)));
        });
    }
}

criterion_group!(benches, bench_slide, bench_heuristic, bench_advisor);
criterion_main!(benches);
