use rand::Rng;
use rand::rngs::{StdRng, ThreadRng};
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use super::{Board, BoardShape};

/// Probability that a freshly spawned tile is a 4 instead of a 2.
pub const FOUR_TILE_CHANCE: f64 = 0.1;

/// Source of random tile insertions. Owns its generator so the deterministic
/// engine stays unit-testable: tests seed a `StdRng`, gameplay uses the
/// thread generator.
#[derive(Debug, Clone)]
pub struct TileSpawner<R = ThreadRng> {
    rng: R,
}

impl TileSpawner<ThreadRng> {
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl Default for TileSpawner<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl TileSpawner<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> TileSpawner<R> {
    /// Places a 2 (or, rarely, a 4) on a uniformly chosen empty cell inside
    /// the shape. Returns the placement, or `None` when no cell is free.
    pub fn spawn<const N: usize>(
        &mut self,
        board: &mut Board<N>,
        shape: &BoardShape<N>,
    ) -> Option<(usize, usize, u32)> {
        let empty = board.empty_cells_within(shape);
        let &(row, col) = empty.choose(&mut self.rng)?;

        let value = if self.rng.random_bool(FOUR_TILE_CHANCE) {
            4
        } else {
            2
        };

        board.set(row, col, value);
        Some((row, col, value))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn spawns_land_on_empty_cells_only() {
        let mut spawner = TileSpawner::seeded(7);
        let mut board = Board::<4>::empty();
        let shape = BoardShape::full();

        for n in 1..=16 {
            let (row, col, value) = spawner.spawn(&mut board, &shape).unwrap();
            assert_eq!(board.get(row, col), Some(value));
            assert!(value == 2 || value == 4);
            assert_eq!(board.empty_count(), 16 - n);
        }

        assert!(spawner.spawn(&mut board, &shape).is_none());
    }

    #[test]
    fn spawns_respect_the_shape() {
        let mask = [
            [true, false, false, false, false],
            [false; 5],
            [false; 5],
            [false; 5],
            [false, false, false, false, true],
        ];
        let shape = BoardShape::new(mask).unwrap();

        let mut spawner = TileSpawner::seeded(0);
        let mut board = Board::<5>::empty();

        assert!(spawner.spawn(&mut board, &shape).is_some());
        assert!(spawner.spawn(&mut board, &shape).is_some());
        assert!(spawner.spawn(&mut board, &shape).is_none());

        assert!(board.get(0, 0).is_some());
        assert!(board.get(4, 4).is_some());
        assert_eq!(board.empty_count(), 23);
    }

    #[test]
    fn seeded_spawner_is_reproducible() {
        let shape = BoardShape::full();

        let mut a = TileSpawner::seeded(42);
        let mut b = TileSpawner::seeded(42);

        let mut board_a = Board::<4>::empty();
        let mut board_b = Board::<4>::empty();

        for _ in 0..8 {
            assert_eq!(
                a.spawn(&mut board_a, &shape),
                b.spawn(&mut board_b, &shape)
            );
        }

        assert_eq!(board_a, board_b);
    }
}
