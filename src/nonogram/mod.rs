use itertools::Itertools as _;
use thiserror::Error;

pub mod catalog;

/// One cell of the player's grid: undetermined, painted, or crossed out as
/// known-blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Empty,
    Filled,
    Marked,
}

#[derive(Debug, Error)]
pub enum PuzzleError {
    #[error("puzzle {id} has no cells")]
    Empty { id: String },
    #[error("puzzle {id} row {row} has {found} cells, expected {expected}")]
    Ragged {
        id: String,
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("puzzle {id} row {row} contains {found:?}, expected '#' or '.'")]
    BadArt { id: String, row: usize, found: char },
}

/// A named, already solved puzzle. The row and column clues are always the
/// run-length encoding of the solution; `new` derives them so the invariant
/// holds for every catalog entry by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    id: String,
    name: String,
    width: usize,
    height: usize,
    solution: Vec<Vec<bool>>,
    row_clues: Vec<Vec<u32>>,
    col_clues: Vec<Vec<u32>>,
}

impl Puzzle {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        solution: Vec<Vec<bool>>,
    ) -> Result<Self, PuzzleError> {
        let id = id.into();

        let height = solution.len();
        let width = solution.first().map_or(0, Vec::len);
        if width == 0 {
            return Err(PuzzleError::Empty { id });
        }

        for (row, cells) in solution.iter().enumerate() {
            if cells.len() != width {
                return Err(PuzzleError::Ragged {
                    id,
                    row,
                    found: cells.len(),
                    expected: width,
                });
            }
        }

        let row_clues = solution
            .iter()
            .map(|row| derive_clue(row.iter().copied()))
            .collect();
        let col_clues = (0..width)
            .map(|col| derive_clue(solution.iter().map(|row| row[col])))
            .collect();

        Ok(Self {
            id,
            name: name.into(),
            width,
            height,
            solution,
            row_clues,
            col_clues,
        })
    }

    /// Builds a puzzle from rows of `#` (filled) and `.` (blank).
    pub fn from_art(
        id: impl Into<String>,
        name: impl Into<String>,
        art: &[&str],
    ) -> Result<Self, PuzzleError> {
        let id = id.into();

        let mut solution = Vec::with_capacity(art.len());
        for (row, line) in art.iter().enumerate() {
            let cells: Result<Vec<bool>, PuzzleError> = line
                .chars()
                .map(|c| match c {
                    '#' => Ok(true),
                    '.' => Ok(false),
                    found => Err(PuzzleError::BadArt {
                        id: id.clone(),
                        row,
                        found,
                    }),
                })
                .collect();
            solution.push(cells?);
        }

        Self::new(id, name, solution)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn solution(&self) -> &[Vec<bool>] {
        &self.solution
    }

    pub fn row_clue(&self, row: usize) -> &[u32] {
        &self.row_clues[row]
    }

    pub fn col_clue(&self, col: usize) -> &[u32] {
        &self.col_clues[col]
    }
}

/// Run-length encoding of one solution line, with `[0]` standing for a line
/// with no filled cells.
fn derive_clue(cells: impl Iterator<Item = bool>) -> Vec<u32> {
    let groups = run_lengths(cells);
    if groups.is_empty() { vec![0] } else { groups }
}

fn run_lengths(cells: impl Iterator<Item = bool>) -> Vec<u32> {
    let chunks = cells.chunk_by(|&filled| filled);

    chunks
        .into_iter()
        .filter(|&(filled, _)| filled)
        .map(|(_, chunk)| chunk.count() as u32)
        .collect()
}

/// Whether a line could still satisfy its clue. A line with undetermined
/// cells passes a prefix check only (group count within bounds and each
/// existing group no longer than the clue entry at its index); a fully
/// determined line must match the clue exactly.
pub fn line_is_consistent(line: &[CellState], clue: &[u32]) -> bool {
    let groups = run_lengths(line.iter().map(|&cell| cell == CellState::Filled));

    if line.contains(&CellState::Empty) {
        return groups.len() <= clue.len()
            && groups
                .iter()
                .zip(clue)
                .all(|(group, &entry)| *group <= entry);
    }

    if clue == [0] {
        groups.is_empty()
    } else {
        groups == clue
    }
}

/// Player-facing tri-state grid, same dimensions as its puzzle. Mutated only
/// through the toggle and hint operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleGrid {
    width: usize,
    height: usize,
    cells: Vec<CellState>,
}

impl PuzzleGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![CellState::Empty; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, row: usize, col: usize) -> CellState {
        self.cells[row * self.width + col]
    }

    fn set(&mut self, row: usize, col: usize, state: CellState) {
        self.cells[row * self.width + col] = state;
    }

    /// Primary toggle: empty and marked cells become filled, filled cells
    /// revert to empty.
    pub fn toggle_fill(&mut self, row: usize, col: usize) {
        let next = match self.get(row, col) {
            CellState::Filled => CellState::Empty,
            CellState::Empty | CellState::Marked => CellState::Filled,
        };
        self.set(row, col, next);
    }

    /// Secondary toggle: empty and filled cells become marked, marked cells
    /// revert to empty.
    pub fn toggle_mark(&mut self, row: usize, col: usize) {
        let next = match self.get(row, col) {
            CellState::Marked => CellState::Empty,
            CellState::Empty | CellState::Filled => CellState::Marked,
        };
        self.set(row, col, next);
    }

    pub fn apply(&mut self, hint: Hint) {
        self.set(hint.row, hint.col, hint.action);
    }

    pub fn clear(&mut self) {
        self.cells.fill(CellState::Empty);
    }

    pub fn row(&self, row: usize) -> &[CellState] {
        &self.cells[row * self.width..(row + 1) * self.width]
    }

    pub fn col(&self, col: usize) -> Vec<CellState> {
        (0..self.height).map(|row| self.get(row, col)).collect()
    }

    pub fn is_fully_determined(&self) -> bool {
        !self.cells.contains(&CellState::Empty)
    }

    pub fn determined_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|&&cell| cell != CellState::Empty)
            .count()
    }
}

/// True when every cell is determined and every row and column matches its
/// clue exactly.
pub fn puzzle_is_complete(grid: &PuzzleGrid, puzzle: &Puzzle) -> bool {
    debug_assert_eq!((grid.width(), grid.height()), (puzzle.width(), puzzle.height()));

    if !grid.is_fully_determined() {
        return false;
    }

    (0..puzzle.height()).all(|row| line_is_consistent(grid.row(row), puzzle.row_clue(row)))
        && (0..puzzle.width()).all(|col| line_is_consistent(&grid.col(col), puzzle.col_clue(col)))
}

/// Cells painted where the solution is blank, plus cells crossed out where
/// the solution is filled. Undetermined cells are never mistakes.
pub fn count_mistakes(grid: &PuzzleGrid, puzzle: &Puzzle) -> u32 {
    let mut mistakes = 0;

    for (row, solution_row) in puzzle.solution().iter().enumerate() {
        for (col, &should_fill) in solution_row.iter().enumerate() {
            match grid.get(row, col) {
                CellState::Filled if !should_fill => mistakes += 1,
                CellState::Marked if should_fill => mistakes += 1,
                _ => {}
            }
        }
    }

    mistakes
}

/// A single revealed cell, not a solver step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hint {
    pub row: usize,
    pub col: usize,
    pub action: CellState,
}

/// First undetermined cell in row-major order, revealed from the solution.
/// `None` once the grid is fully determined.
pub fn hint(grid: &PuzzleGrid, puzzle: &Puzzle) -> Option<Hint> {
    for row in 0..grid.height() {
        for col in 0..grid.width() {
            if grid.get(row, col) == CellState::Empty {
                let action = if puzzle.solution()[row][col] {
                    CellState::Filled
                } else {
                    CellState::Marked
                };

                return Some(Hint { row, col, action });
            }
        }
    }

    None
}

#[cfg(test)]
mod test {
    use super::*;

    fn heart() -> Puzzle {
        catalog::heart()
    }

    fn fill_from_solution(puzzle: &Puzzle) -> PuzzleGrid {
        let mut grid = PuzzleGrid::new(puzzle.width(), puzzle.height());

        for (row, cells) in puzzle.solution().iter().enumerate() {
            for (col, &filled) in cells.iter().enumerate() {
                if filled {
                    grid.toggle_fill(row, col);
                } else {
                    grid.toggle_mark(row, col);
                }
            }
        }

        grid
    }

    #[test]
    fn derived_clues_match_known_values() {
        let heart = heart();

        let rows: Vec<&[u32]> = (0..5).map(|r| heart.row_clue(r)).collect();
        assert_eq!(rows, [&[1, 1][..], &[5], &[5], &[3], &[1]]);

        let cols: Vec<&[u32]> = (0..5).map(|c| heart.col_clue(c)).collect();
        assert_eq!(cols, [&[2][..], &[4], &[4], &[4], &[2]]);
    }

    #[test]
    fn blank_line_gets_the_zero_sentinel() {
        let puzzle = Puzzle::from_art("dot", "Dot", &["#.", ".."]).unwrap();

        assert_eq!(puzzle.row_clue(1), [0]);
        assert_eq!(puzzle.col_clue(1), [0]);
    }

    #[test]
    fn solution_lines_are_always_consistent_with_their_own_clues() {
        for puzzle in catalog::builtin() {
            let grid = fill_from_solution(&puzzle);

            for row in 0..puzzle.height() {
                assert!(
                    line_is_consistent(grid.row(row), puzzle.row_clue(row)),
                    "row {row} of {}",
                    puzzle.id(),
                );
            }

            for col in 0..puzzle.width() {
                assert!(
                    line_is_consistent(&grid.col(col), puzzle.col_clue(col)),
                    "col {col} of {}",
                    puzzle.id(),
                );
            }

            assert!(puzzle_is_complete(&grid, &puzzle));
            assert_eq!(count_mistakes(&grid, &puzzle), 0);
        }
    }

    #[test]
    fn flipping_one_cell_breaks_the_determined_line() {
        let heart = heart();
        let mut grid = fill_from_solution(&heart);

        // (1, 0) is filled in the solution; cross it out instead.
        grid.toggle_mark(1, 0);

        assert!(!line_is_consistent(grid.row(1), heart.row_clue(1)));
        assert!(!puzzle_is_complete(&grid, &heart));
        assert!(count_mistakes(&grid, &heart) > 0);
    }

    #[test]
    fn partial_line_passes_the_prefix_check() {
        use CellState::{Empty, Filled};

        // heart row 0 clue is [1, 1].
        let heart = heart();
        let clue = heart.row_clue(0);

        let one_filled = [Filled, Empty, Empty, Empty, Empty];
        assert!(line_is_consistent(&one_filled, clue));

        let group_too_long = [Filled, Filled, Empty, Empty, Empty];
        assert!(!line_is_consistent(&group_too_long, clue));
    }

    #[test]
    fn partial_line_with_too_many_groups_fails() {
        use CellState::{Empty, Filled, Marked};

        let line = [Filled, Marked, Filled, Marked, Filled, Empty];
        assert!(!line_is_consistent(&line, &[1, 1]));
    }

    #[test]
    fn determined_line_must_match_exactly() {
        use CellState::{Filled, Marked};

        let line = [Filled, Marked, Filled, Marked, Marked];
        assert!(line_is_consistent(&line, &[1, 1]));
        assert!(!line_is_consistent(&line, &[1, 2]));
        assert!(!line_is_consistent(&line, &[1]));

        let blank = [Marked; 5];
        assert!(line_is_consistent(&blank, &[0]));
        assert!(!line_is_consistent(&blank, &[1]));
    }

    #[test]
    fn marked_cells_do_not_count_as_painted() {
        use CellState::{Empty, Marked};

        let line = [Marked, Marked, Empty, Empty, Empty];
        assert!(line_is_consistent(&line, &[0]));
    }

    #[test]
    fn single_wrong_fill_counts_one_mistake() {
        let heart = heart();
        let mut grid = PuzzleGrid::new(5, 5);

        // (0, 0) is blank in the heart solution.
        grid.toggle_fill(0, 0);
        assert_eq!(count_mistakes(&grid, &heart), 1);

        // Undetermined cells are never mistakes.
        grid.toggle_fill(0, 0);
        assert_eq!(count_mistakes(&grid, &heart), 0);
    }

    #[test]
    fn toggles_cycle_like_mouse_buttons() {
        let mut grid = PuzzleGrid::new(2, 2);

        grid.toggle_fill(0, 0);
        assert_eq!(grid.get(0, 0), CellState::Filled);
        grid.toggle_fill(0, 0);
        assert_eq!(grid.get(0, 0), CellState::Empty);

        grid.toggle_mark(0, 0);
        assert_eq!(grid.get(0, 0), CellState::Marked);
        grid.toggle_fill(0, 0);
        assert_eq!(grid.get(0, 0), CellState::Filled);
        grid.toggle_mark(0, 0);
        assert_eq!(grid.get(0, 0), CellState::Marked);
        grid.toggle_mark(0, 0);
        assert_eq!(grid.get(0, 0), CellState::Empty);
    }

    #[test]
    fn hint_reveals_the_first_undetermined_cell() {
        let heart = heart();
        let mut grid = PuzzleGrid::new(5, 5);

        let first = hint(&grid, &heart).unwrap();
        assert_eq!((first.row, first.col), (0, 0));
        assert_eq!(first.action, CellState::Marked);

        grid.apply(first);

        let second = hint(&grid, &heart).unwrap();
        assert_eq!((second.row, second.col), (0, 1));
        assert_eq!(second.action, CellState::Filled);
    }

    #[test]
    fn hint_is_none_once_the_grid_is_determined() {
        let heart = heart();
        let grid = fill_from_solution(&heart);

        assert_eq!(hint(&grid, &heart), None);
    }

    #[test]
    fn rejects_malformed_solutions() {
        assert!(matches!(
            Puzzle::new("empty", "Empty", vec![]),
            Err(PuzzleError::Empty { .. })
        ));

        assert!(matches!(
            Puzzle::new("ragged", "Ragged", vec![vec![true, false], vec![true]]),
            Err(PuzzleError::Ragged { row: 1, .. })
        ));

        assert!(matches!(
            Puzzle::from_art("bad", "Bad", &["#x"]),
            Err(PuzzleError::BadArt { found: 'x', .. })
        ));
    }
}
