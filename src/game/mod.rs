//! Stateful session layer on top of the pure engines: score and best-score
//! accounting, undo history, terminal-state guards, and the two-phase
//! pattern flow. Sessions own their persistence port and tile spawner, so
//! they stay testable with a memory store and a seeded generator.

use rand::Rng;
use rand::rngs::ThreadRng;

use crate::board::{Board, BoardShape, Direction, ShapeError, TileSpawner};
use crate::nonogram::{self, Hint, Puzzle, PuzzleGrid};
use crate::search::advisor::{self, PlayStyle};
use crate::storage::{GameKind, ScoreStore, Snapshot};

pub const CLASSIC_SIZE: usize = 4;
pub const PATTERN_SIZE: usize = 5;

pub const CLASSIC_WIN_TILE: u32 = 2048;
pub const PATTERN_WIN_TILE: u32 = 128;

/// Upper bound on retained undo snapshots in the pattern game.
pub const HISTORY_LIMIT: usize = 10;

fn board_from_snapshot<const N: usize>(snapshot: &Snapshot) -> Option<Board<N>> {
    if snapshot.cells.len() != N || snapshot.cells.iter().any(|row| row.len() != N) {
        return None;
    }

    let mut values = [[0u32; N]; N];
    for (row, cells) in snapshot.cells.iter().enumerate() {
        for (col, &value) in cells.iter().enumerate() {
            values[row][col] = value;
        }
    }

    Board::from_array(values).ok()
}

fn snapshot_of<const N: usize>(board: &Board<N>, score: u32, over: bool, won: bool) -> Snapshot {
    Snapshot {
        cells: board.to_array().iter().map(|row| row.to_vec()).collect(),
        score,
        over,
        won,
    }
}

/// The unconstrained 4x4 game.
pub struct ClassicGame<S, R = ThreadRng> {
    board: Board<CLASSIC_SIZE>,
    score: u32,
    best: u32,
    over: bool,
    won: bool,
    win_seen: bool,
    previous: Option<(Board<CLASSIC_SIZE>, u32)>,
    moves: Vec<Direction>,
    win_tile: u32,
    store: S,
    spawner: TileSpawner<R>,
}

impl<S: ScoreStore, R: Rng> ClassicGame<S, R> {
    pub fn new(store: S, spawner: TileSpawner<R>) -> Self {
        let mut game = Self {
            board: Board::empty(),
            score: 0,
            best: store.best_score(GameKind::Classic),
            over: false,
            won: false,
            win_seen: false,
            previous: None,
            moves: Vec::new(),
            win_tile: CLASSIC_WIN_TILE,
            store,
            spawner,
        };

        game.deal_initial_tiles();
        game
    }

    /// Overrides the winning tile value (2048 by default).
    pub fn with_win_tile(mut self, target: u32) -> Self {
        self.win_tile = target;
        self
    }

    /// Restores the saved session if a usable snapshot exists, otherwise
    /// starts fresh.
    pub fn resume(store: S, spawner: TileSpawner<R>) -> Self {
        let snapshot = store.load_snapshot(GameKind::Classic);
        let mut game = Self::new(store, spawner);

        if let Some(snapshot) = snapshot {
            if let Some(board) = board_from_snapshot(&snapshot) {
                log::info!("resuming classic game at score {}", snapshot.score);
                game.board = board;
                game.score = snapshot.score;
                game.over = snapshot.over;
                game.won = snapshot.won;
                game.win_seen = snapshot.won;
                game.previous = None;
                game.moves.clear();
            }
        }

        game
    }

    fn deal_initial_tiles(&mut self) {
        let shape = BoardShape::full();
        self.spawner.spawn(&mut self.board, &shape);
        self.spawner.spawn(&mut self.board, &shape);
    }

    pub fn board(&self) -> &Board<CLASSIC_SIZE> {
        &self.board
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best_score(&self) -> u32 {
        self.best
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn can_undo(&self) -> bool {
        self.previous.is_some()
    }

    pub fn moves(&self) -> &[Direction] {
        &self.moves
    }

    pub fn win_tile(&self) -> u32 {
        self.win_tile
    }

    /// Applies one slide. Returns false (and changes nothing) while a
    /// terminal state is unresolved or when the slide would not move any
    /// tile; a successful move spawns a tile, updates scores and history,
    /// and re-evaluates the terminal predicates.
    pub fn make_move(&mut self, direction: Direction) -> bool {
        if self.over || self.won {
            return false;
        }

        let outcome = self.board.slide(direction);
        if !outcome.moved {
            return false;
        }

        self.previous = Some((self.board, self.score));
        self.board = outcome.board;
        self.spawner.spawn(&mut self.board, &BoardShape::full());

        self.score += outcome.score_delta;
        if self.score > self.best {
            self.best = self.score;
            self.store.save_best_score(GameKind::Classic, self.best);
        }

        self.over = self.board.is_game_over();
        if !self.win_seen && self.board.is_win(self.win_tile) {
            self.won = true;
            self.win_seen = true;
            log::info!("reached {} with score {}", self.win_tile, self.score);
        }

        self.moves.push(direction);
        self.persist();

        if self.over {
            log::info!("game over at score {}", self.score);
        }

        true
    }

    /// Restores the state before the last successful move. Single-step: the
    /// entry is consumed and a new move is needed before undoing again.
    pub fn undo(&mut self) -> bool {
        let Some((board, score)) = self.previous.take() else {
            return false;
        };

        self.board = board;
        self.score = score;
        self.over = false;
        self.won = false;
        self.moves.pop();
        self.persist();

        true
    }

    /// Keeps playing after the win overlay; the win will not trigger again
    /// this session.
    pub fn continue_after_win(&mut self) {
        self.won = false;
        self.persist();
    }

    pub fn new_game(&mut self) {
        log::info!("starting a new classic game");

        self.board = Board::empty();
        self.score = 0;
        self.best = self.store.best_score(GameKind::Classic);
        self.over = false;
        self.won = false;
        self.win_seen = false;
        self.previous = None;
        self.moves.clear();

        self.deal_initial_tiles();
        self.persist();
    }

    pub fn play_style(&self) -> Option<PlayStyle> {
        advisor::analyze_play_style(&self.moves)
    }

    fn persist(&mut self) {
        let snapshot = snapshot_of(&self.board, self.score, self.over, self.won);
        self.store.save_snapshot(GameKind::Classic, &snapshot);
    }
}

/// Phase of the pattern variant: first the nonogram is solved, then the
/// sliding game runs on its solution shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Nonogram,
    Sliding,
}

/// The nonogram-shaped 5x5 variant. The mask is fixed for the whole session;
/// changing puzzles starts a new session.
pub struct PatternGame<S, R = ThreadRng> {
    puzzle: Puzzle,
    grid: PuzzleGrid,
    phase: Phase,
    hints_used: u32,
    shape: BoardShape<PATTERN_SIZE>,
    board: Board<PATTERN_SIZE>,
    score: u32,
    best: u32,
    over: bool,
    won: bool,
    win_seen: bool,
    can_undo: bool,
    history: Vec<(Board<PATTERN_SIZE>, u32)>,
    moves_count: u32,
    win_tile: u32,
    store: S,
    spawner: TileSpawner<R>,
}

impl<S: ScoreStore, R: Rng> PatternGame<S, R> {
    /// Fails when the puzzle is not `PATTERN_SIZE` square or its solution has
    /// no filled cells.
    pub fn new(puzzle: Puzzle, store: S, spawner: TileSpawner<R>) -> Result<Self, ShapeError> {
        let shape = BoardShape::from_rows(puzzle.solution())?;
        let grid = PuzzleGrid::new(puzzle.width(), puzzle.height());
        let best = store.best_score(GameKind::Pattern);

        Ok(Self {
            puzzle,
            grid,
            phase: Phase::Nonogram,
            hints_used: 0,
            shape,
            board: Board::empty(),
            score: 0,
            best,
            over: false,
            won: false,
            win_seen: false,
            can_undo: false,
            history: Vec::new(),
            moves_count: 0,
            win_tile: PATTERN_WIN_TILE,
            store,
            spawner,
        })
    }

    /// Overrides the winning tile value (128 by default).
    pub fn with_win_tile(mut self, target: u32) -> Self {
        self.win_tile = target;
        self
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn grid(&self) -> &PuzzleGrid {
        &self.grid
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn shape(&self) -> &BoardShape<PATTERN_SIZE> {
        &self.shape
    }

    pub fn board(&self) -> &Board<PATTERN_SIZE> {
        &self.board
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best_score(&self) -> u32 {
        self.best
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn can_undo(&self) -> bool {
        self.can_undo
    }

    pub fn moves_count(&self) -> u32 {
        self.moves_count
    }

    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    pub fn mistakes(&self) -> u32 {
        nonogram::count_mistakes(&self.grid, &self.puzzle)
    }

    pub fn win_tile(&self) -> u32 {
        self.win_tile
    }

    pub fn toggle_fill(&mut self, row: usize, col: usize) {
        if self.phase != Phase::Nonogram {
            return;
        }

        self.grid.toggle_fill(row, col);
        self.check_nonogram_complete();
    }

    pub fn toggle_mark(&mut self, row: usize, col: usize) {
        if self.phase != Phase::Nonogram {
            return;
        }

        self.grid.toggle_mark(row, col);
        self.check_nonogram_complete();
    }

    /// Reveals one cell from the solution, if any is still undetermined.
    pub fn use_hint(&mut self) -> Option<Hint> {
        if self.phase != Phase::Nonogram {
            return None;
        }

        let hint = nonogram::hint(&self.grid, &self.puzzle)?;
        self.grid.apply(hint);
        self.hints_used += 1;
        self.check_nonogram_complete();

        Some(hint)
    }

    pub fn clear_grid(&mut self) {
        if self.phase != Phase::Nonogram {
            return;
        }

        self.grid.clear();
    }

    fn check_nonogram_complete(&mut self) {
        if nonogram::puzzle_is_complete(&self.grid, &self.puzzle) {
            log::info!("nonogram {} solved, starting sliding phase", self.puzzle.id());
            self.begin_sliding();
        }
    }

    fn begin_sliding(&mut self) {
        self.phase = Phase::Sliding;
        self.board = Board::empty();
        self.score = 0;
        self.over = false;
        self.won = false;
        self.win_seen = false;
        self.can_undo = false;
        self.history.clear();
        self.moves_count = 0;

        self.spawner.spawn(&mut self.board, &self.shape);
        self.spawner.spawn(&mut self.board, &self.shape);
        self.persist();
    }

    /// Same contract as [`ClassicGame::make_move`], restricted to the mask.
    pub fn make_move(&mut self, direction: Direction) -> bool {
        if self.phase != Phase::Sliding || self.over || self.won {
            return false;
        }

        let outcome = self.board.slide_within(&self.shape, direction);
        if !outcome.moved {
            return false;
        }

        if self.history.len() == HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push((self.board, self.score));

        self.board = outcome.board;
        self.spawner.spawn(&mut self.board, &self.shape);

        self.score += outcome.score_delta;
        if self.score > self.best {
            self.best = self.score;
            self.store.save_best_score(GameKind::Pattern, self.best);
        }

        self.over = self.board.is_game_over_within(&self.shape);
        if !self.win_seen && self.board.is_win_within(&self.shape, self.win_tile) {
            self.won = true;
            self.win_seen = true;
            log::info!("reached {} on {} with score {}", self.win_tile, self.puzzle.id(), self.score);
        }

        self.can_undo = true;
        self.moves_count += 1;
        self.persist();

        true
    }

    pub fn undo(&mut self) -> bool {
        if !self.can_undo {
            return false;
        }

        let Some((board, score)) = self.history.pop() else {
            return false;
        };

        self.board = board;
        self.score = score;
        self.over = false;
        self.won = false;
        self.can_undo = false;
        self.moves_count = self.moves_count.saturating_sub(1);
        self.persist();

        true
    }

    pub fn continue_after_win(&mut self) {
        self.won = false;
        self.persist();
    }

    /// Back to an empty nonogram grid for the current puzzle.
    pub fn new_game(&mut self) {
        log::info!("restarting pattern game on {}", self.puzzle.id());

        self.grid = PuzzleGrid::new(self.puzzle.width(), self.puzzle.height());
        self.phase = Phase::Nonogram;
        self.hints_used = 0;
        self.board = Board::empty();
        self.score = 0;
        self.best = self.store.best_score(GameKind::Pattern);
        self.over = false;
        self.won = false;
        self.win_seen = false;
        self.can_undo = false;
        self.history.clear();
        self.moves_count = 0;
        self.store.clear_snapshot(GameKind::Pattern);
    }

    /// Switches to a different puzzle and restarts from the nonogram phase.
    pub fn change_puzzle(&mut self, puzzle: Puzzle) -> Result<(), ShapeError> {
        self.shape = BoardShape::from_rows(puzzle.solution())?;
        self.puzzle = puzzle;
        self.new_game();
        Ok(())
    }

    fn persist(&mut self) {
        let snapshot = snapshot_of(&self.board, self.score, self.over, self.won);
        self.store.save_snapshot(GameKind::Pattern, &snapshot);
    }
}
