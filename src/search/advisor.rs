use crate::board::{Board, Direction, MoveOutcome};

use super::cache::EvalCache;
use super::heuristic::{self, HeuristicWeights};

/// Default number of plies explored by [`Advisor::best_move`].
pub const SEARCH_DEPTH: u32 = 4;

/// Coarse danger classification from the number of empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn classify(empty_cells: usize) -> Self {
        match empty_cells {
            0..=2 => RiskLevel::High,
            3..=5 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };

        f.write_str(name)
    }
}

/// One candidate direction from [`Advisor::analyze`], with its one-ply
/// evaluation as confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveHint {
    pub direction: Direction,
    pub confidence: f64,
    pub reason: String,
    pub expected_score: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub best: Option<MoveHint>,
    pub alternatives: Vec<MoveHint>,
    pub risk: RiskLevel,
    pub advice: String,
}

/// Heuristic move advisor. `best_move` runs the bounded-depth search;
/// `analyze` is the shallow one-ply advisory view. The two may legitimately
/// disagree about the best direction.
pub struct Advisor<const N: usize> {
    weights: HeuristicWeights,
    depth: u32,
    cache: EvalCache<N>,
}

impl<const N: usize> Advisor<N> {
    pub fn new() -> Self {
        Self::with_depth(SEARCH_DEPTH)
    }

    pub fn with_depth(depth: u32) -> Self {
        Self {
            weights: HeuristicWeights::default(),
            depth,
            cache: EvalCache::new(),
        }
    }

    pub fn with_weights(mut self, weights: HeuristicWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn weights(&self) -> &HeuristicWeights {
        &self.weights
    }

    /// Best direction by recursive search, or `None` when no slide changes
    /// the board (the caller is expected to have checked game-over already).
    ///
    /// Only the moving player's plies are branched; the random-tile step is
    /// not modeled, so each branch bottoms out in a plain evaluator call.
    /// Ties resolve to the first direction in [`Direction::ALL`] order.
    pub fn best_move(&mut self, board: &Board<N>) -> Option<Direction> {
        self.cache.clear();

        let mut best: Option<(f64, Direction)> = None;

        for direction in Direction::ALL {
            let outcome = board.slide(direction);
            if !outcome.moved {
                continue;
            }

            let eval = self.search(&outcome.board, self.depth.saturating_sub(1));
            log::trace!("search {direction}: {eval:.3}");

            if best.is_none_or(|(best_eval, _)| eval > best_eval) {
                best = Some((eval, direction));
            }
        }

        log::debug!(
            "best_move depth {} explored {} boards ({:.0}% cache hits)",
            self.depth,
            self.cache.len(),
            self.cache.hit_rate() * 100.0,
        );

        best.map(|(_, direction)| direction)
    }

    fn search(&mut self, board: &Board<N>, depth: u32) -> f64 {
        if depth == 0 {
            return self.leaf(board);
        }

        let mut best = f64::NEG_INFINITY;
        let mut any_move = false;

        for direction in Direction::ALL {
            let outcome = board.slide(direction);
            if !outcome.moved {
                continue;
            }

            any_move = true;
            best = best.max(self.search(&outcome.board, depth - 1));
        }

        if any_move { best } else { self.leaf(board) }
    }

    fn leaf(&mut self, board: &Board<N>) -> f64 {
        if let Some(eval) = self.cache.get(board) {
            return eval;
        }

        let eval = heuristic::evaluate(board, &self.weights);
        self.cache.insert(*board, eval);
        eval
    }

    /// Shallow advisory view: each legal direction is scored by a single
    /// one-ply evaluation, sorted by confidence, with a rationale string and
    /// an overall risk classification.
    pub fn analyze(&self, board: &Board<N>) -> Analysis {
        let mut hints: Vec<MoveHint> = Direction::ALL
            .into_iter()
            .filter_map(|direction| {
                let outcome = board.slide(direction);
                outcome.moved.then(|| MoveHint {
                    direction,
                    confidence: heuristic::evaluate(&outcome.board, &self.weights),
                    reason: reason_for(board, &outcome),
                    expected_score: outcome.score_delta,
                })
            })
            .collect();

        // Stable sort: equal confidence keeps enumeration order.
        hints.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let risk = RiskLevel::classify(board.empty_count());
        let advice = advice_for(board, hints.first(), risk);

        let mut hints = hints.into_iter();
        Analysis {
            best: hints.next(),
            alternatives: hints.collect(),
            risk,
            advice,
        }
    }
}

impl<const N: usize> Default for Advisor<N> {
    fn default() -> Self {
        Self::new()
    }
}

fn reason_for<const N: usize>(board: &Board<N>, outcome: &MoveOutcome<N>) -> String {
    if outcome.score_delta > 0 {
        return format!("merging tiles gains {} points", outcome.score_delta);
    }

    if outcome.board.empty_count() > board.empty_count() {
        return "opens up more empty space".to_string();
    }

    if outcome.board.max_tile() >= 512 {
        return "keeps the largest tile near a corner".to_string();
    }

    "the safest choice in the current position".to_string()
}

fn advice_for<const N: usize>(
    board: &Board<N>,
    best: Option<&MoveHint>,
    risk: RiskLevel,
) -> String {
    let Some(best) = best else {
        return "no legal moves remain".to_string();
    };

    if risk == RiskLevel::High {
        return "dangerous position, move carefully".to_string();
    }

    if board.max_tile() >= 1024 {
        return "almost there, keep the big tile anchored in a corner".to_string();
    }

    if board.empty_count() <= 3 {
        return "space is running out, focus on merging tiles".to_string();
    }

    best.reason.clone()
}

/// Leaning of the last moves: mostly horizontal, mostly vertical, or an even
/// mix. Needs at least 10 recorded moves; only the last 20 are considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStyle {
    Horizontal,
    Vertical,
    Balanced,
}

impl PlayStyle {
    pub fn describe(self) -> &'static str {
        match self {
            PlayStyle::Horizontal => {
                "you favour horizontal moves; try using the vertical axis too"
            }
            PlayStyle::Vertical => {
                "you favour vertical moves; try using the horizontal axis too"
            }
            PlayStyle::Balanced => "a well balanced play style",
        }
    }
}

pub fn analyze_play_style(moves: &[Direction]) -> Option<PlayStyle> {
    if moves.len() < 10 {
        return None;
    }

    let recent = &moves[moves.len().saturating_sub(20)..];
    let horizontal = recent.iter().filter(|d| d.is_horizontal()).count();
    let vertical = recent.len() - horizontal;

    Some(if horizontal > vertical {
        PlayStyle::Horizontal
    } else if vertical > horizontal {
        PlayStyle::Vertical
    } else {
        PlayStyle::Balanced
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::board::Board;

    fn board4(values: [[u32; 4]; 4]) -> Board<4> {
        Board::from_array(values).unwrap()
    }

    #[test]
    fn best_move_picks_a_legal_direction() {
        let board = board4([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);

        let mut advisor = Advisor::new();
        let best = advisor.best_move(&board).unwrap();

        assert!(board.slide(best).moved);
    }

    #[test]
    fn best_move_is_none_when_nothing_moves() {
        let board = board4([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);

        let mut advisor = Advisor::new();
        assert_eq!(advisor.best_move(&board), None);
    }

    #[test]
    fn ties_resolve_in_enumeration_order() {
        // A single tile in the exact centre of symmetry does not exist on an
        // even board, but a lone corner tile makes down and right the only
        // movers; up and left report moved=false and are skipped.
        let board = board4([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);

        let mut advisor = Advisor::with_depth(1);
        let best = advisor.best_move(&board).unwrap();

        assert_eq!(best, Direction::Down);
    }

    #[test]
    fn depth_zero_still_ranks_top_level_moves() {
        let board = board4([[4, 4, 2, 0], [0; 4], [0; 4], [0; 4]]);

        let mut advisor = Advisor::with_depth(0);
        assert!(advisor.best_move(&board).is_some());
    }

    #[test]
    fn analyze_sorts_hints_by_confidence() {
        let board = board4([[2, 2, 4, 8], [0; 4], [0; 4], [0; 4]]);

        let advisor = Advisor::new();
        let analysis = advisor.analyze(&board);

        let best = analysis.best.as_ref().unwrap();
        for hint in &analysis.alternatives {
            assert!(best.confidence >= hint.confidence);
        }
    }

    #[test]
    fn analyze_reports_merge_reason_and_expected_score() {
        let board = board4([[2, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);

        let advisor = Advisor::<4>::new();
        let analysis = advisor.analyze(&board);

        let left = analysis
            .best
            .iter()
            .chain(&analysis.alternatives)
            .find(|hint| hint.direction == Direction::Left)
            .unwrap();

        assert_eq!(left.expected_score, 4);
        assert_eq!(left.reason, "merging tiles gains 4 points");
    }

    #[test]
    fn analyze_with_no_legal_moves_says_so() {
        let board = board4([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);

        let advisor = Advisor::<4>::new();
        let analysis = advisor.analyze(&board);

        assert!(analysis.best.is_none());
        assert!(analysis.alternatives.is_empty());
        assert_eq!(analysis.advice, "no legal moves remain");
        assert_eq!(analysis.risk, RiskLevel::High);
    }

    #[test]
    fn risk_tracks_empty_cells() {
        assert_eq!(RiskLevel::classify(0), RiskLevel::High);
        assert_eq!(RiskLevel::classify(2), RiskLevel::High);
        assert_eq!(RiskLevel::classify(3), RiskLevel::Medium);
        assert_eq!(RiskLevel::classify(5), RiskLevel::Medium);
        assert_eq!(RiskLevel::classify(6), RiskLevel::Low);
    }

    #[test]
    fn play_style_needs_ten_moves() {
        let moves = vec![Direction::Left; 9];
        assert_eq!(analyze_play_style(&moves), None);
    }

    #[test]
    fn play_style_spots_a_horizontal_habit() {
        let mut moves = vec![Direction::Left; 8];
        moves.extend([Direction::Right; 4]);
        moves.extend([Direction::Up; 3]);

        assert_eq!(analyze_play_style(&moves), Some(PlayStyle::Horizontal));
    }

    #[test]
    fn play_style_only_looks_at_recent_moves() {
        // 30 old vertical moves followed by 20 horizontal ones: the window
        // holds only the horizontal tail.
        let mut moves = vec![Direction::Up; 30];
        moves.extend([Direction::Left; 20]);

        assert_eq!(analyze_play_style(&moves), Some(PlayStyle::Horizontal));
    }
}
