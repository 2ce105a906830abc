//! The fixed set of solved puzzles shipped with the game. Clues are derived
//! from the art at load time, so a typo here fails immediately rather than
//! at play time.

use super::Puzzle;

pub fn builtin() -> Vec<Puzzle> {
    vec![heart(), smile()]
}

pub fn find(id: &str) -> Option<Puzzle> {
    builtin().into_iter().find(|puzzle| puzzle.id() == id)
}

pub fn heart() -> Puzzle {
    Puzzle::from_art(
        "heart_5x5",
        "Heart",
        &[
            ".#.#.", //
            "#####",
            "#####",
            ".###.",
            "..#..",
        ],
    )
    .expect("builtin puzzle art is valid")
}

pub fn smile() -> Puzzle {
    Puzzle::from_art(
        "smile_7x7",
        "Smile",
        &[
            ".#####.", //
            "#.....#",
            "#.#.#.#",
            "#.....#",
            "#.###.#",
            "#.....#",
            ".#####.",
        ],
    )
    .expect("builtin puzzle art is valid")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let puzzles = builtin();
        let mut ids: Vec<&str> = puzzles.iter().map(Puzzle::id).collect();
        ids.dedup();

        assert_eq!(ids.len(), puzzles.len());
    }

    #[test]
    fn find_locates_puzzles_by_id() {
        assert_eq!(find("heart_5x5").unwrap().name(), "Heart");
        assert_eq!(find("smile_7x7").unwrap().width(), 7);
        assert!(find("missing").is_none());
    }

    #[test]
    fn smile_clues_match_known_values() {
        let smile = smile();

        let rows: Vec<&[u32]> = (0..7).map(|r| smile.row_clue(r)).collect();
        assert_eq!(
            rows,
            [
                &[5][..],
                &[1, 1],
                &[1, 1, 1],
                &[1, 1],
                &[1, 3, 1],
                &[1, 1],
                &[5],
            ]
        );
    }
}
