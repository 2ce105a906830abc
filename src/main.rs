use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use crossterm::{
    QueueableCommand, execute,
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
        enable_raw_mode,
    },
};
use rand::Rng as _;
use rand::rngs::StdRng;

use twenty_fourty_eight_patterns::board::{Board, Direction, TileSpawner};
use twenty_fourty_eight_patterns::game::{ClassicGame, PatternGame, Phase};
use twenty_fourty_eight_patterns::nonogram::{CellState, catalog};
use twenty_fourty_eight_patterns::search::Advisor;
use twenty_fourty_eight_patterns::storage::{JsonFileStore, MemoryStore, ScoreStore};

#[cfg(feature = "remote-advisor")]
use twenty_fourty_eight_patterns::remote::RemoteAdvisor;

#[derive(Parser)]
#[command(about = "2048-style sliding games with a heuristic move advisor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play the classic 4x4 game interactively.
    Play {
        /// JSON file for best scores and saved games; volatile when absent.
        #[arg(long)]
        store: Option<PathBuf>,
        /// Tile-spawn seed, for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Solve a nonogram, then play 2048 on the cells it opens.
    Pattern {
        /// Puzzle id from the catalog.
        #[arg(long, default_value = "heart_5x5")]
        puzzle: String,
        #[arg(long)]
        store: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Let the heuristic advisor play on its own.
    Auto {
        #[arg(long, default_value_t = 1)]
        games: u32,
        /// Search depth of the advisor.
        #[arg(long, default_value_t = 4)]
        depth: u32,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Read a 4x4 board from stdin (rows of numbers, `.` or 0 = empty) and
    /// print the advisor's verdict.
    Analyze {
        #[arg(long, default_value_t = 4)]
        depth: u32,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Play { store, seed } => {
            let spawner = TileSpawner::seeded(seed.unwrap_or_else(|| rand::rng().random()));
            match store {
                Some(path) => run_play(ClassicGame::resume(JsonFileStore::new(path), spawner)),
                None => run_play(ClassicGame::new(MemoryStore::new(), spawner)),
            }
        }
        Command::Pattern {
            puzzle,
            store,
            seed,
        } => {
            let puzzle = catalog::find(&puzzle)
                .with_context(|| format!("no puzzle named {puzzle:?} in the catalog"))?;
            let spawner = TileSpawner::seeded(seed.unwrap_or_else(|| rand::rng().random()));
            match store {
                Some(path) => {
                    run_pattern(PatternGame::new(puzzle, JsonFileStore::new(path), spawner)?)
                }
                None => run_pattern(PatternGame::new(puzzle, MemoryStore::new(), spawner)?),
            }
        }
        Command::Auto { games, depth, seed } => run_auto(games, depth, seed),
        Command::Analyze { depth } => run_analyze(depth),
    }
}

fn key_direction(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up | KeyCode::Char('w') => Some(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') => Some(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') => Some(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') => Some(Direction::Right),
        _ => None,
    }
}

fn tile_color(value: u32) -> Color {
    match value {
        0 => Color::DarkGrey,
        2 | 4 => Color::White,
        8..=64 => Color::Yellow,
        128..=1024 => Color::DarkYellow,
        _ => Color::Red,
    }
}

/// Runs `body` inside the raw-mode alternate screen, restoring the terminal
/// on the way out even when the body fails.
fn with_terminal(body: impl FnOnce(&mut io::Stdout) -> anyhow::Result<()>) -> anyhow::Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide)?;

    let result = body(&mut stdout);

    execute!(stdout, LeaveAlternateScreen, Show)?;
    disable_raw_mode()?;

    result
}

fn draw_board<const N: usize>(
    stdout: &mut io::Stdout,
    board: &Board<N>,
    masked: impl Fn(usize, usize) -> bool,
) -> anyhow::Result<()> {
    for row in 0..N {
        for col in 0..N {
            if !masked(row, col) {
                stdout.queue(Print("      "))?;
                continue;
            }

            match board.get(row, col) {
                Some(value) => {
                    stdout
                        .queue(SetForegroundColor(tile_color(value)))?
                        .queue(Print(format!("{value:>5} ")))?
                        .queue(ResetColor)?;
                }
                None => {
                    stdout
                        .queue(SetForegroundColor(Color::DarkGrey))?
                        .queue(Print("    . "))?
                        .queue(ResetColor)?;
                }
            }
        }

        stdout.queue(Print("\r\n\r\n"))?;
    }

    Ok(())
}

fn run_play<S: ScoreStore>(mut game: ClassicGame<S, StdRng>) -> anyhow::Result<()> {
    let mut advisor = Advisor::new();
    #[cfg(feature = "remote-advisor")]
    let remote = RemoteAdvisor::from_env();

    with_terminal(|stdout| {
        let mut message = String::new();

        loop {
            stdout.queue(Clear(ClearType::All))?.queue(MoveTo(0, 0))?;
            stdout.queue(Print(format!(
                "2048  score {}  best {}\r\n\r\n",
                game.score(),
                game.best_score(),
            )))?;

            draw_board(stdout, game.board(), |_, _| true)?;

            if game.is_won() {
                stdout.queue(Print(
                    "you made the target tile! c continues, n restarts\r\n",
                ))?;
            } else if game.is_over() {
                stdout.queue(Print("game over. n restarts, q quits\r\n"))?;
            } else {
                stdout.queue(Print("arrows/wasd move, u undo, h hint, n new, q quit\r\n"))?;
            }

            if !message.is_empty() {
                stdout.queue(Print(format!("{message}\r\n")))?;
            }

            stdout.flush()?;

            let Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) = event::read()?
            else {
                continue;
            };

            let terminal_state = game.is_over() || game.is_won();

            match code {
                KeyCode::Char('q') => break,
                KeyCode::Char('n') => {
                    game.new_game();
                    message.clear();
                }
                KeyCode::Char('c') if game.is_won() => {
                    game.continue_after_win();
                    message.clear();
                }
                KeyCode::Char('u') if !terminal_state => {
                    if !game.undo() {
                        message = "nothing to undo".to_string();
                    } else {
                        message.clear();
                    }
                }
                KeyCode::Char('h') if !terminal_state => {
                    let analysis = advisor.analyze(game.board());
                    message = match (advisor.best_move(game.board()), analysis.best) {
                        (Some(deep), Some(shallow)) => format!(
                            "advisor: {deep} (quick look favours {}, risk {}): {}",
                            shallow.direction, analysis.risk, analysis.advice,
                        ),
                        _ => analysis.advice,
                    };
                }
                #[cfg(feature = "remote-advisor")]
                KeyCode::Char('g') if !terminal_state => {
                    message = match &remote {
                        Some(remote) => {
                            let advice = remote.recommend(game.board());
                            match advice.direction {
                                Some(direction) => format!(
                                    "remote: {direction} ({}% confident): {}",
                                    advice.confidence, advice.reasoning,
                                ),
                                None => advice.reasoning,
                            }
                        }
                        None => "remote advisor needs GEMINI_API_KEY".to_string(),
                    };
                }
                // Move keys are ignored while an overlay is up.
                code if !terminal_state => {
                    if let Some(direction) = key_direction(code) {
                        if game.make_move(direction) {
                            message.clear();
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(())
    })
}

fn cell_glyph(state: CellState) -> &'static str {
    match state {
        CellState::Empty => " .",
        CellState::Filled => "##",
        CellState::Marked => " x",
    }
}

fn run_pattern<S: ScoreStore>(mut game: PatternGame<S, StdRng>) -> anyhow::Result<()> {
    with_terminal(|stdout| {
        let mut cursor = (0usize, 0usize);
        let mut message = String::new();

        loop {
            stdout.queue(Clear(ClearType::All))?.queue(MoveTo(0, 0))?;

            match game.phase() {
                Phase::Nonogram => {
                    draw_nonogram(stdout, &game, cursor)?;
                    stdout.queue(Print(
                        "arrows move, space fills, x marks, h hint, c clear, q quit\r\n",
                    ))?;
                }
                Phase::Sliding => {
                    stdout.queue(Print(format!(
                        "{}  score {}  best {}  target {}\r\n\r\n",
                        game.puzzle().name(),
                        game.score(),
                        game.best_score(),
                        game.win_tile(),
                    )))?;

                    draw_board(stdout, game.board(), |row, col| {
                        game.shape().contains(row, col)
                    })?;

                    if game.is_won() {
                        stdout.queue(Print(
                            "you made the target tile! c continues, n restarts\r\n",
                        ))?;
                    } else if game.is_over() {
                        stdout.queue(Print("game over. n restarts, q quits\r\n"))?;
                    } else {
                        stdout.queue(Print("arrows/wasd move, u undo, n new, q quit\r\n"))?;
                    }
                }
            }

            if !message.is_empty() {
                stdout.queue(Print(format!("{message}\r\n")))?;
            }

            stdout.flush()?;

            let Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) = event::read()?
            else {
                continue;
            };

            if code == KeyCode::Char('q') {
                break;
            }

            match game.phase() {
                Phase::Nonogram => {
                    let (height, width) = (game.puzzle().height(), game.puzzle().width());
                    match code {
                        KeyCode::Up => cursor.0 = cursor.0.saturating_sub(1),
                        KeyCode::Down => cursor.0 = (cursor.0 + 1).min(height - 1),
                        KeyCode::Left => cursor.1 = cursor.1.saturating_sub(1),
                        KeyCode::Right => cursor.1 = (cursor.1 + 1).min(width - 1),
                        KeyCode::Char(' ') | KeyCode::Char('f') => {
                            game.toggle_fill(cursor.0, cursor.1);
                        }
                        KeyCode::Char('x') | KeyCode::Char('m') => {
                            game.toggle_mark(cursor.0, cursor.1);
                        }
                        KeyCode::Char('h') => {
                            if let Some(hint) = game.use_hint() {
                                cursor = (hint.row, hint.col);
                            }
                        }
                        KeyCode::Char('c') => game.clear_grid(),
                        _ => {}
                    }

                    if game.phase() == Phase::Sliding {
                        message = format!(
                            "pattern solved with {} hints, slide away",
                            game.hints_used(),
                        );
                    } else {
                        let mistakes = game.mistakes();
                        message = if mistakes > 0 {
                            format!("{mistakes} mistakes so far")
                        } else {
                            String::new()
                        };
                    }
                }
                Phase::Sliding => {
                    let terminal_state = game.is_over() || game.is_won();

                    match code {
                        KeyCode::Char('n') => {
                            game.new_game();
                            message.clear();
                        }
                        KeyCode::Char('c') if game.is_won() => game.continue_after_win(),
                        KeyCode::Char('u') if !terminal_state => {
                            if !game.undo() {
                                message = "nothing to undo".to_string();
                            }
                        }
                        code if !terminal_state => {
                            if let Some(direction) = key_direction(code) {
                                game.make_move(direction);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }

        Ok(())
    })
}

fn draw_nonogram<S: ScoreStore>(
    stdout: &mut io::Stdout,
    game: &PatternGame<S, StdRng>,
    cursor: (usize, usize),
) -> anyhow::Result<()> {
    let puzzle = game.puzzle();
    let grid = game.grid();

    stdout.queue(Print(format!("{} ({})\r\n\r\n", puzzle.name(), puzzle.id())))?;

    let row_labels: Vec<String> = (0..puzzle.height())
        .map(|row| {
            puzzle
                .row_clue(row)
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    let label_width = row_labels.iter().map(String::len).max().unwrap_or(0);

    let col_clue_height = (0..puzzle.width())
        .map(|col| puzzle.col_clue(col).len())
        .max()
        .unwrap_or(0);

    // Column clues stacked above the grid, bottom-aligned.
    for line in 0..col_clue_height {
        stdout.queue(Print(" ".repeat(label_width + 1)))?;
        for col in 0..puzzle.width() {
            let clue = puzzle.col_clue(col);
            let slot = (line + clue.len()).checked_sub(col_clue_height);
            match slot.and_then(|index| clue.get(index)) {
                Some(entry) => stdout.queue(Print(format!("{entry:>2}")))?,
                None => stdout.queue(Print("  "))?,
            };
        }
        stdout.queue(Print("\r\n"))?;
    }

    for row in 0..puzzle.height() {
        stdout.queue(Print(format!("{:>label_width$} ", row_labels[row])))?;

        for col in 0..puzzle.width() {
            if (row, col) == cursor {
                stdout.queue(SetBackgroundColor(Color::DarkGrey))?;
            }
            stdout.queue(Print(cell_glyph(grid.get(row, col))))?;
            if (row, col) == cursor {
                stdout.queue(SetBackgroundColor(Color::Reset))?;
            }
        }

        stdout.queue(Print("\r\n"))?;
    }

    stdout.queue(Print("\r\n"))?;
    Ok(())
}

fn run_auto(games: u32, depth: u32, seed: Option<u64>) -> anyhow::Result<()> {
    let base_seed = seed.unwrap_or_else(|| rand::rng().random());
    let mut advisor = Advisor::with_depth(depth);

    for index in 0..games {
        let spawner = TileSpawner::seeded(base_seed.wrapping_add(u64::from(index)));
        let mut game = ClassicGame::new(MemoryStore::new(), spawner);

        while !game.is_over() {
            if game.is_won() {
                game.continue_after_win();
            }

            let Some(direction) = advisor.best_move(game.board()) else {
                break;
            };
            if !game.make_move(direction) {
                break;
            }
        }

        println!(
            "game {:>3}: score {:>6}, best tile {:>5}, {} moves",
            index + 1,
            game.score(),
            game.board().max_tile(),
            game.moves().len(),
        );
    }

    Ok(())
}

fn run_analyze(depth: u32) -> anyhow::Result<()> {
    let lines: Vec<String> = io::stdin()
        .lines()
        .take(4)
        .collect::<Result<_, _>>()
        .context("reading board from stdin")?;
    anyhow::ensure!(lines.len() == 4, "expected 4 rows, got {}", lines.len());

    let mut values = [[0u32; 4]; 4];
    for (row, line) in lines.iter().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        anyhow::ensure!(
            tokens.len() == 4,
            "row {} has {} cells, expected 4",
            row + 1,
            tokens.len(),
        );

        for (col, token) in tokens.iter().enumerate() {
            values[row][col] = if *token == "." {
                0
            } else {
                token
                    .parse()
                    .with_context(|| format!("bad cell {token:?} in row {}", row + 1))?
            };
        }
    }

    let board = Board::from_array(values)?;
    println!("{board}\n");

    let mut advisor = Advisor::with_depth(depth);
    let analysis = advisor.analyze(&board);

    for hint in analysis.best.iter().chain(&analysis.alternatives) {
        println!(
            "{:>5}: confidence {:>8.2}, +{} points, {}",
            hint.direction.to_string(),
            hint.confidence,
            hint.expected_score,
            hint.reason,
        );
    }

    println!("risk: {}", analysis.risk);
    println!("advice: {}", analysis.advice);

    match advisor.best_move(&board) {
        Some(direction) => println!("deeper search (depth {depth}) suggests: {direction}"),
        None => println!("no direction changes the board"),
    }

    Ok(())
}
