pub mod collector;
pub mod config;
pub mod document;
mod error;
pub mod filter;
pub mod log;
pub mod mistakes;
pub mod reader;
pub mod replay;
pub mod rules;
mod types;
pub mod visitor;

pub use collector::collect_puzzles;
pub use config::{Config, DetectorConfig, HexColor, LayoutConfig, PuzzleTemplate};
pub use document::{Document, layout_document, render_to_path, write_pdf};
pub use error::{ErrorAccumulator, PuzzleError};
pub use reader::{Compression, GameFormat, read_games};
pub use rules::{ChessRules, RulesError, ShakmatyRules};
pub use types::{GameRecord, MistakeRecord, PuzzleSet, Side};

use std::io::Write;

/// Runs the whole pipeline for one player: collects three puzzles from
/// `games` and writes the two-page PDF to `sink`.
///
/// Returns the puzzle set that was rendered so callers can log or dump it.
pub fn generate_puzzle_sheet<R, W>(
    rules: &R,
    games: &[GameRecord],
    username: &str,
    config: &Config,
    sink: W,
) -> Result<PuzzleSet, PuzzleError>
where
    R: ChessRules,
    W: Write,
{
    let puzzles = collect_puzzles(rules, games, username, &config.detector, &config.template);
    let document = layout_document(rules, &puzzles, &config.layout)?;
    write_pdf(&document, sink)?;

    tracing::info!(username, games = games.len(), "Puzzle sheet written");
    Ok(puzzles)
}
