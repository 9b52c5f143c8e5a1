use super::error::{ErrorAccumulator, PuzzleError};
use super::types::GameRecord;
use super::visitor::{GameVisitor, PgnInput, PgnReaderState};

use pgn_reader::Reader;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use zstd::stream::read::Decoder as ZstdDecoder;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Compression {
    #[default]
    Plain,
    Zstd,
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(
                "Invalid compression value ''. Supported values: 'zstd' or omitted.".to_string(),
            );
        }

        if normalized.eq_ignore_ascii_case("zstd") {
            Ok(Self::Zstd)
        } else if normalized.eq_ignore_ascii_case("none") {
            Ok(Self::Plain)
        } else {
            Err(format!(
                "Invalid compression value '{}'. Supported values: 'zstd' or omitted.",
                normalized
            ))
        }
    }
}

/// Layout of the game files.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum GameFormat {
    /// One or more PGN games.
    #[default]
    Pgn,
    /// Lichess `/api/games/user` export, one JSON object per line.
    Ndjson,
}

impl FromStr for GameFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pgn" => Ok(Self::Pgn),
            "ndjson" | "jsonl" | "lichess" => Ok(Self::Ndjson),
            other => Err(format!(
                "Invalid format '{}'. Supported values: 'pgn' or 'ndjson'.",
                other
            )),
        }
    }
}

/// Expands `pattern` (single file path or glob pattern) to the files to read.
fn resolve_paths(pattern: &str) -> Result<Vec<PathBuf>, PuzzleError> {
    if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
        let paths = glob::glob(pattern).map_err(|e| PuzzleError::Input {
            path: PathBuf::from(pattern),
            message: e.to_string(),
        })?;
        let mut paths: Vec<PathBuf> = paths.filter_map(|entry| entry.ok()).collect();
        paths.sort();
        Ok(paths)
    } else {
        Ok(vec![PathBuf::from(pattern)])
    }
}

fn open_input_stream(path: &Path, compression: Compression) -> Result<PgnInput, String> {
    let file =
        File::open(path).map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    match compression {
        Compression::Plain => Ok(Box::new(file)),
        Compression::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as PgnInput)
            .map_err(|e| {
                format!(
                    "Failed to initialize zstd decoder for '{}': {}",
                    path.display(),
                    e
                )
            }),
    }
}

/// Reads every game matched by `pattern`, in path order then file order.
///
/// A single unreadable path is a hard error. When a glob matched several
/// files, unreadable ones are skipped with a warning.
pub fn read_games(
    pattern: &str,
    format: GameFormat,
    compression: Compression,
) -> Result<Vec<GameRecord>, PuzzleError> {
    let paths = resolve_paths(pattern)?;
    let mut games = Vec::new();

    for path in &paths {
        let input = match open_input_stream(path, compression) {
            Ok(input) => input,
            Err(message) => {
                if paths.len() == 1 {
                    return Err(PuzzleError::Input {
                        path: path.clone(),
                        message,
                    });
                }
                tracing::warn!("{message}");
                continue;
            }
        };

        let before = games.len();
        match format {
            GameFormat::Pgn => read_pgn_games(input, path, &mut games),
            GameFormat::Ndjson => read_ndjson_games(input, path, &mut games),
        }
        tracing::debug!(
            path = %path.display(),
            games = games.len() - before,
            "Read game file"
        );
    }

    Ok(games)
}

enum ReadNextGameOutcome {
    GameReady(GameRecord),
    ReaderFinished,
}

fn read_next_game(reader: &mut PgnReaderState, source_path: &Path) -> ReadNextGameOutcome {
    let game_index = reader.next_game_index;

    match reader.pgn_reader.read_game(&mut reader.visitor) {
        Ok(Some(_)) => {
            reader.next_game_index += 1;
            match reader.visitor.current_game.take() {
                Some(game) => ReadNextGameOutcome::GameReady(game),
                None => ReadNextGameOutcome::ReaderFinished,
            }
        }
        Ok(None) => ReadNextGameOutcome::ReaderFinished,
        Err(error) => {
            reader.next_game_index += 1;
            let error_msg = format!(
                "Parser-stage error: stage=read_game; file='{}'; game_index={}; error={}",
                source_path.display(),
                game_index,
                error
            );
            tracing::warn!("{error_msg}");
            reader.visitor.finalize_game_with_error(error_msg);

            match reader.visitor.current_game.take() {
                Some(game) => ReadNextGameOutcome::GameReady(game),
                None => ReadNextGameOutcome::ReaderFinished,
            }
        }
    }
}

fn read_pgn_games(input: PgnInput, source_path: &Path, games: &mut Vec<GameRecord>) {
    // pgn-reader buffers internally, so no BufReader here.
    let mut reader = PgnReaderState::new(input);
    while let ReadNextGameOutcome::GameReady(game) = read_next_game(&mut reader, source_path) {
        games.push(game);
    }
}

#[derive(Debug, Default, Deserialize)]
struct LichessGame {
    id: Option<String>,
    variant: Option<String>,
    #[serde(default)]
    players: LichessPlayers,
    moves: Option<String>,
    pgn: Option<String>,
    #[serde(rename = "initialFen")]
    initial_fen: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LichessPlayers {
    white: Option<LichessPlayer>,
    black: Option<LichessPlayer>,
}

#[derive(Debug, Default, Deserialize)]
struct LichessPlayer {
    user: Option<LichessUser>,
}

#[derive(Debug, Default, Deserialize)]
struct LichessUser {
    name: String,
}

impl LichessPlayer {
    fn name(player: Option<LichessPlayer>) -> Option<String> {
        player.and_then(|p| p.user).map(|u| u.name)
    }
}

impl LichessGame {
    fn into_record(self) -> GameRecord {
        let mut record = match self.pgn.as_deref() {
            Some(pgn) if !pgn.trim().is_empty() => record_from_pgn(pgn),
            _ => GameRecord {
                movetext: self.moves.unwrap_or_default(),
                ..GameRecord::default()
            },
        };

        let mut diagnostics = ErrorAccumulator::default();
        if let Some(err) = record.parse_error.take() {
            diagnostics.push(&err);
        }

        if record.movetext.is_empty() && diagnostics.is_empty() {
            diagnostics.push("Missing moves: neither 'pgn' nor 'moves' present");
        }

        if let Some(variant) = self.variant.as_deref()
            && !matches!(variant, "standard" | "fromPosition")
        {
            diagnostics.push(&format!("Unsupported variant: variant='{variant}'"));
        }
        record.parse_error = diagnostics.take();

        record.white = LichessPlayer::name(self.players.white).or(record.white);
        record.black = LichessPlayer::name(self.players.black).or(record.black);
        record.fen = record.fen.or(self.initial_fen);
        if record.site.is_none() {
            record.site = self.id.map(|id| format!("https://lichess.org/{id}"));
        }
        record
    }
}

fn record_from_pgn(pgn: &str) -> GameRecord {
    let mut reader = Reader::new(pgn.as_bytes());
    let mut visitor = GameVisitor::new();

    match reader.read_game(&mut visitor) {
        Ok(_) => visitor.current_game.take().unwrap_or_default(),
        Err(error) => {
            visitor.finalize_game_with_error(format!(
                "Parser-stage error: stage=read_game; error={error}"
            ));
            visitor.current_game.take().unwrap_or_default()
        }
    }
}

fn read_ndjson_games(input: PgnInput, source_path: &Path, games: &mut Vec<GameRecord>) {
    let reader = BufReader::new(input);

    for (line_idx, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                tracing::warn!(
                    "Failed to read '{}' at line {}: {}",
                    source_path.display(),
                    line_idx + 1,
                    error
                );
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<LichessGame>(&line) {
            Ok(game) => games.push(game.into_record()),
            Err(error) => tracing::warn!(
                "Skipping malformed game in '{}' at line {}: {}",
                source_path.display(),
                line_idx + 1,
                error
            ),
        }
    }
}
