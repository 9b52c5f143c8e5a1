//! Builds a two-page PDF of practice puzzles from a player's own games.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use chess_puzzles::chess::{
    Compression, Config, GameFormat, PuzzleError, ShakmatyRules, generate_puzzle_sheet, log,
    read_games,
};

/// Turn missed captures from your games into a printable puzzle sheet
#[derive(Parser, Debug)]
#[command(name = "chess-puzzles")]
#[command(version, long_about = None)]
struct Cli {
    /// Game file or glob pattern, e.g. "games/*.pgn"
    #[arg(long)]
    games: String,

    /// Player whose mistakes are collected (matched case-insensitively)
    #[arg(short, long)]
    username: String,

    /// Where to write the PDF
    #[arg(short, long)]
    output: PathBuf,

    /// Input layout: pgn or ndjson (Lichess export)
    #[arg(long, default_value = "pgn")]
    format: GameFormat,

    /// Input compression: zstd or none
    #[arg(long)]
    compression: Option<Compression>,

    /// TOML file overriding detector, padding and layout settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write the selected puzzles as JSON
    #[arg(long)]
    dump_json: Option<PathBuf>,
}

fn run(cli: Cli) -> Result<(), PuzzleError> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let games = read_games(
        &cli.games,
        cli.format,
        cli.compression.unwrap_or_default(),
    )?;
    tracing::info!(games = games.len(), pattern = %cli.games, "Games loaded");

    // Nothing is written to the output path unless the whole sheet was built.
    let mut pdf = Vec::new();
    let puzzles = generate_puzzle_sheet(
        &ShakmatyRules,
        &games,
        &cli.username,
        &config,
        &mut pdf,
    )?;
    fs::write(&cli.output, &pdf)?;

    if let Some(path) = &cli.dump_json {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &puzzles).map_err(io::Error::from)?;
        writer.flush()?;
        tracing::info!(path = %path.display(), "Puzzle JSON written");
    }

    Ok(())
}

fn main() -> ExitCode {
    log::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
