pub mod chess;

pub use chess::{
    Config, GameFormat, GameRecord, MistakeRecord, PuzzleError, PuzzleSet, Side, collect_puzzles,
    generate_puzzle_sheet, layout_document, read_games, write_pdf,
};
