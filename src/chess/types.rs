use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// One recorded game as read from PGN or a Lichess export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameRecord {
    pub event: Option<String>,
    pub site: Option<String>,
    pub white: Option<String>,
    pub black: Option<String>,
    pub result: Option<String>,

    /// Starting position when the game did not begin from the standard setup.
    pub fen: Option<String>,

    pub movetext: String,

    /// Contains `None` for cleanly read games or the accumulated diagnostics.
    pub parse_error: Option<String>,
}

impl GameRecord {
    /// Side played by `username`: White on a case-insensitive match of the
    /// White tag, otherwise Black.
    pub fn side_of(&self, username: &str) -> Side {
        match self.white.as_deref() {
            Some(white) if white.to_lowercase() == username.to_lowercase() => Side::White,
            _ => Side::Black,
        }
    }

    /// Short label for log lines.
    pub fn label(&self) -> &str {
        self.site
            .as_deref()
            .or(self.event.as_deref())
            .unwrap_or("<unnamed game>")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub const fn name(self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(Self::White),
            "black" | "b" => Ok(Self::Black),
            other => Err(format!(
                "Invalid side '{other}'. Supported values: 'white' or 'black'."
            )),
        }
    }
}

/// A position where the player skipped an available capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MistakeRecord {
    /// FEN of the position before the player's move.
    pub position: String,
    pub move_number: u32,
    pub player_move: String,
    pub hint: String,
    /// At most three moves, in the order the rules capability listed them.
    pub best_moves: Vec<String>,
}

/// Exactly three puzzles in collection order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PuzzleSet([MistakeRecord; 3]);

impl PuzzleSet {
    pub const LEN: usize = 3;

    /// Takes the first three `records`, padding with `filler` when short.
    pub fn from_records(
        records: impl IntoIterator<Item = MistakeRecord>,
        filler: impl Fn() -> MistakeRecord,
    ) -> Self {
        let mut records = records.into_iter();
        Self(std::array::from_fn(|_| {
            records.next().unwrap_or_else(&filler)
        }))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MistakeRecord> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[MistakeRecord] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a PuzzleSet {
    type Item = &'a MistakeRecord;
    type IntoIter = std::slice::Iter<'a, MistakeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
