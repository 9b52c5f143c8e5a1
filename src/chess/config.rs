//! Tunables for detection, padding and page layout, loadable from TOML.
//!
//! Every field has a default, so a layout file only needs the keys it
//! changes:
//!
//! ```toml
//! [detector]
//! hint = "Count the loose pieces"
//!
//! [layout]
//! title = "Puzzles for the club night"
//! light_square = "#EEEED2"
//! dark_square = "#769656"
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::error::PuzzleError;
use super::rules::{ChessRules, ShakmatyRules};
use super::types::MistakeRecord;

/// Points per inch in PDF user space.
pub const INCH: f32 = 72.0;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub detector: DetectorConfig,
    pub template: PuzzleTemplate,
    pub layout: LayoutConfig,
}

impl Config {
    pub fn from_toml_str(input: &str) -> Result<Self, PuzzleError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, PuzzleError> {
        let input = fs::read_to_string(path).map_err(|e| PuzzleError::Input {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml_str(&input)?;
        tracing::debug!(path = %path.display(), "Loaded layout configuration");
        Ok(config)
    }

    fn validate(&self) -> Result<(), PuzzleError> {
        let layout = &self.layout;
        let positive = [
            ("layout.page_width", layout.page_width),
            ("layout.page_height", layout.page_height),
            ("layout.board_size", layout.board_size),
            ("layout.glyph_scale", layout.glyph_scale),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(PuzzleError::Config(format!(
                    "{key} must be a positive number, got {value}"
                )));
            }
        }
        if self.template.best_moves.len() > crate::chess::mistakes::MAX_BEST_MOVES {
            return Err(PuzzleError::Config(format!(
                "template.best_moves holds at most {} moves",
                crate::chess::mistakes::MAX_BEST_MOVES
            )));
        }
        if let Some(fen) = &self.template.position {
            ShakmatyRules
                .position_from_notation(fen)
                .map_err(|e| PuzzleError::Config(format!("template.position: {e}")))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Flagged plies kept per game.
    pub max_per_game: usize,
    pub hint: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_per_game: 3,
            hint: "Look for tactical opportunities".to_string(),
        }
    }
}

/// The record used to pad a puzzle set when too few mistakes were found.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PuzzleTemplate {
    /// FEN of the padding position; the standard start when unset.
    pub position: Option<String>,
    pub move_number: u32,
    pub player_move: String,
    pub hint: String,
    pub best_moves: Vec<String>,
}

impl Default for PuzzleTemplate {
    fn default() -> Self {
        Self {
            position: None,
            move_number: 1,
            player_move: "N/A".to_string(),
            hint: "Analyze this position for the best move".to_string(),
            best_moves: vec!["e4".to_string(), "d4".to_string(), "Nf3".to_string()],
        }
    }
}

impl PuzzleTemplate {
    pub fn record<R: ChessRules>(&self, rules: &R) -> MistakeRecord {
        MistakeRecord {
            position: self
                .position
                .clone()
                .unwrap_or_else(|| rules.starting_notation()),
            move_number: self.move_number,
            player_move: self.player_move.clone(),
            hint: self.hint.clone(),
            best_moves: self.best_moves.clone(),
        }
    }
}

/// An `#RRGGBB` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Components scaled to `0.0..=1.0`.
    pub fn rgb(self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }
}

impl TryFrom<String> for HexColor {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::str::FromStr for HexColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid color '{s}'. Expected the form '#RRGGBB'.");
        let digits = s.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Page geometry, palette, fonts and fixed strings of the puzzle sheet.
///
/// Coordinates are PDF points with the origin at the bottom-left corner.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,

    pub regular_font: String,
    pub bold_font: String,
    pub oblique_font: String,

    pub title: String,
    pub title_size: f32,
    pub title_y: f32,
    pub subtitle: String,
    pub subtitle_size: f32,
    pub subtitle_y: f32,

    /// Bottom edge of each diagram, top to bottom.
    pub diagram_y: [f32; 3],
    pub board_size: f32,
    pub light_square: HexColor,
    pub dark_square: HexColor,
    /// Glyph size as a fraction of the square size.
    pub glyph_scale: f32,
    pub glyph_offset: (f32, f32),

    pub label_size: f32,
    pub label_gap: f32,
    pub caption_size: f32,
    pub hint_size: f32,
    /// Horizontal gap between a diagram and its hint.
    pub hint_gap: f32,

    pub solutions_title: String,
    pub solutions_start_y: f32,
    pub heading_size: f32,
    pub body_size: f32,
    pub bullet_size: f32,
    pub body_indent: f32,
    pub bullet_indent: f32,
    pub heading_step: f32,
    pub line_step: f32,
    pub bullet_step: f32,
    pub block_step: f32,

    pub footer: String,
    pub footer_size: f32,
    pub footer_y: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let page_height = 11.0 * INCH;
        Self {
            page_width: 8.5 * INCH,
            page_height,
            margin: INCH,

            regular_font: "Helvetica".to_string(),
            bold_font: "Helvetica-Bold".to_string(),
            oblique_font: "Helvetica-Oblique".to_string(),

            title: "Your Weekly Chess Puzzles".to_string(),
            title_size: 24.0,
            title_y: page_height - INCH,
            subtitle: "Find the best move in each position".to_string(),
            subtitle_size: 12.0,
            subtitle_y: page_height - 1.3 * INCH,

            diagram_y: [
                page_height - 2.5 * INCH,
                page_height - 5.0 * INCH,
                page_height - 7.5 * INCH,
            ],
            board_size: 2.0 * INCH,
            light_square: HexColor::new(0xF0, 0xD9, 0xB5),
            dark_square: HexColor::new(0xB5, 0x88, 0x63),
            glyph_scale: 0.8,
            glyph_offset: (0.15, 0.1),

            label_size: 14.0,
            label_gap: 0.2 * INCH,
            caption_size: 10.0,
            hint_size: 10.0,
            hint_gap: 0.5 * INCH,

            solutions_title: "Solutions".to_string(),
            solutions_start_y: page_height - 1.8 * INCH,
            heading_size: 14.0,
            body_size: 11.0,
            bullet_size: 10.0,
            body_indent: 1.2 * INCH,
            bullet_indent: 1.4 * INCH,
            heading_step: 0.3 * INCH,
            line_step: 0.25 * INCH,
            bullet_step: 0.2 * INCH,
            block_step: 0.5 * INCH,

            footer: "Keep practicing! Visit lichess.org for more puzzles.".to_string(),
            footer_size: 10.0,
            footer_y: INCH,
        }
    }
}

impl LayoutConfig {
    pub fn square_size(&self) -> f32 {
        self.board_size / 8.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::rules::ShakmatyRules;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_default_layout_geometry() {
        let layout = LayoutConfig::default();

        assert!(close(layout.page_width, 612.0));
        assert!(close(layout.page_height, 792.0));
        assert!(close(layout.title_y, 720.0));
        assert!(close(layout.subtitle_y, 698.4));
        assert!(close(layout.diagram_y[0], 612.0));
        assert!(close(layout.diagram_y[1], 432.0));
        assert!(close(layout.diagram_y[2], 252.0));
        assert!(close(layout.square_size(), 18.0));
        assert!(close(layout.solutions_start_y, 662.4));
        assert!(close(layout.body_indent, 86.4));
        assert!(close(layout.bullet_indent, 100.8));
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_toml_overrides_only_named_keys() {
        let config = Config::from_toml_str(
            r##"
[detector]
hint = "Count the loose pieces"

[layout]
title = "Club night"
dark_square = "#769656"
"##,
        )
        .unwrap();

        assert_eq!(config.detector.hint, "Count the loose pieces");
        assert_eq!(config.detector.max_per_game, 3);
        assert_eq!(config.layout.title, "Club night");
        assert_eq!(config.layout.dark_square, HexColor::new(0x76, 0x96, 0x56));
        assert_eq!(config.layout.light_square, HexColor::new(0xF0, 0xD9, 0xB5));
        assert_eq!(config.template, PuzzleTemplate::default());
    }

    #[test]
    fn test_invalid_color_is_config_error() {
        let err = Config::from_toml_str("[layout]\nlight_square = \"F0D9B5\"\n").unwrap_err();
        assert!(matches!(err, PuzzleError::Config(_)));
        assert!(err.to_string().contains("#RRGGBB"));
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let err = Config::from_toml_str("[layout]\nboard_colour = 1\n").unwrap_err();
        assert!(matches!(err, PuzzleError::Config(_)));
    }

    #[test]
    fn test_non_positive_board_is_rejected() {
        let err = Config::from_toml_str("[layout]\nboard_size = 0.0\n").unwrap_err();
        assert!(err.to_string().contains("layout.board_size"));
    }

    #[test]
    fn test_template_with_too_many_moves_is_rejected() {
        let err =
            Config::from_toml_str("[template]\nbest_moves = [\"a3\", \"b3\", \"c3\", \"d3\"]\n")
                .unwrap_err();
        assert!(matches!(err, PuzzleError::Config(_)));
    }

    #[test]
    fn test_template_position_must_be_a_legal_fen() {
        let err = Config::from_toml_str("[template]\nposition = \"not a fen\"\n")
            .unwrap_err();
        assert!(matches!(err, PuzzleError::Config(_)));
        assert!(err.to_string().contains("template.position"));

        let config =
            Config::from_toml_str("[template]\nposition = \"4k3/8/8/8/8/8/8/4K3 w - - 0 1\"\n")
                .unwrap();
        assert_eq!(
            config.template.position.as_deref(),
            Some("4k3/8/8/8/8/8/8/4K3 w - - 0 1")
        );
    }

    #[test]
    fn test_hex_color_parse_and_display() {
        let color: HexColor = "#b58863".parse().unwrap();
        assert_eq!(color, HexColor::new(0xB5, 0x88, 0x63));
        assert_eq!(color.to_string(), "#B58863");

        let (r, g, b) = HexColor::new(255, 0, 51).rgb();
        assert!(close(r, 1.0) && close(g, 0.0) && close(b, 0.2));

        assert!("#12345".parse::<HexColor>().is_err());
        assert!("#GG0000".parse::<HexColor>().is_err());
    }

    #[test]
    fn test_default_template_record() {
        let record = PuzzleTemplate::default().record(&ShakmatyRules);

        assert_eq!(
            record.position,
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
        assert_eq!(record.move_number, 1);
        assert_eq!(record.player_move, "N/A");
        assert_eq!(record.hint, "Analyze this position for the best move");
        assert_eq!(record.best_moves, vec!["e4", "d4", "Nf3"]);
    }

    #[test]
    fn test_load_reads_file_and_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.toml");
        fs::write(&path, "[layout]\nfooter = \"See you next week\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.layout.footer, "See you next week");

        let missing = Config::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, PuzzleError::Input { .. }));
    }
}
