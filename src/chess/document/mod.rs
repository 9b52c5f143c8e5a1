//! Two-page puzzle sheet: a positioned model built from a [`PuzzleSet`] and
//! a PDF backend that draws it.
//!
//! Layout is fixed; nothing reflows when strings get longer.

mod pdf;

pub use pdf::{encode_win_ansi, render_to_path, write_pdf};

use super::config::{HexColor, LayoutConfig};
use super::error::PuzzleError;
use super::rules::ChessRules;
use super::types::{MistakeRecord, PuzzleSet, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    Regular,
    Bold,
    Oblique,
}

/// A single line of text with its baseline origin.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub face: FontFace,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardSquare {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: HexColor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieceGlyph {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub face: FontFace,
    pub symbol: char,
    pub side: Side,
}

/// One puzzle on the first page: board, label, caption and hint.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramBlock {
    /// Bottom-left corner of the board.
    pub origin: (f32, f32),
    pub squares: Vec<BoardSquare>,
    pub pieces: Vec<PieceGlyph>,
    pub label: TextRun,
    pub caption: TextRun,
    pub hint: TextRun,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PuzzlePage {
    pub title: TextRun,
    pub subtitle: TextRun,
    pub diagrams: Vec<DiagramBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolutionBlock {
    pub heading: TextRun,
    pub position: TextRun,
    pub player_move: TextRun,
    pub best_moves_label: TextRun,
    pub bullets: Vec<TextRun>,
    pub key_idea: TextRun,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolutionPage {
    pub title: TextRun,
    pub blocks: Vec<SolutionBlock>,
    pub footer: TextRun,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontNames {
    pub regular: String,
    pub bold: String,
    pub oblique: String,
}

impl FontNames {
    pub fn name(&self, face: FontFace) -> &str {
        match face {
            FontFace::Regular => &self.regular,
            FontFace::Bold => &self.bold,
            FontFace::Oblique => &self.oblique,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub width: f32,
    pub height: f32,
    pub fonts: FontNames,
    pub puzzles: PuzzlePage,
    pub solutions: SolutionPage,
}

fn run(x: f32, y: f32, size: f32, face: FontFace, text: impl Into<String>) -> TextRun {
    TextRun {
        x,
        y,
        size,
        face,
        text: text.into(),
    }
}

/// Positions every element of the sheet.
///
/// Fails only when a record's position cannot be read as a board.
pub fn layout_document<R: ChessRules>(
    rules: &R,
    puzzles: &PuzzleSet,
    layout: &LayoutConfig,
) -> Result<Document, PuzzleError> {
    let diagrams = puzzles
        .iter()
        .zip(layout.diagram_y)
        .enumerate()
        .map(|(index, (record, y))| diagram_block(rules, index + 1, record, y, layout))
        .collect::<Result<Vec<_>, _>>()?;

    let puzzle_page = PuzzlePage {
        title: run(
            layout.margin,
            layout.title_y,
            layout.title_size,
            FontFace::Bold,
            &layout.title,
        ),
        subtitle: run(
            layout.margin,
            layout.subtitle_y,
            layout.subtitle_size,
            FontFace::Regular,
            &layout.subtitle,
        ),
        diagrams,
    };

    Ok(Document {
        width: layout.page_width,
        height: layout.page_height,
        fonts: FontNames {
            regular: layout.regular_font.clone(),
            bold: layout.bold_font.clone(),
            oblique: layout.oblique_font.clone(),
        },
        puzzles: puzzle_page,
        solutions: solution_page(puzzles, layout),
    })
}

fn diagram_block<R: ChessRules>(
    rules: &R,
    number: usize,
    record: &MistakeRecord,
    y: f32,
    layout: &LayoutConfig,
) -> Result<DiagramBlock, PuzzleError> {
    let diagram = rules.diagram(&record.position)?;
    let x = layout.margin;
    let board = layout.board_size;
    let square = layout.square_size();
    let (dx, dy) = layout.glyph_offset;

    let mut squares = Vec::with_capacity(64);
    for rank in 0..8u8 {
        for file in 0..8u8 {
            // a1 is dark.
            let color = if (rank + file) % 2 == 0 {
                layout.dark_square
            } else {
                layout.light_square
            };
            squares.push(BoardSquare {
                x: x + f32::from(file) * square,
                y: y + f32::from(rank) * square,
                size: square,
                color,
            });
        }
    }

    let pieces = diagram
        .pieces
        .iter()
        .map(|piece| PieceGlyph {
            x: x + f32::from(piece.file) * square + dx * square,
            y: y + f32::from(piece.rank) * square + dy * square,
            size: layout.glyph_scale * square,
            face: FontFace::Regular,
            symbol: piece.symbol,
            side: piece.side,
        })
        .collect();

    Ok(DiagramBlock {
        origin: (x, y),
        squares,
        pieces,
        label: run(
            x,
            y + board + layout.label_gap,
            layout.label_size,
            FontFace::Bold,
            format!("Puzzle {number}"),
        ),
        caption: run(
            x,
            y + board,
            layout.caption_size,
            FontFace::Regular,
            format!("Move {} - {} to move", record.move_number, diagram.side_to_move),
        ),
        hint: run(
            x + board + layout.hint_gap,
            y + board / 2.0,
            layout.hint_size,
            FontFace::Oblique,
            format!("Hint: {}", record.hint),
        ),
    })
}

fn solution_page(puzzles: &PuzzleSet, layout: &LayoutConfig) -> SolutionPage {
    let mut cursor = layout.solutions_start_y;
    let mut blocks = Vec::with_capacity(PuzzleSet::LEN);

    for (index, record) in puzzles.iter().enumerate() {
        let heading = run(
            layout.margin,
            cursor,
            layout.heading_size,
            FontFace::Bold,
            format!("Puzzle {} - Solution", index + 1),
        );
        cursor -= layout.heading_step;

        let position = run(
            layout.body_indent,
            cursor,
            layout.body_size,
            FontFace::Regular,
            format!("Position: Move {}", record.move_number),
        );
        cursor -= layout.line_step;

        let player_move = run(
            layout.body_indent,
            cursor,
            layout.body_size,
            FontFace::Regular,
            format!("Your move was: {}", record.player_move),
        );
        cursor -= layout.line_step;

        let best_moves_label = run(
            layout.body_indent,
            cursor,
            layout.body_size,
            FontFace::Bold,
            "Best moves:",
        );
        cursor -= layout.line_step;

        let mut bullets = Vec::with_capacity(record.best_moves.len().min(3));
        for mv in record.best_moves.iter().take(3) {
            bullets.push(run(
                layout.bullet_indent,
                cursor,
                layout.bullet_size,
                FontFace::Regular,
                format!("\u{2022} {mv}"),
            ));
            cursor -= layout.bullet_step;
        }

        let key_idea = run(
            layout.body_indent,
            cursor,
            layout.hint_size,
            FontFace::Oblique,
            format!("Key idea: {}", record.hint),
        );
        cursor -= layout.block_step;

        blocks.push(SolutionBlock {
            heading,
            position,
            player_move,
            best_moves_label,
            bullets,
            key_idea,
        });
    }

    SolutionPage {
        title: run(
            layout.margin,
            layout.title_y,
            layout.title_size,
            FontFace::Bold,
            &layout.solutions_title,
        ),
        blocks,
        footer: run(
            layout.margin,
            layout.footer_y,
            layout.footer_size,
            FontFace::Regular,
            &layout.footer,
        ),
    }
}
