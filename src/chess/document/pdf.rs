use std::fs::File;
use std::io::Write;
use std::path::Path;

use pdf_writer::types::TextRenderingMode;
use pdf_writer::{Content, Name, Pdf, Rect, Ref, Str};

use super::{BoardSquare, DiagramBlock, Document, FontFace, PieceGlyph, SolutionBlock, TextRun};
use crate::chess::error::PuzzleError;
use crate::chess::types::Side;

const CATALOG_ID: Ref = Ref::new(1);
const PAGE_TREE_ID: Ref = Ref::new(2);
const FONT_IDS: [Ref; 3] = [Ref::new(3), Ref::new(4), Ref::new(5)];
const PUZZLE_PAGE_ID: Ref = Ref::new(6);
const PUZZLE_CONTENT_ID: Ref = Ref::new(7);
const SOLUTION_PAGE_ID: Ref = Ref::new(8);
const SOLUTION_CONTENT_ID: Ref = Ref::new(9);

const FACES: [FontFace; 3] = [FontFace::Regular, FontFace::Bold, FontFace::Oblique];

const GLYPH_OUTLINE_WIDTH: f32 = 0.5;

fn resource_name(face: FontFace) -> Name<'static> {
    match face {
        FontFace::Regular => Name(b"F1"),
        FontFace::Bold => Name(b"F2"),
        FontFace::Oblique => Name(b"F3"),
    }
}

/// Maps text to WinAnsiEncoding bytes. Characters the encoding lacks become
/// `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u8,
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02C6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8A,
            '\u{2039}' => 0x8B,
            '\u{0152}' => 0x8C,
            '\u{017D}' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{02DC}' => 0x98,
            '\u{2122}' => 0x99,
            '\u{0161}' => 0x9A,
            '\u{203A}' => 0x9B,
            '\u{0153}' => 0x9C,
            '\u{017E}' => 0x9E,
            '\u{0178}' => 0x9F,
            _ => b'?',
        })
        .collect()
}

fn draw_text(content: &mut Content, text: &TextRun) {
    content
        .begin_text()
        .set_font(resource_name(text.face), text.size)
        .next_line(text.x, text.y)
        .show(Str(&encode_win_ansi(&text.text)))
        .end_text();
}

fn draw_square(content: &mut Content, square: &BoardSquare) {
    let (r, g, b) = square.color.rgb();
    content
        .set_fill_rgb(r, g, b)
        .rect(square.x, square.y, square.size, square.size)
        .fill_nonzero();
}

fn draw_piece(content: &mut Content, piece: &PieceGlyph) {
    let mut symbol = [0u8; 4];
    let symbol = encode_win_ansi(piece.symbol.encode_utf8(&mut symbol));

    content.save_state();
    match piece.side {
        Side::White => {
            content
                .set_fill_rgb(1.0, 1.0, 1.0)
                .set_stroke_rgb(0.0, 0.0, 0.0)
                .set_line_width(GLYPH_OUTLINE_WIDTH);
        }
        Side::Black => {
            content.set_fill_rgb(0.0, 0.0, 0.0);
        }
    }
    let mode = match piece.side {
        Side::White => TextRenderingMode::FillStroke,
        Side::Black => TextRenderingMode::Fill,
    };
    content
        .begin_text()
        .set_text_rendering_mode(mode)
        .set_font(resource_name(piece.face), piece.size)
        .next_line(piece.x, piece.y)
        .show(Str(&symbol))
        .end_text();
    content.restore_state();
}

fn draw_diagram(content: &mut Content, block: &DiagramBlock) {
    for square in &block.squares {
        draw_square(content, square);
    }
    for piece in &block.pieces {
        draw_piece(content, piece);
    }
    content.set_fill_rgb(0.0, 0.0, 0.0);
    for text in [&block.label, &block.caption, &block.hint] {
        draw_text(content, text);
    }
}

fn draw_solution(content: &mut Content, block: &SolutionBlock) {
    for text in [
        &block.heading,
        &block.position,
        &block.player_move,
        &block.best_moves_label,
    ] {
        draw_text(content, text);
    }
    for bullet in &block.bullets {
        draw_text(content, bullet);
    }
    draw_text(content, &block.key_idea);
}

fn puzzle_content(document: &Document) -> Vec<u8> {
    let page = &document.puzzles;
    let mut content = Content::new();
    content.set_fill_rgb(0.0, 0.0, 0.0);
    draw_text(&mut content, &page.title);
    draw_text(&mut content, &page.subtitle);
    for block in &page.diagrams {
        draw_diagram(&mut content, block);
    }
    content.finish()
}

fn solution_content(document: &Document) -> Vec<u8> {
    let page = &document.solutions;
    let mut content = Content::new();
    content.set_fill_rgb(0.0, 0.0, 0.0);
    draw_text(&mut content, &page.title);
    for block in &page.blocks {
        draw_solution(&mut content, block);
    }
    draw_text(&mut content, &page.footer);
    content.finish()
}

/// Serializes `document` into a complete PDF file.
///
/// No creation date or file identifier is written, so equal documents give
/// equal bytes.
fn to_bytes(document: &Document) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let media_box = Rect::new(0.0, 0.0, document.width, document.height);

    pdf.catalog(CATALOG_ID).pages(PAGE_TREE_ID);
    pdf.pages(PAGE_TREE_ID)
        .kids([PUZZLE_PAGE_ID, SOLUTION_PAGE_ID])
        .count(2);

    for (face, id) in FACES.into_iter().zip(FONT_IDS) {
        pdf.type1_font(id)
            .base_font(Name(document.fonts.name(face).as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
    }

    let pages = [
        (PUZZLE_PAGE_ID, PUZZLE_CONTENT_ID, puzzle_content(document)),
        (SOLUTION_PAGE_ID, SOLUTION_CONTENT_ID, solution_content(document)),
    ];
    for (page_id, content_id, data) in &pages {
        {
            let mut page = pdf.page(*page_id);
            page.media_box(media_box)
                .parent(PAGE_TREE_ID)
                .contents(*content_id);
            let mut resources = page.resources();
            let mut fonts = resources.fonts();
            for (face, font_id) in FACES.into_iter().zip(FONT_IDS) {
                fonts.pair(resource_name(face), font_id);
            }
        }
        pdf.stream(*content_id, data);
    }

    pdf.finish()
}

/// Writes `document` as PDF to `sink`. The sink is flushed but left open.
pub fn write_pdf<W: Write>(document: &Document, mut sink: W) -> Result<(), PuzzleError> {
    let bytes = to_bytes(document);
    sink.write_all(&bytes)?;
    sink.flush()?;
    tracing::debug!(bytes = bytes.len(), "PDF written");
    Ok(())
}

/// Creates (or truncates) `path` and writes `document` into it.
pub fn render_to_path(document: &Document, path: &Path) -> Result<(), PuzzleError> {
    let file = File::create(path)?;
    write_pdf(document, file)?;
    tracing::info!(path = %path.display(), "Puzzle sheet saved");
    Ok(())
}
