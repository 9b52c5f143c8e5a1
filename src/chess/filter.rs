use smallvec::SmallVec;
use std::io;
use std::ops::ControlFlow;

use pgn_reader::{Nag, RawComment, RawTag, Reader, SanPlus, Skip, Visitor};

use crate::pgn_visitor_skip_variations;

pub(crate) type MoveList = SmallVec<[String; 128]>;

/// Mainline of one game: SAN tokens with comments, NAGs and variations
/// dropped.
#[derive(Debug, Default)]
pub struct ParsedMovetext {
    pub sans: MoveList,
    /// Value of a `[FEN "..."]` tag, when the movetext carried headers.
    pub fen: Option<String>,
    pub parse_error: bool,
}

/// Parses a movetext string, or a full PGN game with tags, into its mainline.
///
/// Tokens that are not SAN are skipped by the reader; only reader failures
/// and input without any game set `parse_error`.
pub fn parse_movetext_mainline(movetext: &str) -> ParsedMovetext {
    if movetext.trim().is_empty() {
        return ParsedMovetext::default();
    }

    let mut reader = Reader::new(io::Cursor::new(movetext.as_bytes()));
    let mut visitor = MainlineVisitor::default();

    let parse_error = !matches!(reader.read_game(&mut visitor), Ok(Some(())));
    ParsedMovetext {
        sans: visitor.sans,
        fen: visitor.fen,
        parse_error,
    }
}

#[derive(Default)]
struct MainlineVisitor {
    sans: MoveList,
    fen: Option<String>,
}

impl Visitor for MainlineVisitor {
    type Tags = ();
    type Movetext = ();
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        self.sans.clear();
        self.fen = None;
        ControlFlow::Continue(())
    }

    fn tag(
        &mut self,
        _: &mut Self::Tags,
        key: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        if key == b"FEN" && self.fen.is_none() {
            let fen = value.decode_utf8_lossy();
            if !fen.trim().is_empty() {
                self.fen = Some(fen.trim().to_string());
            }
        }
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, _tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(())
    }

    fn san(
        &mut self,
        _movetext: &mut Self::Movetext,
        san_plus: SanPlus,
    ) -> ControlFlow<Self::Output> {
        self.sans.push(san_plus.to_string());
        ControlFlow::Continue(())
    }

    pgn_visitor_skip_variations!();

    fn end_game(&mut self, _movetext: Self::Movetext) -> Self::Output {}
}
