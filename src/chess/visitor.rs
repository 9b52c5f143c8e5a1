use super::error::ErrorAccumulator;
use super::types::GameRecord;

use pgn_reader::{Nag, Outcome, RawComment, RawTag, Reader, SanPlus, Skip, Visitor};
use std::fmt::Write;
use std::io::Read;
use std::ops::ControlFlow;

/// Implements the annotation and variation callbacks of a pgn-reader
/// `Visitor` as no-ops that keep only the mainline. The caller must have
/// `ControlFlow`, `Nag`, `RawComment` and `Skip` in scope.
#[macro_export]
macro_rules! pgn_visitor_skip_variations {
    () => {
        fn nag(&mut self, _: &mut Self::Movetext, _: Nag) -> ControlFlow<Self::Output> {
            ControlFlow::Continue(())
        }

        fn comment(
            &mut self,
            _: &mut Self::Movetext,
            _: RawComment<'_>,
        ) -> ControlFlow<Self::Output> {
            ControlFlow::Continue(())
        }

        fn partial_comment(
            &mut self,
            _: &mut Self::Movetext,
            _: RawComment<'_>,
        ) -> ControlFlow<Self::Output> {
            ControlFlow::Continue(())
        }

        fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
            ControlFlow::Continue(Skip(true))
        }
    };
}

/// Tags kept on a [`GameRecord`]. The first non-empty value of a tag wins.
#[derive(Debug, Default)]
struct Tags {
    event: Option<String>,
    site: Option<String>,
    white: Option<String>,
    black: Option<String>,
    result: Option<String>,
    fen: Option<String>,
    variant: Option<String>,
}

impl Tags {
    fn set(&mut self, key: &[u8], value: RawTag<'_>) {
        let slot = match key {
            b"Event" => &mut self.event,
            b"Site" => &mut self.site,
            b"White" => &mut self.white,
            b"Black" => &mut self.black,
            b"Result" => &mut self.result,
            b"FEN" => &mut self.fen,
            b"Variant" => &mut self.variant,
            _ => return,
        };
        if slot.is_some() {
            return;
        }

        let value = value.decode_utf8_lossy();
        let value = value.trim();
        if !value.is_empty() {
            *slot = Some(value.to_string());
        }
    }

    fn unsupported_variant(&self) -> Option<&str> {
        self.variant.as_deref().filter(|variant| {
            !["standard", "from position"]
                .iter()
                .any(|known| variant.eq_ignore_ascii_case(known))
        })
    }
}

/// Mainline SAN written back out with move numbers that follow the starting
/// position, e.g. `40... Kd7 41. Kd2` for a game set up with Black to move.
#[derive(Debug)]
pub struct NumberedMovetext {
    text: String,
    fullmove: u32,
    white_to_move: bool,
}

impl NumberedMovetext {
    fn starting_at(fen: Option<&str>) -> Self {
        // placement, turn, castling, en passant, halfmove clock, fullmove
        let mut fields = fen.unwrap_or_default().split_ascii_whitespace().skip(1);
        let white_to_move = fields.next() != Some("b");
        let fullmove = fields
            .nth(3)
            .and_then(|n| n.parse().ok())
            .filter(|&n| n >= 1)
            .unwrap_or(1);

        Self {
            text: String::with_capacity(256),
            fullmove,
            white_to_move,
        }
    }

    fn push(&mut self, san: &SanPlus) {
        let first = self.text.is_empty();
        if !first {
            self.text.push(' ');
        }

        if self.white_to_move {
            let _ = write!(self.text, "{}. ", self.fullmove);
        } else {
            if first {
                let _ = write!(self.text, "{}... ", self.fullmove);
            }
            self.fullmove += 1;
        }
        let _ = write!(self.text, "{san}");
        self.white_to_move = !self.white_to_move;
    }
}

/// Streaming PGN visitor that turns each game into a [`GameRecord`].
///
/// Comments, NAGs and variations are dropped; the result comes from the
/// `Result` tag, else from the movetext's termination marker.
#[derive(Debug, Default)]
pub struct GameVisitor {
    tags: Tags,
    outcome: Option<String>,
    diagnostics: ErrorAccumulator,
    pub current_game: Option<GameRecord>,
}

impl GameVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn finish_record(&mut self, movetext: String) {
        if let Some(variant) = self.tags.unsupported_variant() {
            let msg = format!("Unsupported variant: Variant='{variant}'");
            self.diagnostics.push(&msg);
        }

        let tags = std::mem::take(&mut self.tags);
        self.current_game = Some(GameRecord {
            event: tags.event,
            site: tags.site,
            white: tags.white,
            black: tags.black,
            result: tags.result.or_else(|| self.outcome.take()),
            fen: tags.fen,
            movetext,
            parse_error: self.diagnostics.take(),
        });
    }

    /// Emits a record for a game the reader gave up on. Its tags are kept,
    /// its moves are not.
    pub fn finalize_game_with_error(&mut self, error_msg: String) {
        self.diagnostics.push(&error_msg);
        self.finish_record(String::new());
    }
}

pub type PgnInput = Box<dyn Read + Send>;

/// A reader positioned somewhere inside one input stream.
pub struct PgnReaderState {
    pub pgn_reader: Reader<PgnInput>,
    /// 1-based index of the game the next `read_game` call returns.
    pub next_game_index: usize,
    pub visitor: GameVisitor,
}

impl PgnReaderState {
    pub fn new(input: PgnInput) -> Self {
        Self {
            pgn_reader: Reader::new(input),
            next_game_index: 1,
            visitor: GameVisitor::new(),
        }
    }
}

impl Visitor for GameVisitor {
    type Tags = ();
    type Movetext = NumberedMovetext;
    type Output = ();

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        self.tags = Tags::default();
        self.outcome = None;
        self.diagnostics = ErrorAccumulator::default();
        self.current_game = None;
        ControlFlow::Continue(())
    }

    fn tag(
        &mut self,
        _: &mut Self::Tags,
        key: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        self.tags.set(key, value);
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, _: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        ControlFlow::Continue(NumberedMovetext::starting_at(self.tags.fen.as_deref()))
    }

    fn san(&mut self, movetext: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        movetext.push(&san);
        ControlFlow::Continue(())
    }

    pgn_visitor_skip_variations!();

    fn outcome(
        &mut self,
        _movetext: &mut Self::Movetext,
        outcome: Outcome,
    ) -> ControlFlow<Self::Output> {
        self.outcome = Some(outcome.to_string());
        ControlFlow::Continue(())
    }

    fn end_game(&mut self, movetext: Self::Movetext) -> Self::Output {
        self.finish_record(movetext.text);
    }
}
