//! The chess rules capability the heuristic and the renderer depend on.
//!
//! Nothing outside this module touches `shakmaty` position or move types
//! directly, so the detector can be driven by a scripted implementation in
//! tests.

use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, File, Move, Position, Rank, Square};
use smallvec::SmallVec;
use thiserror::Error;

use super::types::Side;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("invalid position '{fen}': {reason}")]
    InvalidPosition { fen: String, reason: String },
    #[error("invalid move '{san}': {reason}")]
    InvalidMove { san: String, reason: String },
}

/// A piece drawn on a diagram square. `file` and `rank` are 0-based from a1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedPiece {
    pub file: u8,
    pub rank: u8,
    pub side: Side,
    /// FEN letter: upper case for White, lower case for Black.
    pub symbol: char,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardDiagram {
    pub pieces: SmallVec<[PlacedPiece; 32]>,
    pub side_to_move: Side,
}

/// Position representation, move generation and notation.
pub trait ChessRules {
    type Position: Clone;
    type Move: Copy;

    fn starting_position(&self) -> Self::Position;

    fn position_from_notation(&self, fen: &str) -> Result<Self::Position, RulesError>;

    fn notation_of_position(&self, position: &Self::Position) -> String;

    fn side_to_move(&self, position: &Self::Position) -> Side;

    fn fullmove_number(&self, position: &Self::Position) -> u32;

    fn enumerate_legal_moves(&self, position: &Self::Position) -> Vec<Self::Move>;

    fn is_capture(&self, position: &Self::Position, mv: Self::Move) -> bool;

    fn is_in_check(&self, position: &Self::Position) -> bool;

    /// Notation of `mv` played from `position`, including check suffixes.
    fn notation_of(&self, position: &Self::Position, mv: Self::Move) -> String;

    fn parse_move(&self, position: &Self::Position, san: &str) -> Result<Self::Move, RulesError>;

    fn apply(&self, position: &mut Self::Position, mv: Self::Move);

    fn diagram(&self, fen: &str) -> Result<BoardDiagram, RulesError>;

    /// Notation of the standard starting position.
    fn starting_notation(&self) -> String {
        self.notation_of_position(&self.starting_position())
    }
}

/// Standard chess via `shakmaty`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyRules;

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

fn parse_fen(fen: &str) -> Result<Fen, RulesError> {
    Fen::from_ascii(fen.trim().as_bytes()).map_err(|e| RulesError::InvalidPosition {
        fen: fen.to_string(),
        reason: e.to_string(),
    })
}

impl ChessRules for ShakmatyRules {
    type Position = Chess;
    type Move = Move;

    fn starting_position(&self) -> Chess {
        Chess::default()
    }

    fn position_from_notation(&self, fen: &str) -> Result<Chess, RulesError> {
        parse_fen(fen)?
            .into_position(CastlingMode::Standard)
            .map_err(|e| RulesError::InvalidPosition {
                fen: fen.to_string(),
                reason: e.to_string(),
            })
    }

    fn notation_of_position(&self, position: &Chess) -> String {
        Fen::from_position(position, EnPassantMode::Legal).to_string()
    }

    fn side_to_move(&self, position: &Chess) -> Side {
        position.turn().into()
    }

    fn fullmove_number(&self, position: &Chess) -> u32 {
        position.fullmoves().get()
    }

    fn enumerate_legal_moves(&self, position: &Chess) -> Vec<Move> {
        position.legal_moves().into_iter().collect()
    }

    fn is_capture(&self, _position: &Chess, mv: Move) -> bool {
        mv.is_capture()
    }

    fn is_in_check(&self, position: &Chess) -> bool {
        position.is_check()
    }

    fn notation_of(&self, position: &Chess, mv: Move) -> String {
        SanPlus::from_move(position.clone(), mv).to_string()
    }

    fn parse_move(&self, position: &Chess, san: &str) -> Result<Move, RulesError> {
        let invalid = |reason: String| RulesError::InvalidMove {
            san: san.to_string(),
            reason,
        };
        let parsed = SanPlus::from_ascii(san.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        parsed.san.to_move(position).map_err(|e| invalid(e.to_string()))
    }

    fn apply(&self, position: &mut Chess, mv: Move) {
        position.play_unchecked(mv);
    }

    fn diagram(&self, fen: &str) -> Result<BoardDiagram, RulesError> {
        let setup = parse_fen(fen)?.into_setup();
        let mut pieces = SmallVec::new();

        for rank in 0..8u32 {
            for file in 0..8u32 {
                let square = Square::from_coords(File::new(file), Rank::new(rank));
                if let Some(piece) = setup.board.piece_at(square) {
                    pieces.push(PlacedPiece {
                        file: file as u8,
                        rank: rank as u8,
                        side: piece.color.into(),
                        symbol: piece.char(),
                    });
                }
            }
        }

        Ok(BoardDiagram {
            pieces,
            side_to_move: setup.turn.into(),
        })
    }
}
