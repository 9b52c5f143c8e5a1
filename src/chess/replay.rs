//! Move-by-move replay of a recorded game.

use super::filter::{MoveList, parse_movetext_mainline};
use super::rules::{ChessRules, RulesError};
use super::types::{GameRecord, Side};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ply {ply}: {source}")]
pub struct ReplayError {
    pub ply: usize,
    #[source]
    pub source: RulesError,
}

/// One half-move with the state it was played from.
#[derive(Debug, Clone)]
pub struct Ply<P, M> {
    /// Snapshot of the position before `mv`.
    pub before: P,
    pub mv: M,
    pub mover: Side,
    pub move_number: u32,
}

/// Replays the mainline of one game against a rules capability.
pub struct Replayer<'a, R: ChessRules> {
    rules: &'a R,
    start: Option<R::Position>,
    sans: MoveList,
}

impl<'a, R: ChessRules> Replayer<'a, R> {
    /// Parses `game` up front. A record that cannot be parsed, or whose
    /// starting position is invalid, replays as an empty sequence.
    pub fn new(rules: &'a R, game: &GameRecord) -> Self {
        let parsed = parse_movetext_mainline(&game.movetext);
        if parsed.parse_error {
            tracing::warn!(game = game.label(), "Unparsable movetext, skipping game");
            return Self::empty(rules);
        }

        let fen = game.fen.as_deref().or(parsed.fen.as_deref());
        let start = match fen {
            Some(fen) => match rules.position_from_notation(fen) {
                Ok(position) => position,
                Err(err) => {
                    tracing::warn!(game = game.label(), "{err}, skipping game");
                    return Self::empty(rules);
                }
            },
            None => rules.starting_position(),
        };

        Self {
            rules,
            start: Some(start),
            sans: parsed.sans,
        }
    }

    fn empty(rules: &'a R) -> Self {
        Self {
            rules,
            start: None,
            sans: MoveList::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() || self.sans.is_empty()
    }

    /// A fresh forward-only sequence over the game's plies.
    pub fn plies(&self) -> Plies<'_, R> {
        let move_number = self
            .start
            .as_ref()
            .map_or(1, |position| self.rules.fullmove_number(position));

        Plies {
            rules: self.rules,
            position: self.start.clone(),
            sans: self.sans.iter(),
            ply: 0,
            move_number,
        }
    }
}

/// Iterator returned by [`Replayer::plies`]. After the first error it is
/// exhausted.
pub struct Plies<'a, R: ChessRules> {
    rules: &'a R,
    position: Option<R::Position>,
    sans: std::slice::Iter<'a, String>,
    ply: usize,
    move_number: u32,
}

impl<R: ChessRules> Iterator for Plies<'_, R> {
    type Item = Result<Ply<R::Position, R::Move>, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.position.as_mut()?;
        let san = self.sans.next()?;
        self.ply += 1;

        let mv = match self.rules.parse_move(position, san) {
            Ok(mv) => mv,
            Err(source) => {
                self.position = None;
                return Some(Err(ReplayError {
                    ply: self.ply,
                    source,
                }));
            }
        };

        let before = position.clone();
        let mover = self.rules.side_to_move(&before);
        let move_number = self.move_number;

        self.rules.apply(position, mv);
        if mover == Side::Black {
            self.move_number += 1;
        }

        Some(Ok(Ply {
            before,
            mv,
            mover,
            move_number,
        }))
    }
}
