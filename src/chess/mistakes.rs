//! Missed-capture heuristic.
//!
//! A ply is flagged when the player had at least one capture available, was
//! not in check, and played a non-capturing move. There is no engine
//! evaluation, so a quiet move that was objectively better still counts.

use std::ops::ControlFlow;

use super::config::DetectorConfig;
use super::replay::{Ply, ReplayError};
use super::rules::ChessRules;
use super::types::{MistakeRecord, Side};

/// Number of capture suggestions kept per record.
pub const MAX_BEST_MOVES: usize = 3;

/// Folds plies into mistake records, stopping once `limit` were found.
#[derive(Debug)]
pub struct MistakeAccumulator<'a, R> {
    rules: &'a R,
    player: Side,
    hint: &'a str,
    limit: usize,
    found: Vec<MistakeRecord>,
}

impl<'a, R: ChessRules> MistakeAccumulator<'a, R> {
    pub fn new(rules: &'a R, player: Side, config: &'a DetectorConfig) -> Self {
        Self {
            rules,
            player,
            hint: &config.hint,
            limit: config.max_per_game,
            found: Vec::with_capacity(config.max_per_game.min(8)),
        }
    }

    pub fn is_full(&self) -> bool {
        self.found.len() >= self.limit
    }

    /// Inspects one ply. Breaks when the accumulator is full.
    pub fn step(mut self, ply: Ply<R::Position, R::Move>) -> ControlFlow<Self, Self> {
        if self.is_full() {
            return ControlFlow::Break(self);
        }

        if ply.mover == self.player
            && let Some(record) = self.classify(&ply)
        {
            tracing::debug!(
                move_number = record.move_number,
                player_move = %record.player_move,
                "Missed capture"
            );
            self.found.push(record);
        }

        if self.is_full() {
            ControlFlow::Break(self)
        } else {
            ControlFlow::Continue(self)
        }
    }

    fn classify(&self, ply: &Ply<R::Position, R::Move>) -> Option<MistakeRecord> {
        let rules = self.rules;
        let position = &ply.before;

        if rules.is_capture(position, ply.mv) || rules.is_in_check(position) {
            return None;
        }

        let captures: Vec<R::Move> = rules
            .enumerate_legal_moves(position)
            .into_iter()
            .filter(|&mv| rules.is_capture(position, mv))
            .collect();
        if captures.is_empty() {
            return None;
        }

        Some(MistakeRecord {
            position: rules.notation_of_position(position),
            move_number: ply.move_number,
            player_move: rules.notation_of(position, ply.mv),
            hint: self.hint.to_string(),
            best_moves: captures
                .iter()
                .take(MAX_BEST_MOVES)
                .map(|&mv| rules.notation_of(position, mv))
                .collect(),
        })
    }

    pub fn into_records(self) -> Vec<MistakeRecord> {
        self.found
    }
}

/// Runs the heuristic over one game's plies for `player`.
///
/// A replay error ends the scan; mistakes found before it are kept.
pub fn detect_mistakes<R, I>(
    rules: &R,
    plies: I,
    player: Side,
    config: &DetectorConfig,
) -> Vec<MistakeRecord>
where
    R: ChessRules,
    I: IntoIterator<Item = Result<Ply<R::Position, R::Move>, ReplayError>>,
{
    let start = MistakeAccumulator::new(rules, player, config);
    if start.is_full() {
        return Vec::new();
    }

    let folded = plies.into_iter().try_fold(start, |acc, ply| match ply {
        Ok(ply) => acc.step(ply),
        Err(err) => {
            tracing::warn!("{err}, stopping scan of this game");
            ControlFlow::Break(acc)
        }
    });

    match folded {
        ControlFlow::Continue(acc) | ControlFlow::Break(acc) => acc.into_records(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::replay::Replayer;
    use crate::chess::rules::{BoardDiagram, RulesError, ShakmatyRules};
    use crate::chess::types::GameRecord;

    fn scan(movetext: &str, player: Side, config: &DetectorConfig) -> Vec<MistakeRecord> {
        let rules = ShakmatyRules;
        let record = GameRecord {
            movetext: movetext.to_string(),
            ..GameRecord::default()
        };
        let replayer = Replayer::new(&rules, &record);
        detect_mistakes(&rules, replayer.plies(), player, config)
    }

    fn scan_default(movetext: &str, player: Side) -> Vec<MistakeRecord> {
        scan(movetext, player, &DetectorConfig::default())
    }

    #[test]
    fn test_no_captures_available_means_no_mistakes() {
        let movetext = "1. e4 e5 2. Nf3 Nc6 3. Bb5";
        let rules = ShakmatyRules;
        let record = GameRecord {
            movetext: movetext.to_string(),
            ..GameRecord::default()
        };

        // Black never has a capture on its turns (1... e5, 2... Nc6).
        let black_plies: Vec<_> = Replayer::new(&rules, &record)
            .plies()
            .map(Result::unwrap)
            .filter(|ply| ply.mover == Side::Black)
            .collect();
        assert_eq!(black_plies.len(), 2);
        for ply in &black_plies {
            assert!(
                !rules
                    .enumerate_legal_moves(&ply.before)
                    .into_iter()
                    .any(|mv| rules.is_capture(&ply.before, mv))
            );
        }

        assert!(scan_default(movetext, Side::Black).is_empty());
    }

    #[test]
    fn test_single_missed_capture() {
        // After 1. e4 d5 White can take on d5 but plays Nc3.
        let mistakes = scan_default("1. e4 d5 2. Nc3", Side::White);

        assert_eq!(mistakes.len(), 1);
        let mistake = &mistakes[0];
        assert_eq!(
            mistake.position,
            "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
        );
        assert_eq!(mistake.move_number, 2);
        assert_eq!(mistake.player_move, "Nc3");
        assert_eq!(mistake.hint, "Look for tactical opportunities");
        assert_eq!(mistake.best_moves, vec!["exd5"]);
    }

    #[test]
    fn test_best_moves_follow_enumeration_order_and_are_capped() {
        let rules = ShakmatyRules;
        // White queen on d4 can capture four black pawns; white plays a king move.
        let fen = "4k3/8/8/2p1p3/3Q4/2p1p3/8/K7 w - - 0 1";
        let position = rules.position_from_notation(fen).unwrap();
        let record = GameRecord {
            fen: Some(fen.to_string()),
            movetext: "1. Kb1".to_string(),
            ..GameRecord::default()
        };

        let mistakes = detect_mistakes(
            &rules,
            Replayer::new(&rules, &record).plies(),
            Side::White,
            &DetectorConfig::default(),
        );

        let expected: Vec<String> = rules
            .enumerate_legal_moves(&position)
            .into_iter()
            .filter(|&mv| rules.is_capture(&position, mv))
            .take(3)
            .map(|mv| rules.notation_of(&position, mv))
            .collect();

        assert_eq!(mistakes.len(), 1);
        assert_eq!(mistakes[0].best_moves.len(), 3);
        assert_eq!(mistakes[0].best_moves, expected);
    }

    #[test]
    fn test_capture_move_is_never_flagged() {
        let mistakes = scan_default("1. e4 d5 2. exd5", Side::White);
        assert!(mistakes.is_empty());
    }

    #[test]
    fn test_position_in_check_is_never_flagged() {
        let rules = ShakmatyRules;
        // Rook on e5 checks the black king; dxe5 is available but Black plays Kd7.
        let fen = "4k3/8/3p4/4R3/8/8/8/6K1 b - - 0 1";
        let record = GameRecord {
            fen: Some(fen.to_string()),
            movetext: "1... Kd7".to_string(),
            ..GameRecord::default()
        };
        let position = rules.position_from_notation(fen).unwrap();
        assert!(rules.is_in_check(&position));
        assert!(
            rules
                .enumerate_legal_moves(&position)
                .into_iter()
                .any(|mv| rules.is_capture(&position, mv))
        );

        let mistakes = detect_mistakes(
            &rules,
            Replayer::new(&rules, &record).plies(),
            Side::Black,
            &DetectorConfig::default(),
        );
        assert!(mistakes.is_empty());
    }

    #[test]
    fn test_opponent_plies_are_ignored() {
        // Black misses exd4 after 2. d4 but we scan for White.
        let movetext = "1. e4 e5 2. d4 Nc6";
        assert!(scan_default(movetext, Side::White).is_empty());

        let black = scan_default(movetext, Side::Black);
        assert_eq!(black.len(), 1);
        assert_eq!(black[0].move_number, 2);
        assert_eq!(black[0].player_move, "Nc6");
        assert_eq!(black[0].best_moves, vec!["exd4"]);
    }

    const FOUR_MISSES: &str = "1. e4 d5 2. Nc3 Nf6 3. Nf3 e6 4. d3 Bb4 5. a3 a6 6. h3";

    #[test]
    fn test_stops_at_three_per_game() {
        let mistakes = scan_default(FOUR_MISSES, Side::White);

        let numbers: Vec<_> = mistakes.iter().map(|m| m.move_number).collect();
        assert_eq!(numbers, vec![2, 3, 4]);
    }

    #[test]
    fn test_early_exit_matches_full_scan() {
        let full_config = DetectorConfig {
            max_per_game: usize::MAX,
            ..DetectorConfig::default()
        };

        let full = scan(FOUR_MISSES, Side::White, &full_config);
        let early = scan_default(FOUR_MISSES, Side::White);

        assert!(full.len() > 3);
        assert_eq!(&full[..3], early.as_slice());
    }

    #[test]
    fn test_zero_limit_returns_nothing() {
        let config = DetectorConfig {
            max_per_game: 0,
            ..DetectorConfig::default()
        };
        assert!(scan(FOUR_MISSES, Side::White, &config).is_empty());
    }

    #[test]
    fn test_illegal_move_keeps_partial_results() {
        // 2. Nc3 is a miss, 3. Ke4 is illegal.
        let mistakes = scan_default("1. e4 d5 2. Nc3 Nf6 3. Ke4 e6 4. d3", Side::White);

        assert_eq!(mistakes.len(), 1);
        assert_eq!(mistakes[0].player_move, "Nc3");
    }

    #[test]
    fn test_custom_hint_is_used() {
        let config = DetectorConfig {
            hint: "Count the hanging pieces".to_string(),
            ..DetectorConfig::default()
        };
        let mistakes = scan("1. e4 d5 2. Nc3", Side::White, &config);

        assert_eq!(mistakes[0].hint, "Count the hanging pieces");
    }

    /// Scripted rules: positions are ply indices, moves are `(is_capture, id)`.
    struct ScriptedRules {
        captures_available: Vec<bool>,
        in_check: Vec<bool>,
    }

    impl ChessRules for ScriptedRules {
        type Position = usize;
        type Move = (bool, u8);

        fn starting_position(&self) -> usize {
            0
        }

        fn position_from_notation(&self, fen: &str) -> Result<usize, RulesError> {
            fen.parse().map_err(|_| RulesError::InvalidPosition {
                fen: fen.to_string(),
                reason: "not an index".to_string(),
            })
        }

        fn notation_of_position(&self, position: &usize) -> String {
            format!("pos{position}")
        }

        fn side_to_move(&self, position: &usize) -> Side {
            if position % 2 == 0 { Side::White } else { Side::Black }
        }

        fn fullmove_number(&self, position: &usize) -> u32 {
            (*position / 2 + 1) as u32
        }

        fn enumerate_legal_moves(&self, position: &usize) -> Vec<(bool, u8)> {
            let mut moves = vec![(false, 0)];
            if self.captures_available[*position] {
                moves.extend([(true, 1), (true, 2), (true, 3), (true, 4)]);
            }
            moves
        }

        fn is_capture(&self, _position: &usize, mv: (bool, u8)) -> bool {
            mv.0
        }

        fn is_in_check(&self, position: &usize) -> bool {
            self.in_check[*position]
        }

        fn notation_of(&self, _position: &usize, mv: (bool, u8)) -> String {
            format!("m{}", mv.1)
        }

        fn parse_move(&self, _position: &usize, san: &str) -> Result<(bool, u8), RulesError> {
            Ok((san == "x", 0))
        }

        fn apply(&self, position: &mut usize, _mv: (bool, u8)) {
            *position += 1;
        }

        fn diagram(&self, _fen: &str) -> Result<BoardDiagram, RulesError> {
            Ok(BoardDiagram {
                pieces: Default::default(),
                side_to_move: Side::White,
            })
        }
    }

    fn scripted_plies(
        rules: &ScriptedRules,
        sans: &[&str],
    ) -> Vec<Result<Ply<usize, (bool, u8)>, ReplayError>> {
        let mut position = rules.starting_position();
        sans.iter()
            .map(|san| {
                let mv = rules.parse_move(&position, san).unwrap();
                let before = position;
                rules.apply(&mut position, mv);
                Ok(Ply {
                    before,
                    mv,
                    mover: rules.side_to_move(&before),
                    move_number: rules.fullmove_number(&before),
                })
            })
            .collect()
    }

    #[test]
    fn test_scripted_rules_cover_all_branches() {
        let rules = ScriptedRules {
            //                       0      1     2      3     4     5
            captures_available: vec![true, true, true, false, true, true],
            in_check: vec![false, false, true, false, false, false],
        };
        // ply 0: quiet with captures -> flagged
        // ply 2: in check -> skipped
        // ply 4: played a capture -> skipped
        let plies = scripted_plies(&rules, &["q", "q", "q", "q", "x", "q"]);

        let mistakes = detect_mistakes(&rules, plies, Side::White, &DetectorConfig::default());

        assert_eq!(mistakes.len(), 1);
        assert_eq!(mistakes[0].position, "pos0");
        assert_eq!(mistakes[0].move_number, 1);
        assert_eq!(mistakes[0].player_move, "m0");
        assert_eq!(mistakes[0].best_moves, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn test_scripted_replay_error_aborts_scan() {
        let rules = ScriptedRules {
            captures_available: vec![true; 6],
            in_check: vec![false; 6],
        };
        let mut plies = scripted_plies(&rules, &["q", "q"]);
        plies.push(Err(ReplayError {
            ply: 3,
            source: RulesError::InvalidMove {
                san: "??".to_string(),
                reason: "scripted".to_string(),
            },
        }));
        plies.extend(scripted_plies(&rules, &["q", "q"]));

        let mistakes = detect_mistakes(&rules, plies, Side::White, &DetectorConfig::default());

        assert_eq!(mistakes.len(), 1);
    }
}
