use super::config::{DetectorConfig, PuzzleTemplate};
use super::mistakes::detect_mistakes;
use super::replay::Replayer;
use super::rules::ChessRules;
use super::types::{GameRecord, MistakeRecord, PuzzleSet};

/// Collects the first three missed captures by `username` across `games`,
/// in game order, padding from `template` when fewer are found.
///
/// Games after the third mistake are never replayed.
pub fn collect_puzzles<R: ChessRules>(
    rules: &R,
    games: &[GameRecord],
    username: &str,
    detector: &DetectorConfig,
    template: &PuzzleTemplate,
) -> PuzzleSet {
    let mut found: Vec<MistakeRecord> = Vec::with_capacity(PuzzleSet::LEN);

    for game in games {
        if found.len() >= PuzzleSet::LEN {
            break;
        }

        if let Some(err) = game.parse_error.as_deref() {
            tracing::warn!(game = game.label(), "{err}, skipping game");
            continue;
        }

        let replayer = Replayer::new(rules, game);
        if replayer.is_empty() {
            tracing::debug!(game = game.label(), "No moves to replay");
            continue;
        }

        let side = game.side_of(username);
        let mistakes = detect_mistakes(rules, replayer.plies(), side, detector);
        tracing::debug!(
            game = game.label(),
            side = %side,
            mistakes = mistakes.len(),
            "Scanned game"
        );
        found.extend(mistakes);
    }

    let padded = PuzzleSet::LEN.saturating_sub(found.len());
    if padded > 0 {
        tracing::info!(
            found = found.len(),
            padded,
            "Padding puzzle set with template"
        );
    }

    PuzzleSet::from_records(found, || template.record(rules))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::rules::ShakmatyRules;
    use crate::chess::types::Side;

    fn game(white: &str, black: &str, movetext: &str) -> GameRecord {
        GameRecord {
            white: Some(white.to_string()),
            black: Some(black.to_string()),
            movetext: movetext.to_string(),
            ..GameRecord::default()
        }
    }

    fn collect(games: &[GameRecord], username: &str) -> PuzzleSet {
        collect_puzzles(
            &ShakmatyRules,
            games,
            username,
            &DetectorConfig::default(),
            &PuzzleTemplate::default(),
        )
    }

    fn real(set: &PuzzleSet) -> usize {
        set.iter().filter(|p| p.player_move != "N/A").count()
    }

    // One missed capture for White (2. Nc3).
    const ONE_WHITE_MISS: &str = "1. e4 d5 2. Nc3";
    // One missed capture for Black (2... Nc6).
    const ONE_BLACK_MISS: &str = "1. e4 e5 2. d4 Nc6";
    // Four missed captures for White.
    const FOUR_WHITE_MISSES: &str = "1. e4 d5 2. Nc3 Nf6 3. Nf3 e6 4. d3 Bb4 5. a3";

    #[test]
    fn test_zero_games_gives_three_identical_defaults() {
        let set = collect(&[], "anyone");
        let default = PuzzleTemplate::default().record(&ShakmatyRules);

        assert_eq!(set.as_slice().len(), 3);
        assert!(set.iter().all(|p| *p == default));
    }

    #[test]
    fn test_always_three_records() {
        let cases = [
            (vec![game("bob", "carol", "1. e4 e5")], 0),
            (vec![game("alice", "bob", ONE_WHITE_MISS)], 1),
            (
                vec![
                    game("alice", "bob", ONE_WHITE_MISS),
                    game("bob", "alice", ONE_BLACK_MISS),
                ],
                2,
            ),
            (vec![game("alice", "bob", FOUR_WHITE_MISSES)], 3),
        ];

        for (games, expected_real) in cases {
            let set = collect(&games, "alice");
            assert_eq!(set.as_slice().len(), 3);
            assert_eq!(real(&set), expected_real);
        }
    }

    #[test]
    fn test_username_match_is_case_insensitive_and_picks_side() {
        // As Black, "ALICE" misses exd4; White's quiet moves are ignored.
        let set = collect(&[game("bob", "alice", ONE_BLACK_MISS)], "ALICE");

        assert_eq!(set.as_slice()[0].player_move, "Nc6");
        assert_eq!(set.as_slice()[0].best_moves, vec!["exd4"]);
        assert_eq!(real(&set), 1);
    }

    #[test]
    fn test_later_games_are_not_consumed_after_three() {
        let games = vec![
            game("alice", "bob", FOUR_WHITE_MISSES),
            game("bob", "alice", ONE_BLACK_MISS),
        ];
        let set = collect(&games, "alice");

        let moves: Vec<_> = set.iter().map(|p| p.player_move.as_str()).collect();
        assert_eq!(moves, vec!["Nc3", "Nf3", "d3"]);
    }

    #[test]
    fn test_results_follow_game_order() {
        let games = vec![
            game("bob", "alice", ONE_BLACK_MISS),
            game("alice", "bob", ONE_WHITE_MISS),
        ];
        let set = collect(&games, "alice");

        assert_eq!(set.as_slice()[0].player_move, "Nc6");
        assert_eq!(set.as_slice()[1].player_move, "Nc3");
        assert_eq!(set.as_slice()[2].player_move, "N/A");
    }

    #[test]
    fn test_unreadable_games_are_skipped() {
        let broken = GameRecord {
            parse_error: Some("Missing moves".to_string()),
            ..game("alice", "bob", "")
        };
        let garbage = game("alice", "bob", "[Event \"unterminated");
        let good = game("alice", "bob", ONE_WHITE_MISS);

        let set = collect(&[broken, garbage, good], "alice");

        assert_eq!(set.as_slice()[0].player_move, "Nc3");
        assert_eq!(real(&set), 1);
    }

    #[test]
    fn test_record_with_read_diagnostic_is_skipped() {
        let chess960 = GameRecord {
            parse_error: Some("Unsupported variant: Variant='Chess960'".to_string()),
            ..game("alice", "bob", ONE_WHITE_MISS)
        };

        assert_eq!(real(&collect(&[chess960], "alice")), 0);
    }

    #[test]
    fn test_custom_template_pads() {
        let template = PuzzleTemplate {
            hint: "Rest day".to_string(),
            ..PuzzleTemplate::default()
        };
        let set = collect_puzzles(
            &ShakmatyRules,
            &[game("alice", "bob", ONE_WHITE_MISS)],
            "alice",
            &DetectorConfig::default(),
            &template,
        );

        assert_eq!(set.as_slice()[0].hint, "Look for tactical opportunities");
        assert_eq!(set.as_slice()[1].hint, "Rest day");
        assert_eq!(set.as_slice()[2].hint, "Rest day");
    }

    #[test]
    fn test_player_side_helper_defaults_to_black() {
        let unknown = game("bob", "carol", "1. e4");
        assert_eq!(unknown.side_of("alice"), Side::Black);
    }
}
