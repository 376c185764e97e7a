//! Perspective normalization for engine scores.
//!
//! Engines report scores relative to whichever side is to move. To compare
//! two independently-run searches, both scores are first converted into a
//! fixed frame (white advantage positive), then re-signed for the player
//! being judged.

use chess::EngineScore;
use cozy_chess::Color;

/// Convert a side-to-move-relative score into the fixed white-positive
/// frame, in centipawns. `None` in, `None` out.
pub fn normalize_score(score: Option<EngineScore>, side_to_move: Color) -> Option<i32> {
    let cp = score?.to_cp();
    Some(match side_to_move {
        Color::White => cp,
        Color::Black => -cp,
    })
}

/// Centipawns from `player`'s point of view: positive always means good
/// for that player.
pub fn score_for_player(
    score: Option<EngineScore>,
    side_to_move: Color,
    player: Color,
) -> Option<i32> {
    let white_cp = normalize_score(score, side_to_move)?;
    Some(match player {
        Color::White => white_cp,
        Color::Black => -white_cp,
    })
}

/// Inputs for a best-vs-played comparison.
///
/// Both scores must be evaluations of the position *after* the respective
/// move was made, reported from the viewpoint of `side_to_move` (the
/// opponent of `player` at search time). Feeding in a pre-move
/// principal-variation score instead compares searches run to different
/// depths and flags good moves as blunders.
#[derive(Debug, Clone)]
pub struct MoveComparison<'a> {
    pub best_move: &'a str,
    pub played_move: &'a str,
    pub post_played_score: Option<EngineScore>,
    pub post_best_score: Option<EngineScore>,
    /// Side to move in the searched post-move positions.
    pub side_to_move: Color,
    pub player: Color,
}

/// Evaluations of the best and played moves in the player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveReport {
    pub best_eval: Option<i32>,
    pub played_eval: Option<i32>,
    pub delta: Option<i32>,
}

/// Compare the played move against the engine's best move.
///
/// When the played move *is* the best move, the single post-move score is
/// reused for both evaluations, so `delta == 0` holds by construction
/// rather than by two searches happening to agree.
pub fn compute_move_report(cmp: &MoveComparison) -> MoveReport {
    if cmp.best_move == cmp.played_move {
        let eval = score_for_player(cmp.post_played_score, cmp.side_to_move, cmp.player);
        return MoveReport {
            best_eval: eval,
            played_eval: eval,
            delta: eval.map(|_| 0),
        };
    }

    let best_eval = score_for_player(cmp.post_best_score, cmp.side_to_move, cmp.player);
    let played_eval = score_for_player(cmp.post_played_score, cmp.side_to_move, cmp.player);
    let delta = match (best_eval, played_eval) {
        (Some(best), Some(played)) => Some(best - played),
        _ => None,
    };

    MoveReport {
        best_eval,
        played_eval,
        delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalize_keeps_white_to_move() {
        assert_eq!(
            normalize_score(Some(EngineScore::Centipawns(35)), Color::White),
            Some(35)
        );
    }

    #[test]
    fn normalize_negates_black_to_move() {
        assert_eq!(
            normalize_score(Some(EngineScore::Centipawns(35)), Color::Black),
            Some(-35)
        );
    }

    #[test]
    fn normalize_passes_none_through() {
        assert_eq!(normalize_score(None, Color::White), None);
        assert_eq!(normalize_score(None, Color::Black), None);
    }

    #[test]
    fn score_for_black_player() {
        // Black to move, -29 for black means white is up 29; from black's
        // view that is -29 again.
        assert_eq!(
            score_for_player(
                Some(EngineScore::Centipawns(-29)),
                Color::Black,
                Color::Black
            ),
            Some(-29)
        );
        assert_eq!(
            score_for_player(
                Some(EngineScore::Centipawns(-29)),
                Color::Black,
                Color::White
            ),
            Some(29)
        );
    }

    #[test]
    fn same_move_reuses_one_score() {
        // Startpos, white plays the engine's best move e2e4; the post-move
        // search answers -29 from black's perspective.
        let report = compute_move_report(&MoveComparison {
            best_move: "e2e4",
            played_move: "e2e4",
            post_played_score: Some(EngineScore::Centipawns(-29)),
            // A second sample of the same position would never be consulted.
            post_best_score: Some(EngineScore::Centipawns(-45)),
            side_to_move: Color::Black,
            player: Color::White,
        });
        assert_eq!(report.best_eval, Some(29));
        assert_eq!(report.played_eval, Some(29));
        assert_eq!(report.delta, Some(0));
    }

    #[test]
    fn differing_moves_compare_post_move_scores() {
        let report = compute_move_report(&MoveComparison {
            best_move: "d2d4",
            played_move: "e2e4",
            post_played_score: Some(EngineScore::Centipawns(-20)),
            post_best_score: Some(EngineScore::Centipawns(-30)),
            side_to_move: Color::Black,
            player: Color::White,
        });
        assert_eq!(report.best_eval, Some(30));
        assert_eq!(report.played_eval, Some(20));
        assert_eq!(report.delta, Some(10));
    }

    #[test]
    fn missing_score_yields_null_delta() {
        let report = compute_move_report(&MoveComparison {
            best_move: "d2d4",
            played_move: "e2e4",
            post_played_score: None,
            post_best_score: Some(EngineScore::Centipawns(-30)),
            side_to_move: Color::Black,
            player: Color::White,
        });
        assert_eq!(report.best_eval, Some(30));
        assert_eq!(report.played_eval, None);
        assert_eq!(report.delta, None);
    }

    #[test]
    fn mate_scores_flow_through_perspective() {
        // White just walked into mate in 2: the post-move search, from
        // black's perspective, reports Mate(2).
        let eval = score_for_player(Some(EngineScore::Mate(2)), Color::Black, Color::White);
        assert!(eval.unwrap() < -20_000);
    }

    proptest! {
        #[test]
        fn double_negation_round_trips(cp in -25_000i32..=25_000) {
            let white = normalize_score(Some(EngineScore::Centipawns(cp)), Color::Black).unwrap();
            let back = normalize_score(Some(EngineScore::Centipawns(white)), Color::Black).unwrap();
            prop_assert_eq!(back, cp);
        }

        #[test]
        fn identical_moves_always_zero_delta(
            played in -25_000i32..=25_000,
            best in -25_000i32..=25_000,
        ) {
            // The construction-level guarantee: no pair of raw samples can
            // manufacture a non-zero delta for the same move.
            let report = compute_move_report(&MoveComparison {
                best_move: "g1f3",
                played_move: "g1f3",
                post_played_score: Some(EngineScore::Centipawns(played)),
                post_best_score: Some(EngineScore::Centipawns(best)),
                side_to_move: Color::Black,
                player: Color::White,
            });
            prop_assert_eq!(report.delta, Some(0));
        }
    }
}
