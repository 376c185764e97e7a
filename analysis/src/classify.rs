//! Discrete quality scales over a best-vs-played centipawn delta.
//!
//! Two scales coexist and are not interchangeable: the live scale keeps a
//! `Great` bucket for negative deltas (the played move out-performed the
//! best-move search), while the session scale floors negatives to `Best`
//! and inserts a `Mistake` tier for post-game reporting.

use serde::{Deserialize, Serialize};

/// Delta at or above which a move is recorded as a blunder.
pub const BLUNDER_THRESHOLD: i32 = 150;

/// Extra threshold centipawns granted per centipawn the player was already
/// down before the move. A slip matters less in a lost position.
pub const LOSING_TOLERANCE: f64 = 0.1;

/// Full-move cutoff past which moves are not recorded as blunders; deep
/// positions give low-signal deltas.
pub const RECORDING_MOVE_CAP: u32 = 40;

/// Live in-game annotation scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveQuality {
    /// Out-performed the best-move search (negative delta).
    Great,
    /// Matched the best move exactly.
    Best,
    /// Within 50 cp of best.
    Good,
    /// 50-149 cp worse than best.
    Inaccuracy,
    /// 150+ cp worse than best.
    Blunder,
}

/// Post-game report scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMoveQuality {
    Best,
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
}

/// Classify a delta on the live scale. `None` (no evaluation) stays `None`.
pub fn classify_move(delta: Option<i32>) -> Option<MoveQuality> {
    let delta = delta?;
    Some(match delta {
        d if d < 0 => MoveQuality::Great,
        0 => MoveQuality::Best,
        1..=49 => MoveQuality::Good,
        50..=149 => MoveQuality::Inaccuracy,
        _ => MoveQuality::Blunder,
    })
}

/// Classify a delta on the session scale. Negative deltas floor to `Best`.
pub fn classify_session_move(delta: Option<i32>) -> Option<SessionMoveQuality> {
    let delta = delta?;
    Some(match delta {
        d if d <= 0 => SessionMoveQuality::Best,
        1..=10 => SessionMoveQuality::Excellent,
        11..=50 => SessionMoveQuality::Good,
        51..=100 => SessionMoveQuality::Inaccuracy,
        101..=149 => SessionMoveQuality::Mistake,
        _ => SessionMoveQuality::Blunder,
    })
}

/// Whether a delta counts as a recordable blunder.
///
/// `pre_eval` is the player-perspective evaluation before the move. When
/// the player was already losing, the threshold scales up by
/// [`LOSING_TOLERANCE`] per centipawn of disadvantage. A `None` delta is
/// never a blunder.
pub fn is_blunder(delta: Option<i32>, pre_eval: Option<i32>) -> bool {
    let Some(delta) = delta else {
        return false;
    };
    let threshold = match pre_eval {
        Some(pre) if pre < 0 => f64::from(BLUNDER_THRESHOLD) + LOSING_TOLERANCE * f64::from(-pre),
        _ => f64::from(BLUNDER_THRESHOLD),
    };
    f64::from(delta) >= threshold
}

/// Whether a ply index is inside the default recording window.
/// `None` and negative indices never are.
pub fn is_within_recording_cap(move_index: Option<i64>) -> bool {
    is_within_recording_cap_at(move_index, RECORDING_MOVE_CAP)
}

/// Recording-window check against an explicit full-move cap.
pub fn is_within_recording_cap_at(move_index: Option<i64>, cap_full_moves: u32) -> bool {
    match move_index {
        Some(i) if i >= 0 => (i as u64) < u64::from(cap_full_moves) * 2,
        _ => false,
    }
}
