//! Engine evaluation scores, always relative to the side to move.

use serde::{Deserialize, Serialize};

/// Centipawn proxy for a forced mate. Large enough that any mate outranks
/// any material evaluation an engine will realistically report.
pub const MATE_BASE: i32 = 30_000;

/// Per-move decay applied to the mate proxy, so nearer mates score higher.
pub const MATE_DECAY: i32 = 100;

/// Engine evaluation score.
///
/// Centipawns: positive = side-to-move is better.
/// Mate: positive N = side-to-move mates in N moves,
/// negative N = side-to-move gets mated in N moves.
/// `Mate(0)` means the side to move is already checkmated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineScore {
    Centipawns(i32),
    Mate(i32),
}

impl EngineScore {
    /// Convert to centipawns for comparison. Mate scores map to
    /// `sign(N) * (MATE_BASE - |N| * MATE_DECAY)`; `Mate(0)` is the
    /// mated-right-now case and maps to `-MATE_BASE`.
    pub fn to_cp(&self) -> i32 {
        match self {
            Self::Centipawns(cp) => *cp,
            Self::Mate(m) if *m > 0 => MATE_BASE - m * MATE_DECAY,
            Self::Mate(m) => -(MATE_BASE - m.abs() * MATE_DECAY),
        }
    }

    /// Negate the score (flip perspective).
    pub fn negate(&self) -> Self {
        match self {
            Self::Centipawns(cp) => Self::Centipawns(-cp),
            Self::Mate(m) => Self::Mate(-m),
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Centipawns(cp) => format!("{:+.2}", *cp as f64 / 100.0),
            Self::Mate(m) => {
                if *m > 0 {
                    format!("+M{}", m)
                } else {
                    format!("-M{}", m.abs())
                }
            }
        }
    }
}

impl std::fmt::Display for EngineScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
