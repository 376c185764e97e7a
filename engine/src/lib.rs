pub mod oracle;
pub mod uci;

pub use oracle::{Oracle, OracleConfig, SearchLimits, SearchOracle};
pub use uci::{parse_uci_line, InfoLine, UciLine};

use chess::EngineScore;

/// Errors from the search oracle adapter.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("search engine executable not found")]
    ExecutableNotFound,
    #[error("failed to spawn search engine: {0}")]
    Spawn(std::io::Error),
    #[error("timed out waiting for engine handshake")]
    BootTimeout,
    #[error("engine closed before completing handshake")]
    BootClosed,
    #[error("engine process closed")]
    EngineClosed,
}

/// Terminal result of one search: the engine's best move (engine notation,
/// `None` when the position has no legal replies) and the most recent
/// score observed for that search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub best_move: Option<String>,
    pub score: Option<EngineScore>,
}
