pub mod fen;
pub mod score;
pub mod types;
pub mod uci;

pub use fen::{epd_key, legal_reply_count, parse_fen, side_to_move, FenError};
pub use score::EngineScore;
pub use types::PlayerColor;
pub use uci::{format_uci_move, parse_uci_move, UciMoveError};
