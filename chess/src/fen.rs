//! FEN parsing and position-identity helpers.

use cozy_chess::{Board, Color};

/// FEN fields that identify a position: placement, side to move, castling,
/// en passant. The halfmove clock and fullmove number are bookkeeping only.
const EPD_FIELDS: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format")]
    InvalidFormat,
    #[error("FEN has no side-to-move field")]
    MissingSideToMove,
}

/// Parse a FEN string into a Board.
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    fen.parse().map_err(|_| FenError::InvalidFormat)
}

/// Extract the side to move from a FEN string.
///
/// Fails when the second field is absent or is neither `w` nor `b`.
pub fn side_to_move(fen: &str) -> Result<Color, FenError> {
    match fen.split_whitespace().nth(1) {
        Some("w") => Ok(Color::White),
        Some("b") => Ok(Color::Black),
        _ => Err(FenError::MissingSideToMove),
    }
}

/// Reduce a FEN to its normalized position key: the first four fields,
/// with the halfmove clock and fullmove number stripped. Two positions
/// reached by different move orders (transpositions) compare equal under
/// this key.
pub fn epd_key(fen: &str) -> Result<String, FenError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() < EPD_FIELDS {
        return Err(FenError::InvalidFormat);
    }
    side_to_move(fen)?;
    Ok(fields[..EPD_FIELDS].join(" "))
}

/// Number of legal moves in the position, or `None` if the FEN does not
/// parse. Zero means checkmate or stalemate.
pub fn legal_reply_count(fen: &str) -> Option<usize> {
    let board: Board = fen.parse().ok()?;
    let mut count = 0;
    board.generate_moves(|moves| {
        count += moves.len();
        false
    });
    Some(count)
}
