//! Engine-notation (UCI) move codec over cozy-chess types.

use cozy_chess::{File, Move, Piece, Rank, Square};

#[derive(Debug, thiserror::Error)]
pub enum UciMoveError {
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
}

/// Parse engine move notation (e2e4, e7e8q).
pub fn parse_uci_move(s: &str) -> Result<Move, UciMoveError> {
    if s.len() < 4 || s.len() > 5 {
        return Err(UciMoveError::InvalidMove(s.to_string()));
    }

    let from = parse_square(&s[0..2])?;
    let to = parse_square(&s[2..4])?;

    let promotion = if s.len() == 5 {
        Some(match &s[4..5] {
            "q" => Piece::Queen,
            "r" => Piece::Rook,
            "b" => Piece::Bishop,
            "n" => Piece::Knight,
            _ => return Err(UciMoveError::InvalidPromotion(s.to_string())),
        })
    } else {
        None
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

fn parse_square(s: &str) -> Result<Square, UciMoveError> {
    let mut chars = s.chars();

    let file = chars
        .next()
        .and_then(|c| (c as usize).checked_sub('a' as usize))
        .and_then(File::try_index)
        .ok_or_else(|| UciMoveError::InvalidSquare(s.to_string()))?;

    let rank = chars
        .next()
        .and_then(|c| (c as usize).checked_sub('1' as usize))
        .and_then(Rank::try_index)
        .ok_or_else(|| UciMoveError::InvalidSquare(s.to_string()))?;

    Ok(Square::new(file, rank))
}

/// Format a move in engine notation (cozy-chess Move → "e2e4").
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(match promo {
            Piece::Queen => 'q',
            Piece::Rook => 'r',
            Piece::Bishop => 'b',
            Piece::Knight => 'n',
            _ => unreachable!(),
        });
    }
    s
}

fn format_square(sq: Square) -> String {
    let file = (b'a' + sq.file() as u8) as char;
    let rank = (b'1' + sq.rank() as u8) as char;
    format!("{}{}", file, rank)
}
