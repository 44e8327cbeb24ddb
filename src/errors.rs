//! Public error taxonomy.
//!
//! Only FEN parsing surfaces errors to callers. "No legal moves" is
//! structural (`choose_move` returns `None`), search timeouts are absorbed
//! into the decision report, and a missing or empty opening book simply
//! leaves its report flags unset.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("FEN needs at least 4 fields, got {0}")]
    FieldCount(usize),
    #[error("invalid piece character '{0}' in placement field")]
    InvalidPiece(char),
    #[error("placement field walks off the board")]
    PlacementOverflow,
    #[error("invalid active color '{0}'")]
    InvalidActiveColor(String),
    #[error("invalid castling character '{0}'")]
    InvalidCastling(char),
    #[error("invalid en passant target '{0}'")]
    InvalidEnPassant(String),
    #[error("invalid clock field '{0}'")]
    InvalidClock(String),
    #[error("each side needs exactly one king (found {white} white, {black} black)")]
    KingCount { white: u32, black: u32 },
}
