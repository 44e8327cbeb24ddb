pub mod attacks;
mod bitboard;
mod chessmove;
pub mod movegen;
mod piece;
mod position;
mod square;
pub mod zobrist;

pub use bitboard::{BitBoard, EMPTY};
pub use chessmove::Move;
pub use piece::{Color, Piece};
pub use position::{BK, BQ, NullUndo, Position, START_FEN, UndoRecord, WK, WQ};
pub use square::Square;
