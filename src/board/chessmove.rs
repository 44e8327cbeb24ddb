use std::fmt;

use super::piece::Piece;
use super::square::Square;

/// A move, carrying everything make/unmake and the move-ordering layer need
/// without re-probing the board: the moving kind, the captured kind (if any)
/// and the promotion target.
///
/// Castling and en passant are implied: a king moving two files castles, a
/// pawn capturing onto an empty square captures en passant. No flag bits.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub capture: Option<Piece>,
    pub promotion: Option<Piece>,
}

impl Move {
    #[inline]
    pub fn new(from: Square, to: Square, piece: Piece, capture: Option<Piece>) -> Self {
        Move { from, to, piece, capture, promotion: None }
    }

    #[inline]
    pub fn promoting(
        from: Square,
        to: Square,
        capture: Option<Piece>,
        promotion: Piece,
    ) -> Self {
        Move { from, to, piece: Piece::Pawn, capture, promotion: Some(promotion) }
    }

    #[inline]
    pub fn is_capture(self) -> bool {
        self.capture.is_some()
    }

    #[inline]
    pub fn is_promotion(self) -> bool {
        self.promotion.is_some()
    }

    /// True for a king move of two files, which is how castling is encoded.
    #[inline]
    pub fn is_castling(self) -> bool {
        self.piece == Piece::King && self.from.file().abs_diff(self.to.file()) == 2
    }

    /// UCI long algebraic form: "e2e4", "e7e8q".
    pub fn to_uci(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promo) = self.promotion {
            write!(f, "{}", promo.to_char())?;
        }
        Ok(())
    }
}
