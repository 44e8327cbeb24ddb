use std::fmt;

use super::bitboard::{BitBoard, EMPTY};
use super::chessmove::Move;
use super::movegen;
use super::piece::{Color, Piece};
use super::square::Square;
use super::zobrist;
use crate::errors::FenError;

/// Castling rights, one bit each.
pub const WK: u8 = 1;
pub const WQ: u8 = 2;
pub const BK: u8 = 4;
pub const BQ: u8 = 8;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Everything needed to reverse one ply in O(1). The bit toggles are
/// replayed backwards; the scalar state is restored by value.
#[derive(Clone, Copy, Debug)]
pub struct UndoRecord {
    pub mv: Move,
    captured: Option<Piece>,
    ep_capture: Option<Square>,
    rook_hop: Option<(Square, Square)>,
    promoted: Option<Piece>,
    prev_ep: Option<Square>,
    prev_castling: u8,
    prev_halfmove: u32,
    prev_zobrist: u64,
}

/// The authoritative game state: per-color-per-kind bitboards, a redundant
/// mailbox for O(1) square lookups, castling/EP/clock state, an
/// incrementally maintained Zobrist key, and the undo stack.
#[derive(Clone, Debug)]
pub struct Position {
    piece_bb: [[BitBoard; 6]; 2],
    side_bb: [BitBoard; 2],
    mailbox: [Option<Piece>; 64],
    side_to_move: Color,
    castling: u8,
    ep_square: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    zobrist: u64,
    history: Vec<UndoRecord>,
}

// When any piece moves from or to square X, castling rights are ANDed with
// CASTLING_MASK[X]. King and rook home squares clear their bits; a rook
// captured on its corner loses the right through the destination mask.
const CASTLING_MASK: [u8; 64] = {
    let mut mask = [0xFFu8; 64];
    mask[0] = 0xFF ^ WQ; // a1
    mask[4] = 0xFF ^ (WK | WQ); // e1
    mask[7] = 0xFF ^ WK; // h1
    mask[56] = 0xFF ^ BQ; // a8
    mask[60] = 0xFF ^ (BK | BQ); // e8
    mask[63] = 0xFF ^ BK; // h8
    mask
};

impl Position {
    /// The standard starting position.
    pub fn new() -> Self {
        Position::from_fen(START_FEN).expect("start FEN is valid")
    }

    // --- accessors ---

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.mailbox[sq.index()]
    }

    #[inline]
    pub fn color_on(&self, sq: Square) -> Option<Color> {
        if self.side_bb[Color::White.index()].contains(sq) {
            Some(Color::White)
        } else if self.side_bb[Color::Black.index()].contains(sq) {
            Some(Color::Black)
        } else {
            None
        }
    }

    #[inline]
    pub fn pieces(&self, color: Color, piece: Piece) -> BitBoard {
        self.piece_bb[color.index()][piece.index()]
    }

    #[inline]
    pub fn side(&self, color: Color) -> BitBoard {
        self.side_bb[color.index()]
    }

    #[inline]
    pub fn occupied(&self) -> BitBoard {
        self.side_bb[0] | self.side_bb[1]
    }

    #[inline]
    pub fn castling_rights(&self) -> u8 {
        self.castling
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.ep_square
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[inline]
    pub fn zobrist(&self) -> u64 {
        self.zobrist
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(color, Piece::King).lsb()
    }

    /// Half-moves played since the game started.
    #[inline]
    pub fn ply(&self) -> u32 {
        (self.fullmove_number - 1) * 2 + self.side_to_move.index() as u32
    }

    /// How often the current position has occurred over the game, counting
    /// the present occurrence. Keys are compared, not full states.
    pub fn repetitions(&self) -> u32 {
        let mut count = 1;
        for undo in &self.history {
            if undo.prev_zobrist == self.zobrist {
                count += 1;
            }
        }
        count
    }

    /// Is `color`'s king attacked right now?
    pub fn in_check_of(&self, color: Color) -> bool {
        match self.king_square(color) {
            Some(king) => movegen::is_square_attacked(self, king, !color),
            None => false,
        }
    }

    /// Is the side to move in check?
    pub fn is_in_check(&self) -> bool {
        self.in_check_of(self.side_to_move)
    }

    /// All legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut scratch = self.clone();
        movegen::legal_moves(&mut scratch)
    }

    /// Resolve a UCI long-algebraic string ("e2e4", "e7e8q") against the
    /// current legal moves.
    pub fn parse_uci(&self, uci: &str) -> Option<Move> {
        self.legal_moves().into_iter().find(|mv| mv.to_string() == uci)
    }

    // --- make / unmake ---

    #[inline]
    fn toggle(&mut self, color: Color, piece: Piece, sq: Square) {
        self.piece_bb[color.index()][piece.index()].toggle(sq);
        self.side_bb[color.index()].toggle(sq);
    }

    /// Play `mv`. The move must come from this position's move generator
    /// (pseudo-legal at minimum); basic agreement with the board is a debug
    /// assertion, full legality is the caller's contract.
    pub fn make(&mut self, mv: Move) {
        let us = self.side_to_move;
        let them = !us;
        debug_assert_eq!(self.mailbox[mv.from.index()], Some(mv.piece));
        debug_assert!(self.side_bb[us.index()].contains(mv.from));

        let mut undo = UndoRecord {
            mv,
            captured: None,
            ep_capture: None,
            rook_hop: None,
            promoted: None,
            prev_ep: self.ep_square,
            prev_castling: self.castling,
            prev_halfmove: self.halfmove_clock,
            prev_zobrist: self.zobrist,
        };

        // lift the mover off its source square
        self.toggle(us, mv.piece, mv.from);
        self.zobrist ^= zobrist::piece_key(us.index(), mv.piece.index(), mv.from.index());
        self.mailbox[mv.from.index()] = None;

        let mut reset_clock = mv.piece == Piece::Pawn;

        // a pawn capturing onto the EP square takes the pawn beside it
        let is_ep = mv.piece == Piece::Pawn
            && undo.prev_ep == Some(mv.to)
            && self.mailbox[mv.to.index()].is_none();
        if is_ep {
            let cap_sq = Square::from_coords(mv.from.rank(), mv.to.file());
            self.toggle(them, Piece::Pawn, cap_sq);
            self.zobrist ^= zobrist::piece_key(them.index(), Piece::Pawn.index(), cap_sq.index());
            self.mailbox[cap_sq.index()] = None;
            undo.ep_capture = Some(cap_sq);
        } else if let Some(captured) = self.mailbox[mv.to.index()] {
            self.toggle(them, captured, mv.to);
            self.zobrist ^= zobrist::piece_key(them.index(), captured.index(), mv.to.index());
            undo.captured = Some(captured);
            reset_clock = true;
        }

        // a double push opens an EP window behind the pawn
        let mut new_ep = None;
        if mv.piece == Piece::Pawn && mv.from.rank().abs_diff(mv.to.rank()) == 2 {
            new_ep = Some(Square::from_coords((mv.from.rank() + mv.to.rank()) / 2, mv.from.file()));
        }

        // castling also hops the rook
        if mv.is_castling() {
            let rank = us.back_rank();
            let (rook_from, rook_to) = if mv.to.file() == 6 {
                (Square::from_coords(rank, 7), Square::from_coords(rank, 5))
            } else {
                (Square::from_coords(rank, 0), Square::from_coords(rank, 3))
            };
            self.toggle(us, Piece::Rook, rook_from);
            self.toggle(us, Piece::Rook, rook_to);
            self.zobrist ^= zobrist::piece_key(us.index(), Piece::Rook.index(), rook_from.index());
            self.zobrist ^= zobrist::piece_key(us.index(), Piece::Rook.index(), rook_to.index());
            self.mailbox[rook_from.index()] = None;
            self.mailbox[rook_to.index()] = Some(Piece::Rook);
            undo.rook_hop = Some((rook_from, rook_to));
        }

        let new_castling =
            self.castling & CASTLING_MASK[mv.from.index()] & CASTLING_MASK[mv.to.index()];

        // drop the piece, promoted if a pawn reached the last rank
        let final_kind = if mv.piece == Piece::Pawn && mv.to.rank() == us.promotion_rank() {
            let kind = mv.promotion.unwrap_or(Piece::Queen);
            undo.promoted = Some(kind);
            kind
        } else {
            mv.piece
        };
        self.toggle(us, final_kind, mv.to);
        self.zobrist ^= zobrist::piece_key(us.index(), final_kind.index(), mv.to.index());
        self.mailbox[mv.to.index()] = Some(final_kind);

        // state seeds: XOR the old contribution out, the new one in
        self.zobrist ^= zobrist::ep_key(zobrist::ep_index(self.ep_square));
        self.zobrist ^= zobrist::ep_key(zobrist::ep_index(new_ep));
        self.ep_square = new_ep;

        self.zobrist ^= zobrist::castling_key(self.castling);
        self.zobrist ^= zobrist::castling_key(new_castling);
        self.castling = new_castling;

        self.zobrist ^= zobrist::side_key(us.index());
        self.zobrist ^= zobrist::side_key(them.index());

        if reset_clock {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = them;
        self.history.push(undo);
    }

    /// Reverse the most recent `make`. No-op on an empty history.
    pub fn unmake(&mut self) {
        let Some(undo) = self.history.pop() else {
            return;
        };
        let mv = undo.mv;
        let us = !self.side_to_move;
        let them = self.side_to_move;

        // lift whatever landed on the destination, put the mover back
        let final_kind = undo.promoted.unwrap_or(mv.piece);
        self.toggle(us, final_kind, mv.to);
        self.mailbox[mv.to.index()] = None;
        self.toggle(us, mv.piece, mv.from);
        self.mailbox[mv.from.index()] = Some(mv.piece);

        if let Some(captured) = undo.captured {
            self.toggle(them, captured, mv.to);
            self.mailbox[mv.to.index()] = Some(captured);
        }
        if let Some(cap_sq) = undo.ep_capture {
            self.toggle(them, Piece::Pawn, cap_sq);
            self.mailbox[cap_sq.index()] = Some(Piece::Pawn);
        }
        if let Some((rook_from, rook_to)) = undo.rook_hop {
            self.toggle(us, Piece::Rook, rook_to);
            self.toggle(us, Piece::Rook, rook_from);
            self.mailbox[rook_to.index()] = None;
            self.mailbox[rook_from.index()] = Some(Piece::Rook);
        }

        self.ep_square = undo.prev_ep;
        self.castling = undo.prev_castling;
        self.halfmove_clock = undo.prev_halfmove;
        self.zobrist = undo.prev_zobrist;
        if us == Color::Black {
            self.fullmove_number -= 1;
        }
        self.side_to_move = us;
    }

    /// Pass the turn: flip side to move and close the EP window. Returns
    /// None while in check (a null move would be illegal there).
    pub fn make_null(&mut self) -> Option<NullUndo> {
        if self.is_in_check() {
            return None;
        }
        let undo = NullUndo { prev_ep: self.ep_square, prev_zobrist: self.zobrist };
        self.zobrist ^= zobrist::ep_key(zobrist::ep_index(self.ep_square));
        self.zobrist ^= zobrist::ep_key(zobrist::ep_index(None));
        self.ep_square = None;
        self.zobrist ^= zobrist::side_key(self.side_to_move.index());
        self.side_to_move = !self.side_to_move;
        self.zobrist ^= zobrist::side_key(self.side_to_move.index());
        Some(undo)
    }

    pub fn unmake_null(&mut self, undo: NullUndo) {
        self.side_to_move = !self.side_to_move;
        self.ep_square = undo.prev_ep;
        self.zobrist = undo.prev_zobrist;
    }

    /// Recompute the Zobrist key from nothing. Construction and sanity
    /// checks only; after every make/unmake the incremental key must equal
    /// this.
    pub fn zobrist_from_scratch(&self) -> u64 {
        let mut key = 0u64;
        for color in [Color::White, Color::Black] {
            for piece in Piece::ALL {
                for sq in self.pieces(color, piece).iter() {
                    key ^= zobrist::piece_key(color.index(), piece.index(), sq.index());
                }
            }
        }
        key ^= zobrist::castling_key(self.castling);
        key ^= zobrist::side_key(self.side_to_move.index());
        key ^= zobrist::ep_key(zobrist::ep_index(self.ep_square));
        key
    }

    // --- FEN ---

    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(FenError::FieldCount(parts.len()));
        }

        let mut piece_bb = [[EMPTY; 6]; 2];
        let mut side_bb = [EMPTY; 2];
        let mut mailbox = [None; 64];

        let mut rank = 7i32;
        let mut file = 0i32;
        for ch in parts[0].chars() {
            if ch == '/' {
                rank -= 1;
                file = 0;
                continue;
            }
            if let Some(skip) = ch.to_digit(10) {
                file += skip as i32;
                continue;
            }
            let piece = Piece::from_char(ch).ok_or(FenError::InvalidPiece(ch))?;
            let color = if ch.is_ascii_uppercase() { Color::White } else { Color::Black };
            if !(0..8).contains(&rank) || !(0..8).contains(&file) {
                return Err(FenError::PlacementOverflow);
            }
            let sq = Square::from_coords(rank as usize, file as usize);
            piece_bb[color.index()][piece.index()].set(sq);
            side_bb[color.index()].set(sq);
            mailbox[sq.index()] = Some(piece);
            file += 1;
        }

        let white_kings = piece_bb[Color::White.index()][Piece::King.index()].popcnt();
        let black_kings = piece_bb[Color::Black.index()][Piece::King.index()].popcnt();
        if white_kings != 1 || black_kings != 1 {
            return Err(FenError::KingCount { white: white_kings, black: black_kings });
        }

        let side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidActiveColor(other.to_string())),
        };

        let mut castling = 0u8;
        for ch in parts[2].chars() {
            match ch {
                'K' => castling |= WK,
                'Q' => castling |= WQ,
                'k' => castling |= BK,
                'q' => castling |= BQ,
                '-' => {}
                other => return Err(FenError::InvalidCastling(other)),
            }
        }

        let ep_square = if parts[3] == "-" {
            None
        } else {
            let sq = Square::parse(parts[3])
                .ok_or_else(|| FenError::InvalidEnPassant(parts[3].to_string()))?;
            if sq.rank() != 2 && sq.rank() != 5 {
                return Err(FenError::InvalidEnPassant(parts[3].to_string()));
            }
            Some(sq)
        };

        let halfmove_clock = match parts.get(4) {
            Some(s) => s.parse().map_err(|_| FenError::InvalidClock(s.to_string()))?,
            None => 0,
        };
        let fullmove_number: u32 = match parts.get(5) {
            Some(s) => s.parse().map_err(|_| FenError::InvalidClock(s.to_string()))?,
            None => 1,
        };
        // counting starts at 1; a zero here would underflow ply()
        let fullmove_number = fullmove_number.max(1);

        let mut pos = Position {
            piece_bb,
            side_bb,
            mailbox,
            side_to_move,
            castling,
            ep_square,
            halfmove_clock,
            fullmove_number,
            zobrist: 0,
            history: Vec::new(),
        };
        pos.zobrist = pos.zobrist_from_scratch();
        Ok(pos)
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(80);

        for rank in (0..8).rev() {
            let mut empty_run = 0;
            for file in 0..8 {
                let sq = Square::from_coords(rank, file);
                match self.piece_on(sq) {
                    Some(piece) => {
                        if empty_run > 0 {
                            fen.push(char::from_digit(empty_run, 10).unwrap_or('8'));
                            empty_run = 0;
                        }
                        let ch = piece.to_char();
                        if self.color_on(sq) == Some(Color::White) {
                            fen.push(ch.to_ascii_uppercase());
                        } else {
                            fen.push(ch);
                        }
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                fen.push(char::from_digit(empty_run, 10).unwrap_or('8'));
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.side_to_move == Color::White { 'w' } else { 'b' });

        fen.push(' ');
        if self.castling == 0 {
            fen.push('-');
        } else {
            if self.castling & WK != 0 {
                fen.push('K');
            }
            if self.castling & WQ != 0 {
                fen.push('Q');
            }
            if self.castling & BK != 0 {
                fen.push('k');
            }
            if self.castling & BQ != 0 {
                fen.push('q');
            }
        }

        fen.push(' ');
        match self.ep_square {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::new()
    }
}

/// Positions compare by game state, not by how they were reached: the undo
/// stack is excluded so a FEN round-trip restores equality.
impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.piece_bb == other.piece_bb
            && self.side_bb == other.side_bb
            && self.mailbox == other.mailbox
            && self.side_to_move == other.side_to_move
            && self.castling == other.castling
            && self.ep_square == other.ep_square
            && self.halfmove_clock == other.halfmove_clock
            && self.fullmove_number == other.fullmove_number
            && self.zobrist == other.zobrist
    }
}

impl Eq for Position {}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct NullUndo {
    prev_ep: Option<Square>,
    prev_zobrist: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    fn play(pos: &mut Position, uci: &str) {
        let mv = pos.parse_uci(uci).unwrap_or_else(|| panic!("{} not legal in {}", uci, pos));
        pos.make(mv);
    }

    #[test]
    fn start_position_state() {
        let pos = Position::new();
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.castling_rights(), WK | WQ | BK | BQ);
        assert_eq!(pos.en_passant(), None);
        assert_eq!(pos.piece_on(sq("e1")), Some(Piece::King));
        assert_eq!(pos.color_on(sq("e8")), Some(Color::Black));
        assert_eq!(pos.ply(), 0);
    }

    #[test]
    fn fen_roundtrip_startpos() {
        let pos = Position::new();
        assert_eq!(pos.to_fen(), START_FEN);
        assert_eq!(Position::from_fen(&pos.to_fen()).unwrap(), pos);
    }

    #[test]
    fn fen_rejects_garbage() {
        assert!(matches!(Position::from_fen("nonsense"), Err(FenError::FieldCount(1))));
        assert!(matches!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq - 0 1"),
            Err(FenError::InvalidPiece('X'))
        ));
        assert!(matches!(
            Position::from_fen("8/8/8/8/8/8/8/8 w - - 0 1"),
            Err(FenError::KingCount { white: 0, black: 0 })
        ));
        assert!(matches!(
            Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"),
            Err(FenError::InvalidActiveColor(_))
        ));
    }

    #[test]
    fn make_updates_board_and_clocks() {
        let mut pos = Position::new();
        play(&mut pos, "e2e4");
        assert_eq!(pos.piece_on(sq("e4")), Some(Piece::Pawn));
        assert_eq!(pos.piece_on(sq("e2")), None);
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(pos.en_passant(), Some(sq("e3")));
        assert_eq!(pos.halfmove_clock(), 0);
        assert_eq!(pos.fullmove_number(), 1);

        play(&mut pos, "g8f6");
        assert_eq!(pos.fullmove_number(), 2);
        assert_eq!(pos.en_passant(), None);
        assert_eq!(pos.halfmove_clock(), 1);
    }

    #[test]
    fn make_unmake_restores_everything() {
        let mut pos = Position::new();
        let before = pos.clone();
        for mv in pos.legal_moves() {
            pos.make(mv);
            pos.unmake();
            assert_eq!(pos, before, "make/unmake of {} did not restore state", mv);
            assert_eq!(pos.zobrist(), pos.zobrist_from_scratch());
        }
    }

    #[test]
    fn incremental_zobrist_matches_scratch_over_a_game() {
        let mut pos = Position::new();
        for uci in ["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6", "b5c6", "d7c6", "e1g1"] {
            play(&mut pos, uci);
            assert_eq!(pos.zobrist(), pos.zobrist_from_scratch(), "after {}", uci);
        }
    }

    #[test]
    fn castling_moves_the_rook() {
        let mut pos =
            Position::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        play(&mut pos, "e1g1");
        assert_eq!(pos.piece_on(sq("g1")), Some(Piece::King));
        assert_eq!(pos.piece_on(sq("f1")), Some(Piece::Rook));
        assert_eq!(pos.piece_on(sq("h1")), None);
        assert_eq!(pos.castling_rights() & (WK | WQ), 0);

        pos.unmake();
        assert_eq!(pos.piece_on(sq("e1")), Some(Piece::King));
        assert_eq!(pos.piece_on(sq("h1")), Some(Piece::Rook));
        assert_eq!(pos.castling_rights(), WK | WQ | BK | BQ);
    }

    #[test]
    fn queenside_castle_and_rights() {
        let mut pos =
            Position::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R b KQkq - 0 1").unwrap();
        play(&mut pos, "e8c8");
        assert_eq!(pos.piece_on(sq("c8")), Some(Piece::King));
        assert_eq!(pos.piece_on(sq("d8")), Some(Piece::Rook));
        assert_eq!(pos.castling_rights(), WK | WQ);
    }

    #[test]
    fn rook_move_clears_one_right() {
        let mut pos =
            Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        play(&mut pos, "a1a2");
        let fen = pos.to_fen();
        let castling_field: &str = fen.split_whitespace().nth(2).unwrap();
        assert_eq!(castling_field, "Kkq");
    }

    #[test]
    fn rook_capture_clears_opponent_right() {
        let mut pos =
            Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        play(&mut pos, "a1a8");
        assert_eq!(pos.castling_rights(), WK | BK);
    }

    #[test]
    fn en_passant_capture_and_undo() {
        let mut pos = Position::new();
        for uci in ["e2e4", "g8f6", "e4e5", "d7d5"] {
            play(&mut pos, uci);
        }
        assert_eq!(pos.en_passant(), Some(sq("d6")));
        let pre_key = pos.zobrist();
        let before = pos.clone();

        play(&mut pos, "e5d6");
        assert_eq!(pos.piece_on(sq("d6")), Some(Piece::Pawn));
        assert_eq!(pos.color_on(sq("d6")), Some(Color::White));
        assert_eq!(pos.piece_on(sq("d5")), None, "captured pawn removed");
        assert_eq!(pos.zobrist(), pos.zobrist_from_scratch());

        pos.unmake();
        assert_eq!(pos, before);
        assert_eq!(pos.zobrist(), pre_key);
    }

    #[test]
    fn promotion_defaults_to_queen() {
        let mut pos = Position::from_fen("7k/P7/8/8/8/8/8/7K w - - 0 1").unwrap();
        let mv = Move::new(sq("a7"), sq("a8"), Piece::Pawn, None);
        pos.make(mv);
        assert_eq!(pos.piece_on(sq("a8")), Some(Piece::Queen));
        pos.unmake();
        assert_eq!(pos.piece_on(sq("a7")), Some(Piece::Pawn));
        assert_eq!(pos.piece_on(sq("a8")), None);
    }

    #[test]
    fn underpromotion_round_trip() {
        let mut pos = Position::from_fen("7k/P7/8/8/8/8/8/7K w - - 0 1").unwrap();
        let before = pos.clone();
        let mv = Move::promoting(sq("a7"), sq("a8"), None, Piece::Knight);
        pos.make(mv);
        assert_eq!(pos.piece_on(sq("a8")), Some(Piece::Knight));
        pos.unmake();
        assert_eq!(pos, before);
    }

    #[test]
    fn null_move_flips_side_and_clears_ep() {
        let mut pos = Position::new();
        play(&mut pos, "e2e4");
        assert!(pos.en_passant().is_some());
        let key = pos.zobrist();

        let undo = pos.make_null().unwrap();
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.en_passant(), None);
        assert_ne!(pos.zobrist(), key);
        assert_eq!(pos.zobrist(), pos.zobrist_from_scratch());

        pos.unmake_null(undo);
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_eq!(pos.zobrist(), key);
    }

    #[test]
    fn null_move_refused_in_check() {
        let pos = Position::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        let mut pos = pos;
        assert!(pos.make_null().is_none());
    }

    #[test]
    fn threefold_repetition_by_key() {
        let mut pos = Position::new();
        let initial_key = pos.zobrist();
        for uci in ["g1f3", "b8c6", "f3g1", "c6b8", "g1f3", "b8c6", "f3g1", "c6b8"] {
            play(&mut pos, uci);
        }
        assert_eq!(pos.zobrist(), initial_key);
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.repetitions(), 3);
    }

    #[test]
    fn halfmove_clock_resets_on_pawn_and_capture() {
        let mut pos = Position::new();
        play(&mut pos, "g1f3");
        assert_eq!(pos.halfmove_clock(), 1);
        play(&mut pos, "d7d5");
        assert_eq!(pos.halfmove_clock(), 0);
        play(&mut pos, "f3e5");
        assert_eq!(pos.halfmove_clock(), 1);
        play(&mut pos, "d5d4");
        assert_eq!(pos.halfmove_clock(), 0);
    }
}
