use std::sync::LazyLock;

use super::bitboard::BitBoard;
use super::piece::Color;
use super::square::Square;

struct LeaperTables {
    knight: [BitBoard; 64],
    king: [BitBoard; 64],
    /// `[color][square]` — squares a pawn of that color attacks from there.
    pawn: [[BitBoard; 64]; 2],
}

static LEAPERS: LazyLock<LeaperTables> = LazyLock::new(|| {
    let mut knight = [BitBoard(0); 64];
    let mut king = [BitBoard(0); 64];
    let mut pawn = [[BitBoard(0); 64]; 2];

    const KNIGHT_OFFSETS: [(i8, i8); 8] = [
        (-2, -1), (-2, 1), (-1, -2), (-1, 2),
        (1, -2), (1, 2), (2, -1), (2, 1),
    ];
    const KING_OFFSETS: [(i8, i8); 8] = [
        (-1, -1), (-1, 0), (-1, 1),
        (0, -1),           (0, 1),
        (1, -1),  (1, 0),  (1, 1),
    ];

    for sq in 0..64usize {
        let r = (sq / 8) as i8;
        let f = (sq % 8) as i8;

        knight[sq] = offsets_to_board(r, f, &KNIGHT_OFFSETS);
        king[sq] = offsets_to_board(r, f, &KING_OFFSETS);
        pawn[Color::White.index()][sq] = offsets_to_board(r, f, &[(1, -1), (1, 1)]);
        pawn[Color::Black.index()][sq] = offsets_to_board(r, f, &[(-1, -1), (-1, 1)]);
    }

    LeaperTables { knight, king, pawn }
});

fn offsets_to_board(r: i8, f: i8, offsets: &[(i8, i8)]) -> BitBoard {
    let mut bb = 0u64;
    for &(dr, df) in offsets {
        let nr = r + dr;
        let nf = f + df;
        if (0..8).contains(&nr) && (0..8).contains(&nf) {
            bb |= 1u64 << (nr * 8 + nf);
        }
    }
    BitBoard(bb)
}

#[inline]
pub fn knight_attacks(sq: Square) -> BitBoard {
    LEAPERS.knight[sq.index()]
}

#[inline]
pub fn king_attacks(sq: Square) -> BitBoard {
    LEAPERS.king[sq.index()]
}

#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> BitBoard {
    LEAPERS.pawn[color.index()][sq.index()]
}

/// Slider rays traced against the occupancy: walk each direction until the
/// first occupied square, which is included (caller decides capture vs own
/// piece).
fn ray_attacks(sq: Square, occupied: BitBoard, directions: &[(i8, i8)]) -> BitBoard {
    let mut attacks = 0u64;
    let r = sq.rank() as i8;
    let f = sq.file() as i8;

    for &(dr, df) in directions {
        let mut nr = r + dr;
        let mut nf = f + df;
        while (0..8).contains(&nr) && (0..8).contains(&nf) {
            let bit = 1u64 << (nr * 8 + nf);
            attacks |= bit;
            if occupied.0 & bit != 0 {
                break;
            }
            nr += dr;
            nf += df;
        }
    }
    BitBoard(attacks)
}

#[inline]
pub fn bishop_attacks(sq: Square, occupied: BitBoard) -> BitBoard {
    ray_attacks(sq, occupied, &[(1, 1), (1, -1), (-1, 1), (-1, -1)])
}

#[inline]
pub fn rook_attacks(sq: Square, occupied: BitBoard) -> BitBoard {
    ray_attacks(sq, occupied, &[(0, 1), (0, -1), (1, 0), (-1, 0)])
}

#[inline]
pub fn queen_attacks(sq: Square, occupied: BitBoard) -> BitBoard {
    bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)
}


// Leaper attacks never depend on occupancy, so they come from tables built
// once behind a LazyLock. Sliders are ray-traced per query: at the depths
// this engine searches, evaluation dominates the profile, and the ray walk
// keeps the board layer free of magic-number tables.
