//! Move ordering. Good ordering is what makes alpha-beta prune; the scores
//! here only rank candidates and never leak into evaluation.

use arrayvec::ArrayVec;

use crate::board::{Color, Move, Piece, Position, Square};
use crate::types::Score;

pub struct ScoredMove {
    pub mv: Move,
    pub score: Score,
}

/// Ordering inputs for one search node. Killer and history tables live in
/// the search; the priority move is this decision's opening-book hint.
pub struct OrderingContext<'a> {
    pub killers: &'a [Option<Move>; 2],
    pub history: &'a [[Score; 64]; 64],
    pub priority_move: Option<Move>,
    pub use_killers: bool,
    pub use_history: bool,
}

/// d4, e4, d5, e5 — used by the pawn-push shaping below.
const INNER_CENTER: [u8; 4] = [27, 28, 35, 36];

/// Score and sort `moves` best-first.
pub fn order_moves(
    pos: &Position,
    moves: &[Move],
    ctx: &OrderingContext<'_>,
) -> ArrayVec<ScoredMove, 256> {
    let mut scored: ArrayVec<ScoredMove, 256> = ArrayVec::new();
    for &mv in moves {
        scored.push(ScoredMove { mv, score: score_move(pos, mv, ctx) });
    }
    scored.sort_unstable_by(|a, b| b.score.cmp(&a.score));
    scored
}

fn score_move(pos: &Position, mv: Move, ctx: &OrderingContext<'_>) -> Score {
    let mut score = 0;

    if let Some(promo) = mv.promotion {
        // queen promotions first, then by piece value
        score += 15_000 + promo.value() / 10;
    }

    if let Some(victim) = mv.capture {
        let exchange = 10 * victim.value() - mv.piece.value();
        let band = if victim.value() > mv.piece.value() {
            12_000
        } else if victim.value() == mv.piece.value() {
            9_000
        } else {
            7_000
        };
        // exchange/10 keeps the bands disjoint while preserving MVV-LVA
        // order inside each one
        score += band + exchange / 10;
    } else if ctx.use_killers {
        for (i, killer) in ctx.killers.iter().enumerate() {
            if *killer == Some(mv) {
                score += 10_000 - 100 * i as Score;
            }
        }
    }

    if ctx.priority_move == Some(mv) {
        score += 8_500;
    }

    if mv.piece == Piece::Pawn && mv.from.rank().abs_diff(mv.to.rank()) == 2 {
        score += 8_000 + double_push_bonus(pos, mv);
    }

    if ctx.use_history && !mv.is_capture() && !mv.is_promotion() {
        score += ctx.history[mv.from.index()][mv.to.index()];
    }

    score
}

/// Shaping for pawn double pushes: favor central thrusts, avoid burying a
/// bishop, reward contesting an opponent-held center.
fn double_push_bonus(pos: &Position, mv: Move) -> Score {
    let us = pos.side_to_move();
    let them = !us;
    let mut bonus = 15;

    match mv.to.file() {
        3 | 4 => bonus += 20,
        2 | 5 => bonus += 10,
        _ => {}
    }

    if lands_on_undeveloped_bishop_diagonal(pos, us, mv.to) {
        bonus -= 10;
    }

    // the opponent just double-pushed; answering in kind keeps the tension
    if pos.en_passant().is_some() {
        bonus += 5;
    }

    if (2..=5).contains(&mv.to.file()) {
        let their_pawns = pos.pieces(them, Piece::Pawn);
        if INNER_CENTER.iter().any(|&idx| their_pawns.contains(Square::new(idx))) {
            bonus += 15;
        }
    }

    bonus
}

fn lands_on_undeveloped_bishop_diagonal(pos: &Position, us: Color, to: Square) -> bool {
    let back = us.back_rank();
    for bishop_file in [2usize, 5] {
        let home = Square::from_coords(back, bishop_file);
        if pos.piece_on(home) == Some(Piece::Bishop) && pos.color_on(home) == Some(us) {
            let forward = to.rank() as i32 - back as i32;
            let forward = match us {
                Color::White => forward,
                Color::Black => -forward,
            };
            let sideways = (to.file() as i32 - bishop_file as i32).abs();
            if forward > 0 && sideways == forward {
                return true;
            }
        }
    }
    false
}

/// Captures only, for quiescence: ranked by a cheap exchange estimate.
pub fn order_captures(moves: &[Move]) -> ArrayVec<ScoredMove, 256> {
    let mut scored: ArrayVec<ScoredMove, 256> = ArrayVec::new();
    for &mv in moves {
        if let Some(victim) = mv.capture {
            let score = victim.value() - mv.piece.value() / 10;
            scored.push(ScoredMove { mv, score });
        }
    }
    scored.sort_unstable_by(|a, b| b.score.cmp(&a.score));
    scored
}
