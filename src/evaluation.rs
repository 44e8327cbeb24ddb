//! Static evaluation: a weighted sum of heuristics over one position,
//! reported in centipawns from an explicit perspective.

use crate::board::{Color, Piece, Position, Square};
use crate::types::Score;

/// The fixed set of evaluation heuristics. Difficulty profiles enable a
/// subset by giving each a nonzero weight.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Heuristic {
    Material,
    CenterControl,
    Development,
    PawnStructure,
    KingSafety,
}

impl Heuristic {
    pub const ALL: [Heuristic; 5] = [
        Heuristic::Material,
        Heuristic::CenterControl,
        Heuristic::Development,
        Heuristic::PawnStructure,
        Heuristic::KingSafety,
    ];

    /// Stable key used in report breakdowns.
    pub fn key(self) -> &'static str {
        match self {
            Heuristic::Material => "material",
            Heuristic::CenterControl => "centerControl",
            Heuristic::Development => "development",
            Heuristic::PawnStructure => "pawnStructure",
            Heuristic::KingSafety => "kingSafety",
        }
    }
}

/// Per-heuristic weights. Zero disables a heuristic entirely.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvalWeights {
    pub material: f64,
    pub center_control: f64,
    pub development: f64,
    pub pawn_structure: f64,
    pub king_safety: f64,
}

impl EvalWeights {
    pub const fn all() -> Self {
        EvalWeights {
            material: 1.0,
            center_control: 1.0,
            development: 1.0,
            pawn_structure: 1.0,
            king_safety: 1.0,
        }
    }

    pub const fn none() -> Self {
        EvalWeights {
            material: 0.0,
            center_control: 0.0,
            development: 0.0,
            pawn_structure: 0.0,
            king_safety: 0.0,
        }
    }

    #[inline]
    pub fn get(&self, heuristic: Heuristic) -> f64 {
        match heuristic {
            Heuristic::Material => self.material,
            Heuristic::CenterControl => self.center_control,
            Heuristic::Development => self.development,
            Heuristic::PawnStructure => self.pawn_structure,
            Heuristic::KingSafety => self.king_safety,
        }
    }

    pub fn enabled(&self) -> impl Iterator<Item = Heuristic> + '_ {
        Heuristic::ALL.into_iter().filter(|&h| self.get(h) != 0.0)
    }
}

/// Remaining-material phase: 24 with everything on the board, 0 in a pure
/// pawn endgame.
pub fn game_phase(pos: &Position) -> i32 {
    let mut phase = 0;
    for color in [Color::White, Color::Black] {
        phase += pos.pieces(color, Piece::Knight).popcnt() as i32;
        phase += pos.pieces(color, Piece::Bishop).popcnt() as i32;
        phase += pos.pieces(color, Piece::Rook).popcnt() as i32 * 2;
        phase += pos.pieces(color, Piece::Queen).popcnt() as i32 * 4;
    }
    phase
}

/// 0.0 at full material, 1.0 once the minor/major pieces are gone.
pub fn endgame_weight(pos: &Position) -> f64 {
    (1.0 - game_phase(pos) as f64 / 24.0).max(0.0)
}

/// Composite score from `us`'s perspective, in centipawns.
pub fn evaluate(pos: &Position, us: Color, weights: &EvalWeights) -> Score {
    let mut total = 0.0;
    for heuristic in Heuristic::ALL {
        let weight = weights.get(heuristic);
        if weight != 0.0 {
            total += weight * heuristic_value(pos, us, heuristic);
        }
    }
    total.round() as Score
}

/// Like [`evaluate`], but also returns the weighted contribution of every
/// enabled heuristic for reporting.
pub fn evaluate_with_breakdown(
    pos: &Position,
    us: Color,
    weights: &EvalWeights,
) -> (Score, Vec<(Heuristic, f64)>) {
    let mut total = 0.0;
    let mut parts = Vec::with_capacity(5);
    for heuristic in Heuristic::ALL {
        let weight = weights.get(heuristic);
        if weight != 0.0 {
            let value = weight * heuristic_value(pos, us, heuristic);
            parts.push((heuristic, value));
            total += value;
        }
    }
    (total.round() as Score, parts)
}

fn heuristic_value(pos: &Position, us: Color, heuristic: Heuristic) -> f64 {
    let them = !us;
    match heuristic {
        Heuristic::Material => material(pos, us) as f64,
        Heuristic::CenterControl => center_control(pos, us) as f64,
        Heuristic::Development => {
            // only worth scoring while the opening is still being played
            if pos.ply() <= 20 {
                (development(pos, us) - development(pos, them)) as f64
            } else {
                0.0
            }
        }
        Heuristic::PawnStructure => (pawn_structure(pos, us) - pawn_structure(pos, them)) as f64,
        Heuristic::KingSafety => {
            let scale = (1.0 - endgame_weight(pos)).max(0.2);
            (king_safety(pos, us) - king_safety(pos, them)) as f64 * scale
        }
    }
}

// --- material ---

fn material(pos: &Position, us: Color) -> Score {
    let them = !us;
    let mut score = 0;
    for piece in [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        let diff =
            pos.pieces(us, piece).popcnt() as Score - pos.pieces(them, piece).popcnt() as Score;
        score += diff * piece.value();
    }
    score
}

// --- center control ---

/// d4, e4, d5, e5
const INNER_CENTER: [u8; 4] = [27, 28, 35, 36];
/// the twelve squares ringing the inner center (c3..f3, c4, f4, c5, f5, c6..f6)
const CENTER_RING: [u8; 12] = [18, 19, 20, 21, 26, 29, 34, 37, 42, 43, 44, 45];

fn center_control(pos: &Position, us: Color) -> Score {
    let mut score = 0;
    for &idx in &INNER_CENTER {
        let sq = Square::new(idx);
        if let Some(piece) = pos.piece_on(sq) {
            let value = match piece {
                Piece::Pawn => 30,
                Piece::Knight => 20,
                Piece::Bishop => 15,
                _ => 10,
            };
            score += if pos.color_on(sq) == Some(us) { value } else { -value };
        }
    }
    for &idx in &CENTER_RING {
        let sq = Square::new(idx);
        if pos.color_on(sq).is_some() {
            score += if pos.color_on(sq) == Some(us) { 5 } else { -5 };
        }
    }
    score
}

// --- development ---

fn minor_start_squares(color: Color) -> [Square; 4] {
    let rank = color.back_rank();
    [
        Square::from_coords(rank, 1), // knight
        Square::from_coords(rank, 6), // knight
        Square::from_coords(rank, 2), // bishop
        Square::from_coords(rank, 5), // bishop
    ]
}

fn undeveloped_minors(pos: &Position, color: Color) -> Score {
    let starts = minor_start_squares(color);
    let mut count = 0;
    for (i, sq) in starts.into_iter().enumerate() {
        let expected = if i < 2 { Piece::Knight } else { Piece::Bishop };
        if pos.piece_on(sq) == Some(expected) && pos.color_on(sq) == Some(color) {
            count += 1;
        }
    }
    count
}

fn development(pos: &Position, color: Color) -> Score {
    let mut score = 0;
    score -= 25 * undeveloped_minors(pos, color);

    if let Some(king) = pos.king_square(color) {
        if king.file() == 4 {
            // still on the starting file, castling not done
            score -= 15;
        }
        if king.rank() == color.back_rank() && (king.file() == 6 || king.file() == 2) {
            score += 40;
        }
    }

    // queen wandering out before the minors are placed
    if pos.ply() < 8 {
        if let Some(queen) = pos.pieces(color, Piece::Queen).lsb() {
            if queen.rank() != color.back_rank() && undeveloped_minors(pos, color) >= 2 {
                score -= 30;
            }
        }
    }

    score
}

// --- pawn structure ---

/// Passed-pawn bonus indexed by the pawn's rank from its own side's view.
const PASSED_BONUS: [Score; 8] = [0, 10, 15, 25, 40, 60, 90, 0];

fn pawn_structure(pos: &Position, color: Color) -> Score {
    let pawns = pos.pieces(color, Piece::Pawn);
    let their_pawns = pos.pieces(!color, Piece::Pawn);

    let mut file_counts = [0i32; 8];
    for sq in pawns.iter() {
        file_counts[sq.file()] += 1;
    }

    let mut score = 0;
    for count in file_counts {
        if count > 1 {
            score -= 12 * (count - 1);
        }
    }

    for sq in pawns.iter() {
        let file = sq.file();
        let neighbor_left = file > 0 && file_counts[file - 1] > 0;
        let neighbor_right = file < 7 && file_counts[file + 1] > 0;
        if neighbor_left || neighbor_right {
            score += 8;
        } else {
            score -= 15;
        }

        if is_passed(sq, color, their_pawns.iter()) {
            let rel_rank = match color {
                Color::White => sq.rank(),
                Color::Black => 7 - sq.rank(),
            };
            score += PASSED_BONUS[rel_rank];
        }
    }

    score
}

fn is_passed(sq: Square, color: Color, their_pawns: impl Iterator<Item = Square>) -> bool {
    for theirs in their_pawns {
        if sq.file().abs_diff(theirs.file()) <= 1 {
            let ahead = match color {
                Color::White => theirs.rank() > sq.rank(),
                Color::Black => theirs.rank() < sq.rank(),
            };
            if ahead {
                return false;
            }
        }
    }
    true
}

// --- king safety ---

fn king_safety(pos: &Position, color: Color) -> Score {
    let Some(king) = pos.king_square(color) else {
        return 0;
    };
    let pawns = pos.pieces(color, Piece::Pawn);
    let second_rank = match color {
        Color::White => 1,
        Color::Black => 6,
    };

    let king_file = king.file() as i32;
    let shield_files = (king_file - 1..=king_file + 1).filter(|f| (0..8).contains(f));

    let mut score = 0;
    let flanked = king.file() <= 2 || king.file() >= 5;

    for file in shield_files {
        let file = file as usize;
        if king.rank() == color.back_rank()
            && flanked
            && pawns.contains(Square::from_coords(second_rank, file))
        {
            score += 12;
        }
        let file_has_pawn = pawns.iter().any(|p| p.file() == file);
        if !file_has_pawn {
            score -= 25;
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_all(fen: &str, us: Color) -> Score {
        let pos = Position::from_fen(fen).unwrap();
        evaluate(&pos, us, &EvalWeights::all())
    }

    #[test]
    fn startpos_is_balanced() {
        let pos = Position::new();
        assert_eq!(evaluate(&pos, Color::White, &EvalWeights::all()), 0);
        assert_eq!(evaluate(&pos, Color::Black, &EvalWeights::all()), 0);
    }

    #[test]
    fn phase_and_endgame_weight() {
        let pos = Position::new();
        assert_eq!(game_phase(&pos), 24);
        assert_eq!(endgame_weight(&pos), 0.0);

        let endgame = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert_eq!(game_phase(&endgame), 0);
        assert_eq!(endgame_weight(&endgame), 1.0);
    }

    #[test]
    fn queen_odds_dominates() {
        let fen = "rnb1kbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert!(eval_all(fen, Color::White) > 800);
        assert!(eval_all(fen, Color::Black) < -800);
    }

    #[test]
    fn perspective_negates_on_mirrored_position() {
        // asymmetric middlegame and its color-mirrored twin
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 0 1";
        let mirrored = "rnbqk2r/pppp1ppp/5n2/2b1p3/4P3/2N5/PPPP1PPP/R1BQKBNR b KQkq - 0 1";
        assert_eq!(eval_all(fen, Color::White), eval_all(mirrored, Color::Black));
        assert_eq!(eval_all(fen, Color::Black), eval_all(mirrored, Color::White));
    }

    #[test]
    fn center_pawn_counts() {
        // lone white pawn on e4 vs lone black pawn on a6, pawn-structure noise
        // excluded by weighting only the center heuristic
        let weights = EvalWeights { center_control: 1.0, ..EvalWeights::none() };
        let pos =
            Position::from_fen("4k3/8/p7/8/4P3/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(evaluate(&pos, Color::White, &weights), 30);
    }

    #[test]
    fn development_penalizes_sleeping_minors() {
        let weights = EvalWeights { development: 1.0, ..EvalWeights::none() };
        // white developed both knights and castled; black untouched
        let pos = Position::from_fen(
            "rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQ1RK1 w kq - 4 5",
        )
        .unwrap();
        let score = evaluate(&pos, Color::White, &weights);
        assert!(score > 0, "developed side should score higher, got {}", score);
    }

    #[test]
    fn doubled_and_isolated_pawns_penalized() {
        let weights = EvalWeights { pawn_structure: 1.0, ..EvalWeights::none() };
        // white: doubled isolated e-pawns; black: connected d/e pawns
        let pos = Position::from_fen("4k3/3pp3/8/8/8/4P3/4P3/4K3 w - - 0 1").unwrap();
        let score = evaluate(&pos, Color::White, &weights);
        assert!(score < 0, "doubled+isolated should lose to connected, got {}", score);
    }

    #[test]
    fn passed_pawn_bonus_grows_with_rank() {
        let weights = EvalWeights { pawn_structure: 1.0, ..EvalWeights::none() };
        let near = Position::from_fen("4k3/8/8/8/8/4P3/8/4K3 w - - 0 1").unwrap();
        let far = Position::from_fen("4k3/8/4P3/8/8/8/8/4K3 w - - 0 1").unwrap();
        let near_score = evaluate(&near, Color::White, &weights);
        let far_score = evaluate(&far, Color::White, &weights);
        assert!(far_score > near_score, "{} vs {}", far_score, near_score);
    }

    #[test]
    fn king_shield_beats_open_files() {
        let weights = EvalWeights { king_safety: 1.0, ..EvalWeights::none() };
        // both kings castled short; white keeps the pawn shield, black lost it
        let sheltered = Position::from_fen(
            "rnbq1rk1/ppppp3/8/8/8/8/PPPPPPPP/RNBQ1RK1 w - - 0 10",
        )
        .unwrap();
        let score = evaluate(&sheltered, Color::White, &weights);
        assert!(score > 0, "intact shield should win king safety, got {}", score);
    }

    #[test]
    fn breakdown_matches_total_and_enabled_set() {
        let pos = Position::from_fen(
            "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 0 1",
        )
        .unwrap();
        let weights = EvalWeights::all();
        let (total, parts) = evaluate_with_breakdown(&pos, Color::White, &weights);
        assert_eq!(parts.len(), 5);
        let sum: f64 = parts.iter().map(|(_, v)| v).sum();
        assert_eq!(sum.round() as Score, total);
        assert_eq!(total, evaluate(&pos, Color::White, &weights));

        let material_only = EvalWeights { material: 1.0, ..EvalWeights::none() };
        let (_, parts) = evaluate_with_breakdown(&pos, Color::White, &material_only);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].0, Heuristic::Material);
    }
}

// Every heuristic is computed as `us - them`, so evaluate(p, White) ==
// -evaluate(p, Black) up to the rounding of weighted sums. The search relies
// on that sign flip at each ply.
