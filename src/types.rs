//! Shared scalar types and score bounds.

pub type Score = i32;

/// Hard bound for alpha-beta windows.
pub const SCORE_INFINITY: Score = 30_000;

/// Base mate score. Actual mate scores are `SCORE_MATE - ply`, so faster
/// mates rank higher. Fits comfortably in i32 together with every bonus
/// the evaluator can stack on top.
pub const SCORE_MATE: Score = 20_000;

/// Scores beyond this magnitude are treated as forced mates by the
/// iterative-deepening driver.
pub const MATE_THRESHOLD: Score = 15_000;

pub const MAX_PLY: usize = 64;

/// Cap for history-heuristic counters.
pub const HISTORY_MAX: Score = 16_384;

/// How many decision reports the engine keeps before evicting the oldest.
pub const REPORT_HISTORY_CAP: usize = 100;

/// Book consultation stops after this many plies of the game.
pub const BOOK_PLY_LIMIT: u32 = 30;
