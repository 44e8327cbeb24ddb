//! Iterative-deepening alpha-beta with quiescence, late-move reduction, and
//! optional null-move pruning. All tunables come from the difficulty
//! profile; the search itself has no global state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::debug;

use crate::board::{Move, Piece, Position, movegen};
use crate::difficulty::DifficultyProfile;
use crate::evaluation::evaluate;
use crate::ordering::{self, OrderingContext};
use crate::types::{HISTORY_MAX, MATE_THRESHOLD, MAX_PLY, SCORE_INFINITY, SCORE_MATE, Score};

/// Counters and flags produced by one search, reported per decision.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchStats {
    /// Nodes visited, interior and quiescence alike.
    pub nodes: u64,
    /// Deepest fully completed iteration.
    pub depth_reached: u8,
    pub elapsed_ms: u64,
    pub nodes_per_second: u64,
    pub timed_out: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct SearchOutcome {
    pub best_move: Option<Move>,
    pub score: Score,
    pub stats: SearchStats,
}

struct SearchContext<'a> {
    profile: &'a DifficultyProfile,
    priority_move: Option<Move>,
    killers: [[Option<Move>; 2]; MAX_PLY],
    history: Box<[[Score; 64]; 64]>,
    nodes: u64,
    start: Instant,
    budget_ms: u64,
    stop: Option<Arc<AtomicBool>>,
    timed_out: bool,
    root_best: Option<Move>,
}

impl<'a> SearchContext<'a> {
    fn new(
        profile: &'a DifficultyProfile,
        priority_move: Option<Move>,
        stop: Option<Arc<AtomicBool>>,
    ) -> Self {
        SearchContext {
            profile,
            priority_move,
            killers: [[None; 2]; MAX_PLY],
            history: Box::new([[0; 64]; 64]),
            nodes: 0,
            start: Instant::now(),
            budget_ms: profile.max_time_ms,
            stop,
            timed_out: false,
            root_best: None,
        }
    }

    /// Poll the wall clock every 1024 nodes; once over budget or externally
    /// stopped, every frame unwinds with a tentative score and the flag set.
    #[inline]
    fn tick(&mut self) {
        self.nodes += 1;
        if self.nodes & 1023 == 0 {
            if self.budget_ms > 0 {
                let elapsed = self.start.elapsed().as_millis() as u64;
                if elapsed >= self.budget_ms {
                    self.timed_out = true;
                }
            }
            if let Some(stop) = &self.stop {
                if stop.load(Ordering::Relaxed) {
                    self.timed_out = true;
                }
            }
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Iterative deepening from the profile's `min_depth` to `max_depth`,
/// keeping the answer of the last completed iteration. Never returns
/// `best_move: None` while a legal move exists.
pub fn search(
    pos: &mut Position,
    profile: &DifficultyProfile,
    priority_move: Option<Move>,
) -> SearchOutcome {
    search_with_stop(pos, profile, priority_move, None)
}

/// Like [`search`], with an external cancellation flag checked at the same
/// polling point as the clock. A raised flag reads as a timeout: the best
/// move found so far comes back.
pub fn search_with_stop(
    pos: &mut Position,
    profile: &DifficultyProfile,
    priority_move: Option<Move>,
    stop: Option<Arc<AtomicBool>>,
) -> SearchOutcome {
    let mut ctx = SearchContext::new(profile, priority_move, stop);
    let mut best_move: Option<Move> = None;
    let mut best_score: Score = -SCORE_INFINITY;
    let mut depth_reached = 0u8;

    for depth in profile.min_depth..=profile.max_depth {
        // soft gate: don't start an iteration we're unlikely to finish
        if depth > profile.min_depth
            && ctx.budget_ms > 0
            && ctx.elapsed_ms() * 10 > ctx.budget_ms * 7
        {
            break;
        }

        ctx.root_best = None;
        let score = alpha_beta(pos, &mut ctx, depth, 0, -SCORE_INFINITY, SCORE_INFINITY, true);

        if ctx.timed_out {
            // an interrupted iteration is only trusted when nothing
            // completed before it
            if best_move.is_none() {
                best_move = ctx.root_best;
                best_score = score;
            }
            break;
        }

        best_move = ctx.root_best.or(best_move);
        best_score = score;
        depth_reached = depth;
        debug!(
            "depth {} score {} nodes {} elapsed {}ms",
            depth,
            score,
            ctx.nodes,
            ctx.elapsed_ms()
        );

        if best_score.abs() > MATE_THRESHOLD {
            break;
        }
    }

    let elapsed_ms = ctx.elapsed_ms();
    let nodes_per_second = ctx.nodes * 1000 / elapsed_ms.max(1);
    SearchOutcome {
        best_move,
        score: best_score,
        stats: SearchStats {
            nodes: ctx.nodes,
            depth_reached,
            elapsed_ms,
            nodes_per_second,
            timed_out: ctx.timed_out,
        },
    }
}

/// Fail-hard alpha-beta. The score is always from the side to move's
/// perspective; each recursion negates.
fn alpha_beta(
    pos: &mut Position,
    ctx: &mut SearchContext<'_>,
    depth: u8,
    ply: usize,
    mut alpha: Score,
    beta: Score,
    allow_null: bool,
) -> Score {
    ctx.tick();
    let us = pos.side_to_move();
    if ctx.timed_out {
        return evaluate(pos, us, &ctx.profile.eval);
    }

    let in_check = pos.is_in_check();
    let moves = movegen::legal_moves(pos);
    if moves.is_empty() {
        // ply-adjusted so nearer mates score higher
        return if in_check { -(SCORE_MATE - ply as Score) } else { 0 };
    }

    if depth == 0 {
        return if ctx.profile.use_quiescence {
            quiescence(pos, ctx, ctx.profile.quiescence_depth, ply, alpha, beta)
        } else {
            evaluate(pos, us, &ctx.profile.eval)
        };
    }

    // null move: hand the opponent a free tempo; if the reduced search
    // still clears beta, this position is good enough to cut. Skipped
    // without non-pawn material, where zugzwang makes the bound a lie.
    if ctx.profile.use_null_move && allow_null && depth >= 3 && ply > 0 && !in_check {
        let minors_and_majors =
            pos.side(us) & !(pos.pieces(us, Piece::Pawn) | pos.pieces(us, Piece::King));
        if !minors_and_majors.is_empty() {
            if let Some(undo) = pos.make_null() {
                let score = -alpha_beta(pos, ctx, depth - 3, ply + 1, -beta, -beta + 1, false);
                pos.unmake_null(undo);
                if !ctx.timed_out && score >= beta {
                    return beta;
                }
            }
        }
    }

    let killer_slot = ply.min(MAX_PLY - 1);
    let ordered = {
        let view = OrderingContext {
            killers: &ctx.killers[killer_slot],
            history: &ctx.history,
            priority_move: ctx.priority_move,
            use_killers: ctx.profile.use_killers,
            use_history: ctx.profile.use_history,
        };
        ordering::order_moves(pos, &moves, &view)
    };

    // a timeout mid-loop must still leave a root answer behind
    if ply == 0 && ctx.root_best.is_none() {
        ctx.root_best = Some(ordered[0].mv);
    }

    for (index, scored) in ordered.iter().enumerate() {
        let mv = scored.mv;

        // late-move reduction: trust the ordering and look one ply less at
        // quiet stragglers
        let mut child_depth = depth - 1;
        if ctx.profile.use_lmr
            && index >= 4
            && depth >= 3
            && !mv.is_capture()
            && !mv.is_promotion()
            && child_depth > 0
        {
            child_depth -= 1;
        }

        pos.make(mv);
        let score = -alpha_beta(pos, ctx, child_depth, ply + 1, -beta, -alpha, true);
        pos.unmake();

        if ctx.timed_out {
            return alpha;
        }

        if score > alpha {
            alpha = score;
            if ply == 0 {
                ctx.root_best = Some(mv);
            }
            if alpha >= beta {
                if !mv.is_capture() && !mv.is_promotion() {
                    if ctx.profile.use_killers {
                        ctx.killers[killer_slot][1] = ctx.killers[killer_slot][0];
                        ctx.killers[killer_slot][0] = Some(mv);
                    }
                    if ctx.profile.use_history {
                        let entry = &mut ctx.history[mv.from.index()][mv.to.index()];
                        *entry = (*entry + (depth as Score) * (depth as Score)).min(HISTORY_MAX);
                    }
                }
                return beta;
            }
        }
    }

    alpha
}

/// Capture-only search at the leaves: stand pat on the static eval, then
/// resolve hanging material so the horizon doesn't hide a recapture.
fn quiescence(
    pos: &mut Position,
    ctx: &mut SearchContext<'_>,
    qdepth: u8,
    ply: usize,
    mut alpha: Score,
    beta: Score,
) -> Score {
    ctx.tick();
    let us = pos.side_to_move();

    let stand_pat = evaluate(pos, us, &ctx.profile.eval);
    if ctx.timed_out || stand_pat >= beta {
        return if stand_pat >= beta { beta } else { stand_pat };
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }
    if qdepth == 0 || ply >= MAX_PLY {
        return alpha;
    }

    let moves = movegen::legal_moves(pos);
    for scored in ordering::order_captures(&moves).iter() {
        pos.make(scored.mv);
        let score = -quiescence(pos, ctx, qdepth - 1, ply + 1, -beta, -alpha);
        pos.unmake();

        if ctx.timed_out {
            return alpha;
        }
        if score > alpha {
            alpha = score;
            if alpha >= beta {
                return beta;
            }
        }
    }

    alpha
}


// The deepening loop retains only answers from fully completed iterations;
// a partially searched depth may have refuted nothing yet. The one
// exception is a timeout before any iteration finished, where the root's
// first ordered move is better than no move at all.
