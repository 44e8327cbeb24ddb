//! The decision layer: difficulty configuration, book consultation,
//! search, imperfection injection, and report assembly.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::{Color, Move, Position};
use crate::book::{self, BookSource};
use crate::difficulty::{Difficulty, DifficultyProfile};
use crate::evaluation::evaluate_with_breakdown;
use crate::report::{
    BookOutcome, Decision, DecisionReport, Imperfection, ImperfectionKind, MoveAnalysis,
    MoveEvaluation, ReportLog, ReportMeta, SearchStatsReport,
};
use crate::search;
use crate::types::{BOOK_PLY_LIMIT, Score};

/// A configured opponent. Owns its difficulty profile, random stream, an
/// optional opening book, and the bounded history of decision reports.
///
/// `Position` is taken by reference and cloned internally; the caller's
/// state is never mutated.
pub struct Engine {
    difficulty: Difficulty,
    profile: DifficultyProfile,
    book: Option<Box<dyn BookSource>>,
    rng: StdRng,
    reports: ReportLog,
}

/// A legal move with its 1-ply static score, best first.
struct RankedMove {
    mv: Move,
    score: Score,
}

impl Engine {
    pub fn new(difficulty: Difficulty) -> Self {
        Engine::build(difficulty, StdRng::from_os_rng(), None)
    }

    /// Deterministic engine: the same seed, position, and difficulty always
    /// produce the same decision and report.
    pub fn with_seed(difficulty: Difficulty, seed: u64) -> Self {
        Engine::build(difficulty, StdRng::seed_from_u64(seed), None)
    }

    pub fn with_book(difficulty: Difficulty, book: Box<dyn BookSource>) -> Self {
        Engine::build(difficulty, StdRng::from_os_rng(), Some(book))
    }

    fn build(difficulty: Difficulty, rng: StdRng, book: Option<Box<dyn BookSource>>) -> Self {
        Engine {
            difficulty,
            profile: difficulty.profile(),
            book,
            rng,
            reports: ReportLog::new(),
        }
    }

    pub fn set_book(&mut self, book: Box<dyn BookSource>) {
        self.book = Some(book);
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    /// Mutable profile access, e.g. to zero the thinking delay or the
    /// imperfection chances in harnesses.
    pub fn profile_mut(&mut self) -> &mut DifficultyProfile {
        &mut self.profile
    }

    pub fn latest_report(&self) -> Option<&DecisionReport> {
        self.reports.latest()
    }

    pub fn reports(&self) -> impl Iterator<Item = &DecisionReport> {
        self.reports.iter()
    }

    pub fn clear_reports(&mut self) {
        self.reports.clear();
    }

    /// Choose a move for the side to move. `None` only when no legal move
    /// exists; the caller distinguishes checkmate from stalemate via
    /// [`Position::is_in_check`]. Every call appends a report.
    pub fn choose_move(&mut self, pos: &Position) -> Option<Move> {
        let us = pos.side_to_move();
        let mut report = DecisionReport {
            meta: ReportMeta {
                timestamp: Utc::now(),
                bot_color: color_name(us).to_string(),
                difficulty: self.profile.name.to_string(),
                fen: pos.to_fen(),
                move_number: pos.fullmove_number(),
                ply: pos.ply(),
            },
            opening_book: BookOutcome::default(),
            search_stats: SearchStatsReport::default(),
            move_analysis: MoveAnalysis::default(),
            decision: Decision::default(),
        };

        self.think_delay();

        let legal = pos.legal_moves();
        if legal.is_empty() {
            self.reports.push(report);
            return None;
        }

        let (ranked, evaluations) = self.analyze_moves(pos, &legal);
        report.move_analysis = MoveAnalysis {
            total_legal_moves: legal.len(),
            top_moves: evaluations.iter().take(10).cloned().collect(),
            all_moves: evaluations,
        };

        // a forced move needs no search
        if legal.len() == 1 {
            let mv = legal[0];
            report.decision = Decision {
                selected_move: Some(mv.to_string()),
                selected_score: Some(ranked[0].score),
                imperfection: Imperfection::default(),
                final_move: Some(mv.to_string()),
            };
            info!("{}: forced move {}", self.profile.name, mv);
            self.reports.push(report);
            return Some(mv);
        }

        // the book hint is never played outright; it biases move ordering
        let priority = self.consult_book(pos, &legal, &mut report.opening_book);

        let mut search_pos = pos.clone();
        let outcome = search::search(&mut search_pos, &self.profile, priority);
        report.search_stats = SearchStatsReport {
            positions_evaluated: outcome.stats.nodes,
            max_depth_reached: outcome.stats.depth_reached,
            time_spent_ms: outcome.stats.elapsed_ms,
            nodes_per_second: outcome.stats.nodes_per_second,
            timeout: outcome.stats.timed_out,
        };

        // the search cannot come back empty-handed while legal moves exist;
        // the top static move is the documented fallback
        let search_best = outcome.best_move.unwrap_or(ranked[0].mv);

        let mut final_move = search_best;
        let mut imperfection = Imperfection::default();

        if self.profile.blunder_chance > 0.0 && self.rng.random_bool(self.profile.blunder_chance)
        {
            let pick = legal[self.rng.random_range(0..legal.len())];
            if pick != final_move {
                imperfection = Imperfection {
                    kind: ImperfectionKind::Blunder,
                    original_move: Some(final_move.to_string()),
                };
                final_move = pick;
            }
        } else if self.profile.mistake_chance > 0.0
            && self.rng.random_bool(self.profile.mistake_chance)
        {
            let pool = self.profile.mistake_pool_size.clamp(1, ranked.len());
            let pick = ranked[self.rng.random_range(0..pool)].mv;
            if pick != final_move {
                imperfection = Imperfection {
                    kind: ImperfectionKind::Suboptimal,
                    original_move: Some(final_move.to_string()),
                };
                final_move = pick;
            }
        }

        let selected_score = if final_move == search_best {
            outcome.score
        } else {
            ranked
                .iter()
                .find(|r| r.mv == final_move)
                .map(|r| r.score)
                .unwrap_or(outcome.score)
        };

        report.decision = Decision {
            selected_move: Some(final_move.to_string()),
            selected_score: Some(selected_score),
            imperfection,
            final_move: Some(final_move.to_string()),
        };

        info!(
            "{}: {} ({} legal, depth {}, {} nodes, {} ms)",
            self.profile.name,
            final_move,
            legal.len(),
            report.search_stats.max_depth_reached,
            report.search_stats.positions_evaluated,
            report.search_stats.time_spent_ms,
        );
        self.reports.push(report);
        Some(final_move)
    }

    /// 1-ply static evaluation of every legal move, sorted best-first. The
    /// same ranking backs the report's move analysis and the mistake pool.
    fn analyze_moves(
        &self,
        pos: &Position,
        legal: &[Move],
    ) -> (Vec<RankedMove>, Vec<MoveEvaluation>) {
        let us = pos.side_to_move();
        let mut scratch = pos.clone();
        let mut rows: Vec<(Move, Score, BTreeMap<&'static str, f64>)> =
            Vec::with_capacity(legal.len());

        for &mv in legal {
            scratch.make(mv);
            let (score, parts) = evaluate_with_breakdown(&scratch, us, &self.profile.eval);
            scratch.unmake();
            let breakdown = parts.into_iter().map(|(h, v)| (h.key(), v)).collect();
            rows.push((mv, score, breakdown));
        }
        rows.sort_by(|a, b| b.1.cmp(&a.1));

        let ranked = rows.iter().map(|(mv, score, _)| RankedMove { mv: *mv, score: *score }).collect();
        let evaluations = rows
            .into_iter()
            .map(|(mv, score, breakdown)| MoveEvaluation {
                uci: mv.to_string(),
                score,
                breakdown,
            })
            .collect();
        (ranked, evaluations)
    }

    fn consult_book(
        &mut self,
        pos: &Position,
        legal: &[Move],
        outcome: &mut BookOutcome,
    ) -> Option<Move> {
        if !self.profile.use_book || pos.ply() > BOOK_PLY_LIMIT {
            return None;
        }
        let entries = match &self.book {
            Some(source) => {
                outcome.tried = true;
                source.query(pos.zobrist())
            }
            None => return None,
        };
        if entries.is_empty() {
            return None;
        }
        outcome.found = true;

        let pick = book::sample_weighted(&entries, &mut self.rng)?;
        outcome.book_move = Some(pick.uci.clone());
        match legal.iter().find(|m| m.to_string() == pick.uci) {
            Some(&mv) => {
                outcome.used_as_priority = true;
                Some(mv)
            }
            None => {
                warn!("book move {} is not legal in {}", pick.uci, pos.to_fen());
                None
            }
        }
    }

    fn think_delay(&mut self) {
        let (lo, hi) = self.profile.thinking_delay_ms;
        if hi == 0 {
            return;
        }
        let ms = if hi > lo { self.rng.random_range(lo..=hi) } else { lo };
        if ms > 0 {
            thread::sleep(Duration::from_millis(ms));
        }
    }
}

fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}
