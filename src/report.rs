//! Decision reports: a structured trace of everything that went into one
//! move choice, plus the JSON/text adapters and the bounded history the
//! engine appends to.

use std::collections::{BTreeMap, VecDeque};
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{REPORT_HISTORY_CAP, Score};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionReport {
    pub meta: ReportMeta,
    pub opening_book: BookOutcome,
    pub search_stats: SearchStatsReport,
    pub move_analysis: MoveAnalysis,
    pub decision: Decision,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub timestamp: DateTime<Utc>,
    /// "white" or "black"
    pub bot_color: String,
    pub difficulty: String,
    pub fen: String,
    pub move_number: u32,
    pub ply: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookOutcome {
    pub tried: bool,
    pub found: bool,
    pub book_move: Option<String>,
    pub used_as_priority: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStatsReport {
    pub positions_evaluated: u64,
    pub max_depth_reached: u8,
    pub time_spent_ms: u64,
    pub nodes_per_second: u64,
    pub timeout: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveAnalysis {
    pub total_legal_moves: usize,
    /// The ten best by 1-ply static score, descending.
    pub top_moves: Vec<MoveEvaluation>,
    /// Every legal move, descending by the same score.
    pub all_moves: Vec<MoveEvaluation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveEvaluation {
    #[serde(rename = "move")]
    pub uci: String,
    pub score: Score,
    /// Weighted contribution per enabled heuristic, keyed by heuristic name.
    pub breakdown: BTreeMap<&'static str, f64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub selected_move: Option<String>,
    pub selected_score: Option<Score>,
    pub imperfection: Imperfection,
    pub final_move: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Imperfection {
    #[serde(rename = "type")]
    pub kind: ImperfectionKind,
    pub original_move: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImperfectionKind {
    #[default]
    None,
    Blunder,
    Suboptimal,
}

impl DecisionReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Line-oriented human-readable rendering.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== decision report ===");
        let _ = writeln!(
            out,
            "{} | {} playing {} | move {} (ply {})",
            self.meta.timestamp.to_rfc3339(),
            self.meta.difficulty,
            self.meta.bot_color,
            self.meta.move_number,
            self.meta.ply,
        );
        let _ = writeln!(out, "fen: {}", self.meta.fen);

        let book = &self.opening_book;
        if book.tried {
            match &book.book_move {
                Some(mv) if book.used_as_priority => {
                    let _ = writeln!(out, "book: {} (fed to move ordering)", mv);
                }
                Some(mv) => {
                    let _ = writeln!(out, "book: {} (not legal here, ignored)", mv);
                }
                None => {
                    let _ = writeln!(out, "book: no entry");
                }
            }
        } else {
            let _ = writeln!(out, "book: not consulted");
        }

        let stats = &self.search_stats;
        let _ = writeln!(
            out,
            "search: depth {} | {} positions | {} ms | {} nps{}",
            stats.max_depth_reached,
            stats.positions_evaluated,
            stats.time_spent_ms,
            stats.nodes_per_second,
            if stats.timeout { " | timed out" } else { "" },
        );

        let _ = writeln!(out, "legal moves: {}", self.move_analysis.total_legal_moves);
        for (rank, entry) in self.move_analysis.top_moves.iter().enumerate() {
            let parts: Vec<String> =
                entry.breakdown.iter().map(|(k, v)| format!("{} {:+.1}", k, v)).collect();
            let _ = writeln!(
                out,
                "  {:2}. {:7} {:+6}  [{}]",
                rank + 1,
                entry.uci,
                entry.score,
                parts.join(", "),
            );
        }

        let decision = &self.decision;
        match (&decision.selected_move, decision.selected_score) {
            (Some(mv), Some(score)) => {
                let _ = writeln!(out, "selected: {} ({:+})", mv, score);
            }
            (Some(mv), None) => {
                let _ = writeln!(out, "selected: {}", mv);
            }
            _ => {
                let _ = writeln!(out, "selected: none (no legal moves)");
            }
        }
        match decision.imperfection.kind {
            ImperfectionKind::None => {}
            kind => {
                let _ = writeln!(
                    out,
                    "imperfection: {:?} (search preferred {})",
                    kind,
                    decision.imperfection.original_move.as_deref().unwrap_or("?"),
                );
            }
        }
        if let Some(mv) = &decision.final_move {
            let _ = writeln!(out, "played: {}", mv);
        }
        out
    }
}

/// Bounded FIFO of recent reports. Oldest evicted past the cap.
#[derive(Debug, Default)]
pub struct ReportLog {
    reports: VecDeque<DecisionReport>,
    cap: usize,
}

impl ReportLog {
    pub fn new() -> Self {
        ReportLog { reports: VecDeque::new(), cap: REPORT_HISTORY_CAP }
    }

    pub fn with_capacity(cap: usize) -> Self {
        ReportLog { reports: VecDeque::new(), cap: cap.max(1) }
    }

    pub fn push(&mut self, report: DecisionReport) {
        if self.reports.len() == self.cap {
            self.reports.pop_front();
        }
        self.reports.push_back(report);
    }

    pub fn latest(&self) -> Option<&DecisionReport> {
        self.reports.back()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecisionReport> {
        self.reports.iter()
    }

    pub fn clear(&mut self) {
        self.reports.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report(ply: u32) -> DecisionReport {
        let mut breakdown = BTreeMap::new();
        breakdown.insert("material", 0.0);
        breakdown.insert("centerControl", 30.0);
        DecisionReport {
            meta: ReportMeta {
                timestamp: Utc::now(),
                bot_color: "white".into(),
                difficulty: "master".into(),
                fen: crate::board::START_FEN.into(),
                move_number: 1,
                ply,
            },
            opening_book: BookOutcome {
                tried: true,
                found: true,
                book_move: Some("e2e4".into()),
                used_as_priority: true,
            },
            search_stats: SearchStatsReport {
                positions_evaluated: 1234,
                max_depth_reached: 8,
                time_spent_ms: 250,
                nodes_per_second: 4936,
                timeout: false,
            },
            move_analysis: MoveAnalysis {
                total_legal_moves: 20,
                top_moves: vec![MoveEvaluation {
                    uci: "e2e4".into(),
                    score: 30,
                    breakdown: breakdown.clone(),
                }],
                all_moves: vec![MoveEvaluation { uci: "e2e4".into(), score: 30, breakdown }],
            },
            decision: Decision {
                selected_move: Some("e2e4".into()),
                selected_score: Some(30),
                imperfection: Imperfection::default(),
                final_move: Some("e2e4".into()),
            },
        }
    }

    #[test]
    fn json_shape_uses_camel_case_sections() {
        let json = sample_report(0).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["meta"]["botColor"], "white");
        assert_eq!(value["meta"]["moveNumber"], 1);
        assert_eq!(value["openingBook"]["tried"], true);
        assert_eq!(value["openingBook"]["usedAsPriority"], true);
        assert_eq!(value["searchStats"]["maxDepthReached"], 8);
        assert_eq!(value["searchStats"]["positionsEvaluated"], 1234);
        assert_eq!(value["moveAnalysis"]["totalLegalMoves"], 20);
        assert_eq!(value["moveAnalysis"]["allMoves"][0]["move"], "e2e4");
        assert_eq!(value["moveAnalysis"]["allMoves"][0]["breakdown"]["centerControl"], 30.0);
        assert_eq!(value["decision"]["selectedMove"], "e2e4");
        assert_eq!(value["decision"]["imperfection"]["type"], "none");
    }

    #[test]
    fn text_rendering_mentions_the_essentials() {
        let text = sample_report(0).to_text();
        assert!(text.contains("master"));
        assert!(text.contains("legal moves: 20"));
        assert!(text.contains("e2e4"));
        assert!(text.contains("played: e2e4"));
    }

    #[test]
    fn log_caps_and_evicts_oldest() {
        let mut log = ReportLog::with_capacity(3);
        for ply in 0..5 {
            log.push(sample_report(ply));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.latest().unwrap().meta.ply, 4);
        let plies: Vec<u32> = log.iter().map(|r| r.meta.ply).collect();
        assert_eq!(plies, vec![2, 3, 4]);

        log.clear();
        assert!(log.is_empty());
        assert!(log.latest().is_none());
    }

    #[test]
    fn imperfection_kinds_serialize_lowercase() {
        let mut report = sample_report(0);
        report.decision.imperfection.kind = ImperfectionKind::Blunder;
        report.decision.imperfection.original_move = Some("e2e4".into());
        let value: serde_json::Value =
            serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["decision"]["imperfection"]["type"], "blunder");
        assert_eq!(value["decision"]["imperfection"]["originalMove"], "e2e4");
    }
}
