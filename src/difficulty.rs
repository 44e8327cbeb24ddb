//! Difficulty tiers and the profile values each one fixes.

use crate::evaluation::EvalWeights;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Difficulty {
    Rookie,
    Casual,
    Strategic,
    Master,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] =
        [Difficulty::Rookie, Difficulty::Casual, Difficulty::Strategic, Difficulty::Master];

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Rookie => "rookie",
            Difficulty::Casual => "casual",
            Difficulty::Strategic => "strategic",
            Difficulty::Master => "master",
        }
    }

    /// The full parameter set for this tier.
    pub fn profile(self) -> DifficultyProfile {
        match self {
            Difficulty::Rookie => DifficultyProfile {
                name: "rookie",
                min_depth: 2,
                max_depth: 4,
                max_time_ms: 500,
                use_quiescence: false,
                quiescence_depth: 0,
                use_killers: false,
                use_history: false,
                use_null_move: false,
                use_lmr: false,
                use_book: false,
                eval: EvalWeights {
                    material: 1.0,
                    center_control: 1.0,
                    ..EvalWeights::none()
                },
                blunder_chance: 0.10,
                mistake_chance: 0.15,
                mistake_pool_size: 6,
                thinking_delay_ms: (300, 800),
            },
            Difficulty::Casual => DifficultyProfile {
                name: "casual",
                min_depth: 4,
                max_depth: 6,
                max_time_ms: 1_000,
                use_quiescence: true,
                quiescence_depth: 4,
                use_killers: false,
                use_history: false,
                use_null_move: false,
                use_lmr: false,
                use_book: true,
                eval: EvalWeights {
                    material: 1.0,
                    center_control: 1.0,
                    development: 1.0,
                    pawn_structure: 1.0,
                    ..EvalWeights::none()
                },
                blunder_chance: 0.03,
                mistake_chance: 0.08,
                mistake_pool_size: 4,
                thinking_delay_ms: (400, 1_000),
            },
            Difficulty::Strategic => DifficultyProfile {
                name: "strategic",
                min_depth: 6,
                max_depth: 8,
                max_time_ms: 2_000,
                use_quiescence: true,
                quiescence_depth: 6,
                use_killers: true,
                use_history: true,
                use_null_move: false,
                use_lmr: true,
                use_book: true,
                eval: EvalWeights::all(),
                blunder_chance: 0.0,
                mistake_chance: 0.02,
                mistake_pool_size: 3,
                thinking_delay_ms: (500, 1_200),
            },
            Difficulty::Master => DifficultyProfile {
                name: "master",
                min_depth: 8,
                max_depth: 10,
                max_time_ms: 3_000,
                use_quiescence: true,
                quiescence_depth: 8,
                use_killers: true,
                use_history: true,
                use_null_move: true,
                use_lmr: true,
                use_book: true,
                eval: EvalWeights::all(),
                blunder_chance: 0.0,
                mistake_chance: 0.0,
                mistake_pool_size: 1,
                thinking_delay_ms: (600, 1_500),
            },
        }
    }
}

/// One tier's search, evaluation, book, and imperfection parameters, read
/// field-by-field by the engine. A plain value: tweak a copy for tests or
/// custom opponents.
#[derive(Clone, Debug)]
pub struct DifficultyProfile {
    pub name: &'static str,
    pub min_depth: u8,
    pub max_depth: u8,
    /// Soft wall-clock budget per decision; 0 disables the limit.
    pub max_time_ms: u64,
    pub use_quiescence: bool,
    pub quiescence_depth: u8,
    pub use_killers: bool,
    pub use_history: bool,
    pub use_null_move: bool,
    pub use_lmr: bool,
    pub use_book: bool,
    pub eval: EvalWeights,
    pub blunder_chance: f64,
    pub mistake_chance: f64,
    pub mistake_pool_size: usize,
    /// Inclusive range of the artificial pause before each decision.
    pub thinking_delay_ms: (u64, u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_scale_monotonically() {
        let profiles: Vec<_> = Difficulty::ALL.iter().map(|d| d.profile()).collect();
        for pair in profiles.windows(2) {
            assert!(pair[0].max_depth <= pair[1].max_depth);
            assert!(pair[0].max_time_ms <= pair[1].max_time_ms);
            assert!(pair[0].blunder_chance >= pair[1].blunder_chance);
            assert!(pair[0].mistake_chance >= pair[1].mistake_chance);
        }
    }

    #[test]
    fn top_tiers_never_blunder() {
        assert_eq!(Difficulty::Strategic.profile().blunder_chance, 0.0);
        let master = Difficulty::Master.profile();
        assert_eq!(master.blunder_chance, 0.0);
        assert_eq!(master.mistake_chance, 0.0);
        assert!(master.use_null_move && master.use_lmr);
    }

    #[test]
    fn rookie_is_handicapped() {
        let rookie = Difficulty::Rookie.profile();
        assert!(!rookie.use_book && !rookie.use_killers && !rookie.use_quiescence);
        assert_eq!(rookie.eval.development, 0.0);
        assert!(rookie.blunder_chance > 0.0);
    }

    #[test]
    fn names_match_tiers() {
        for d in Difficulty::ALL {
            assert_eq!(d.profile().name, d.name());
        }
    }
}
