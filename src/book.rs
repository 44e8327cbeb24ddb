//! Opening-book boundary. The engine only ever sees [`BookSource`]; how the
//! weighted moves were produced (Polyglot file, database, hardcoded lines)
//! is the caller's business.

use std::collections::HashMap;

use rand::Rng;

/// One weighted candidate for a position. The move is UCI long algebraic so
/// sources need no knowledge of this crate's move representation; the
/// engine validates it against the legal moves before use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookMove {
    pub uci: String,
    pub weight: u32,
}

impl BookMove {
    pub fn new(uci: impl Into<String>, weight: u32) -> Self {
        BookMove { uci: uci.into(), weight }
    }
}

/// A read-only store of weighted book moves keyed by Zobrist key.
pub trait BookSource {
    /// Candidates for the position, or empty when the position is unknown.
    fn query(&self, key: u64) -> Vec<BookMove>;
}

/// In-memory book, hash-indexed. Useful for tests and for callers that
/// parse a book file themselves.
#[derive(Debug, Clone, Default)]
pub struct MemoryBook {
    by_key: HashMap<u64, Vec<BookMove>>,
}

impl MemoryBook {
    pub fn new() -> Self {
        MemoryBook::default()
    }

    pub fn insert(&mut self, key: u64, uci: impl Into<String>, weight: u32) {
        self.by_key.entry(key).or_default().push(BookMove::new(uci, weight));
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

impl BookSource for MemoryBook {
    fn query(&self, key: u64) -> Vec<BookMove> {
        self.by_key.get(&key).cloned().unwrap_or_default()
    }
}

/// Pick one candidate proportionally to its weight. All-zero weights fall
/// back to the first entry.
pub fn sample_weighted<'a, R: Rng + ?Sized>(
    moves: &'a [BookMove],
    rng: &mut R,
) -> Option<&'a BookMove> {
    if moves.is_empty() {
        return None;
    }
    let total: u64 = moves.iter().map(|m| u64::from(m.weight)).sum();
    if total == 0 {
        return moves.first();
    }
    let mut pick = rng.random_range(0..total);
    for candidate in moves {
        let weight = u64::from(candidate.weight);
        if pick < weight {
            return Some(candidate);
        }
        pick -= weight;
    }
    moves.first()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::board::Position;

    #[test]
    fn memory_book_round_trip() {
        let pos = Position::new();
        let mut book = MemoryBook::new();
        book.insert(pos.zobrist(), "e2e4", 5);
        book.insert(pos.zobrist(), "d2d4", 3);

        let row = book.query(pos.zobrist());
        assert_eq!(row.len(), 2);
        assert_eq!(book.query(pos.zobrist() ^ 1), vec![]);
    }

    #[test]
    fn sampling_respects_weights() {
        let moves = vec![BookMove::new("e2e4", 90), BookMove::new("a2a3", 10)];
        let mut rng = StdRng::seed_from_u64(42);
        let mut e4_hits = 0;
        for _ in 0..200 {
            if sample_weighted(&moves, &mut rng).unwrap().uci == "e2e4" {
                e4_hits += 1;
            }
        }
        assert!(e4_hits > 140, "90% weight drew only {}/200", e4_hits);
    }

    #[test]
    fn sampling_edge_cases() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(sample_weighted(&[], &mut rng).is_none());

        let zero_weights = vec![BookMove::new("e2e4", 0), BookMove::new("d2d4", 0)];
        assert_eq!(sample_weighted(&zero_weights, &mut rng).unwrap().uci, "e2e4");

        let single = vec![BookMove::new("g1f3", 1)];
        assert_eq!(sample_weighted(&single, &mut rng).unwrap().uci, "g1f3");
    }

    #[test]
    fn sampling_is_deterministic_under_a_fixed_seed() {
        let moves = vec![
            BookMove::new("e2e4", 4),
            BookMove::new("d2d4", 3),
            BookMove::new("c2c4", 2),
        ];
        let picks_a: Vec<String> = {
            let mut rng = StdRng::seed_from_u64(99);
            (0..10).map(|_| sample_weighted(&moves, &mut rng).unwrap().uci.clone()).collect()
        };
        let picks_b: Vec<String> = {
            let mut rng = StdRng::seed_from_u64(99);
            (0..10).map(|_| sample_weighted(&moves, &mut rng).unwrap().uci.clone()).collect()
        };
        assert_eq!(picks_a, picks_b);
    }
}
