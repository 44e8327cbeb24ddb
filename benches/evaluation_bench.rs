use criterion::{Criterion, criterion_group, criterion_main};

use gambit::evaluation::{EvalWeights, evaluate};
use gambit::{Color, Position};

fn bench_evaluation(c: &mut Criterion) {
    let positions = vec![
        ("startpos", Position::new()),
        (
            "middlegame",
            Position::from_fen(
                "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
            )
            .unwrap(),
        ),
        ("endgame", Position::from_fen("8/5k2/8/8/8/8/4K3/4R3 w - - 0 1").unwrap()),
        (
            "complex",
            Position::from_fen(
                "r1bq1rk1/pp2ppbp/2np2p1/2n5/P3PP2/N1P2N2/1PB3PP/R1B1QRK1 b - - 0 10",
            )
            .unwrap(),
        ),
    ];

    let weights = EvalWeights::all();
    for (name, pos) in &positions {
        c.bench_function(&format!("eval_{}", name), |b| {
            b.iter(|| evaluate(pos, Color::White, &weights))
        });
    }
}

criterion_group!(benches, bench_evaluation);
criterion_main!(benches);
