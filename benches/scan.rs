//! Scanner and pipeline throughput over a synthetic corpus.

use criterion::{Criterion, Throughput, criterion_group, criterion_main};

use polybook::book::index::{BuildOptions, build_book};
use polybook::pgn;

const GAME: &str = "[Event \"bench\"]\n\
[Site \"?\"]\n\
[Result \"1/2-1/2\"]\n\
\n\
1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 Nf6 5. O-O Be7 6. Re1 b5 7. Bb3 d6 \
8. c3 O-O 9. h3 Nb8 {the Breyer} 10. d4 Nbd7 11. Nbd2 Bb7 12. Bc2 Re8 \
13. Nf1 Bf8 14. Ng3 g6 15. a4 c5 16. d5 c4 1/2-1/2\n\n";

fn corpus(games: usize) -> Vec<u8> {
    GAME.as_bytes().repeat(games)
}

fn scanner_throughput(c: &mut Criterion) {
    let data = corpus(2_000);
    let mut group = c.benchmark_group("scan");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("tokenise", |b| {
        b.iter(|| {
            let mut tokens = 0u64;
            let stats = pgn::scan(&data, |game| {
                tokens += game.sans.iter().filter(|&&b| b == 0).count() as u64
            });
            (tokens, stats.games)
        })
    });
    group.finish();
}

fn build_throughput(c: &mut Criterion) {
    let data = corpus(500);
    let mut group = c.benchmark_group("build");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("book", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(1 << 20);
            build_book(&data, &mut out, BuildOptions::default()).unwrap();
            out.len()
        })
    });
    group.finish();
}

criterion_group!(benches, scanner_throughput, build_throughput);
criterion_main!(benches);
