use criterion::{criterion_group, criterion_main, Criterion};

use helpers::collection::TestCollection;
use prunerank::{
    bounds::RawBounds,
    engine::{Algorithm, QueryEngine, WorkerState},
    query::Query,
    scorer::Bm25,
};

fn criterion_benchmark(c: &mut Criterion) {
    const NUM_DOCS: usize = 10_000;

    let collection = TestCollection::new(100, NUM_DOCS, 5., 10, Some(42));
    let scorer = Bm25::new(0.9, 0.4, &collection.index);
    let bounds = RawBounds::build(&collection.index, &scorer, 64);

    let query = Query::new(vec![0, 5, 17, 42]);

    for algorithm in [
        Algorithm::RankedOr,
        Algorithm::Wand,
        Algorithm::BlockMaxWand,
        Algorithm::MaxScore,
        Algorithm::BlockMaxMaxScore,
    ] {
        let engine = QueryEngine::new(&collection.index, &bounds, &scorer, algorithm, 10, false);
        c.bench_function(&algorithm.to_string(), |b| {
            let mut state = WorkerState::for_algorithm(algorithm, NUM_DOCS);
            b.iter(|| engine.evaluate(&query, &mut state).unwrap())
        });
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(500);
    targets = criterion_benchmark
}
criterion_main!(benches);
