use std::hint::black_box;
use std::sync::Arc;

use blocking::{BlockingConfig, BlockingIndex, Candidate};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use matcher::MatchEngine;
use normalize::{NormalizeConfig, Normalizer, RawName};
use similarity::Weights;

const PREFIXES: [&str; 12] = [
    "St.", "Mercy", "Northside", "Lakeview", "Riverside", "Summit", "Valley", "Harbor",
    "Pinecrest", "Oakwood", "Acme", "Zenith",
];
const CORES: [&str; 8] = [
    "General", "Family", "Community", "Regional", "Memorial", "Childrens", "Dental", "Surgical",
];
const KINDS: [&str; 6] = [
    "Hospital", "Clinic", "Medical Ctr", "Health Sys", "Group Inc", "Associates LLC",
];

/// Deterministic synthetic roster of facility names.
fn roster(normalizer: &Normalizer, size: usize) -> Vec<Candidate> {
    (0..size)
        .map(|i| {
            let text = format!(
                "{} {} {} {}",
                PREFIXES[i % PREFIXES.len()],
                CORES[(i / PREFIXES.len()) % CORES.len()],
                KINDS[(i / 7) % KINDS.len()],
                i / 97
            );
            let raw = RawName::new(text);
            let name = normalizer.normalize_raw(&raw);
            Candidate {
                id: format!("c{i}"),
                raw,
                name,
            }
        })
        .collect()
}

fn engine(size: usize) -> MatchEngine {
    let normalizer = Arc::new(Normalizer::new(&NormalizeConfig::default()).expect("normalizer"));
    let candidates = roster(&normalizer, size);
    let index = BlockingIndex::build(candidates, &BlockingConfig::default()).expect("index");
    MatchEngine::new(normalizer, Arc::new(index), Weights::default()).expect("engine")
}

fn bench_pair_scoring(c: &mut Criterion) {
    let normalizer = Normalizer::new(&NormalizeConfig::default()).expect("normalizer");
    let a = normalizer.normalize("St. Mary's Hospital");
    let b = normalizer.normalize("Saint Marys Medical Center");

    c.bench_function("similarity_score_pair", |bench| {
        bench.iter(|| similarity::score(black_box(&a), black_box(&b)))
    });
    c.bench_function("normalize_name", |bench| {
        bench.iter(|| normalizer.normalize(black_box("The Mercy Gen. Hosp. of St. Louis, Inc.")))
    });
}

fn bench_score_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_query");
    let query = RawName::new("Mercy General Hospital");

    for size in [50usize, 500, 5_000] {
        let engine = engine(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &engine, |bench, engine| {
            bench.iter(|| engine.score_query(black_box(&query)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pair_scoring, bench_score_query);
criterion_main!(benches);
