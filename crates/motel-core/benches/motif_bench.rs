//! # Motif Benchmarks
//!
//! Performance benchmarks for motif evaluation, neighborhood traversal and
//! ensemble probabilities.
//!
//! Run with: `cargo bench -p motel-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use motel_core::{
    Attribute, EdgeWeights, Ensemble, EnsembleKind, Filter, Graph, GraphStore, MotelConfig, Motif,
    MotifEdge, MotifVertex, SparseImage, neighborhood,
};
use std::hint::black_box;

const TAGS: [&str; 4] = ["NOUN", "VERB", "ADJ", "DET"];

/// A token chain: vertex `i` is tagged `TAGS[i % 4]` and linked to `i + 1`.
fn create_token_chain(size: usize) -> Graph {
    let mut graph = Graph::new();
    let mut prev = None;

    for i in 0..size {
        let vertex = graph
            .create_vertex(vec![Attribute::new("pos", TAGS[i % TAGS.len()])])
            .expect("vertex");
        if let Some(prev) = prev {
            graph.create_edge(prev, "motel:next", vertex).expect("edge");
        }
        prev = Some(vertex);
    }

    graph
}

/// NOUN followed by VERB.
fn noun_before_verb() -> Motif {
    Motif::new(
        0,
        vec![
            MotifVertex::new(0, Filter::single("pos", "NOUN")),
            MotifVertex::new(1, Filter::single("pos", "VERB")),
        ],
        vec![MotifEdge::new(0, "motel:next", 1)],
    )
    .expect("motif")
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_motif_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("motif_evaluation");
    let motif = noun_before_verb();

    for size in [100, 1000, 10000].iter() {
        let graph = create_token_chain(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(motif.evaluate(&graph)));
        });
    }

    group.finish();
}

fn bench_neighborhood(c: &mut Criterion) {
    let mut group = c.benchmark_group("neighborhood");
    let weights = EdgeWeights::default();

    for distance in [1.0, 4.0, 16.0].iter() {
        let graph = create_token_chain(1000);
        let origin = graph.vertex_ids().expect("ids")[500];
        group.bench_with_input(BenchmarkId::from_parameter(distance), distance, |b, &d| {
            b.iter(|| black_box(neighborhood(&graph, origin, d, &weights)));
        });
    }

    group.finish();
}

fn bench_probabilities(c: &mut Criterion) {
    let mut group = c.benchmark_group("probabilities");
    let config = MotelConfig::default();

    for size in [100, 1000].iter() {
        let graph = create_token_chain(*size);
        let mut image = SparseImage::new();
        image.register_many(TAGS.iter().map(|tag| {
            Motif::new(0, vec![MotifVertex::new(0, Filter::single("pos", *tag))], Vec::new())
                .expect("motif")
        }));
        image.register(noun_before_verb());
        image.evaluate_store(&graph, "doc").expect("evaluate");

        for kind in EnsembleKind::ALL {
            let ensemble = Ensemble::new(kind, &image, &config);
            group.bench_with_input(BenchmarkId::new(kind.as_str(), size), size, |b, _| {
                b.iter(|| black_box(ensemble.probabilities()));
            });
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_motif_evaluation,
    bench_neighborhood,
    bench_probabilities,
);

criterion_main!(benches);
