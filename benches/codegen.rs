//! Benchmarks for code generation
//!
//! Run with: cargo bench

use celebrimbor::graph::Parameters;
use celebrimbor::{codegen, Graph, KindRegistry, NodeId, PortRef};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use egui::Pos2;

/// Chain of `size` sensor -> comparison -> if triples, each feeding the next.
fn build_graph(size: usize) -> Graph {
    let mut graph = Graph::new(KindRegistry::with_builtins());
    let mut previous: Option<NodeId> = None;
    for i in 0..size {
        let y = i as f32 * 200.0;
        let sensor = graph
            .create_node("sensor_input", Pos2::new(0.0, y), &Parameters::new())
            .unwrap();
        let cmp = graph
            .create_node("comparison", Pos2::new(300.0, y), &Parameters::new())
            .unwrap();
        let branch = graph
            .create_node("if", Pos2::new(600.0, y), &Parameters::new())
            .unwrap();
        graph.add_elif(branch).unwrap();
        graph
            .connect(&PortRef::new(sensor, "out"), &PortRef::new(cmp, "left"))
            .unwrap();
        graph
            .connect(&PortRef::new(cmp, "result"), &PortRef::new(branch, "condition"))
            .unwrap();
        if let Some(prev) = previous {
            graph
                .connect(&PortRef::new(prev, "out_false"), &PortRef::new(branch, "elif_0"))
                .unwrap();
        }
        previous = Some(branch);
    }
    graph
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("codegen_generate");

    for size in [10, 100, 1000].iter() {
        let graph = build_graph(*size);
        group.throughput(Throughput::Elements(graph.node_count() as u64));
        group.bench_with_input(BenchmarkId::new("generate", size), &graph, |b, graph| {
            b.iter(|| black_box(codegen::generate(graph)));
        });
    }

    group.finish();
}

fn bench_connect_and_regenerate(c: &mut Criterion) {
    let mut group = c.benchmark_group("codegen_after_edit");

    for size in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("disconnect_regenerate", size), size, |b, &size| {
            b.iter_batched(
                || build_graph(size),
                |mut graph| {
                    let id = graph.connections().next().map(|c| c.id);
                    if let Some(id) = id {
                        graph.disconnect(id).unwrap();
                    }
                    black_box(codegen::generate(&graph))
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_generate, bench_connect_and_regenerate);
criterion_main!(benches);
