use criterion::{black_box, criterion_group, criterion_main, Criterion};
use converge_core::graph::{DefaultPolicy, Relationship, RelationshipGraph};

/// A chain of `len` resources, each depending on the previous one.
fn chain(len: usize) -> RelationshipGraph<usize> {
    let mut graph = RelationshipGraph::new();
    for i in 1..len {
        graph.add_relationship(i - 1, i, Relationship::ordering());
    }
    graph
}

/// `width` independent resources, each with `depth` dependents in a row.
fn fan(width: usize, depth: usize) -> RelationshipGraph<usize> {
    let mut graph = RelationshipGraph::new();
    for root in 0..width {
        graph.add_vertex(root);
    }
    for root in 0..width {
        let mut previous = root;
        for level in 1..depth {
            let vertex = level * width + root;
            graph.add_relationship(previous, vertex, Relationship::ordering());
            previous = vertex;
        }
    }
    graph
}

fn benchmark_chain(c: &mut Criterion) {
    let mut graph = chain(1000);
    c.bench_function("traverse chain 1000", |b| {
        b.iter(|| {
            graph
                .traverse(&mut DefaultPolicy, |_, vertex, _| {
                    black_box(vertex);
                })
                .unwrap();
        })
    });
}

fn benchmark_fan(c: &mut Criterion) {
    let mut graph = fan(100, 10);
    c.bench_function("traverse fan 100x10", |b| {
        b.iter(|| {
            graph
                .traverse(&mut DefaultPolicy, |_, vertex, _| {
                    black_box(vertex);
                })
                .unwrap();
        })
    });
}

fn benchmark_cycle_check(c: &mut Criterion) {
    let graph = chain(5000);
    c.bench_function("is_cyclic chain 5000", |b| {
        b.iter(|| black_box(graph.graph().is_cyclic()))
    });
}

criterion_group!(benches, benchmark_chain, benchmark_fan, benchmark_cycle_check);
criterion_main!(benches);
