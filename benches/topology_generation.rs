use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kais_operator::domain::models::TopologySpec;
use kais_operator::services::topology::generate;

fn cell_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("worker-{i}")).collect()
}

fn bench_full_mesh(c: &mut Criterion) {
    let names = cell_names(50);
    c.bench_function("topology/full_mesh_50", |b| {
        b.iter(|| generate(&TopologySpec::FullMesh, black_box(&names)).unwrap())
    });
}

fn bench_hierarchy(c: &mut Criterion) {
    let names = cell_names(50);
    let topology = TopologySpec::Hierarchy { root: names[0].clone() };
    c.bench_function("topology/hierarchy_50", |b| {
        b.iter(|| generate(&topology, black_box(&names)).unwrap())
    });
}

fn bench_ring(c: &mut Criterion) {
    let names = cell_names(50);
    c.bench_function("topology/ring_50", |b| {
        b.iter(|| generate(&TopologySpec::Ring, black_box(&names)).unwrap())
    });
}

criterion_group!(benches, bench_full_mesh, bench_hierarchy, bench_ring);
criterion_main!(benches);
