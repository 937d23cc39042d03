use criterion::{Criterion, black_box, criterion_group, criterion_main};

use memvault_ring::{AvlTree, HashRing, NodeAddr, ring_position};

fn cluster(nodes: u16, vnodes: usize) -> HashRing {
    let mut ring = HashRing::new();
    for port in 0..nodes {
        ring.add_node(&NodeAddr::new("127.0.0.1", 7000 + port), vnodes);
    }
    ring
}

fn bench_ring_position(c: &mut Criterion) {
    c.bench_function("ring_position", |b| {
        b.iter(|| black_box(ring_position(black_box("user:123456"))))
    });
}

fn bench_avl_insert(c: &mut Criterion) {
    c.bench_function("avl_insert_10k", |b| {
        b.iter(|| {
            let mut tree = AvlTree::new();
            for i in 0..10_000u32 {
                tree.insert(i.wrapping_mul(2_654_435_761), i);
            }
            black_box(tree.height())
        })
    });
}

fn bench_route(c: &mut Criterion) {
    let ring = cluster(5, 100);
    c.bench_function("route_5_nodes_500_vnodes", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            black_box(ring.route(&format!("key:{i}")).is_ok())
        })
    });
}

fn bench_placement(c: &mut Criterion) {
    let ring = cluster(5, 100);
    c.bench_function("placement_rf3", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            black_box(ring.placement(&format!("key:{i}"), 3).map(|p| p.replicas.len()))
        })
    });
}

fn bench_add_remove_node(c: &mut Criterion) {
    let mut ring = cluster(4, 100);
    let node = NodeAddr::new("127.0.0.1", 9000);
    c.bench_function("add_remove_node_100_vnodes", |b| {
        b.iter(|| {
            ring.add_node(&node, 100);
            black_box(ring.remove_node(&node))
        })
    });
}

criterion_group!(
    benches,
    bench_ring_position,
    bench_avl_insert,
    bench_route,
    bench_placement,
    bench_add_remove_node
);
criterion_main!(benches);
