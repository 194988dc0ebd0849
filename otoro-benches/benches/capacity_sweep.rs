//! Capacity-sweep benchmarks: build and query times across
//! `min_node_capacity` values.
//!
//! Doubles the minimum occupancy per step to show the trade-off between
//! shallow, wide trees (cheap descent, expensive splits) and deep, narrow
//! ones.

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};

use otoro_benches::{
    BENCH_SEED,
    params::CapacitySweepParams,
    source::synthetic_points,
};
use otoro_core::{MTree, MTreeBuilder, RandomPromotion, euclidean_distance};

const MIN_CAPACITIES: [usize; 4] = [2, 4, 8, 16];
const POINT_COUNT: usize = 1_000;
const QUERY_LIMIT: usize = 10;

type Point = Vec<i32>;
type PointMetric = fn(&Point, &Point) -> f64;

fn euclid(a: &Point, b: &Point) -> f64 {
    euclidean_distance(a, b)
}

fn build_tree(
    points: Vec<Point>,
    min_capacity: usize,
) -> MTree<Point, PointMetric, RandomPromotion> {
    let mut tree = MTreeBuilder::new(euclid as PointMetric)
        .with_min_node_capacity(min_capacity)
        .with_promotion(RandomPromotion::with_seed(BENCH_SEED))
        .build()
        .expect("sweep capacities are valid");
    for point in points {
        tree.add(point);
    }
    tree
}

fn bench_insertion(c: &mut Criterion) {
    let points = synthetic_points(POINT_COUNT, BENCH_SEED);
    let mut group = c.benchmark_group("mtree_build");
    for min_capacity in MIN_CAPACITIES {
        let params = CapacitySweepParams {
            point_count: POINT_COUNT,
            min_capacity,
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(&params),
            &min_capacity,
            |bencher, &min_capacity| {
                bencher.iter_batched(
                    || points.clone(),
                    |points| build_tree(points, min_capacity),
                    BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let points = synthetic_points(POINT_COUNT, BENCH_SEED);
    let queries = synthetic_points(64, BENCH_SEED.wrapping_add(1));
    let mut group = c.benchmark_group("mtree_nearest");
    for min_capacity in MIN_CAPACITIES {
        let params = CapacitySweepParams {
            point_count: POINT_COUNT,
            min_capacity,
        };
        let tree = build_tree(points.clone(), min_capacity);
        group.bench_with_input(
            BenchmarkId::from_parameter(&params),
            &tree,
            |bencher, tree| {
                let mut cursor = 0;
                bencher.iter(|| {
                    let query = queries[cursor % queries.len()].clone();
                    cursor += 1;
                    tree.nearest_by_limit(query, QUERY_LIMIT).count()
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_insertion, bench_queries);
criterion_main!(benches);
