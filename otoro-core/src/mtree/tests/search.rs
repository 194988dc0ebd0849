//! Search behaviour: laziness, ordering, bounds, and iterator cloning.

use crate::{ExtremesPromotion, MTree, MTreeBuilder};

use super::fixtures::deterministic_tree;

type AbsoluteMetric = fn(&i32, &i32) -> f64;

fn absolute(a: &i32, b: &i32) -> f64 {
    f64::from((a - b).abs())
}

fn one_dimensional_tree() -> MTree<i32, AbsoluteMetric, ExtremesPromotion> {
    MTreeBuilder::new(absolute as AbsoluteMetric)
        .with_min_node_capacity(2)
        .with_max_node_capacity(3)
        .with_promotion(ExtremesPromotion)
        .build()
        .expect("test capacities are valid")
}

#[test]
fn empty_tree_yields_no_results() {
    let tree = deterministic_tree(2, 3);
    let mut nearest = tree.nearest_by_limit(vec![1, 2, 3], 4);
    assert!(nearest.is_exhausted());
    assert_eq!(nearest.next(), None);
}

#[test]
fn results_arrive_incrementally_in_distance_order() {
    let mut tree = one_dimensional_tree();
    for value in [1, 2, 3, 4] {
        tree.add(value);
    }

    let results: Vec<(i32, f64)> = tree
        .nearest(0)
        .map(|neighbour| (*neighbour.item, neighbour.distance))
        .collect();
    assert_eq!(results, vec![(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)]);
}

#[test]
fn cloned_iterators_advance_independently() {
    let mut tree = one_dimensional_tree();
    for value in [1, 2, 3, 4] {
        tree.add(value);
    }

    let mut first = tree.nearest(0);
    assert_eq!(first.next().map(|n| *n.item), Some(1));

    let mut second = first.clone();
    let from_first: Vec<i32> = first.by_ref().map(|n| *n.item).collect();
    let from_second: Vec<i32> = second.by_ref().map(|n| *n.item).collect();
    assert_eq!(from_first, vec![2, 3, 4]);
    assert_eq!(from_second, from_first, "clones replay the same sequence");

    assert!(first.is_exhausted());
    assert_eq!(first.next(), None, "a terminated iterator stays terminated");
}

#[test]
fn limit_caps_the_number_of_emissions() {
    let mut tree = one_dimensional_tree();
    for value in 0..20 {
        tree.add(value * 7);
    }

    let results: Vec<i32> = tree.nearest_by_limit(3, 4).map(|n| *n.item).collect();
    assert_eq!(results, vec![0, 7, 14, 21]);

    let generous: Vec<i32> = tree.nearest_by_limit(3, 100).map(|n| *n.item).collect();
    assert_eq!(generous.len(), 20, "a limit beyond the tree yields everything");
}

#[test]
fn range_excludes_items_beyond_the_radius() {
    let mut tree = one_dimensional_tree();
    for value in [10, 20, 30, 40, 50] {
        tree.add(value);
    }

    let results: Vec<(i32, f64)> = tree
        .nearest_by_range(23, 10.0)
        .map(|neighbour| (*neighbour.item, neighbour.distance))
        .collect();
    assert_eq!(results, vec![(20, 3.0), (30, 7.0)]);
}

#[test]
fn range_and_limit_apply_simultaneously() {
    let mut tree = one_dimensional_tree();
    for value in [10, 20, 30, 40, 50] {
        tree.add(value);
    }

    let results: Vec<i32> = tree.nearest_bounded(34, 20.0, 2).map(|n| *n.item).collect();
    assert_eq!(results, vec![30, 40]);
}

#[test]
fn search_stays_lazy_until_consumed() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CALLS: AtomicUsize = AtomicUsize::new(0);
    fn counting(a: &i32, b: &i32) -> f64 {
        CALLS.fetch_add(1, Ordering::Relaxed);
        absolute(a, b)
    }

    let mut tree: MTree<i32, AbsoluteMetric, ExtremesPromotion> =
        MTreeBuilder::new(counting as AbsoluteMetric)
            .with_min_node_capacity(2)
            .with_max_node_capacity(3)
            .with_promotion(ExtremesPromotion)
            .build()
            .expect("test capacities are valid");
    for value in 0..32 {
        tree.add(value);
    }

    let after_build = CALLS.load(Ordering::Relaxed);
    let mut nearest = tree.nearest(5);
    let initialisation_calls = CALLS.load(Ordering::Relaxed) - after_build;
    assert_eq!(
        initialisation_calls, 1,
        "building a query costs one distance to the root"
    );

    nearest.next().expect("the tree is non-empty");
    let first_result_calls = CALLS.load(Ordering::Relaxed) - after_build;
    let full: Vec<i32> = nearest.map(|n| *n.item).collect();
    let all_calls = CALLS.load(Ordering::Relaxed) - after_build;
    assert_eq!(full.len(), 31);
    assert!(
        first_result_calls < all_calls,
        "producing one result must cost less than draining the query"
    );
}
