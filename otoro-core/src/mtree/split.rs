//! Node-split support: the per-split distance cache, promotion strategies,
//! and the balanced partition.
//!
//! A split evaluates the metric `O(k²)` times for a node of `k` children, so
//! every distance taken during one split goes through a [`SplitCache`] keyed
//! by the unordered item pair. The cache lives for exactly one split and is
//! dropped with it; routing and search call the metric directly because their
//! probe sets do not repeat.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::{SeedableRng, rngs::SmallRng, seq::index};

use crate::metric::Metric;

/// Memoises pairwise distances between the items taking part in one split.
///
/// Items are addressed by index into the split's item slice, and each pair is
/// normalised to `(low, high)` so the symmetric probe hits the same slot.
pub(crate) struct SplitCache<'a, T, D> {
    metric: &'a D,
    items: &'a [T],
    memo: HashMap<(usize, usize), f64>,
}

impl<'a, T, D> SplitCache<'a, T, D>
where
    D: Metric<T>,
{
    pub(crate) fn new(metric: &'a D, items: &'a [T]) -> Self {
        Self {
            metric,
            items,
            memo: HashMap::new(),
        }
    }

    /// Returns the distance between two member items, computing it at most
    /// once per unordered pair.
    pub(crate) fn distance(&mut self, a: usize, b: usize) -> f64 {
        if a == b {
            return 0.0;
        }
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(&known) = self.memo.get(&key) {
            return known;
        }
        let computed = self.metric.distance(&self.items[a], &self.items[b]);
        self.memo.insert(key, computed);
        computed
    }

    #[cfg(test)]
    pub(crate) fn memoised_pairs(&self) -> usize {
        self.memo.len()
    }
}

/// Chooses the two pivots promoted by a node split.
///
/// `items` holds the splitting node's child pivots in ascending item order
/// and always contains at least two distinct items. The returned indices
/// must differ.
pub trait PromotionStrategy<T> {
    /// Picks two member indices to promote.
    ///
    /// `distance` memoises the metric for the duration of the split; call it
    /// rather than the raw metric so partitioning can reuse the values.
    fn promote(&self, items: &[T], distance: &mut dyn FnMut(usize, usize) -> f64)
    -> (usize, usize);
}

/// Default promotion: a uniform random sample of two distinct members.
#[derive(Debug)]
pub struct RandomPromotion {
    rng: Mutex<SmallRng>,
}

impl RandomPromotion {
    /// Creates a promotion strategy seeded from the thread-local entropy
    /// source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(SmallRng::from_entropy()),
        }
    }

    /// Seeds the internal RNG to make splits reproducible.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomPromotion {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PromotionStrategy<T> for RandomPromotion {
    fn promote(
        &self,
        items: &[T],
        _distance: &mut dyn FnMut(usize, usize) -> f64,
    ) -> (usize, usize) {
        let mut rng = self.rng.lock().expect("promotion rng mutex poisoned");
        let picks = index::sample(&mut *rng, items.len(), 2);
        (picks.index(0), picks.index(1))
    }
}

/// Deterministic promotion used by tests: the least and greatest members in
/// the item order.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtremesPromotion;

impl<T: Ord> PromotionStrategy<T> for ExtremesPromotion {
    fn promote(
        &self,
        items: &[T],
        _distance: &mut dyn FnMut(usize, usize) -> f64,
    ) -> (usize, usize) {
        let mut least = 0;
        let mut greatest = 0;
        for (index, item) in items.iter().enumerate() {
            if *item < items[least] {
                least = index;
            }
            if *item > items[greatest] {
                greatest = index;
            }
        }
        (least, greatest)
    }
}

/// Distributes split members between the two promoted pivots, balanced.
///
/// Members are sorted ascending by distance to each pivot, then admitted
/// alternately from the front of each ordering, skipping members the other
/// side already took. The result sizes differ by at most one, and each pivot
/// lands in its own partition because its self-distance of zero sorts it
/// first.
pub(crate) fn balanced_partition(
    count: usize,
    (first, second): (usize, usize),
    distance: &mut dyn FnMut(usize, usize) -> f64,
) -> (Vec<usize>, Vec<usize>) {
    let queue1 = sorted_by_distance_to(count, first, distance);
    let queue2 = sorted_by_distance_to(count, second, distance);

    let mut taken = vec![false; count];
    let mut partition1 = Vec::with_capacity(count.div_ceil(2));
    let mut partition2 = Vec::with_capacity(count / 2);
    let (mut cursor1, mut cursor2) = (0, 0);

    while cursor1 < count || cursor2 < count {
        while cursor1 < count && taken[queue1[cursor1]] {
            cursor1 += 1;
        }
        if cursor1 < count {
            taken[queue1[cursor1]] = true;
            partition1.push(queue1[cursor1]);
            cursor1 += 1;
        }

        while cursor2 < count && taken[queue2[cursor2]] {
            cursor2 += 1;
        }
        if cursor2 < count {
            taken[queue2[cursor2]] = true;
            partition2.push(queue2[cursor2]);
            cursor2 += 1;
        }
    }

    (partition1, partition2)
}

fn sorted_by_distance_to(
    count: usize,
    pivot: usize,
    distance: &mut dyn FnMut(usize, usize) -> f64,
) -> Vec<usize> {
    let keys: Vec<f64> = (0..count).map(|member| distance(member, pivot)).collect();
    let mut order: Vec<usize> = (0..count).collect();
    // Stable sort: ties keep ascending item order.
    order.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]));
    order
}
