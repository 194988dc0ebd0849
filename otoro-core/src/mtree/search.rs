//! Incremental best-first nearest-neighbour search.
//!
//! The query keeps two min-heaps: pending subtrees ordered by the lower
//! bound `max(d(query, pivot) − radius, 0)`, and candidate entries ordered by
//! their true distance. An entry is emitted only once no unexplored subtree
//! could still hold something closer, which makes emissions non-decreasing in
//! distance. Each `next` call does just enough expansion to produce one
//! result, so an abandoned iterator costs only the frontier explored so far.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::iter::FusedIterator;

use crate::metric::Metric;
use crate::mtree::node::{Child, Entry, Node};

/// One search result: a borrowed indexed item and its distance to the query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbour<'tree, T> {
    /// The indexed item.
    pub item: &'tree T,
    /// Distance between the query and the item.
    pub distance: f64,
}

/// A subtree awaiting expansion, keyed by its lower-bound distance.
struct PendingSubtree<'tree, T> {
    node: &'tree Node<T>,
    distance: f64,
    min_distance: f64,
}

impl<T> Clone for PendingSubtree<'_, T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node,
            distance: self.distance,
            min_distance: self.min_distance,
        }
    }
}

impl<T> PartialEq for PendingSubtree<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.min_distance == other.min_distance
    }
}

impl<T> Eq for PendingSubtree<'_, T> {}

impl<T> PartialOrd for PendingSubtree<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for PendingSubtree<'_, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.min_distance.total_cmp(&other.min_distance)
    }
}

/// An entry whose true distance is known but which may not be emitted yet.
struct CandidateEntry<'tree, T> {
    entry: &'tree Entry<T>,
    distance: f64,
}

impl<T> Clone for CandidateEntry<'_, T> {
    fn clone(&self) -> Self {
        Self {
            entry: self.entry,
            distance: self.distance,
        }
    }
}

impl<T> PartialEq for CandidateEntry<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}

impl<T> Eq for CandidateEntry<'_, T> {}

impl<T> PartialOrd for CandidateEntry<'_, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for CandidateEntry<'_, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance.total_cmp(&other.distance)
    }
}

/// Lazy producer of the indexed items nearest to a query point, in
/// non-decreasing distance order, bounded by a search radius and a result
/// limit.
///
/// Returned by [`crate::MTree::nearest`] and its bounded companions. Cloning
/// the iterator snapshots the query state: both copies then produce the same
/// remaining sequence independently.
pub struct Nearest<'tree, T, D> {
    metric: &'tree D,
    query: T,
    range: f64,
    limit: usize,
    pending: BinaryHeap<Reverse<PendingSubtree<'tree, T>>>,
    candidates: BinaryHeap<Reverse<CandidateEntry<'tree, T>>>,
    next_pending_min_distance: f64,
    yielded: usize,
}

impl<'tree, T, D> Nearest<'tree, T, D>
where
    D: Metric<T>,
{
    pub(crate) fn new(
        metric: &'tree D,
        root: Option<&'tree Node<T>>,
        query: T,
        range: f64,
        limit: usize,
    ) -> Self {
        let mut pending = BinaryHeap::new();
        let mut next_pending_min_distance = f64::INFINITY;
        if let Some(root) = root {
            let distance = metric.distance(&query, &root.pivot);
            let min_distance = (distance - root.radius).max(0.0);
            next_pending_min_distance = min_distance;
            pending.push(Reverse(PendingSubtree {
                node: root,
                distance,
                min_distance,
            }));
        }
        Self {
            metric,
            query,
            range,
            limit,
            pending,
            candidates: BinaryHeap::new(),
            next_pending_min_distance,
            yielded: 0,
        }
    }

    /// Whether the query can produce no further results.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.yielded >= self.limit || (self.pending.is_empty() && self.candidates.is_empty())
    }

    /// Expands the closest pending subtree, pushing each child that may
    /// intersect the query ball onto the matching heap.
    fn expand_closest_pending(&mut self) -> bool {
        let Some(Reverse(pending)) = self.pending.pop() else {
            return false;
        };
        for child in pending.node.children.values() {
            let child_parent_distance = child
                .parent_distance()
                .expect("non-root items carry a parent distance");
            // Triangle-inequality precheck on stored metrics alone; skips
            // the metric evaluation for children that cannot reach the ball.
            if (pending.distance - child_parent_distance).abs() - child.radius() > self.range {
                continue;
            }
            let distance = self.metric.distance(&self.query, child.item());
            let min_distance = (distance - child.radius()).max(0.0);
            if min_distance > self.range {
                continue;
            }
            match child {
                Child::Entry(entry) => {
                    self.candidates.push(Reverse(CandidateEntry { entry, distance }));
                }
                Child::Subtree(node) => {
                    self.pending.push(Reverse(PendingSubtree {
                        node,
                        distance,
                        min_distance,
                    }));
                }
            }
        }
        self.next_pending_min_distance = self
            .pending
            .peek()
            .map_or(f64::INFINITY, |Reverse(top)| top.min_distance);
        true
    }
}

impl<'tree, T, D> Iterator for Nearest<'tree, T, D>
where
    D: Metric<T>,
{
    type Item = Neighbour<'tree, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.yielded >= self.limit {
            return None;
        }
        loop {
            if let Some(Reverse(best)) = self.candidates.peek() {
                // Nothing unexplored can beat this candidate: emit it.
                if best.distance <= self.next_pending_min_distance {
                    let Some(Reverse(best)) = self.candidates.pop() else {
                        unreachable!("peeked candidate heap is non-empty")
                    };
                    self.yielded += 1;
                    return Some(Neighbour {
                        item: &best.entry.item,
                        distance: best.distance,
                    });
                }
            }
            if !self.expand_closest_pending() {
                return None;
            }
        }
    }
}

impl<T, D> FusedIterator for Nearest<'_, T, D> where D: Metric<T> {}

impl<T: Clone, D> Clone for Nearest<'_, T, D> {
    fn clone(&self) -> Self {
        Self {
            metric: self.metric,
            query: self.query.clone(),
            range: self.range,
            limit: self.limit,
            pending: self.pending.clone(),
            candidates: self.candidates.clone(),
            next_pending_min_distance: self.next_pending_min_distance,
            yielded: self.yielded,
        }
    }
}
