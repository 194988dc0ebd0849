//! The M-Tree: a balanced, dynamic metric-space index.
//!
//! Supports insertion, deletion, and incremental nearest-neighbour retrieval
//! over any caller-supplied metric. Routing, covering radii, and the stored
//! parent distances let every operation prune subtrees with the triangle
//! inequality instead of scanning.

mod invariants;
mod node;
mod search;
mod split;

pub use self::invariants::TreeInvariantViolation;
pub use self::search::{Nearest, Neighbour};
pub use self::split::{ExtremesPromotion, PromotionStrategy, RandomPromotion};

use tracing::debug;

use crate::metric::Metric;

use self::node::{CapacityBounds, Child, Inserted, Node, NodeVariant, OpContext, Removal};

/// An in-memory M-Tree over items of type `T`.
///
/// `T` must be cheap to clone and carry a total order; the order keys the
/// children maps and need not agree with the metric. The metric `D` is any
/// [`Metric`] implementation, including plain closures. The promotion
/// strategy `P` only participates in node splits; the default samples two
/// random pivots.
///
/// Items must be distinct: inserting an item that is already indexed is a
/// caller error, caught by an assertion in debug builds and unchecked in
/// release builds.
///
/// Mutation is single-threaded; concurrent read-only searches over a frozen
/// tree are fine because searching takes `&self`.
///
/// # Examples
/// ```
/// use otoro_core::{MTreeBuilder, euclidean_distance};
///
/// let mut tree = MTreeBuilder::new(|a: &Vec<i32>, b: &Vec<i32>| euclidean_distance(a, b))
///     .with_min_node_capacity(2)
///     .build()
///     .expect("capacity bounds are valid");
/// tree.add(vec![1, 1]);
/// tree.add(vec![5, 5]);
/// tree.add(vec![9, 9]);
///
/// let nearest: Vec<_> = tree.nearest_by_limit(vec![0, 0], 2).collect();
/// assert_eq!(nearest[0].item, &vec![1, 1]);
/// assert_eq!(nearest[1].item, &vec![5, 5]);
/// assert!(nearest[0].distance <= nearest[1].distance);
/// ```
pub struct MTree<T, D, P = RandomPromotion> {
    bounds: CapacityBounds,
    metric: D,
    promotion: P,
    root: Option<Node<T>>,
    len: usize,
}

impl<T, D, P> std::fmt::Debug for MTree<T, D, P>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MTree")
            .field("bounds", &self.bounds)
            .field("root", &self.root)
            .field("len", &self.len)
            .finish()
    }
}

impl<T, D, P> MTree<T, D, P>
where
    T: Clone + Ord,
    D: Metric<T>,
    P: PromotionStrategy<T>,
{
    pub(crate) fn with_parameters(
        min_node_capacity: usize,
        max_node_capacity: usize,
        metric: D,
        promotion: P,
    ) -> Self {
        Self {
            bounds: CapacityBounds {
                min: min_node_capacity,
                max: max_node_capacity,
            },
            metric,
            promotion,
            root: None,
            len: 0,
        }
    }

    /// Indexes an item.
    ///
    /// The item must not already be indexed.
    pub fn add(&mut self, item: T) {
        let ctx = OpContext {
            metric: &self.metric,
            promotion: &self.promotion,
            bounds: self.bounds,
        };
        match self.root.as_mut() {
            None => {
                let mut root = Node::new(item.clone(), NodeVariant::RootLeaf);
                match root.add(item, 0.0, &ctx) {
                    Inserted::Done => {}
                    Inserted::Split(..) => unreachable!("a fresh root cannot overflow"),
                }
                self.root = Some(root);
            }
            Some(root) => {
                let distance = ctx.metric.distance(&item, &root.pivot);
                match root.add(item, distance, &ctx) {
                    Inserted::Done => {}
                    Inserted::Split(first, second) => {
                        // The old root's pivot keeps anchoring the tree so the
                        // stored distances below stay meaningful.
                        let hollow = self.root.take().expect("the root exists in this branch");
                        debug!("root split; promoting a new internal root");
                        let mut promoted = Node::new(hollow.pivot, NodeVariant::Root);
                        for replacement in [first, second] {
                            let replacement_distance =
                                ctx.metric.distance(&promoted.pivot, &replacement.pivot);
                            promoted.add_child(
                                Child::Subtree(replacement),
                                replacement_distance,
                                &ctx,
                            );
                        }
                        self.root = Some(promoted);
                    }
                }
            }
        }
        self.len += 1;
        self.debug_audit();
    }

    /// Removes an item from the index. Returns whether it was present; an
    /// absent item leaves the tree untouched.
    pub fn remove(&mut self, item: &T) -> bool {
        let ctx = OpContext {
            metric: &self.metric,
            promotion: &self.promotion,
            bounds: self.bounds,
        };
        let Some(root) = self.root.as_mut() else {
            return false;
        };
        let distance = ctx.metric.distance(item, &root.pivot);
        let removed = match root.remove(item, distance, &ctx) {
            Removal::NotFound => false,
            Removal::Removed => true,
            Removal::Underflow => {
                match root.variant {
                    NodeVariant::RootLeaf => {
                        debug_assert!(root.children.is_empty());
                        self.root = None;
                    }
                    NodeVariant::Root => {
                        let hollow = self.root.take().expect("the root exists in this branch");
                        let (_, survivor) = hollow
                            .children
                            .into_iter()
                            .next()
                            .expect("an underflowed internal root keeps exactly one child");
                        let Child::Subtree(survivor) = survivor else {
                            unreachable!("an internal root's children are subtrees")
                        };
                        let variant = if survivor.variant.is_leaf() {
                            NodeVariant::RootLeaf
                        } else {
                            NodeVariant::Root
                        };
                        debug!("root underflow; collapsing into its remaining child");
                        let mut collapsed = Node::new(survivor.pivot.clone(), variant);
                        for (_, grandchild) in survivor.children {
                            let grandchild_distance =
                                ctx.metric.distance(&collapsed.pivot, grandchild.item());
                            collapsed.add_child(grandchild, grandchild_distance, &ctx);
                        }
                        self.root = Some(collapsed);
                    }
                    NodeVariant::Internal | NodeVariant::Leaf => {
                        unreachable!("the root node carries a root variant")
                    }
                }
                true
            }
        };
        if removed {
            self.len -= 1;
        }
        self.debug_audit();
        removed
    }

    /// Searches for indexed items near `query`, unbounded in both radius and
    /// count: the iterator lazily yields every indexed item in non-decreasing
    /// distance order.
    pub fn nearest(&self, query: T) -> Nearest<'_, T, D> {
        self.nearest_bounded(query, f64::INFINITY, usize::MAX)
    }

    /// Searches for every indexed item within `range` of `query`.
    pub fn nearest_by_range(&self, query: T, range: f64) -> Nearest<'_, T, D> {
        self.nearest_bounded(query, range, usize::MAX)
    }

    /// Searches for the `limit` indexed items closest to `query`.
    pub fn nearest_by_limit(&self, query: T, limit: usize) -> Nearest<'_, T, D> {
        self.nearest_bounded(query, f64::INFINITY, limit)
    }

    /// Searches with both a radius and a count bound applied simultaneously.
    ///
    /// An empty tree yields no results. Dropping the iterator cancels the
    /// query.
    pub fn nearest_bounded(&self, query: T, range: f64, limit: usize) -> Nearest<'_, T, D> {
        Nearest::new(&self.metric, self.root.as_ref(), query, range, limit)
    }

    /// Returns the number of indexed items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the tree indexes no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the configured minimum node occupancy.
    #[must_use]
    pub fn min_node_capacity(&self) -> usize {
        self.bounds.min
    }

    /// Returns the configured maximum node occupancy.
    #[must_use]
    pub fn max_node_capacity(&self) -> usize {
        self.bounds.max
    }

    /// Audits every structural invariant, returning the first violation.
    ///
    /// Debug builds run this after each mutation; release builds only run it
    /// on demand.
    pub fn check_invariants(&self) -> Result<(), TreeInvariantViolation> {
        invariants::audit(self.root.as_ref(), &self.metric, self.bounds)
    }

    #[cfg(debug_assertions)]
    fn debug_audit(&self) {
        if let Err(violation) = self.check_invariants() {
            panic!("m-tree invariant violated: {violation}");
        }
    }

    #[cfg(not(debug_assertions))]
    fn debug_audit(&self) {}

    #[cfg(test)]
    pub(crate) fn root(&self) -> Option<&Node<T>> {
        self.root.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn root_mut(&mut self) -> Option<&mut Node<T>> {
        self.root.as_mut()
    }
}

#[cfg(test)]
mod tests;
