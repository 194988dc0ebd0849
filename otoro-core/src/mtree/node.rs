//! Node model and the recursive insertion and deletion machinery.
//!
//! Nodes come in four variants spanning root-ness and leaf-ness, each with
//! its own minimum occupancy. Structural signals between a child and its
//! parent (split replacements, under-capacity, descent misses) travel as the
//! [`Inserted`] and [`Removal`] result variants; nothing of them is visible
//! outside the crate.

use std::collections::BTreeMap;

use tracing::trace;

use crate::metric::Metric;
use crate::mtree::split::{PromotionStrategy, SplitCache, balanced_partition};

/// Node occupancy bounds configured at tree construction.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CapacityBounds {
    pub(crate) min: usize,
    pub(crate) max: usize,
}

/// Borrowed tree configuration threaded through recursive mutations.
pub(crate) struct OpContext<'a, D, P> {
    pub(crate) metric: &'a D,
    pub(crate) promotion: &'a P,
    pub(crate) bounds: CapacityBounds,
}

/// The four node variants: the cross-product of root-ness and leaf-ness.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum NodeVariant {
    /// The whole tree is one node holding entries directly.
    RootLeaf,
    /// An internal root routing to subtrees.
    Root,
    /// A non-root router.
    Internal,
    /// A non-root holder of entries.
    Leaf,
}

impl NodeVariant {
    pub(crate) fn is_leaf(self) -> bool {
        matches!(self, Self::RootLeaf | Self::Leaf)
    }

    pub(crate) fn is_root(self) -> bool {
        matches!(self, Self::RootLeaf | Self::Root)
    }

    /// The variant of the two nodes a split produces. Splits never produce
    /// roots; promotion to a new root happens above them.
    pub(crate) fn split_replacement(self) -> Self {
        if self.is_leaf() {
            Self::Leaf
        } else {
            Self::Internal
        }
    }

    pub(crate) fn min_capacity(self, bounds: CapacityBounds) -> usize {
        match self {
            Self::RootLeaf => 1,
            Self::Root => 2,
            Self::Internal | Self::Leaf => bounds.min,
        }
    }
}

/// Terminal record for one indexed item. Its covering radius is identically
/// zero.
#[derive(Clone, Debug)]
pub(crate) struct Entry<T> {
    pub(crate) item: T,
    pub(crate) parent_distance: Option<f64>,
}

/// A slot in a node's children map: either a routed subtree or a leaf entry.
#[derive(Clone, Debug)]
pub(crate) enum Child<T> {
    Subtree(Node<T>),
    Entry(Entry<T>),
}

impl<T> Child<T> {
    pub(crate) fn item(&self) -> &T {
        match self {
            Self::Subtree(node) => &node.pivot,
            Self::Entry(entry) => &entry.item,
        }
    }

    pub(crate) fn radius(&self) -> f64 {
        match self {
            Self::Subtree(node) => node.radius,
            Self::Entry(_) => 0.0,
        }
    }

    pub(crate) fn parent_distance(&self) -> Option<f64> {
        match self {
            Self::Subtree(node) => node.parent_distance,
            Self::Entry(entry) => entry.parent_distance,
        }
    }

    fn set_parent_distance(&mut self, distance: f64) {
        match self {
            Self::Subtree(node) => node.parent_distance = Some(distance),
            Self::Entry(entry) => entry.parent_distance = Some(distance),
        }
    }
}

/// Signal returned by [`Node::add`]: either the insertion fitted, or the node
/// overflowed and split into two replacements the caller must install in its
/// place.
pub(crate) enum Inserted<T> {
    Done,
    Split(Node<T>, Node<T>),
}

/// Signal returned by [`Node::remove`]. `Underflow` means the removal
/// succeeded but left this node below its minimum occupancy; the caller must
/// recover before returning.
pub(crate) enum Removal {
    Removed,
    NotFound,
    Underflow,
}

/// A router: a pivot item, the covering radius over all descendants, the
/// stored distance to the parent pivot (`None` for the root), and the
/// children keyed by their own pivots.
#[derive(Clone, Debug)]
pub(crate) struct Node<T> {
    pub(crate) pivot: T,
    pub(crate) radius: f64,
    pub(crate) parent_distance: Option<f64>,
    pub(crate) children: BTreeMap<T, Child<T>>,
    pub(crate) variant: NodeVariant,
}

impl<T: Clone + Ord> Node<T> {
    pub(crate) fn new(pivot: T, variant: NodeVariant) -> Self {
        Self {
            pivot,
            radius: 0.0,
            parent_distance: None,
            children: BTreeMap::new(),
            variant,
        }
    }

    /// Inserts `item` somewhere below this node. `distance` is
    /// `d(item, self.pivot)`, already computed by the caller.
    pub(crate) fn add<D, P>(
        &mut self,
        item: T,
        distance: f64,
        ctx: &OpContext<'_, D, P>,
    ) -> Inserted<T>
    where
        D: Metric<T>,
        P: PromotionStrategy<T>,
    {
        self.add_to_children(item, distance, ctx);
        self.split_if_overflowing(ctx)
    }

    fn add_to_children<D, P>(&mut self, item: T, distance: f64, ctx: &OpContext<'_, D, P>)
    where
        D: Metric<T>,
        P: PromotionStrategy<T>,
    {
        if self.variant.is_leaf() {
            debug_assert!(
                !self.children.contains_key(&item),
                "items must be distinct; duplicate insert is a caller error"
            );
            let key = item.clone();
            self.children.insert(
                key.clone(),
                Child::Entry(Entry {
                    item,
                    parent_distance: None,
                }),
            );
            self.update_metrics(&key, distance);
            return;
        }

        let (routed_key, routed_distance) = self.route(&item, ctx);
        let child = self
            .subtree_mut(&routed_key)
            .expect("routing picked an existing child");
        match child.add(item, routed_distance, ctx) {
            Inserted::Done => {
                let reach = child
                    .parent_distance
                    .expect("non-root nodes carry a parent distance")
                    + child.radius;
                self.expand_radius(reach);
            }
            Inserted::Split(first, second) => {
                self.children.remove(&routed_key);
                for replacement in [first, second] {
                    let replacement_distance =
                        ctx.metric.distance(&self.pivot, &replacement.pivot);
                    self.add_child(Child::Subtree(replacement), replacement_distance, ctx);
                }
            }
        }
    }

    /// Selects the routing child for a new item: the nearest child already
    /// covering it, otherwise the child whose radius grows the least. Ties
    /// keep the first candidate in children order.
    fn route<D, P>(&self, item: &T, ctx: &OpContext<'_, D, P>) -> (T, f64)
    where
        D: Metric<T>,
    {
        let mut nearest_covering: Option<(f64, &T)> = None;
        let mut smallest_increase: Option<(f64, f64, &T)> = None;

        for (key, child) in &self.children {
            let distance = ctx.metric.distance(child.item(), item);
            if distance <= child.radius() {
                if nearest_covering.is_none_or(|(best, _)| distance < best) {
                    nearest_covering = Some((distance, key));
                }
            } else {
                let increase = distance - child.radius();
                if smallest_increase.is_none_or(|(best, _, _)| increase < best) {
                    smallest_increase = Some((increase, distance, key));
                }
            }
        }

        if let Some((distance, key)) = nearest_covering {
            (key.clone(), distance)
        } else {
            let (_, distance, key) =
                smallest_increase.expect("routing over a non-empty children map");
            (key.clone(), distance)
        }
    }

    /// Installs a child (subtree or entry) under this node, updating its
    /// parent distance and this node's radius.
    ///
    /// When a subtree's pivot collides with an existing child's pivot, the
    /// arriving subtree is dissolved: its children transfer into the existing
    /// sibling, which may overflow and split, feeding this worklist again.
    /// Stored parent distances stay valid across the transfer because both
    /// parents share the same pivot.
    pub(crate) fn add_child<D, P>(
        &mut self,
        child: Child<T>,
        distance: f64,
        ctx: &OpContext<'_, D, P>,
    ) where
        D: Metric<T>,
        P: PromotionStrategy<T>,
    {
        if self.variant.is_leaf() {
            let key = child.item().clone();
            debug_assert!(
                !self.children.contains_key(&key),
                "leaf entries are keyed by distinct items"
            );
            self.children.insert(key.clone(), child);
            self.update_metrics(&key, distance);
            return;
        }

        let mut arrivals = vec![(child, distance)];
        while let Some((child, distance)) = arrivals.pop() {
            let key = child.item().clone();
            if !self.children.contains_key(&key) {
                self.children.insert(key.clone(), child);
                self.update_metrics(&key, distance);
                continue;
            }

            let Child::Subtree(arriving) = child else {
                unreachable!("a non-leaf node only receives subtree children")
            };
            let existing = self
                .subtree_mut(&key)
                .expect("collision implies an existing subtree");
            for (_, grandchild) in arriving.children {
                let grandchild_distance = grandchild
                    .parent_distance()
                    .expect("non-root items carry a parent distance");
                existing.add_child(grandchild, grandchild_distance, ctx);
            }
            match existing.split_if_overflowing(ctx) {
                Inserted::Done => {
                    // The absorbed grandchildren may have widened the sibling.
                    let reach = existing
                        .parent_distance
                        .expect("non-root nodes carry a parent distance")
                        + existing.radius;
                    self.expand_radius(reach);
                }
                Inserted::Split(first, second) => {
                    self.children.remove(&key);
                    for replacement in [first, second] {
                        let replacement_distance =
                            ctx.metric.distance(&self.pivot, &replacement.pivot);
                        arrivals.push((Child::Subtree(replacement), replacement_distance));
                    }
                }
            }
        }
    }

    /// Splits this node in two when it exceeds the maximum occupancy.
    ///
    /// The children's pivots form the split set; promotion picks two of them
    /// and the balanced partition distributes the rest. Every distance taken
    /// here goes through a cache scoped to this call. On a split the node is
    /// left hollowed out; the caller discards it in favour of the two
    /// replacements.
    pub(crate) fn split_if_overflowing<D, P>(&mut self, ctx: &OpContext<'_, D, P>) -> Inserted<T>
    where
        D: Metric<T>,
        P: PromotionStrategy<T>,
    {
        if self.children.len() <= ctx.bounds.max {
            return Inserted::Done;
        }

        let items: Vec<T> = self.children.keys().cloned().collect();
        trace!(members = items.len(), "splitting overflowing node");
        let mut cache = SplitCache::new(ctx.metric, &items);

        let (first_pivot, second_pivot) = {
            let mut oracle = |a: usize, b: usize| cache.distance(a, b);
            let promoted = ctx.promotion.promote(&items, &mut oracle);
            debug_assert_ne!(promoted.0, promoted.1, "promotion must pick distinct pivots");
            promoted
        };
        let (partition1, partition2) = {
            let mut oracle = |a: usize, b: usize| cache.distance(a, b);
            balanced_partition(items.len(), (first_pivot, second_pivot), &mut oracle)
        };

        let variant = self.variant.split_replacement();
        let mut former = std::mem::take(&mut self.children);
        let mut build = |pivot: usize, members: &[usize], cache: &mut SplitCache<'_, T, D>| {
            let mut node = Node::new(items[pivot].clone(), variant);
            for &member in members {
                let child = former
                    .remove(&items[member])
                    .expect("partition members come from the children map");
                let member_distance = cache.distance(pivot, member);
                node.add_child(child, member_distance, ctx);
            }
            node
        };
        let first = build(first_pivot, &partition1, &mut cache);
        let second = build(second_pivot, &partition2, &mut cache);

        Inserted::Split(first, second)
    }

    /// Removes `item` from this subtree. `distance` is `d(item, self.pivot)`.
    pub(crate) fn remove<D, P>(
        &mut self,
        item: &T,
        distance: f64,
        ctx: &OpContext<'_, D, P>,
    ) -> Removal
    where
        D: Metric<T>,
        P: PromotionStrategy<T>,
    {
        match self.remove_from_children(item, distance, ctx) {
            Removal::NotFound => Removal::NotFound,
            Removal::Removed | Removal::Underflow => {
                if self.children.len() < self.variant.min_capacity(ctx.bounds) {
                    Removal::Underflow
                } else {
                    Removal::Removed
                }
            }
        }
    }

    fn remove_from_children<D, P>(
        &mut self,
        item: &T,
        distance: f64,
        ctx: &OpContext<'_, D, P>,
    ) -> Removal
    where
        D: Metric<T>,
        P: PromotionStrategy<T>,
    {
        if self.variant.is_leaf() {
            return if self.children.remove(item).is_some() {
                Removal::Removed
            } else {
                Removal::NotFound
            };
        }

        let keys: Vec<T> = self.children.keys().cloned().collect();
        for key in keys {
            let child = self
                .subtree(&key)
                .expect("descent keys come from the children map");
            let child_parent_distance = child
                .parent_distance
                .expect("non-root nodes carry a parent distance");
            // Triangle-inequality precheck on the stored metrics, then the
            // real distance, both inclusive.
            if (distance - child_parent_distance).abs() > child.radius {
                continue;
            }
            let child_distance = ctx.metric.distance(item, &child.pivot);
            if child_distance > child.radius {
                continue;
            }

            let child = self
                .subtree_mut(&key)
                .expect("descent keys come from the children map");
            match child.remove(item, child_distance, ctx) {
                Removal::NotFound => {}
                Removal::Removed => {
                    let reach = child_parent_distance + child.radius;
                    self.expand_radius(reach);
                    return Removal::Removed;
                }
                Removal::Underflow => {
                    let survivor = self.restore_child_capacity(&key, ctx);
                    let restored = self
                        .subtree(&survivor)
                        .expect("capacity recovery returns a surviving child");
                    let reach = restored
                        .parent_distance
                        .expect("non-root nodes carry a parent distance")
                        + restored.radius;
                    self.expand_radius(reach);
                    return Removal::Removed;
                }
            }
        }
        Removal::NotFound
    }

    /// Recovers an under-capacity child, preferring a donated grandchild from
    /// the nearest sibling with spare occupancy, otherwise merging the child
    /// into the nearest minimally-occupied sibling. Returns the key of the
    /// surviving (grown) sibling.
    fn restore_child_capacity<D, P>(&mut self, under_key: &T, ctx: &OpContext<'_, D, P>) -> T
    where
        D: Metric<T>,
        P: PromotionStrategy<T>,
    {
        let mut nearest_donor: Option<(f64, &T)> = None;
        let mut nearest_merge: Option<(f64, &T)> = None;

        for (key, child) in &self.children {
            if key == under_key {
                continue;
            }
            let Child::Subtree(sibling) = child else {
                unreachable!("a non-leaf node only holds subtree children")
            };
            let distance = ctx.metric.distance(under_key, key);
            if sibling.children.len() > sibling.variant.min_capacity(ctx.bounds) {
                if nearest_donor.is_none_or(|(best, _)| distance < best) {
                    nearest_donor = Some((distance, key));
                }
            } else if nearest_merge.is_none_or(|(best, _)| distance < best) {
                nearest_merge = Some((distance, key));
            }
        }

        if let Some((_, donor_key)) = nearest_donor {
            let donor_key = donor_key.clone();
            trace!("recovering under-capacity child by donation");
            let donor = self
                .subtree_mut(&donor_key)
                .expect("donor was found among the children");

            let mut nearest_grandchild: Option<(f64, &T)> = None;
            for (grandchild_key, grandchild) in &donor.children {
                let distance = ctx.metric.distance(grandchild.item(), under_key);
                if nearest_grandchild.is_none_or(|(best, _)| distance < best) {
                    nearest_grandchild = Some((distance, grandchild_key));
                }
            }
            let (grandchild_distance, grandchild_key) =
                nearest_grandchild.expect("a donor has at least one grandchild");
            let grandchild_key = grandchild_key.clone();
            let grandchild = donor
                .children
                .remove(&grandchild_key)
                .expect("the nearest grandchild was found in the donor");

            let under = self
                .subtree_mut(under_key)
                .expect("the under-capacity child is still in place");
            under.add_child(grandchild, grandchild_distance, ctx);
            under_key.clone()
        } else {
            let (_, merge_key) =
                nearest_merge.expect("a node keeps at least one sibling of an underflowing child");
            let merge_key = merge_key.clone();
            trace!("recovering under-capacity child by merge");
            let under = match self.children.remove(under_key) {
                Some(Child::Subtree(node)) => node,
                _ => unreachable!("the under-capacity child is a subtree"),
            };
            let target = self
                .subtree_mut(&merge_key)
                .expect("merge candidate was found among the children");
            for (_, grandchild) in under.children {
                let distance = ctx.metric.distance(grandchild.item(), &target.pivot);
                target.add_child(grandchild, distance, ctx);
            }
            merge_key
        }
    }

    /// Sets the freshly installed child's parent distance and widens this
    /// node's radius to keep covering it.
    fn update_metrics(&mut self, key: &T, distance: f64) {
        let child = self
            .children
            .get_mut(key)
            .expect("metrics update targets an installed child");
        child.set_parent_distance(distance);
        let reach = distance + child.radius();
        self.expand_radius(reach);
    }

    /// Radius maintenance is monotone: the radius widens to cover, and is
    /// never re-tightened on removal.
    fn expand_radius(&mut self, reach: f64) {
        if reach > self.radius {
            self.radius = reach;
        }
    }

    fn subtree(&self, key: &T) -> Option<&Node<T>> {
        match self.children.get(key) {
            Some(Child::Subtree(node)) => Some(node),
            _ => None,
        }
    }

    fn subtree_mut(&mut self, key: &T) -> Option<&mut Node<T>> {
        match self.children.get_mut(key) {
            Some(Child::Subtree(node)) => Some(node),
            _ => None,
        }
    }
}
