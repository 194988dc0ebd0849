//! Structural invariant checks for the tree.
//!
//! The auditor walks the whole tree and reports the first violation found.
//! Debug builds run it after every mutation via [`crate::MTree`]'s internal
//! audit; property tests call [`crate::MTree::check_invariants`] directly
//! after each operation.

use thiserror::Error;

use crate::metric::Metric;
use crate::mtree::node::{CapacityBounds, Child, Node};

/// Reports a structural invariant violation found by
/// [`crate::MTree::check_invariants`].
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum TreeInvariantViolation {
    /// A covering radius was negative.
    #[error("node radius {radius} is negative")]
    NegativeRadius {
        /// The offending radius.
        radius: f64,
    },
    /// The root stored a distance to a parent it does not have.
    #[error("the root must not carry a distance to a parent")]
    RootDistanceSet,
    /// The node in root position carries a non-root variant.
    #[error("the root node carries a non-root variant")]
    RootVariantMismatch,
    /// A non-root item was missing its stored parent distance.
    #[error("a non-root item is missing its distance to the parent")]
    ParentDistanceMissing,
    /// A stored parent distance disagreed with the metric.
    #[error("stored parent distance {stored} differs from the computed {computed}")]
    ParentDistanceMismatch {
        /// Distance recorded on the child.
        stored: f64,
        /// Distance the metric reports.
        computed: f64,
    },
    /// A child protruded beyond its parent's covering radius.
    #[error("child reach {reach} exceeds the covering radius {radius}")]
    CoveringRadiusExceeded {
        /// Child parent-distance plus child radius.
        reach: f64,
        /// The parent's covering radius.
        radius: f64,
    },
    /// A node's child count left its variant's occupancy bounds.
    #[error("node holds {len} children, outside [{min}, {max}]")]
    CapacityOutOfBounds {
        /// Number of children held.
        len: usize,
        /// Minimum for the node's variant.
        min: usize,
        /// Configured maximum.
        max: usize,
    },
    /// A children-map key disagreed with the child's own pivot.
    #[error("a children-map key differs from the child's pivot")]
    ChildKeyMismatch,
    /// A leaf held a subtree, an internal node held an entry, or a child
    /// node carried a root variant.
    #[error("a child's kind does not match its parent's variant")]
    ChildVariantMismatch,
    /// Two leaves sat at different depths.
    #[error("leaf entries found at depths {left} and {right}")]
    UnevenLeafDepth {
        /// Height reported by one child.
        left: usize,
        /// Height reported by a sibling.
        right: usize,
    },
}

/// Audits a whole tree. `Ok(())` when every invariant holds.
pub(crate) fn audit<T, D>(
    root: Option<&Node<T>>,
    metric: &D,
    bounds: CapacityBounds,
) -> Result<(), TreeInvariantViolation>
where
    T: Ord,
    D: Metric<T>,
{
    let Some(root) = root else { return Ok(()) };
    if !root.variant.is_root() {
        return Err(TreeInvariantViolation::RootVariantMismatch);
    }
    check_node(root, None, metric, bounds).map(|_| ())
}

/// Checks one node and its subtree, returning the subtree height.
fn check_node<T, D>(
    node: &Node<T>,
    parent_pivot: Option<&T>,
    metric: &D,
    bounds: CapacityBounds,
) -> Result<usize, TreeInvariantViolation>
where
    T: Ord,
    D: Metric<T>,
{
    if node.radius < 0.0 {
        return Err(TreeInvariantViolation::NegativeRadius {
            radius: node.radius,
        });
    }
    check_parent_distance(node.parent_distance, parent_pivot, &node.pivot, metric)?;

    let min = node.variant.min_capacity(bounds);
    if node.children.len() < min || node.children.len() > bounds.max {
        return Err(TreeInvariantViolation::CapacityOutOfBounds {
            len: node.children.len(),
            min,
            max: bounds.max,
        });
    }

    let mut child_height: Option<usize> = None;
    for (key, child) in &node.children {
        if key != child.item() {
            return Err(TreeInvariantViolation::ChildKeyMismatch);
        }
        let stored = child
            .parent_distance()
            .ok_or(TreeInvariantViolation::ParentDistanceMissing)?;
        let computed = metric.distance(child.item(), &node.pivot);
        if stored != computed {
            return Err(TreeInvariantViolation::ParentDistanceMismatch { stored, computed });
        }
        let reach = stored + child.radius();
        if reach > node.radius {
            return Err(TreeInvariantViolation::CoveringRadiusExceeded {
                reach,
                radius: node.radius,
            });
        }

        let height = match child {
            Child::Entry(_) => {
                if !node.variant.is_leaf() {
                    return Err(TreeInvariantViolation::ChildVariantMismatch);
                }
                0
            }
            Child::Subtree(subtree) => {
                if node.variant.is_leaf() || subtree.variant.is_root() {
                    return Err(TreeInvariantViolation::ChildVariantMismatch);
                }
                check_node(subtree, Some(&node.pivot), metric, bounds)?
            }
        };
        match child_height {
            None => child_height = Some(height),
            Some(expected) if expected != height => {
                return Err(TreeInvariantViolation::UnevenLeafDepth {
                    left: expected,
                    right: height,
                });
            }
            Some(_) => {}
        }
    }

    Ok(child_height.expect("occupancy bounds guarantee at least one child") + 1)
}

fn check_parent_distance<T, D>(
    stored: Option<f64>,
    parent_pivot: Option<&T>,
    pivot: &T,
    metric: &D,
) -> Result<(), TreeInvariantViolation>
where
    D: Metric<T>,
{
    match (parent_pivot, stored) {
        (None, Some(_)) => Err(TreeInvariantViolation::RootDistanceSet),
        (None, None) => Ok(()),
        (Some(_), None) => Err(TreeInvariantViolation::ParentDistanceMissing),
        (Some(parent), Some(stored)) => {
            let computed = metric.distance(pivot, parent);
            if stored == computed {
                Ok(())
            } else {
                Err(TreeInvariantViolation::ParentDistanceMismatch { stored, computed })
            }
        }
    }
}
