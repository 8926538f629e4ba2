use std::cmp::Ordering;

use serde::Serialize;

use super::super::arena::Node;
use super::super::order::KeyOrder;
use super::BPlusTree;
use crate::types::{IndexError, NodeId, Result};

/// Shape of a tree that passed [`BPlusTree::verify`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Nodes reachable from the root.
    pub nodes: usize,
    /// Leaf nodes.
    pub leaves: usize,
    /// Interior nodes, the root included once the tree has grown.
    pub interior_nodes: usize,
    /// Pairs stored in leaves.
    pub entries: usize,
    /// Levels, counting the leaf level.
    pub height: usize,
    /// Block bytes held by reachable nodes.
    pub bytes: usize,
}

/// Key interval a node is responsible for; `None` means unbounded.
struct Bounds<'a, K> {
    lower: Option<&'a K>,
    upper: Option<&'a K>,
}

impl<K, V, O> BPlusTree<K, V, O>
where
    K: Clone + Default,
    V: Clone + Default,
    O: KeyOrder<K>,
{
    /// Walks the whole tree and checks its structural invariants.
    ///
    /// Every node must be sorted and within capacity, every interior node must hold at least
    /// one separator, and every node may hold only keys inside the interval its
    /// parent assigns, carry fence keys matching that interval, and link to the next node of
    /// its level. All leaves must sit at the same depth and the arena must hold no node the
    /// tree cannot reach.
    pub fn verify(&self) -> Result<VerifyReport> {
        let mut report = VerifyReport::default();
        let mut level: Vec<(NodeId, Bounds<'_, K>)> = vec![(
            self.root,
            Bounds {
                lower: None,
                upper: None,
            },
        )];
        let mut depth = 0usize;
        while !level.is_empty() {
            depth += 1;
            if depth > self.height {
                return Err(IndexError::InvariantViolation("tree deeper than its height"));
            }
            let mut next_level = Vec::new();
            for (index, (id, bounds)) in level.iter().enumerate() {
                let node = self.arena.get(*id)?;
                let expected_sibling = level.get(index + 1).map(|(next, _)| *next);
                if node.right_sibling() != expected_sibling {
                    return Err(IndexError::InvariantViolation(
                        "right sibling does not match level order",
                    ));
                }
                if node.len() > node.capacity() {
                    return Err(IndexError::InvariantViolation("node over capacity"));
                }
                report.nodes += 1;
                report.bytes += node.byte_size();
                match node {
                    Node::Leaf(leaf) => {
                        if depth != self.height {
                            return Err(IndexError::InvariantViolation(
                                "leaf above the bottom level",
                            ));
                        }
                        self.check_node_keys(
                            leaf.elements().iter().map(|pair| &pair.key),
                            &leaf.low_fence().key,
                            &leaf.high_fence().key,
                            bounds,
                        )?;
                        report.leaves += 1;
                        report.entries += leaf.len();
                    }
                    Node::Interior(interior) => {
                        if depth == self.height {
                            return Err(IndexError::InvariantViolation(
                                "interior node on the leaf level",
                            ));
                        }
                        if interior.is_empty() {
                            return Err(IndexError::InvariantViolation(
                                "interior node without a separator",
                            ));
                        }
                        if !interior.high_fence().payload.is_null() {
                            return Err(IndexError::InvariantViolation(
                                "interior high fence carries a child",
                            ));
                        }
                        self.check_node_keys(
                            interior.elements().iter().map(|pair| &pair.key),
                            &interior.low_fence().key,
                            &interior.high_fence().key,
                            bounds,
                        )?;
                        report.interior_nodes += 1;
                        let mut lower = bounds.lower;
                        let mut child = interior.low_fence().payload;
                        for pair in interior.elements() {
                            next_level.push((
                                child,
                                Bounds {
                                    lower,
                                    upper: Some(&pair.key),
                                },
                            ));
                            lower = Some(&pair.key);
                            child = pair.payload;
                        }
                        next_level.push((
                            child,
                            Bounds {
                                lower,
                                upper: bounds.upper,
                            },
                        ));
                    }
                }
            }
            level = next_level;
        }
        report.height = depth;
        if depth != self.height {
            return Err(IndexError::InvariantViolation("leaves above recorded height"));
        }
        if report.entries != self.len {
            return Err(IndexError::InvariantViolation("entry count does not match len"));
        }
        if report.nodes != self.arena.live_nodes() || report.bytes != self.arena.live_bytes() {
            return Err(IndexError::InvariantViolation("arena holds unreachable nodes"));
        }
        Ok(report)
    }

    fn check_node_keys<'k>(
        &self,
        keys: impl Iterator<Item = &'k K>,
        low_fence: &K,
        high_fence: &K,
        bounds: &Bounds<'_, K>,
    ) -> Result<()>
    where
        K: 'k,
    {
        if let Some(lower) = bounds.lower {
            if self.order.compare(low_fence, lower) != Ordering::Equal {
                return Err(IndexError::InvariantViolation("low fence differs from bound"));
            }
        }
        if let Some(upper) = bounds.upper {
            if self.order.compare(high_fence, upper) != Ordering::Equal {
                return Err(IndexError::InvariantViolation("high fence differs from bound"));
            }
        }
        let mut previous: Option<&K> = None;
        for key in keys {
            if let Some(previous) = previous {
                if !self.order.less(previous, key) {
                    return Err(IndexError::InvariantViolation("keys out of order"));
                }
            }
            if bounds.lower.is_some_and(|lower| self.order.less(key, lower)) {
                return Err(IndexError::InvariantViolation("key below lower bound"));
            }
            if bounds.upper.is_some_and(|upper| !self.order.less(key, upper)) {
                return Err(IndexError::InvariantViolation("key not below upper bound"));
            }
            previous = Some(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::btree::{BPlusTree, BPlusTreeOptions};
    use crate::types::{IndexError, Result};

    #[test]
    fn empty_tree_reports_single_leaf() -> Result<()> {
        let tree = BPlusTree::<u32, u32>::new()?;
        let report = tree.verify()?;
        assert_eq!(report.nodes, 1);
        assert_eq!(report.leaves, 1);
        assert_eq!(report.interior_nodes, 0);
        assert_eq!(report.entries, 0);
        assert_eq!(report.height, 1);
        assert_eq!(report.bytes, tree.arena().live_bytes());
        Ok(())
    }

    #[test]
    fn grown_tree_accounts_for_every_node() -> Result<()> {
        let mut tree = BPlusTree::<u32, u32>::with_options(BPlusTreeOptions {
            leaf_capacity: 4,
            interior_capacity: 3,
        })?;
        for key in 0..500u32 {
            tree.insert(key.wrapping_mul(2_654_435_761) % 10_007, key)?;
        }
        let report = tree.verify()?;
        assert_eq!(report.entries, tree.len());
        assert_eq!(report.height, tree.height());
        assert_eq!(report.nodes, report.leaves + report.interior_nodes);
        assert_eq!(report.nodes, tree.arena().live_nodes());
        Ok(())
    }

    #[test]
    fn interior_node_without_separator_is_rejected() -> Result<()> {
        let mut tree = BPlusTree::<u32, u32>::with_options(BPlusTreeOptions {
            leaf_capacity: 2,
            interior_capacity: 4,
        })?;
        for key in 0..3u32 {
            tree.insert(key, key)?;
        }
        assert_eq!(tree.height(), 2);
        let root = tree.root();
        tree.arena.interior_mut(root)?.remove_at(0);
        assert!(matches!(
            tree.verify(),
            Err(IndexError::InvariantViolation("interior node without a separator"))
        ));
        Ok(())
    }
}
