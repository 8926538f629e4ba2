use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

use smallvec::SmallVec;

use super::arena::{Node, NodeArena};
use super::cursor::Cursor;
use super::options::BPlusTreeOptions;
use super::order::{KeyOrder, NaturalOrder};
use super::pair::ElementPair;
use super::stats::{BPlusTreeStats, BPlusTreeStatsSnapshot};
use crate::types::{IndexError, NodeId, Result};

mod insert;
mod verify;

pub use verify::VerifyReport;

/// Interior nodes visited on the way from the root to a leaf, root first.
pub(super) type DescentPath = SmallVec<[NodeId; 8]>;

/// In-memory B+ tree mapping keys to value handles.
///
/// Leaves hold `(key, value)` pairs; interior nodes hold `(separator, child)` pairs plus a
/// low-fence child for keys below the first separator. Every node lives in the tree's
/// [`NodeArena`] and is released when the tree is cleared, destroyed or dropped.
///
/// Mutation is single-writer: callers serialise `insert` externally.
pub struct BPlusTree<K, V, O = NaturalOrder> {
    pub(super) arena: NodeArena<K, V>,
    pub(super) root: NodeId,
    pub(super) height: usize,
    pub(super) len: usize,
    pub(super) order: O,
    pub(super) options: BPlusTreeOptions,
    pub(super) stats: Arc<BPlusTreeStats>,
}

impl<K, V> BPlusTree<K, V, NaturalOrder>
where
    K: Ord + Clone + Default,
    V: Clone + Default,
{
    /// Creates an empty tree with default options.
    pub fn new() -> Result<Self> {
        Self::with_options(BPlusTreeOptions::default())
    }

    /// Creates an empty tree with the given options.
    pub fn with_options(options: BPlusTreeOptions) -> Result<Self> {
        Self::with_order(options, NaturalOrder)
    }
}

impl<K, V, O> BPlusTree<K, V, O>
where
    K: Clone + Default,
    V: Clone + Default,
    O: KeyOrder<K>,
{
    /// Creates an empty tree ordered by `order`.
    pub fn with_order(options: BPlusTreeOptions, order: O) -> Result<Self> {
        options.validate()?;
        let mut arena = NodeArena::new();
        let root = Self::allocate_empty_root(&mut arena, &options)?;
        tracing::debug!(
            target: "elastic_bptree::root",
            root = %root,
            leaf_capacity = options.leaf_capacity,
            interior_capacity = options.interior_capacity,
            "created btree"
        );
        Ok(Self {
            arena,
            root,
            height: 1,
            len: 0,
            order,
            options,
            stats: Arc::new(BPlusTreeStats::default()),
        })
    }

    fn allocate_empty_root(
        arena: &mut NodeArena<K, V>,
        options: &BPlusTreeOptions,
    ) -> Result<NodeId> {
        let fence = ElementPair::default();
        arena.allocate_leaf(options.leaf_capacity, &fence, &fence)
    }

    /// Handle of the root node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The root node, a leaf while the tree has height 1.
    pub fn root_node(&self) -> Result<&Node<K, V>> {
        self.arena.get(self.root)
    }

    /// Any node owned by the tree.
    pub fn node(&self, id: NodeId) -> Result<&Node<K, V>> {
        self.arena.get(id)
    }

    /// Arena holding the tree's nodes.
    pub fn arena(&self) -> &NodeArena<K, V> {
        &self.arena
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true when no key is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels, counting the leaf level.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Options the tree was created with.
    pub fn options(&self) -> &BPlusTreeOptions {
        &self.options
    }

    /// Key order used by the tree.
    pub fn order(&self) -> &O {
        &self.order
    }

    /// Access the live statistics counters for this tree.
    pub fn stats(&self) -> Arc<BPlusTreeStats> {
        Arc::clone(&self.stats)
    }

    /// Snapshot the current statistics counters.
    pub fn stats_snapshot(&self) -> BPlusTreeStatsSnapshot {
        self.stats.snapshot()
    }

    /// Emit the current statistics to the tracing sink.
    pub fn emit_stats(&self) {
        self.stats.emit_tracing();
    }

    /// Retrieves the value stored under `key`.
    pub fn get(&self, key: &K) -> Result<Option<&V>> {
        let leaf_id = self.find_leaf(key)?;
        let leaf = self.arena.leaf(leaf_id)?;
        Ok(leaf
            .search(key, &self.order)
            .ok()
            .and_then(|position| leaf.get(position))
            .map(|pair| &pair.payload))
    }

    /// Returns true if `key` is stored.
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Cursor over every pair in key order.
    pub fn iter(&self) -> Result<Cursor<'_, K, V, O>> {
        Cursor::new(self, Bound::Unbounded, Bound::Unbounded)
    }

    /// Cursor over the pairs whose keys fall in `range`.
    pub fn range<R>(&self, range: R) -> Result<Cursor<'_, K, V, O>>
    where
        R: RangeBounds<K>,
    {
        Cursor::new(
            self,
            range.start_bound().cloned(),
            range.end_bound().cloned(),
        )
    }

    /// Leaf responsible for `key`.
    pub(crate) fn find_leaf(&self, key: &K) -> Result<NodeId> {
        self.find_leaf_with_path(key).map(|(leaf, _)| leaf)
    }

    /// Leaf responsible for `key` plus the interior nodes above it.
    pub(super) fn find_leaf_with_path(&self, key: &K) -> Result<(NodeId, DescentPath)> {
        let mut path = DescentPath::new();
        let mut current = self.root;
        loop {
            match self.arena.get(current)? {
                Node::Leaf(_) => {
                    self.stats.inc_leaf_searches();
                    return Ok((current, path));
                }
                Node::Interior(node) => {
                    self.stats.inc_internal_searches();
                    path.push(current);
                    if path.len() >= self.height {
                        return Err(IndexError::InvariantViolation(
                            "descent deeper than tree height",
                        ));
                    }
                    current = node.child_for(key, &self.order);
                }
            }
        }
    }

    /// Leftmost leaf of the tree.
    pub(crate) fn leftmost_leaf(&self) -> Result<NodeId> {
        let mut current = self.root;
        for _ in 0..self.height {
            match self.arena.get(current)? {
                Node::Leaf(_) => return Ok(current),
                Node::Interior(node) => current = node.low_fence().payload,
            }
        }
        Err(IndexError::InvariantViolation(
            "descent deeper than tree height",
        ))
    }

    /// Frees every node and installs a fresh empty root leaf.
    pub fn clear(&mut self) -> Result<()> {
        let fresh = Self::allocate_empty_root(&mut self.arena, &self.options)?;
        let old_root = std::mem::replace(&mut self.root, fresh);
        let freed = self.release_subtree(old_root)?;
        tracing::debug!(
            target: "elastic_bptree::root",
            freed,
            root = %fresh,
            "cleared btree"
        );
        self.height = 1;
        self.len = 0;
        Ok(())
    }

    /// Frees every node the tree owns and returns how many were released.
    pub fn destroy(mut self) -> Result<usize> {
        let root = std::mem::replace(&mut self.root, NodeId::NULL);
        self.release_subtree(root)
    }

    fn release_subtree(&mut self, root: NodeId) -> Result<usize> {
        let mut pending: Vec<NodeId> = vec![root];
        let mut freed = 0usize;
        while let Some(id) = pending.pop() {
            if let Node::Interior(node) = self.arena.get(id)? {
                pending.extend(node.children());
            }
            self.arena.free(id)?;
            freed += 1;
        }
        Ok(freed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::btree::{NodeKind, Reversed};
    use crate::types::{PageId, TupleSlot};

    fn slot(i: u64) -> TupleSlot {
        TupleSlot::new(PageId(i), (i % 7) as u16)
    }

    #[test]
    fn empty_tree_has_single_leaf_root() -> Result<()> {
        let tree = BPlusTree::<u64, TupleSlot>::new()?;
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        let root = tree.root_node()?;
        assert_eq!(root.kind(), NodeKind::Leaf);
        assert_eq!(root.capacity(), 128);
        assert!(tree.get(&42)?.is_none());
        Ok(())
    }

    #[test]
    fn invalid_options_are_rejected() {
        let options = BPlusTreeOptions {
            leaf_capacity: 1,
            interior_capacity: 4,
        };
        assert!(matches!(
            BPlusTree::<u64, u64>::with_options(options),
            Err(IndexError::InvalidArgument(_))
        ));
    }

    #[test]
    fn clear_releases_every_node() -> Result<()> {
        let mut tree =
            BPlusTree::<u64, TupleSlot>::with_options(BPlusTreeOptions::with_leaf_capacity(4))?;
        for i in 0..100 {
            tree.insert(i, slot(i))?;
        }
        assert!(tree.arena().live_nodes() > 1);
        let stale_root = tree.root();
        tree.clear()?;
        assert_eq!(tree.arena().live_nodes(), 1);
        assert!(tree.node(stale_root).is_err());
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        tree.insert(5, slot(5))?;
        assert_eq!(tree.get(&5)?, Some(&slot(5)));
        Ok(())
    }

    #[test]
    fn destroy_counts_released_nodes() -> Result<()> {
        let mut tree =
            BPlusTree::<u64, TupleSlot>::with_options(BPlusTreeOptions::with_leaf_capacity(4))?;
        for i in 0..50 {
            tree.insert(i, slot(i))?;
        }
        let live = tree.arena().live_nodes();
        assert_eq!(tree.destroy()?, live);
        Ok(())
    }

    #[test]
    fn custom_order_controls_layout() -> Result<()> {
        let order = Reversed(NaturalOrder);
        let mut tree = BPlusTree::with_order(BPlusTreeOptions::with_leaf_capacity(4), order)?;
        for i in 0..20u64 {
            tree.insert(i, i * 10)?;
        }
        let mut cursor = tree.iter()?;
        let mut keys = Vec::new();
        while let Some((key, _)) = cursor.next()? {
            keys.push(*key);
        }
        assert_eq!(keys, (0..20).rev().collect::<Vec<_>>());
        assert_eq!(tree.get(&7)?, Some(&70));
        Ok(())
    }
}
