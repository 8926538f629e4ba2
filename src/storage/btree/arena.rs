//! Slab of generation-checked node slots.
//!
//! Every node the tree creates is installed here and addressed by [`NodeId`]. Freeing a
//! node bumps its slot generation, so a second free or any later access through the old
//! handle reports [`IndexError::StaleNode`] instead of touching reused memory.

use std::mem;

use super::node::ElasticNode;
use super::pair::{ElementPair, NodeKind};
use crate::types::{IndexError, NodeId, Result};

/// A node of either kind.
#[derive(Debug)]
pub enum Node<K, V> {
    /// Leaf holding value handles.
    Leaf(ElasticNode<K, V>),
    /// Interior node holding child references.
    Interior(ElasticNode<K, NodeId>),
}

impl<K, V> Node<K, V> {
    /// Kind of the wrapped node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Leaf(_) => NodeKind::Leaf,
            Node::Interior(_) => NodeKind::Interior,
        }
    }

    /// Number of live pairs.
    pub fn len(&self) -> usize {
        match self {
            Node::Leaf(node) => node.len(),
            Node::Interior(node) => node.len(),
        }
    }

    /// Returns true when the node holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of pairs.
    pub fn capacity(&self) -> usize {
        match self {
            Node::Leaf(node) => node.capacity(),
            Node::Interior(node) => node.capacity(),
        }
    }

    /// Returns true when no further pair fits.
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// Size of the node's block in bytes.
    pub fn byte_size(&self) -> usize {
        match self {
            Node::Leaf(node) => node.byte_size(),
            Node::Interior(node) => node.byte_size(),
        }
    }

    /// Node to the right on the same level.
    pub fn right_sibling(&self) -> Option<NodeId> {
        match self {
            Node::Leaf(node) => node.right_sibling(),
            Node::Interior(node) => node.right_sibling(),
        }
    }

    /// Leaf view, if this is a leaf.
    pub fn as_leaf(&self) -> Option<&ElasticNode<K, V>> {
        match self {
            Node::Leaf(node) => Some(node),
            Node::Interior(_) => None,
        }
    }

    /// Interior view, if this is an interior node.
    pub fn as_interior(&self) -> Option<&ElasticNode<K, NodeId>> {
        match self {
            Node::Leaf(_) => None,
            Node::Interior(node) => Some(node),
        }
    }

    /// Releases the node and returns the number of bytes it occupied.
    pub fn destroy(self) -> usize {
        match self {
            Node::Leaf(node) => node.destroy(),
            Node::Interior(node) => node.destroy(),
        }
    }
}

#[derive(Debug)]
struct Slot<K, V> {
    generation: u32,
    node: Option<Node<K, V>>,
}

/// Owner of every node allocation made by a tree.
#[derive(Debug)]
pub struct NodeArena<K, V> {
    slots: Vec<Slot<K, V>>,
    free: Vec<u32>,
    live_nodes: usize,
    live_bytes: usize,
}

impl<K, V> Default for NodeArena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> NodeArena<K, V> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live_nodes: 0,
            live_bytes: 0,
        }
    }

    /// Number of nodes currently allocated.
    pub fn live_nodes(&self) -> usize {
        self.live_nodes
    }

    /// Total block size of the nodes currently allocated.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes
    }

    /// Returns true if `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_ok()
    }

    /// Ensures the next `additional` installs need no slot allocation.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let needed = additional.saturating_sub(self.free.len());
        if needed == 0 {
            return Ok(());
        }
        if self.slots.len().saturating_add(needed) >= u32::MAX as usize {
            return Err(IndexError::InvalidArgument("node arena exhausted"));
        }
        self.slots
            .try_reserve(needed)
            .map_err(|_| IndexError::AllocationFailure {
                bytes: needed.saturating_mul(mem::size_of::<Slot<K, V>>()),
            })
    }

    /// Creates a leaf and installs it.
    pub fn allocate_leaf(
        &mut self,
        capacity: usize,
        low_fence: &ElementPair<K, V>,
        high_fence: &ElementPair<K, V>,
    ) -> Result<NodeId>
    where
        K: Clone,
        V: Clone,
    {
        let node = ElasticNode::create(capacity, NodeKind::Leaf, low_fence, high_fence)?;
        self.adopt(Node::Leaf(node))
    }

    /// Creates an interior node and installs it.
    pub fn allocate_interior(
        &mut self,
        capacity: usize,
        low_fence: &ElementPair<K, NodeId>,
        high_fence: &ElementPair<K, NodeId>,
    ) -> Result<NodeId>
    where
        K: Clone,
    {
        let node = ElasticNode::create(capacity, NodeKind::Interior, low_fence, high_fence)?;
        self.adopt(Node::Interior(node))
    }

    /// Takes ownership of an already created node.
    ///
    /// Cannot fail when a slot was set aside with [`reserve`](Self::reserve).
    pub fn adopt(&mut self, node: Node<K, V>) -> Result<NodeId> {
        self.reserve(1)?;
        let kind = node.kind();
        let bytes = node.byte_size();
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                debug_assert!(slot.node.is_none());
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        };
        self.live_nodes += 1;
        self.live_bytes += bytes;
        tracing::trace!(
            target: "elastic_bptree::arena",
            node = %id,
            kind = kind.as_str(),
            bytes,
            "allocated node"
        );
        Ok(id)
    }

    /// Looks up a live node.
    pub fn get(&self, id: NodeId) -> Result<&Node<K, V>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(IndexError::StaleNode(id))
    }

    /// Looks up a live node for mutation.
    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node<K, V>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(IndexError::StaleNode(id))
    }

    /// Looks up a live leaf.
    pub fn leaf(&self, id: NodeId) -> Result<&ElasticNode<K, V>> {
        match self.get(id)? {
            Node::Leaf(node) => Ok(node),
            Node::Interior(_) => Err(IndexError::InvariantViolation("expected leaf node")),
        }
    }

    /// Looks up a live leaf for mutation.
    pub fn leaf_mut(&mut self, id: NodeId) -> Result<&mut ElasticNode<K, V>> {
        match self.get_mut(id)? {
            Node::Leaf(node) => Ok(node),
            Node::Interior(_) => Err(IndexError::InvariantViolation("expected leaf node")),
        }
    }

    /// Looks up a live interior node.
    pub fn interior(&self, id: NodeId) -> Result<&ElasticNode<K, NodeId>> {
        match self.get(id)? {
            Node::Interior(node) => Ok(node),
            Node::Leaf(_) => Err(IndexError::InvariantViolation("expected interior node")),
        }
    }

    /// Looks up a live interior node for mutation.
    pub fn interior_mut(&mut self, id: NodeId) -> Result<&mut ElasticNode<K, NodeId>> {
        match self.get_mut(id)? {
            Node::Interior(node) => Ok(node),
            Node::Leaf(_) => Err(IndexError::InvariantViolation("expected interior node")),
        }
    }

    /// Releases the node behind `id` and returns its block size.
    ///
    /// Children are not touched; the owner frees each node it created.
    pub fn free(&mut self, id: NodeId) -> Result<usize> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation && slot.node.is_some())
            .ok_or(IndexError::StaleNode(id))?;
        let node = slot.node.take().ok_or(IndexError::StaleNode(id))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        let kind = node.kind();
        let bytes = node.destroy();
        self.live_nodes -= 1;
        self.live_bytes -= bytes;
        tracing::trace!(
            target: "elastic_bptree::arena",
            node = %id,
            kind = kind.as_str(),
            bytes,
            "freed node"
        );
        Ok(bytes)
    }
}
