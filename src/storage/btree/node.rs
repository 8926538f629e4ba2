//! Variable-capacity sorted nodes.
//!
//! An [`ElasticNode`] holds a fixed header (kind, capacity, fences, right sibling) and a
//! sorted array of [`ElementPair`]s whose capacity is chosen when the node is created and
//! never changes. Insertion shifts the tail in place; splitting moves the upper half into a
//! sibling. Neither operation reallocates the element buffer.

use std::cmp::Ordering;

use super::layout::NodeLayout;
use super::order::KeyOrder;
use super::pair::{ElementPair, NodeKind};
use crate::types::{IndexError, NodeId, Result};

/// Fixed part of a node. Fence pairs live here, owned by the node.
#[derive(Clone, Debug)]
pub struct NodeHeader<K, P> {
    kind: NodeKind,
    capacity: usize,
    byte_size: usize,
    right_sibling: Option<NodeId>,
    low_fence: ElementPair<K, P>,
    high_fence: ElementPair<K, P>,
}

/// A node whose element capacity is fixed at creation.
#[derive(Debug)]
pub struct ElasticNode<K, P> {
    header: NodeHeader<K, P>,
    elements: Vec<ElementPair<K, P>>,
}

impl<K, P> ElasticNode<K, P> {
    /// Allocates an empty node able to hold `capacity` pairs.
    ///
    /// The fences are cloned into the node; the caller keeps its own copies.
    pub fn create(
        capacity: usize,
        kind: NodeKind,
        low_fence: &ElementPair<K, P>,
        high_fence: &ElementPair<K, P>,
    ) -> Result<Self>
    where
        K: Clone,
        P: Clone,
    {
        if capacity == 0 {
            return Err(IndexError::InvalidArgument("node capacity must be positive"));
        }
        let layout = NodeLayout::for_node::<K, P>(capacity)?;
        let mut elements = Vec::new();
        elements
            .try_reserve_exact(capacity)
            .map_err(|_| IndexError::AllocationFailure {
                bytes: layout.total_size,
            })?;
        Ok(Self {
            header: NodeHeader {
                kind,
                capacity,
                byte_size: layout.total_size,
                right_sibling: None,
                low_fence: low_fence.clone(),
                high_fence: high_fence.clone(),
            },
            elements,
        })
    }

    /// Allocates an empty node with the same kind, capacity and fences.
    pub fn empty_sibling(&self) -> Result<Self>
    where
        K: Clone,
        P: Clone,
    {
        Self::create(
            self.header.capacity,
            self.header.kind,
            &self.header.low_fence,
            &self.header.high_fence,
        )
    }

    /// Node kind recorded in the header.
    pub fn kind(&self) -> NodeKind {
        self.header.kind
    }

    /// Number of live pairs.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true when the node holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Maximum number of pairs.
    pub fn capacity(&self) -> usize {
        self.header.capacity
    }

    /// Returns true when no further pair fits.
    pub fn is_full(&self) -> bool {
        self.elements.len() >= self.header.capacity
    }

    /// Size in bytes of the node's block (header plus element slots).
    pub fn byte_size(&self) -> usize {
        self.header.byte_size
    }

    /// First position of the live range.
    pub fn begin(&self) -> usize {
        0
    }

    /// One past the last position of the live range.
    pub fn end(&self) -> usize {
        self.elements.len()
    }

    /// Live pairs in key order.
    pub fn elements(&self) -> &[ElementPair<K, P>] {
        &self.elements
    }

    /// Pair at `position`, if live.
    pub fn get(&self, position: usize) -> Option<&ElementPair<K, P>> {
        self.elements.get(position)
    }

    /// Mutable payload at `position`. Keys are not exposed mutably.
    pub fn payload_mut(&mut self, position: usize) -> Option<&mut P> {
        self.elements.get_mut(position).map(|pair| &mut pair.payload)
    }

    /// Smallest key in the node.
    pub fn first_key(&self) -> Option<&K> {
        self.elements.first().map(|pair| &pair.key)
    }

    /// Largest key in the node.
    pub fn last_key(&self) -> Option<&K> {
        self.elements.last().map(|pair| &pair.key)
    }

    /// Lower fence pair.
    pub fn low_fence(&self) -> &ElementPair<K, P> {
        &self.header.low_fence
    }

    /// Upper fence pair.
    pub fn high_fence(&self) -> &ElementPair<K, P> {
        &self.header.high_fence
    }

    /// Replaces the lower fence pair.
    pub fn set_low_fence(&mut self, fence: ElementPair<K, P>) {
        self.header.low_fence = fence;
    }

    /// Replaces the upper fence pair.
    pub fn set_high_fence(&mut self, fence: ElementPair<K, P>) {
        self.header.high_fence = fence;
    }

    /// Node to the right on the same level.
    pub fn right_sibling(&self) -> Option<NodeId> {
        self.header.right_sibling
    }

    /// Links the node to its right neighbour.
    pub fn set_right_sibling(&mut self, sibling: Option<NodeId>) {
        self.header.right_sibling = sibling;
    }

    /// Writes `pair` after the last live pair.
    ///
    /// A full node is left untouched and the pair is handed back.
    pub fn append(&mut self, pair: ElementPair<K, P>) -> std::result::Result<(), ElementPair<K, P>> {
        let end = self.end();
        self.insert_at(pair, end)
    }

    /// Inserts `pair` at `position`, shifting the tail one slot right.
    ///
    /// A full node is left untouched and the pair is handed back.
    ///
    /// # Panics
    ///
    /// Panics if `position` lies outside `begin()..=end()`.
    pub fn insert_at(
        &mut self,
        pair: ElementPair<K, P>,
        position: usize,
    ) -> std::result::Result<(), ElementPair<K, P>> {
        assert!(
            position <= self.elements.len(),
            "insert position {position} outside live range 0..={}",
            self.elements.len()
        );
        if self.is_full() {
            return Err(pair);
        }
        self.elements.insert(position, pair);
        Ok(())
    }

    /// Removes the pair at `position`, shifting the tail one slot left.
    ///
    /// # Panics
    ///
    /// Panics if `position` is not a live position.
    pub fn remove_at(&mut self, position: usize) -> ElementPair<K, P> {
        assert!(
            position < self.elements.len(),
            "remove position {position} outside live range 0..{}",
            self.elements.len()
        );
        self.elements.remove(position)
    }

    /// Position of the first pair whose key is not less than `key`.
    pub fn find_insert_position<O>(&self, key: &K, order: &O) -> usize
    where
        O: KeyOrder<K> + ?Sized,
    {
        self.elements
            .partition_point(|pair| order.less(&pair.key, key))
    }

    /// `Ok(position)` of the pair holding `key`, or `Err(position)` where it would go.
    pub fn search<O>(&self, key: &K, order: &O) -> std::result::Result<usize, usize>
    where
        O: KeyOrder<K> + ?Sized,
    {
        let position = self.find_insert_position(key, order);
        match self.elements.get(position) {
            Some(pair) if order.compare(&pair.key, key) == Ordering::Equal => Ok(position),
            _ => Err(position),
        }
    }

    /// Moves the upper `ceil(len / 2)` pairs into a freshly allocated sibling.
    ///
    /// The sibling has the same kind and capacity and starts with copies of this node's
    /// fences and right link; callers adjust both afterwards.
    pub fn split(&mut self) -> Result<Self>
    where
        K: Clone,
        P: Clone,
    {
        let mut sibling = self.empty_sibling()?;
        self.split_into(&mut sibling);
        Ok(sibling)
    }

    /// Same as [`split`](Self::split) with a sibling allocated up front.
    ///
    /// # Panics
    ///
    /// Panics if `sibling` is not empty, has a different kind, or cannot hold the upper half.
    pub fn split_into(&mut self, sibling: &mut Self)
    where
        K: Clone,
        P: Clone,
    {
        let keep = self.elements.len() / 2;
        self.split_into_at(sibling, keep);
    }

    /// Keeps the first `keep` pairs and moves the rest into `sibling`.
    ///
    /// # Panics
    ///
    /// Panics if `keep > len()`, or if `sibling` is not empty, has a different kind, or
    /// cannot hold the moved pairs.
    pub fn split_into_at(&mut self, sibling: &mut Self, keep: usize)
    where
        K: Clone,
        P: Clone,
    {
        assert!(sibling.is_empty(), "split target must be empty");
        assert_eq!(sibling.kind(), self.kind(), "split target kind mismatch");
        assert!(
            keep <= self.elements.len(),
            "split point {keep} outside live range 0..={}",
            self.elements.len()
        );
        assert!(
            sibling.capacity() >= self.elements.len() - keep,
            "split target too small"
        );
        sibling.elements.extend(self.elements.drain(keep..));
        sibling.header.low_fence = self.header.low_fence.clone();
        sibling.header.high_fence = self.header.high_fence.clone();
        sibling.header.right_sibling = self.header.right_sibling;
    }

    /// Releases the node and returns the number of bytes it occupied.
    pub fn destroy(self) -> usize {
        self.header.byte_size
    }
}

impl<K> ElasticNode<K, NodeId> {
    /// Child responsible for `key`.
    ///
    /// An exact separator match follows that separator's child; otherwise the child of the
    /// greatest separator below `key`, or the low-fence child when there is none.
    pub fn child_for<O>(&self, key: &K, order: &O) -> NodeId
    where
        O: KeyOrder<K> + ?Sized,
    {
        match self.search(key, order) {
            Ok(position) => self.elements[position].payload,
            Err(0) => self.header.low_fence.payload,
            Err(position) => self.elements[position - 1].payload,
        }
    }

    /// Number of children referenced by this node.
    pub fn child_count(&self) -> usize {
        self.elements.len() + 1
    }

    /// Child at `index`, where index 0 is the low-fence child.
    pub fn child_at(&self, index: usize) -> Option<NodeId> {
        match index {
            0 => Some(self.header.low_fence.payload),
            _ => self.elements.get(index - 1).map(|pair| pair.payload),
        }
    }

    /// Children in key order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(self.header.low_fence.payload)
            .chain(self.elements.iter().map(|pair| pair.payload))
    }
}
