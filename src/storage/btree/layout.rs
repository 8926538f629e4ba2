//! Size accounting for node blocks.
//!
//! [`NodeLayout`] reports the size a node would occupy as one block: header followed by the
//! element array. It is bookkeeping for `byte_size` and the arena's byte totals, not the
//! physical placement; a live node keeps its header in an arena slot and its pairs in a
//! separate fixed-capacity buffer.

use std::alloc::Layout;
use std::mem;

use super::node::NodeHeader;
use super::pair::ElementPair;
use crate::types::{IndexError, Result};

/// Accounted layout of a node: a fixed header immediately followed by `capacity` pairs.
///
/// The header embeds both fence pairs, so its alignment is never smaller than the
/// alignment of a pair and the accounted element array starts exactly at `header_size`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NodeLayout {
    /// Size of the fixed header in bytes.
    pub header_size: usize,
    /// Offset of the first element from the start of the block.
    pub elements_offset: usize,
    /// Size of a single element pair.
    pub element_size: usize,
    /// Number of element slots in the block.
    pub capacity: usize,
    /// Size of the whole block, padded to `align`.
    pub total_size: usize,
    /// Alignment of the block.
    pub align: usize,
}

impl NodeLayout {
    /// Computes the layout for a node of `capacity` pairs of `ElementPair<K, P>`.
    pub fn for_node<K, P>(capacity: usize) -> Result<Self> {
        let header = Layout::new::<NodeHeader<K, P>>();
        let elements = Layout::array::<ElementPair<K, P>>(capacity).map_err(|_| {
            IndexError::AllocationFailure { bytes: usize::MAX }
        })?;
        let (block, elements_offset) = header
            .extend(elements)
            .map_err(|_| IndexError::AllocationFailure { bytes: usize::MAX })?;
        let block = block.pad_to_align();
        debug_assert_eq!(elements_offset, header.size());
        Ok(Self {
            header_size: header.size(),
            elements_offset,
            element_size: mem::size_of::<ElementPair<K, P>>(),
            capacity,
            total_size: block.size(),
            align: block.align(),
        })
    }

    /// Number of padding bytes between the header and the element array.
    pub fn padding(&self) -> usize {
        self.elements_offset - self.header_size
    }
}
