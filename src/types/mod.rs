//! Identifier, value-handle and error types shared across the index.

use std::fmt;

/// Generation-checked handle to a node owned by a [`NodeArena`](crate::storage::btree::NodeArena).
///
/// A handle stays valid until its node is freed; afterwards every lookup through it
/// fails with [`IndexError::StaleNode`], even if the slot has been reused.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Handle that never resolves to a node.
    pub const NULL: NodeId = NodeId {
        index: u32::MAX,
        generation: 0,
    };

    /// Returns true for [`NodeId::NULL`].
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }

    /// Slot index inside the owning arena.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time this handle was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}@{}", self.index, self.generation)
        }
    }
}

/// Page identifier of the storage layer a [`TupleSlot`] points into.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct PageId(pub u64);

/// Opaque location of a stored tuple. The index never interprets it.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct TupleSlot {
    /// Page holding the tuple.
    pub page_id: PageId,
    /// Slot within the page.
    pub slot_index: u16,
}

impl TupleSlot {
    /// Builds a slot handle.
    pub fn new(page_id: PageId, slot_index: u16) -> Self {
        Self {
            page_id,
            slot_index,
        }
    }
}

impl fmt::Display for TupleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.page_id.0, self.slot_index)
    }
}

/// Errors surfaced by the index.
///
/// A full node is not an error: `insert_at`/`append` hand the rejected pair back and the
/// tree driver reacts by splitting.
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// Memory for a node or arena slot could not be obtained.
    #[error("allocation failure: unable to obtain {bytes} bytes")]
    AllocationFailure {
        /// Size of the request that failed.
        bytes: usize,
    },
    /// A caller supplied an unusable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// A handle referred to a node that was already freed.
    #[error("stale node handle {0}")]
    StaleNode(NodeId),
    /// Internal structure does not satisfy a B+ tree invariant.
    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),
    /// Options or logging configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
    /// I/O failure while reading configuration.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, IndexError>;
