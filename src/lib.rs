//! Elastic B+ tree: an in-memory ordered index built from variable-capacity nodes.
//!
//! [`BPlusTree`](storage::btree::BPlusTree) maps keys to value handles such as
//! [`TupleSlot`](types::TupleSlot). Nodes are [`ElasticNode`](storage::btree::ElasticNode)s
//! whose capacity is fixed when they are allocated; a full leaf splits in half and pushes a
//! separator into its parent, growing a new root when the split reaches the top.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;
pub mod storage;
pub mod types;

pub use storage::btree::{BPlusTree, BPlusTreeOptions, ElasticNode, ElementPair, NodeKind};
pub use types::{IndexError, NodeId, Result};
