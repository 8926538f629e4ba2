#![forbid(unsafe_code)]

//! In-memory B+ tree built from elastic nodes.
//!
//! Each node's capacity is chosen when it is allocated. Leaves hold sorted key/value pairs;
//! interior nodes hold sorted separator/child pairs plus a low-fence child. Fence pairs bound
//! the keys a node may contain and right-sibling links chain every level.

/// Node arena and the leaf/interior node enum.
pub mod arena;
mod cursor;
/// Size accounting for node blocks.
pub mod layout;
/// Fixed-capacity sorted nodes.
pub mod node;
mod options;
mod order;
mod pair;
mod stats;
mod tree;

pub use arena::{Node, NodeArena};
pub use cursor::Cursor;
pub use layout::NodeLayout;
pub use node::{ElasticNode, NodeHeader};
pub use options::{BPlusTreeOptions, DEFAULT_INTERIOR_CAPACITY, DEFAULT_LEAF_CAPACITY};
pub use order::{KeyOrder, NaturalOrder, Reversed};
pub use pair::{ElementPair, KeyNodePointerPair, KeyValuePair, NodeKind};
pub use stats::{BPlusTreeStats, BPlusTreeStatsSnapshot};
pub use tree::{BPlusTree, VerifyReport};

#[cfg(test)]
mod tests;
