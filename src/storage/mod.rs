//! Index storage structures.

/// B+ tree data structure implementation.
///
/// In-memory ordered index mapping keys to value handles such as tuple slots.
pub mod btree;
