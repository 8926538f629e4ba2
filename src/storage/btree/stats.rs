use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use serde::Serialize;

/// Snapshot of B+ tree statistics at a point in time.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BPlusTreeStatsSnapshot {
    /// Number of leaf searches performed
    pub leaf_searches: u64,
    /// Number of interior node searches performed
    pub internal_searches: u64,
    /// Number of leaf splits performed
    pub leaf_splits: u64,
    /// Number of interior node splits performed
    pub internal_splits: u64,
    /// Number of times a new root was installed
    pub root_growths: u64,
    /// Number of keys inserted
    pub inserts: u64,
    /// Number of inserts that replaced an existing value
    pub replacements: u64,
}

/// Statistics tracking for B+ tree operations.
#[derive(Default, Debug)]
pub struct BPlusTreeStats {
    leaf_searches: AtomicU64,
    internal_searches: AtomicU64,
    leaf_splits: AtomicU64,
    internal_splits: AtomicU64,
    root_growths: AtomicU64,
    inserts: AtomicU64,
    replacements: AtomicU64,
}

impl BPlusTreeStats {
    /// Returns the current count of leaf searches.
    pub fn leaf_searches(&self) -> u64 {
        self.leaf_searches.load(AtomicOrdering::Relaxed)
    }

    /// Returns the current count of interior node searches.
    pub fn internal_searches(&self) -> u64 {
        self.internal_searches.load(AtomicOrdering::Relaxed)
    }

    /// Returns the current count of leaf splits.
    pub fn leaf_splits(&self) -> u64 {
        self.leaf_splits.load(AtomicOrdering::Relaxed)
    }

    /// Returns the current count of interior node splits.
    pub fn internal_splits(&self) -> u64 {
        self.internal_splits.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of root growths.
    pub fn root_growths(&self) -> u64 {
        self.root_growths.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of keys inserted.
    pub fn inserts(&self) -> u64 {
        self.inserts.load(AtomicOrdering::Relaxed)
    }

    /// Returns the number of inserts that replaced an existing value.
    pub fn replacements(&self) -> u64 {
        self.replacements.load(AtomicOrdering::Relaxed)
    }

    pub(crate) fn inc_leaf_searches(&self) {
        self.leaf_searches.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_internal_searches(&self) {
        self.internal_searches.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_leaf_splits(&self) {
        self.leaf_splits.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_internal_splits(&self) {
        self.internal_splits.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_root_growths(&self) {
        self.root_growths.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_inserts(&self) {
        self.inserts.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub(crate) fn inc_replacements(&self) {
        self.replacements.fetch_add(1, AtomicOrdering::Relaxed);
    }

    /// Creates a snapshot of all current statistics.
    pub fn snapshot(&self) -> BPlusTreeStatsSnapshot {
        BPlusTreeStatsSnapshot {
            leaf_searches: self.leaf_searches(),
            internal_searches: self.internal_searches(),
            leaf_splits: self.leaf_splits(),
            internal_splits: self.internal_splits(),
            root_growths: self.root_growths(),
            inserts: self.inserts(),
            replacements: self.replacements(),
        }
    }

    /// Emits current statistics to the tracing infrastructure.
    pub fn emit_tracing(&self) {
        let snapshot = self.snapshot();
        tracing::info!(
            target: "elastic_bptree::stats",
            leaf_searches = snapshot.leaf_searches,
            internal_searches = snapshot.internal_searches,
            leaf_splits = snapshot.leaf_splits,
            internal_splits = snapshot.internal_splits,
            root_growths = snapshot.root_growths,
            inserts = snapshot.inserts,
            replacements = snapshot.replacements,
            "btree stats snapshot"
        );
    }
}
