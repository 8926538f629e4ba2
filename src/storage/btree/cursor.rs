use std::cmp::Ordering;
use std::ops::Bound;

use crate::types::{NodeId, Result};

use super::node::ElasticNode;
use super::order::KeyOrder;
use super::tree::BPlusTree;

/// A cursor for iterating over a range of key-value pairs in a B+ tree.
///
/// The cursor walks the leaf level through right-sibling links, so a range scan descends
/// the tree once.
pub struct Cursor<'a, K, V, O> {
    tree: &'a BPlusTree<K, V, O>,
    lower: Bound<K>,
    upper: Bound<K>,
    current_leaf: Option<&'a ElasticNode<K, V>>,
    slot_index: usize,
    done: bool,
}

impl<'a, K, V, O> Cursor<'a, K, V, O>
where
    K: Clone + Default,
    V: Clone + Default,
    O: KeyOrder<K>,
{
    pub(crate) fn new(tree: &'a BPlusTree<K, V, O>, lo: Bound<K>, hi: Bound<K>) -> Result<Self> {
        let done = range_is_empty(&tree.order, &lo, &hi);
        let mut cursor = Self {
            tree,
            lower: lo,
            upper: hi,
            current_leaf: None,
            slot_index: 0,
            done,
        };
        cursor.initialize()?;
        Ok(cursor)
    }

    /// Advances the cursor and returns the next key-value pair, if any.
    pub fn next(&mut self) -> Result<Option<(&'a K, &'a V)>> {
        if self.done {
            return Ok(None);
        }
        loop {
            let Some(leaf) = self.current_leaf else {
                self.finish();
                return Ok(None);
            };
            let Some(pair) = leaf.get(self.slot_index) else {
                if !self.advance_to_next_leaf()? {
                    return Ok(None);
                }
                continue;
            };
            if self.is_past_upper(&pair.key) {
                self.finish();
                return Ok(None);
            }
            self.slot_index += 1;
            return Ok(Some((&pair.key, &pair.payload)));
        }
    }

    /// Drains the cursor and returns how many pairs it yielded.
    pub fn count_remaining(&mut self) -> Result<usize> {
        let mut count = 0;
        while self.next()?.is_some() {
            count += 1;
        }
        Ok(count)
    }

    /// Drains the cursor into owned pairs.
    pub fn collect_pairs(&mut self) -> Result<Vec<(K, V)>> {
        let mut pairs = Vec::new();
        while let Some((key, value)) = self.next()? {
            pairs.push((key.clone(), value.clone()));
        }
        Ok(pairs)
    }

    fn initialize(&mut self) -> Result<()> {
        if self.done {
            return Ok(());
        }
        let leaf_id = match &self.lower {
            Bound::Included(key) | Bound::Excluded(key) => self.tree.find_leaf(key)?,
            Bound::Unbounded => self.tree.leftmost_leaf()?,
        };
        self.set_current_leaf(leaf_id)?;
        self.seek_to_lower_bound()
    }

    fn seek_to_lower_bound(&mut self) -> Result<()> {
        loop {
            let Some(leaf) = self.current_leaf else {
                self.finish();
                return Ok(());
            };
            let position = match &self.lower {
                Bound::Unbounded => 0,
                Bound::Included(key) => leaf.find_insert_position(key, &self.tree.order),
                Bound::Excluded(key) => match leaf.search(key, &self.tree.order) {
                    Ok(position) => position + 1,
                    Err(position) => position,
                },
            };
            if position < leaf.len() {
                self.slot_index = position;
                return Ok(());
            }
            if !self.advance_to_next_leaf()? {
                return Ok(());
            }
        }
    }

    fn advance_to_next_leaf(&mut self) -> Result<bool> {
        let next_id = match self.current_leaf.and_then(|leaf| leaf.right_sibling()) {
            Some(id) => id,
            None => {
                self.finish();
                return Ok(false);
            }
        };
        self.set_current_leaf(next_id)?;
        Ok(true)
    }

    fn set_current_leaf(&mut self, id: NodeId) -> Result<()> {
        let tree: &'a BPlusTree<K, V, O> = self.tree;
        self.current_leaf = Some(tree.arena.leaf(id)?);
        self.slot_index = 0;
        Ok(())
    }

    fn finish(&mut self) {
        self.done = true;
        self.current_leaf = None;
        self.slot_index = 0;
    }

    fn is_past_upper(&self, key: &K) -> bool {
        match &self.upper {
            Bound::Unbounded => false,
            Bound::Included(bound) => {
                matches!(self.tree.order.compare(key, bound), Ordering::Greater)
            }
            Bound::Excluded(bound) => {
                !matches!(self.tree.order.compare(key, bound), Ordering::Less)
            }
        }
    }
}

fn range_is_empty<K, O: KeyOrder<K>>(order: &O, lower: &Bound<K>, upper: &Bound<K>) -> bool {
    let (lo, hi) = match (lower, upper) {
        (Bound::Included(lo) | Bound::Excluded(lo), Bound::Included(hi) | Bound::Excluded(hi)) => {
            (lo, hi)
        }
        _ => return false,
    };
    match order.compare(lo, hi) {
        Ordering::Greater => true,
        Ordering::Equal => !matches!(
            (lower, upper),
            (Bound::Included(_), Bound::Included(_))
        ),
        Ordering::Less => false,
    }
}
