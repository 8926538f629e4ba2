use std::mem;

use super::super::arena::Node;
use super::super::node::ElasticNode;
use super::super::order::KeyOrder;
use super::super::pair::{ElementPair, KeyValuePair, NodeKind};
use super::BPlusTree;
use crate::types::{IndexError, NodeId, Result};

/// Nodes allocated before a split touches the tree.
///
/// Once a plan exists the split cannot run out of memory, so a failed allocation never
/// leaves a half-linked sibling behind.
struct SplitPlan<K, V> {
    leaf_sibling: ElasticNode<K, V>,
    /// One per full ancestor, bottom-up.
    interior_siblings: Vec<ElasticNode<K, NodeId>>,
    new_root: Option<ElasticNode<K, NodeId>>,
}

impl<K, V, O> BPlusTree<K, V, O>
where
    K: Clone + Default,
    V: Clone + Default,
    O: KeyOrder<K>,
{
    /// Inserts `value` under `key`, returning the value it replaced.
    ///
    /// An existing key keeps its position and has its value swapped. Otherwise the pair goes
    /// into the responsible leaf; a full leaf is split and the separator is pushed upward,
    /// splitting full ancestors and growing a new root when the old root splits.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let (leaf_id, path) = self.find_leaf_with_path(&key)?;
        let leaf = self.arena.leaf_mut(leaf_id)?;
        let position = match leaf.search(&key, &self.order) {
            Ok(position) => {
                let slot = leaf
                    .payload_mut(position)
                    .ok_or(IndexError::InvariantViolation("search hit a dead position"))?;
                let previous = mem::replace(slot, value);
                self.stats.inc_replacements();
                return Ok(Some(previous));
            }
            Err(position) => position,
        };
        if let Err(pair) = leaf.insert_at(ElementPair::new(key, value), position) {
            self.insert_with_split(leaf_id, &path, pair)?;
        }
        self.len += 1;
        self.stats.inc_inserts();
        Ok(None)
    }

    fn plan_split(&mut self, leaf_id: NodeId, path: &[NodeId]) -> Result<SplitPlan<K, V>> {
        let leaf_sibling = self.arena.leaf(leaf_id)?.empty_sibling()?;
        let mut interior_siblings = Vec::with_capacity(path.len());
        let mut splits_root = true;
        for &parent_id in path.iter().rev() {
            let parent = self.arena.interior(parent_id)?;
            if !parent.is_full() {
                splits_root = false;
                break;
            }
            interior_siblings.push(parent.empty_sibling()?);
        }
        let new_root = if splits_root {
            let (low_key, high_key) = match self.arena.get(self.root)? {
                Node::Leaf(node) => (node.low_fence().key.clone(), node.high_fence().key.clone()),
                Node::Interior(node) => {
                    (node.low_fence().key.clone(), node.high_fence().key.clone())
                }
            };
            Some(ElasticNode::create(
                self.options.interior_capacity,
                NodeKind::Interior,
                &ElementPair::new(low_key, self.root),
                &ElementPair::new(high_key, NodeId::NULL),
            )?)
        } else {
            None
        };
        self.arena
            .reserve(1 + interior_siblings.len() + usize::from(new_root.is_some()))?;
        Ok(SplitPlan {
            leaf_sibling,
            interior_siblings,
            new_root,
        })
    }

    fn insert_with_split(
        &mut self,
        leaf_id: NodeId,
        path: &[NodeId],
        pair: KeyValuePair<K, V>,
    ) -> Result<()> {
        let SplitPlan {
            mut leaf_sibling,
            interior_siblings,
            new_root,
        } = self.plan_split(leaf_id, path)?;

        let leaf = self.arena.leaf_mut(leaf_id)?;
        leaf.split_into(&mut leaf_sibling);
        let mut separator = leaf_sibling
            .first_key()
            .cloned()
            .ok_or(IndexError::InvariantViolation("leaf split left the sibling empty"))?;
        leaf.set_high_fence(ElementPair::new(separator.clone(), V::default()));
        leaf_sibling.set_low_fence(ElementPair::new(separator.clone(), V::default()));
        let target = if self.order.less(&pair.key, &separator) {
            leaf
        } else {
            &mut leaf_sibling
        };
        let position = target.find_insert_position(&pair.key, &self.order);
        target
            .insert_at(pair, position)
            .map_err(|_| IndexError::InvariantViolation("split leaf has no room"))?;
        let (left_len, right_len) = (
            self.arena.leaf(leaf_id)?.len(),
            leaf_sibling.len(),
        );
        let mut right_id = self.arena.adopt(Node::Leaf(leaf_sibling))?;
        self.arena
            .leaf_mut(leaf_id)?
            .set_right_sibling(Some(right_id));
        self.stats.inc_leaf_splits();
        tracing::trace!(
            target: "elastic_bptree::split",
            left = %leaf_id,
            right = %right_id,
            left_len,
            right_len,
            "split leaf"
        );

        let mut siblings = interior_siblings.into_iter();
        for &parent_id in path.iter().rev() {
            let parent = self.arena.interior_mut(parent_id)?;
            let position = parent.find_insert_position(&separator, &self.order);
            let pending = match parent.insert_at(ElementPair::new(separator, right_id), position) {
                Ok(()) => return Ok(()),
                Err(pair) => pair,
            };
            let mut sibling = siblings
                .next()
                .ok_or(IndexError::InvariantViolation("split plan missing interior sibling"))?;
            let (promoted, promoted_child) =
                split_interior(parent, &mut sibling, pending, position)?;
            parent.set_high_fence(ElementPair::new(promoted.clone(), NodeId::NULL));
            sibling.set_low_fence(ElementPair::new(promoted.clone(), promoted_child));
            let (left_len, right_len) = (parent.len(), sibling.len());
            let sibling_id = self.arena.adopt(Node::Interior(sibling))?;
            self.arena
                .interior_mut(parent_id)?
                .set_right_sibling(Some(sibling_id));
            self.stats.inc_internal_splits();
            tracing::trace!(
                target: "elastic_bptree::split",
                left = %parent_id,
                right = %sibling_id,
                left_len,
                right_len,
                "split interior node"
            );
            separator = promoted;
            right_id = sibling_id;
        }

        let mut root = new_root.ok_or(IndexError::InvariantViolation(
            "root split without a reserved root",
        ))?;
        root.append(ElementPair::new(separator, right_id))
            .map_err(|_| IndexError::InvariantViolation("new root has no room"))?;
        let old_root = self.root;
        self.root = self.arena.adopt(Node::Interior(root))?;
        self.height += 1;
        self.stats.inc_root_growths();
        tracing::debug!(
            target: "elastic_bptree::root",
            old_root = %old_root,
            new_root = %self.root,
            height = self.height,
            "grew new root"
        );
        Ok(())
    }
}

/// Splits a full interior node around the pair that would sit in the middle once `pending`
/// joins it at `position`.
///
/// Returns the promoted key and the child that becomes the sibling's low-fence child. With
/// `n` existing pairs, the left node ends with `n / 2` pairs and the sibling with the
/// remaining `n - n / 2`, so both keep a separator whenever `n >= 2`.
fn split_interior<K: Clone>(
    parent: &mut ElasticNode<K, NodeId>,
    sibling: &mut ElasticNode<K, NodeId>,
    pending: ElementPair<K, NodeId>,
    position: usize,
) -> Result<(K, NodeId)> {
    let middle = parent.len() / 2;
    let room = |_| IndexError::InvariantViolation("split interior node has no room");
    if position == middle {
        parent.split_into_at(sibling, middle);
        return Ok(pending.into_parts());
    }
    if position < middle {
        parent.split_into_at(sibling, middle - 1);
        let promoted = sibling.remove_at(0);
        parent.insert_at(pending, position).map_err(room)?;
        return Ok(promoted.into_parts());
    }
    parent.split_into_at(sibling, middle);
    let promoted = sibling.remove_at(0);
    sibling
        .insert_at(pending, position - middle - 1)
        .map_err(room)?;
    Ok(promoted.into_parts())
}
