use super::{BPlusTree, BPlusTreeOptions, Node, NodeKind};
use crate::types::{NodeId, PageId, Result, TupleSlot};
use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::ops::Bound;

fn tree_with(leaf: usize, interior: usize) -> Result<BPlusTree<u64, TupleSlot>> {
    BPlusTree::with_options(BPlusTreeOptions {
        leaf_capacity: leaf,
        interior_capacity: interior,
    })
}

fn slot_for(key: u64) -> TupleSlot {
    TupleSlot::new(PageId(key / 16), (key % 16) as u16)
}

fn assert_tree_matches_reference(
    tree: &BPlusTree<u64, TupleSlot>,
    reference: &BTreeMap<u64, TupleSlot>,
    max_key: u64,
) -> Result<()> {
    for key in 0..=max_key {
        assert_eq!(tree.get(&key)?, reference.get(&key));
    }
    let scanned = tree.iter()?.collect_pairs()?;
    let expected: Vec<_> = reference.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(scanned, expected);
    assert_eq!(tree.len(), reference.len());
    Ok(())
}

fn leaf_keys(tree: &BPlusTree<u64, TupleSlot>, id: NodeId) -> Result<Vec<u64>> {
    let leaf = tree.arena().leaf(id)?;
    Ok(leaf.elements().iter().map(|pair| pair.key).collect())
}

/// Follows the leaf chain from the leftmost leaf, returning each leaf's keys.
fn leaf_chain(tree: &BPlusTree<u64, TupleSlot>) -> Result<Vec<Vec<u64>>> {
    let mut chain = Vec::new();
    let mut next = Some(tree.leftmost_leaf()?);
    while let Some(id) = next {
        chain.push(leaf_keys(tree, id)?);
        next = tree.arena().leaf(id)?.right_sibling();
    }
    Ok(chain)
}

#[test]
fn insert_and_get_roundtrip() -> Result<()> {
    let mut tree = tree_with(8, 8)?;
    for key in [5u64, 1, 9, 3, 7] {
        assert_eq!(tree.insert(key, slot_for(key))?, None);
    }
    for key in [1u64, 3, 5, 7, 9] {
        assert_eq!(tree.get(&key)?, Some(&slot_for(key)));
    }
    assert!(!tree.contains_key(&2)?);
    assert_eq!(tree.len(), 5);
    Ok(())
}

#[test]
fn root_leaf_holds_keys_below_capacity() -> Result<()> {
    let mut tree = tree_with(128, 128)?;
    for key in 0..100u64 {
        tree.insert(key, slot_for(key))?;
    }
    assert_eq!(tree.height(), 1);
    assert_eq!(tree.root_node()?.kind(), NodeKind::Leaf);
    assert_eq!(leaf_keys(&tree, tree.root())?, (0..100).collect::<Vec<_>>());
    assert_eq!(tree.stats_snapshot().leaf_splits, 0);
    Ok(())
}

#[test]
fn root_split_creates_new_internal() -> Result<()> {
    let mut tree = tree_with(128, 128)?;
    for key in 0..129u64 {
        tree.insert(key, slot_for(key))?;
    }
    assert_eq!(tree.height(), 2);
    let root = match tree.root_node()? {
        Node::Interior(node) => node,
        Node::Leaf(_) => panic!("root should have grown"),
    };
    assert_eq!(root.len(), 1);
    assert_eq!(root.elements()[0].key, 64);
    let left = leaf_keys(&tree, root.low_fence().payload)?;
    let right = leaf_keys(&tree, root.elements()[0].payload)?;
    assert_eq!(left, (0..64).collect::<Vec<_>>());
    assert_eq!(right, (64..129).collect::<Vec<_>>());
    let stats = tree.stats_snapshot();
    assert_eq!(stats.leaf_splits, 1);
    assert_eq!(stats.root_growths, 1);
    assert_eq!(stats.internal_splits, 0);
    tree.verify()?;
    Ok(())
}

#[test]
fn leaf_chain_covers_every_key_once() -> Result<()> {
    let mut tree = tree_with(5, 4)?;
    let mut keys: Vec<u64> = (0..400).collect();
    keys.shuffle(&mut ChaCha8Rng::seed_from_u64(0x5eed));
    for &key in &keys {
        tree.insert(key, slot_for(key))?;
    }
    let chain = leaf_chain(&tree)?;
    assert!(chain.len() > 1);
    let flattened: Vec<u64> = chain.into_iter().flatten().collect();
    assert_eq!(flattened, (0..400).collect::<Vec<_>>());
    tree.verify()?;
    Ok(())
}

#[test]
fn replacing_values_keeps_shape() -> Result<()> {
    let mut tree = tree_with(4, 4)?;
    for key in 0..64u64 {
        tree.insert(key, slot_for(key))?;
    }
    let before = tree.verify()?;
    for key in 0..64u64 {
        let previous = tree.insert(key, slot_for(key + 1000))?;
        assert_eq!(previous, Some(slot_for(key)));
    }
    assert_eq!(tree.verify()?, before);
    assert_eq!(tree.get(&10)?, Some(&slot_for(1010)));
    let stats = tree.stats_snapshot();
    assert_eq!(stats.inserts, 64);
    assert_eq!(stats.replacements, 64);
    Ok(())
}

#[test]
fn range_iterates_with_bounds() -> Result<()> {
    let mut tree = tree_with(4, 4)?;
    for key in (0..100u64).step_by(3) {
        tree.insert(key, slot_for(key))?;
    }
    let collect = |lo: Bound<u64>, hi: Bound<u64>| -> Result<Vec<u64>> {
        let mut cursor = tree.range((lo, hi))?;
        let mut out = Vec::new();
        while let Some((key, value)) = cursor.next()? {
            assert_eq!(*value, slot_for(*key));
            out.push(*key);
        }
        Ok(out)
    };
    assert_eq!(
        collect(Bound::Included(10), Bound::Included(30))?,
        vec![12, 15, 18, 21, 24, 27, 30]
    );
    assert_eq!(
        collect(Bound::Excluded(12), Bound::Excluded(24))?,
        vec![15, 18, 21]
    );
    assert_eq!(collect(Bound::Unbounded, Bound::Excluded(7))?, vec![0, 3, 6]);
    assert_eq!(collect(Bound::Included(95), Bound::Unbounded)?, vec![96, 99]);
    Ok(())
}

#[test]
fn randomized_inserts_match_reference() -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(0xB7EE);
    for (leaf, interior) in [(2, 2), (3, 5), (7, 3), (16, 16)] {
        let mut tree = tree_with(leaf, interior)?;
        let mut reference = BTreeMap::new();
        for _ in 0..1_500 {
            let key = rng.gen_range(0..2_000u64);
            let value = slot_for(rng.gen());
            let expected = reference.insert(key, value);
            assert_eq!(tree.insert(key, value)?, expected);
        }
        tree.verify()?;
        assert_tree_matches_reference(&tree, &reference, 2_000)?;
    }
    Ok(())
}

#[test]
fn cleared_tree_accepts_new_keys() -> Result<()> {
    let mut tree = tree_with(3, 3)?;
    for key in 0..200u64 {
        tree.insert(key, slot_for(key))?;
    }
    tree.clear()?;
    assert_eq!(tree.verify()?.nodes, 1);
    for key in (0..50u64).rev() {
        tree.insert(key, slot_for(key))?;
    }
    let mut reference = BTreeMap::new();
    for key in 0..50u64 {
        reference.insert(key, slot_for(key));
    }
    assert_tree_matches_reference(&tree, &reference, 60)
}

fn insert_strategy() -> impl Strategy<Value = (u64, u64)> {
    (0u64..256, any::<u64>())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]
    #[test]
    fn btree_matches_btreemap_random_inserts(
        leaf in 2usize..9,
        interior in 2usize..9,
        ops in prop::collection::vec(insert_strategy(), 1..300),
    ) {
        let mut tree = tree_with(leaf, interior).expect("tree");
        let mut reference = BTreeMap::new();
        for (key, raw) in ops {
            let value = slot_for(raw);
            let previous = tree.insert(key, value).expect("insert");
            prop_assert_eq!(previous, reference.insert(key, value));
        }
        let report = tree.verify().expect("verify");
        prop_assert_eq!(report.entries, reference.len());
        for (key, value) in &reference {
            prop_assert_eq!(tree.get(key).expect("get"), Some(value));
        }
        let scanned = tree.iter().expect("iter").collect_pairs().expect("scan");
        let expected: Vec<_> = reference.into_iter().collect();
        prop_assert_eq!(scanned, expected);
    }

    #[test]
    fn range_matches_btreemap_range(
        keys in prop::collection::btree_set(0u64..500, 0..200),
        lo in 0u64..520,
        span in 0u64..200,
    ) {
        let mut tree = tree_with(4, 3).expect("tree");
        let mut reference = BTreeMap::new();
        for key in keys {
            tree.insert(key, slot_for(key)).expect("insert");
            reference.insert(key, slot_for(key));
        }
        let hi = lo + span;
        let scanned = tree.range(lo..hi).expect("range").collect_pairs().expect("scan");
        let expected: Vec<_> = reference.range(lo..hi).map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(scanned, expected);
    }
}
