use elastic_bptree::storage::btree::{
    BPlusTree, BPlusTreeOptions, ElasticNode, ElementPair, NaturalOrder, NodeKind,
};
use elastic_bptree::types::NodeId;
use proptest::prelude::*;
use std::collections::BTreeMap;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn node_inserts_stay_sorted_and_bounded(
        capacity in 1usize..64,
        keys in prop::collection::vec(any::<i32>(), 0..128),
    ) {
        let fence = ElementPair::default();
        let mut node = ElasticNode::<i32, u8>::create(capacity, NodeKind::Leaf, &fence, &fence)
            .expect("create");
        for key in keys {
            let before: Vec<i32> = node.elements().iter().map(|p| p.key).collect();
            let position = node.find_insert_position(&key, &NaturalOrder);
            let accepted = node.insert_at(ElementPair::new(key, 0), position).is_ok();
            prop_assert!(node.len() <= node.capacity());
            if !accepted {
                let after: Vec<i32> = node.elements().iter().map(|p| p.key).collect();
                prop_assert_eq!(after, before);
            }
            prop_assert!(node.elements().windows(2).all(|w| w[0].key <= w[1].key));
        }
    }

    #[test]
    fn split_reproduces_sequence(keys in prop::collection::btree_set(any::<u16>(), 1..100)) {
        let fence = ElementPair::default();
        let mut node =
            ElasticNode::<u16, NodeId>::create(keys.len(), NodeKind::Interior, &fence, &fence)
                .expect("create");
        for key in &keys {
            prop_assert!(node.append(ElementPair::new(*key, NodeId::NULL)).is_ok());
        }
        let sibling = node.split().expect("split");
        prop_assert_eq!(node.len(), keys.len() / 2);
        prop_assert_eq!(sibling.len(), keys.len() - keys.len() / 2);
        let joined: Vec<u16> = node
            .elements()
            .iter()
            .chain(sibling.elements())
            .map(|pair| pair.key)
            .collect();
        prop_assert_eq!(joined, keys.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn tree_matches_btreemap(
        leaf in 2usize..12,
        interior in 2usize..12,
        entries in prop::collection::vec((any::<u16>(), any::<u32>()), 0..400),
    ) {
        let mut tree = BPlusTree::<u16, u32>::with_options(BPlusTreeOptions {
            leaf_capacity: leaf,
            interior_capacity: interior,
        })
        .expect("tree");
        let mut reference = BTreeMap::new();
        for (key, value) in entries {
            prop_assert_eq!(tree.insert(key, value).expect("insert"), reference.insert(key, value));
        }
        tree.verify().expect("verify");
        let scanned = tree.iter().expect("iter").collect_pairs().expect("scan");
        prop_assert_eq!(scanned, reference.into_iter().collect::<Vec<_>>());
    }
}
