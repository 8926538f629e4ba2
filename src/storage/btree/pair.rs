use crate::types::NodeId;

/// A key together with the payload stored next to it in a node.
///
/// Leaves store value handles as the payload; interior nodes store child handles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementPair<K, P> {
    /// Ordering key.
    pub key: K,
    /// Value handle (leaf) or child reference (interior).
    pub payload: P,
}

impl<K, P> ElementPair<K, P> {
    /// Builds a pair.
    pub fn new(key: K, payload: P) -> Self {
        Self { key, payload }
    }

    /// Splits the pair into its parts.
    pub fn into_parts(self) -> (K, P) {
        (self.key, self.payload)
    }
}

impl<K, P> From<(K, P)> for ElementPair<K, P> {
    fn from((key, payload): (K, P)) -> Self {
        Self { key, payload }
    }
}

/// Pair stored in leaf nodes.
pub type KeyValuePair<K, V> = ElementPair<K, V>;

/// Pair stored in interior nodes.
pub type KeyNodePointerPair<K> = ElementPair<K, NodeId>;

/// Logical kind for a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum NodeKind {
    /// Node whose pairs carry value handles.
    Leaf,
    /// Node whose pairs carry child references.
    Interior,
}

impl NodeKind {
    /// Short name used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Leaf => "leaf",
            NodeKind::Interior => "interior",
        }
    }
}
