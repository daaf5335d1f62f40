//! Node: a single key/value holder linked to the next node of its chain.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Generational key of a node inside the map's arena.
    pub struct NodeKey;
}

/// Arena owning every node of a map. Chains only hold keys into it.
pub(crate) type Nodes<V> = SlotMap<NodeKey, Node<V>>;

#[derive(Debug, Clone)]
pub struct Node<V> {
    pub(crate) key: String,
    pub(crate) value: V,
    pub(crate) next: Option<NodeKey>,
}

impl<V> Node<V> {
    pub(crate) fn new(key: String, value: V) -> Self {
        Node {
            key,
            value,
            next: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Arena key of the following node in the same chain, if any.
    pub fn next(&self) -> Option<NodeKey> {
        self.next
    }
}
