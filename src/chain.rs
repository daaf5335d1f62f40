//! Chain: the singly linked list behind one bucket.
//!
//! A chain only stores the key of its head node. The nodes themselves live in
//! the map's arena, so every operation takes the arena alongside the chain.
//! Links are generational arena keys; a stale key simply ends a walk.

use crate::error::RemoveError;
use crate::node::{Node, NodeKey, Nodes};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Chain {
    head: Option<NodeKey>,
}

impl Chain {
    pub(crate) const fn new() -> Self {
        Chain { head: None }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Allocates a node for `key`/`value` and links it at the tail.
    /// Does not look for an existing node with the same key.
    pub(crate) fn append<V>(&mut self, nodes: &mut Nodes<V>, key: String, value: V) -> NodeKey {
        let k = nodes.insert(Node::new(key, value));
        self.link(nodes, k);
        k
    }

    /// Links an already allocated node at the tail, detaching it from
    /// whatever followed it before.
    pub(crate) fn link<V>(&mut self, nodes: &mut Nodes<V>, k: NodeKey) {
        if let Some(node) = nodes.get_mut(k) {
            node.next = None;
        }
        match self.tail_key(nodes) {
            None => self.head = Some(k),
            Some(t) => {
                if let Some(tail) = nodes.get_mut(t) {
                    tail.next = Some(k);
                }
            }
        }
    }

    pub(crate) fn find<V>(&self, nodes: &Nodes<V>, key: &str) -> Option<NodeKey> {
        self.node_keys(nodes)
            .find(|&k| nodes.get(k).is_some_and(|n| n.key == key))
    }

    pub(crate) fn get<'a, V>(&self, nodes: &'a Nodes<V>, key: &str) -> Option<&'a Node<V>> {
        self.find(nodes, key).and_then(|k| nodes.get(k))
    }

    pub(crate) fn get_mut<'a, V>(
        &self,
        nodes: &'a mut Nodes<V>,
        key: &str,
    ) -> Option<&'a mut Node<V>> {
        let k = self.find(nodes, key)?;
        nodes.get_mut(k)
    }

    pub(crate) fn contains<V>(&self, nodes: &Nodes<V>, key: &str) -> bool {
        self.find(nodes, key).is_some()
    }

    /// Unlinks and frees the first node holding `key`.
    ///
    /// Fails without touching the chain when it is empty or when no node
    /// matches.
    pub(crate) fn remove_at<V>(
        &mut self,
        nodes: &mut Nodes<V>,
        key: &str,
    ) -> Result<(String, V), RemoveError> {
        let head = self.head.ok_or(RemoveError::EmptyChain)?;

        let mut prev: Option<NodeKey> = None;
        let mut cur = Some(head);
        while let Some(k) = cur {
            let (matches, next) = match nodes.get(k) {
                Some(n) => (n.key == key, n.next),
                None => break,
            };
            if matches {
                match prev {
                    None => self.head = next,
                    Some(p) => {
                        if let Some(prev_node) = nodes.get_mut(p) {
                            prev_node.next = next;
                        }
                    }
                }
                return nodes
                    .remove(k)
                    .map(|n| (n.key, n.value))
                    .ok_or(RemoveError::KeyNotFound);
            }
            prev = Some(k);
            cur = next;
        }
        Err(RemoveError::KeyNotFound)
    }

    /// Number of nodes, counted by walking the links.
    pub(crate) fn size<V>(&self, nodes: &Nodes<V>) -> usize {
        self.node_keys(nodes).count()
    }

    pub(crate) fn head<'a, V>(&self, nodes: &'a Nodes<V>) -> Option<&'a Node<V>> {
        self.head.and_then(|k| nodes.get(k))
    }

    pub(crate) fn tail<'a, V>(&self, nodes: &'a Nodes<V>) -> Option<&'a Node<V>> {
        self.tail_key(nodes).and_then(|k| nodes.get(k))
    }

    fn tail_key<V>(&self, nodes: &Nodes<V>) -> Option<NodeKey> {
        self.node_keys(nodes).last()
    }

    pub(crate) fn node_keys<'a, V>(&self, nodes: &'a Nodes<V>) -> NodeKeys<'a, V> {
        NodeKeys {
            nodes,
            cur: self.head,
        }
    }

    pub(crate) fn iter<'a, V>(&self, nodes: &'a Nodes<V>) -> BucketIter<'a, V> {
        BucketIter {
            nodes,
            cur: self.head,
        }
    }
}

/// Walks the arena keys of one chain in link order.
pub(crate) struct NodeKeys<'a, V> {
    nodes: &'a Nodes<V>,
    cur: Option<NodeKey>,
}

impl<'a, V> Iterator for NodeKeys<'a, V> {
    type Item = NodeKey;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cur?;
        let node = self.nodes.get(k)?;
        self.cur = node.next;
        Some(k)
    }
}

/// Iterator over the entries of one bucket, in link order.
pub struct BucketIter<'a, V> {
    nodes: &'a Nodes<V>,
    cur: Option<NodeKey>,
}

impl<'a, V> Iterator for BucketIter<'a, V> {
    type Item = (&'a str, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.get(self.cur?)?;
        self.cur = node.next;
        Some((node.key.as_str(), &node.value))
    }
}

/// Read-only view of one bucket of a [`ChainMap`](crate::ChainMap).
pub struct Bucket<'a, V> {
    chain: Chain,
    nodes: &'a Nodes<V>,
}

impl<'a, V> Bucket<'a, V> {
    pub(crate) fn new(chain: Chain, nodes: &'a Nodes<V>) -> Self {
        Bucket { chain, nodes }
    }

    /// Number of entries in this bucket. Walks the whole chain.
    pub fn len(&self) -> usize {
        self.chain.size(self.nodes)
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn head(&self) -> Option<&'a Node<V>> {
        self.chain.head(self.nodes)
    }

    pub fn tail(&self) -> Option<&'a Node<V>> {
        self.chain.tail(self.nodes)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.chain.contains(self.nodes, key)
    }

    pub fn get(&self, key: &str) -> Option<&'a V> {
        self.chain.get(self.nodes, key).map(Node::value)
    }

    pub fn iter(&self) -> BucketIter<'a, V> {
        self.chain.iter(self.nodes)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &'a V> + 'a {
        self.iter().map(|(_, v)| v)
    }

    pub fn entries(&self) -> BucketIter<'a, V> {
        self.iter()
    }
}

impl<'a, V: core::fmt::Debug> core::fmt::Debug for Bucket<'a, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
