//! ChainMap: bucket array, duplicate policy and the grow/shrink state machine.

use crate::chain::{Bucket, BucketIter, Chain};
use crate::error::RemoveError;
use crate::hash::bucket_index;
use crate::node::{Node, NodeKey, Nodes};
use core::fmt;
use core::mem;
use log::{debug, trace};
use slotmap::SlotMap;

/// Bucket count of a fresh or cleared map. Capacity never drops below it.
pub const MIN_CAPACITY: usize = 16;

/// Load factor that triggers a resize, as a percentage of the capacity.
pub const LOAD_FACTOR_PERCENT: usize = 75;

/// What `set` does when the key is already present.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DuplicateKeys {
    /// Append another entry with the same key. Lookups and removals see the
    /// oldest one first; `len` counts both.
    #[default]
    Append,
    /// Replace the value of the existing entry and return the old value.
    Overwrite,
}

/// String-keyed hash map with separate chaining.
///
/// Buckets are singly linked chains whose nodes live in one arena owned by
/// the map. The map doubles its bucket count once it is 75% full after a
/// `set`, and halves it (down to [`MIN_CAPACITY`]) once a `remove` leaves it
/// under 75% of half the current capacity.
pub struct ChainMap<V> {
    buckets: Vec<Chain>,
    nodes: Nodes<V>,
    duplicates: DuplicateKeys,
}

impl<V> ChainMap<V> {
    pub fn new() -> Self {
        Self::with_duplicates(DuplicateKeys::default())
    }

    pub fn with_duplicates(duplicates: DuplicateKeys) -> Self {
        Self {
            buckets: vec![Chain::new(); MIN_CAPACITY],
            nodes: SlotMap::with_key(),
            duplicates,
        }
    }

    pub fn duplicates(&self) -> DuplicateKeys {
        self.duplicates
    }

    /// Current number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn bucket_of(&self, key: &str) -> usize {
        bucket_index(key, self.capacity())
    }

    /// Inserts `value` under `key`, then grows the table if it reached the
    /// load factor.
    ///
    /// Under [`DuplicateKeys::Append`] this always adds an entry and returns
    /// `None`. Under [`DuplicateKeys::Overwrite`] an existing entry is
    /// updated in place and its previous value returned.
    pub fn set(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        let idx = self.bucket_of(&key);
        let previous = match self.duplicates {
            DuplicateKeys::Append => {
                self.buckets[idx].append(&mut self.nodes, key, value);
                None
            }
            DuplicateKeys::Overwrite => match self.buckets[idx].get_mut(&mut self.nodes, &key) {
                Some(node) => Some(mem::replace(&mut node.value, value)),
                None => {
                    self.buckets[idx].append(&mut self.nodes, key, value);
                    None
                }
            },
        };
        self.grow_if_needed();
        previous
    }

    /// Value stored under `key`; the oldest one if the key was appended
    /// more than once.
    pub fn get(&self, key: &str) -> Option<&V> {
        let idx = self.bucket_of(key);
        self.buckets[idx].get(&self.nodes, key).map(Node::value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let idx = self.bucket_of(key);
        self.buckets[idx]
            .get_mut(&mut self.nodes, key)
            .map(|node| &mut node.value)
    }

    pub fn has(&self, key: &str) -> bool {
        let idx = self.bucket_of(key);
        self.buckets[idx].contains(&self.nodes, key)
    }

    /// Removes the first entry stored under `key` and returns its value,
    /// then shrinks the table if it fell below the load factor.
    ///
    /// Fails with [`RemoveError::EmptyChain`] when the key's bucket is empty
    /// and with [`RemoveError::KeyNotFound`] when the bucket holds other keys
    /// only. The map is unchanged on failure.
    pub fn remove(&mut self, key: &str) -> Result<V, RemoveError> {
        let idx = self.bucket_of(key);
        let (_, value) = self.buckets[idx].remove_at(&mut self.nodes, key)?;
        self.shrink_if_needed();
        Ok(value)
    }

    /// Drops every entry and resets the capacity to [`MIN_CAPACITY`].
    pub fn clear(&mut self) {
        trace!(
            "clearing {} entries from {} buckets",
            self.len(),
            self.capacity()
        );
        self.nodes.clear();
        self.buckets = vec![Chain::new(); MIN_CAPACITY];
    }

    /// Entries in bucket order, then insertion order within a bucket.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            nodes: &self.nodes,
            buckets: self.buckets.iter(),
            current: Chain::new().iter(&self.nodes),
        }
    }

    pub fn entries(&self) -> Iter<'_, V> {
        self.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Read-only view of bucket `index`, or `None` past the capacity.
    pub fn bucket(&self, index: usize) -> Option<Bucket<'_, V>> {
        self.buckets
            .get(index)
            .map(|&chain| Bucket::new(chain, &self.nodes))
    }

    /// Views of every bucket, in index order.
    pub fn buckets(&self) -> impl Iterator<Item = Bucket<'_, V>> + '_ {
        self.buckets
            .iter()
            .map(move |&chain| Bucket::new(chain, &self.nodes))
    }

    fn grow_if_needed(&mut self) {
        let capacity = self.capacity();
        if reached_load(self.len(), capacity) {
            self.rehash(capacity * 2);
        }
    }

    fn shrink_if_needed(&mut self) {
        let capacity = self.capacity();
        if capacity > MIN_CAPACITY && !reached_load(self.len(), capacity / 2) {
            self.rehash(capacity / 2);
        }
    }

    /// Re-places every node against `new_capacity`.
    ///
    /// Nodes are visited in iteration order and linked at the tail of their
    /// new bucket, so each bucket ends up exactly as if every entry had been
    /// `set` again in that order. No node is reallocated.
    fn rehash(&mut self, new_capacity: usize) {
        debug!(
            "rehashing {} entries: {} -> {} buckets",
            self.len(),
            self.capacity(),
            new_capacity
        );
        let nodes = &self.nodes;
        let order: Vec<NodeKey> = self
            .buckets
            .iter()
            .flat_map(|chain| chain.node_keys(nodes))
            .collect();

        self.buckets = vec![Chain::new(); new_capacity];
        for k in order {
            let Some(node) = self.nodes.get(k) else {
                continue;
            };
            let idx = bucket_index(&node.key, new_capacity);
            self.buckets[idx].link(&mut self.nodes, k);
        }
    }
}

/// `len` has reached `LOAD_FACTOR_PERCENT` of `capacity`.
fn reached_load(len: usize, capacity: usize) -> bool {
    len * 100 >= capacity * LOAD_FACTOR_PERCENT
}

impl<V> Default for ChainMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for ChainMap<V> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            nodes: self.nodes.clone(),
            duplicates: self.duplicates,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for ChainMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<String>, V> Extend<(K, V)> for ChainMap<V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for ChainMap<V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, V> IntoIterator for &'a ChainMap<V> {
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over all entries of a `ChainMap`.
pub struct Iter<'a, V> {
    nodes: &'a Nodes<V>,
    buckets: core::slice::Iter<'a, Chain>,
    current: BucketIter<'a, V>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.next() {
                return Some(entry);
            }
            let chain = self.buckets.next()?;
            self.current = chain.iter(self.nodes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn distinct(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("key-{i}")).collect()
    }

    fn chain_sizes(m: &ChainMap<i32>) -> usize {
        m.buckets().map(|b| b.len()).sum()
    }

    /// Invariant: every entry sits in the bucket its key hashes to at the
    /// current capacity.
    fn assert_placement<V>(m: &ChainMap<V>) {
        for (i, b) in m.buckets().enumerate() {
            for k in b.keys() {
                assert_eq!(bucket_index(k, m.capacity()), i, "misplaced {k}");
            }
        }
    }

    /// Invariant: a fresh map has 16 empty buckets and the Append policy.
    #[test]
    fn fresh_map() {
        let m: ChainMap<i32> = ChainMap::new();
        assert_eq!(m.capacity(), MIN_CAPACITY);
        assert_eq!(m.len(), 0);
        assert!(m.is_empty());
        assert_eq!(m.duplicates(), DuplicateKeys::Append);
        assert!(m.buckets().all(|b| b.is_empty()));
        assert!(m.bucket(MIN_CAPACITY).is_none());
    }

    /// Invariant: the 12th entry at capacity 16 reaches 75% and doubles the
    /// table; the 11th does not.
    #[test]
    fn grows_at_load_factor() {
        let mut m = ChainMap::new();
        let keys = distinct(12);
        for (i, k) in keys.iter().take(11).enumerate() {
            m.set(k.as_str(), i as i32);
        }
        assert_eq!(m.capacity(), 16);

        m.set(keys[11].as_str(), 11);
        assert_eq!(m.capacity(), 32);
        assert_eq!(m.len(), 12);
        assert_eq!(chain_sizes(&m), 12);
        assert_placement(&m);
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(m.get(k), Some(&(i as i32)));
        }
    }

    /// Invariant: growth keeps doubling; 24 entries at 32 buckets grow to 64.
    #[test]
    fn grows_repeatedly() {
        let mut m = ChainMap::new();
        for (i, k) in distinct(24).into_iter().enumerate() {
            m.set(k, i as i32);
        }
        assert_eq!(m.capacity(), 64);
        assert_eq!(chain_sizes(&m), 24);
        assert_placement(&m);
    }

    /// Invariant: a remove that leaves fewer than 75% of half the capacity
    /// halves the table, never below 16.
    #[test]
    fn shrinks_after_remove() {
        let mut m = ChainMap::new();
        let keys = distinct(12);
        for (i, k) in keys.iter().enumerate() {
            m.set(k.as_str(), i as i32);
        }
        assert_eq!(m.capacity(), 32);

        // 11 < 0.75 * 16
        assert_eq!(m.remove(&keys[0]), Ok(0));
        assert_eq!(m.capacity(), 16);
        assert_placement(&m);

        for k in &keys[1..] {
            m.remove(k).unwrap();
            assert_eq!(m.capacity(), 16);
        }
        assert!(m.is_empty());
    }

    /// Invariant: shrink threshold at 64 buckets is 24 entries.
    #[test]
    fn shrinks_from_sixty_four() {
        let mut m = ChainMap::new();
        let keys = distinct(24);
        for (i, k) in keys.iter().enumerate() {
            m.set(k.as_str(), i as i32);
        }
        assert_eq!(m.capacity(), 64);
        m.remove(&keys[0]).unwrap();
        assert_eq!(m.capacity(), 32);
        assert_eq!(m.len(), 23);
        assert_placement(&m);
    }

    /// Invariant: a failed removal never resizes or mutates.
    #[test]
    fn failed_remove_is_noop() {
        let mut m = ChainMap::new();
        let keys = distinct(12);
        for (i, k) in keys.iter().enumerate() {
            m.set(k.as_str(), i as i32);
        }
        let before: Vec<(String, i32)> = m.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        assert!(m.remove("absent").is_err());
        let after: Vec<(String, i32)> = m.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        assert_eq!(before, after);
        assert_eq!(m.capacity(), 32);
    }

    /// Invariant: `remove` on an empty map reports an empty chain; on a key
    /// whose bucket holds other keys it reports a missing key.
    #[test]
    fn remove_error_kinds() {
        let mut m: ChainMap<i32> = ChainMap::new();
        assert_eq!(m.remove("key1"), Err(RemoveError::EmptyChain));

        m.set("key1", 1);
        // Some other key that collides with "key1".
        let idx = bucket_index("key1", 16);
        let other = (0..)
            .map(|i| format!("probe{i}"))
            .find(|k| bucket_index(k, 16) == idx)
            .unwrap();
        assert_eq!(m.remove(&other), Err(RemoveError::KeyNotFound));
        assert_eq!(m.len(), 1);
    }

    /// Invariant: Append keeps both entries; `get` returns the oldest value
    /// and removal peels them off in insertion order.
    #[test]
    fn append_policy_keeps_duplicates() {
        let mut m = ChainMap::new();
        assert_eq!(m.set("k", 1), None);
        assert_eq!(m.set("k", 2), None);
        assert_eq!(m.len(), 2);
        assert_eq!(m.get("k"), Some(&1));

        assert_eq!(m.remove("k"), Ok(1));
        assert_eq!(m.get("k"), Some(&2));
        assert!(m.has("k"));
        assert_eq!(m.remove("k"), Ok(2));
        assert!(!m.has("k"));
    }

    /// Invariant: Overwrite updates in place, returns the old value and does
    /// not change `len`.
    #[test]
    fn overwrite_policy_replaces() {
        let mut m = ChainMap::with_duplicates(DuplicateKeys::Overwrite);
        assert_eq!(m.set("k", 1), None);
        assert_eq!(m.set("k", 2), Some(1));
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("k"), Some(&2));
    }

    /// Invariant: Overwrite keeps keys unique across growth.
    #[test]
    fn overwrite_policy_across_resize() {
        let mut m = ChainMap::with_duplicates(DuplicateKeys::Overwrite);
        let keys = distinct(40);
        for k in &keys {
            m.set(k.as_str(), 0);
        }
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(m.set(k.as_str(), i as i32), Some(0));
        }
        assert_eq!(m.len(), 40);
        let unique: BTreeSet<&str> = m.keys().collect();
        assert_eq!(unique.len(), 40);
    }

    /// Invariant: rehashing keeps relative order of duplicates, so the oldest
    /// value still wins after a grow.
    #[test]
    fn duplicates_survive_rehash_in_order() {
        let mut m = ChainMap::new();
        m.set("dup", 1);
        m.set("dup", 2);
        for (i, k) in distinct(20).into_iter().enumerate() {
            m.set(k, 100 + i as i32);
        }
        assert_eq!(m.capacity(), 32);
        assert_eq!(m.get("dup"), Some(&1));
        let idx = bucket_index("dup", m.capacity());
        let values: Vec<i32> = m
            .bucket(idx)
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == "dup")
            .map(|(_, v)| *v)
            .collect();
        assert_eq!(values, [1, 2]);
    }

    /// Invariant: `clear` drops everything and restores 16 buckets.
    #[test]
    fn clear_resets_capacity() {
        let mut m = ChainMap::new();
        for (i, k) in distinct(30).into_iter().enumerate() {
            m.set(k, i as i32);
        }
        assert!(m.capacity() > MIN_CAPACITY);
        m.clear();
        assert_eq!(m.len(), 0);
        assert_eq!(m.capacity(), MIN_CAPACITY);
        assert_eq!(m.iter().count(), 0);
        assert!(!m.has("key-0"));

        m.set("again", 1);
        assert_eq!(m.get("again"), Some(&1));
    }

    /// Invariant: iteration walks buckets in index order.
    #[test]
    fn iteration_follows_bucket_order() {
        let mut m = ChainMap::new();
        for (i, k) in distinct(10).into_iter().enumerate() {
            m.set(k, i as i32);
        }
        let indices: Vec<usize> = m.keys().map(|k| bucket_index(k, m.capacity())).collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        assert_eq!(indices, sorted);
        assert_eq!(m.values().count(), 10);
        assert_eq!(m.entries().count(), 10);
        assert_eq!((&m).into_iter().count(), 10);
    }

    /// Invariant: `get_mut` changes are visible to later lookups.
    #[test]
    fn get_mut_edits_value() {
        let mut m = ChainMap::new();
        m.set("a", 1);
        *m.get_mut("a").unwrap() += 41;
        assert_eq!(m.get("a"), Some(&42));
        assert!(m.get_mut("b").is_none());
    }

    /// Invariant: clones are independent.
    #[test]
    fn clone_is_independent() {
        let mut m = ChainMap::new();
        m.set("a", 1);
        let mut c = m.clone();
        c.set("b", 2);
        c.remove("a").unwrap();
        assert!(m.has("a"));
        assert!(!m.has("b"));
        assert!(c.has("b"));
        assert!(!c.has("a"));
    }

    /// Invariant: Debug renders as a map in iteration order.
    #[test]
    fn debug_as_map() {
        let mut m = ChainMap::new();
        m.set("key1", 1);
        m.set("key3", 3);
        assert_eq!(format!("{:?}", m), r#"{"key1": 1, "key3": 3}"#);
    }

    /// Invariant: the threshold helper is exactly 75%.
    #[test]
    fn load_threshold() {
        assert!(!reached_load(11, 16));
        assert!(reached_load(12, 16));
        assert!(!reached_load(23, 32));
        assert!(reached_load(24, 32));
    }
}
