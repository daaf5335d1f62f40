//! chain-hashmap: a single-threaded, string-keyed hash map that resolves
//! collisions with separate chaining.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small map whose behavior is fully reproducible: a fixed hash
//!   function, a fixed growth policy and a fixed iteration order.
//! - Layers:
//!   - Node: key, value and a link to the next node of the same bucket.
//!     Nodes live in one `SlotMap` arena owned by the map; links are
//!     generational keys, not pointers.
//!   - Chain: the linked list behind one bucket. Stores only its head key
//!     and walks the arena for every operation.
//!   - ChainMap<V>: the bucket array, the hash function, the duplicate-key
//!     policy and the grow/shrink state machine.
//!
//! Hashing
//! - `acc = (31 * acc + c) % capacity` over the key's characters, always
//!   against the capacity in effect at call time. Not seeded and not
//!   collision resistant.
//!
//! Resizing
//! - Capacity starts at 16 and only doubles or halves.
//! - After `set`: if `len >= 0.75 * capacity`, double.
//! - After a successful `remove`: if `capacity > 16` and
//!   `len < 0.75 * capacity / 2`, halve.
//! - A rehash re-links the existing nodes into fresh buckets in iteration
//!   order; the result is the same as `set`ting every entry again.
//!
//! Duplicate keys
//! - `DuplicateKeys::Append` (default): a repeated `set` appends a second
//!   entry. `get` returns the oldest, `len` counts both, `remove` peels them
//!   off oldest first.
//! - `DuplicateKeys::Overwrite`: a repeated `set` replaces the value in
//!   place and hands back the old one.
//!
//! Errors
//! - Missing keys are not errors for `get`/`has`.
//! - `remove` returns `RemoveError::EmptyChain` when the key's bucket is
//!   empty and `RemoveError::KeyNotFound` when it holds other keys only.
//!   Neither failure mutates the map.
//!
//! Notes and non-goals
//! - Single-threaded; wrap in a lock for shared use.
//! - Iteration order: bucket index, then insertion order within a bucket.
//!
//! ```
//! use chain_hashmap::ChainMap;
//!
//! let mut map = ChainMap::new();
//! map.set("key1", "value1");
//! map.set("key2", "value2");
//! map.set("key3", "value3");
//!
//! assert_eq!(map.get("key1"), Some(&"value1"));
//! assert!(!map.has("key4"));
//!
//! map.remove("key2").unwrap();
//! assert_eq!(map.keys().collect::<Vec<_>>(), ["key1", "key3"]);
//!
//! map.clear();
//! assert!(map.is_empty());
//! ```

mod chain;
mod chain_map;
mod chain_map_proptest;
mod error;
pub mod hash;
mod node;

// Public surface
pub use chain::{Bucket, BucketIter};
pub use chain_map::{ChainMap, DuplicateKeys, Iter, LOAD_FACTOR_PERCENT, MIN_CAPACITY};
pub use error::RemoveError;
pub use node::{Node, NodeKey};
