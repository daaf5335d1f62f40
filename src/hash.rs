//! Polynomial rolling hash used to pick a bucket.

const MULTIPLIER: u64 = 31;

/// Bucket index of `key` for a table of `capacity` buckets.
///
/// Folds each character's scalar value into `acc = (31 * acc + c) % capacity`,
/// so the result is always in `0..capacity`. The reduction happens at every
/// step, which keeps the accumulator small and makes the index depend on the
/// capacity in effect at call time. `capacity` must be non-zero.
pub fn bucket_index(key: &str, capacity: usize) -> usize {
    debug_assert!(capacity > 0, "bucket_index called with zero capacity");
    let modulus = capacity as u64;
    let acc = key.chars().fold(0u64, |acc, c| {
        (MULTIPLIER * acc + u64::from(u32::from(c))) % modulus
    });
    acc as usize
}

#[cfg(test)]
mod tests {
    use super::bucket_index;

    /// Invariant: the empty key always lands in bucket 0.
    #[test]
    fn empty_key_is_bucket_zero() {
        assert_eq!(bucket_index("", 16), 0);
        assert_eq!(bucket_index("", 1024), 0);
    }

    /// Invariant: hand-computed values for the demo keys at capacity 16.
    #[test]
    fn known_values_at_sixteen() {
        // k=107 -> 11; e: 31*11+101=442 -> 10; y: 31*10+121=431 -> 15
        // '1': 31*15+49=514 -> 2
        assert_eq!(bucket_index("key1", 16), 2);
        assert_eq!(bucket_index("key2", 16), 3);
        assert_eq!(bucket_index("key3", 16), 4);
        assert_eq!(bucket_index("a", 16), 97 % 16);
    }

    /// Invariant: the index is always below the capacity.
    #[test]
    fn index_in_range() {
        for cap in [1usize, 2, 16, 32, 64, 1 << 20] {
            for key in ["", "a", "zzzzzzzzzzzz", "ключ", "🦀crab"] {
                assert!(bucket_index(key, cap) < cap);
            }
        }
    }

    /// Invariant: the same key can land in different buckets once capacity
    /// changes, which is why a resize has to rehash.
    #[test]
    fn depends_on_capacity() {
        // 31 * 11 + 101 = 442; 442 % 16 = 10 but 442 % 32 = 26.
        assert_eq!(bucket_index("ke", 16), 10);
        assert_eq!(bucket_index("ke", 32), 26);
    }

    /// Invariant: non-ASCII characters hash by their scalar value.
    #[test]
    fn uses_scalar_values() {
        let c = 'é';
        assert_eq!(bucket_index("é", 1 << 16), u32::from(c) as usize);
    }
}
