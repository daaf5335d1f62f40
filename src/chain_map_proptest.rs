#![cfg(test)]

// Property tests for ChainMap kept inside the crate so they can check
// structural invariants (bucket placement, capacity policy) directly.

use crate::chain_map::{ChainMap, DuplicateKeys, LOAD_FACTOR_PERCENT, MIN_CAPACITY};
use crate::error::RemoveError;
use crate::hash::bucket_index;
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap, VecDeque};

// Pool-indexed operations so shrinking prefers earlier keys and shorter
// op lists.
#[derive(Clone, Debug)]
enum Op {
    Set(usize, i32),
    Get(usize),
    Has(String),
    Remove(usize),
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z0-9]{0,6}", 1..=40).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Set(i, v)),
            2 => idx.clone().prop_map(Op::Get),
            1 => "[a-z0-9]{0,6}".prop_map(Op::Has),
            4 => idx.clone().prop_map(Op::Remove),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
    })
}

/// Capacity the resize policy predicts after an operation.
fn next_capacity(capacity: usize, len: usize, grew: bool) -> usize {
    if grew {
        if len * 100 >= capacity * LOAD_FACTOR_PERCENT {
            return capacity * 2;
        }
    } else if capacity > MIN_CAPACITY && len * 100 < (capacity / 2) * LOAD_FACTOR_PERCENT {
        return capacity / 2;
    }
    capacity
}

fn expected_remove_error<'a>(
    keys: impl Iterator<Item = &'a String>,
    key: &str,
    capacity: usize,
) -> RemoveError {
    let idx = bucket_index(key, capacity);
    if keys.into_iter().any(|k| bucket_index(k, capacity) == idx) {
        RemoveError::KeyNotFound
    } else {
        RemoveError::EmptyChain
    }
}

fn check_structure(sut: &ChainMap<i32>) -> Result<(), TestCaseError> {
    let cap = sut.capacity();
    prop_assert!(cap >= MIN_CAPACITY);
    prop_assert!(cap.is_power_of_two());
    let mut total = 0;
    for (i, b) in sut.buckets().enumerate() {
        total += b.len();
        for k in b.keys() {
            prop_assert_eq!(bucket_index(k, cap), i);
        }
    }
    prop_assert_eq!(total, sut.len());
    prop_assert_eq!(sut.iter().count(), sut.len());
    Ok(())
}

// Property: Append policy against a model of per-key FIFO queues.
// - `get` returns the oldest value appended under a key.
// - `remove` pops the oldest value; error kind depends on whether any live
//   key shares the bucket.
// - Capacity follows the grow/shrink rules exactly.
// - Every entry sits in the bucket its key hashes to.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_append_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: ChainMap<i32> = ChainMap::new();
        let mut model: HashMap<String, VecDeque<i32>> = HashMap::new();
        let mut capacity = MIN_CAPACITY;
        let model_len = |m: &HashMap<String, VecDeque<i32>>| m.values().map(VecDeque::len).sum::<usize>();

        for op in ops {
            match op {
                Op::Set(i, v) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.set(k.as_str(), v), None);
                    model.entry(k.clone()).or_default().push_back(v);
                    capacity = next_capacity(capacity, model_len(&model), true);
                }
                Op::Get(i) => {
                    let k = &pool[i];
                    let expected = model.get(k).and_then(|q| q.front());
                    prop_assert_eq!(sut.get(k), expected);
                }
                Op::Has(s) => {
                    let expected = model.get(&s).is_some_and(|q| !q.is_empty());
                    prop_assert_eq!(sut.has(&s), expected);
                }
                Op::Remove(i) => {
                    let k = &pool[i];
                    match model.get_mut(k).and_then(VecDeque::pop_front) {
                        Some(v) => {
                            prop_assert_eq!(sut.remove(k), Ok(v));
                            if model.get(k).is_some_and(VecDeque::is_empty) {
                                model.remove(k);
                            }
                            capacity = next_capacity(capacity, model_len(&model), false);
                        }
                        None => {
                            let err = expected_remove_error(model.keys(), k, capacity);
                            prop_assert_eq!(sut.remove(k), Err(err));
                        }
                    }
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                    capacity = MIN_CAPACITY;
                }
            }

            prop_assert_eq!(sut.capacity(), capacity);
            prop_assert_eq!(sut.len(), model_len(&model));
            check_structure(&sut)?;
        }
    }
}

// Property: Overwrite policy behaves like std's HashMap for every op, and
// the entry set matches the model after each step.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_overwrite_matches_std((pool, ops) in arb_scenario()) {
        let mut sut: ChainMap<i32> = ChainMap::with_duplicates(DuplicateKeys::Overwrite);
        let mut model: HashMap<String, i32> = HashMap::new();

        for op in ops {
            match op {
                Op::Set(i, v) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.set(k.as_str(), v), model.insert(k.clone(), v));
                }
                Op::Get(i) => {
                    let k = &pool[i];
                    prop_assert_eq!(sut.get(k), model.get(k));
                }
                Op::Has(s) => {
                    prop_assert_eq!(sut.has(&s), model.contains_key(&s));
                }
                Op::Remove(i) => {
                    let k = &pool[i];
                    match model.remove(k) {
                        Some(v) => {
                            prop_assert_eq!(sut.remove(k), Ok(v));
                        }
                        None => {
                            prop_assert!(sut.remove(k).is_err());
                        }
                    }
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }

            let seen: BTreeMap<&str, i32> = sut.iter().map(|(k, v)| (k, *v)).collect();
            let expected: BTreeMap<&str, i32> = model.iter().map(|(k, v)| (k.as_str(), *v)).collect();
            prop_assert_eq!(seen, expected);
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
            check_structure(&sut)?;
        }
    }
}
