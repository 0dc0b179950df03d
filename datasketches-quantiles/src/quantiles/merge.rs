// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Store-level union of two sketches, including across different k.

use super::compactor::Compactor;
use super::item::QuantilesItem;
use super::level_store::LevelStore;
use crate::common::RandomSource;

/// Folds every retained item of `source` into `target`. Both stores must
/// share the same k.
///
/// Base buffer items are inserted one by one; each populated level of the
/// source is carried into the same level of the target.
pub(super) fn merge_same_k<T: QuantilesItem, R: RandomSource>(
    target: &mut LevelStore<T>,
    source: &LevelStore<T>,
    compactor: &mut Compactor<'_, R>,
) {
    assert_eq!(target.k(), source.k(), "stores must share the same k");
    for &item in source.base_buffer() {
        target.insert(item, compactor);
    }
    for (level, items) in source.levels() {
        target.propagate_carry(level, items, compactor);
    }
}

/// Rebuilds `source` as a store with the smaller `target_k`.
///
/// Level `L` of the source is decimated by `source.k() / target_k` and lands
/// on level `L + log2(source.k() / target_k)` of the result, so every
/// retained item keeps representing the same share of the stream.
///
/// # Panics
///
/// Panics if `target_k` does not evenly divide the source k.
pub(super) fn degrade<T: QuantilesItem, R: RandomSource>(
    source: &LevelStore<T>,
    target_k: usize,
    compactor: &mut Compactor<'_, R>,
) -> LevelStore<T> {
    let source_k = source.k();
    assert!(
        target_k <= source_k && source_k % target_k == 0,
        "cannot degrade k={source_k} to k={target_k}"
    );
    let stride = source_k / target_k;
    let lg_stride = stride.trailing_zeros() as usize;

    let mut target = LevelStore::new(target_k);
    for &item in source.base_buffer() {
        target.insert(item, compactor);
    }
    let mut decimated = vec![T::default(); target_k];
    for (level, items) in source.levels() {
        compactor.decimate(items, &mut decimated, stride);
        target.propagate_carry(level + lg_stride, &decimated, compactor);
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::XorShift64;
    use crate::quantiles::RankAccuracy;

    fn filled_store(k: usize, n: u64, rng: &mut XorShift64) -> LevelStore<i64> {
        let mut store = LevelStore::new(k);
        let mut compactor = Compactor::new(RankAccuracy::LowRanks, rng);
        for i in 0..n {
            store.insert(i as i64, &mut compactor);
        }
        store
    }

    fn total_weight(store: &LevelStore<i64>) -> u64 {
        let levels: u64 = store.levels().map(|(level, _)| (2u64 << level) * store.k() as u64).sum();
        store.base_buffer_count() as u64 + levels
    }

    #[test]
    fn test_merge_same_k_adds_counts() {
        let mut rng = XorShift64::seeded(1);
        let mut left = filled_store(8, 100, &mut rng);
        let right = filled_store(8, 57, &mut rng);
        let mut compactor = Compactor::new(RankAccuracy::LowRanks, &mut rng);
        merge_same_k(&mut left, &right, &mut compactor);
        assert_eq!(left.bit_pattern().bits(), 157 / 16);
        assert_eq!(left.base_buffer_count(), 157 % 16);
        assert_eq!(total_weight(&left), 157);
    }

    #[test]
    fn test_merge_empty_source_is_noop() {
        let mut rng = XorShift64::seeded(2);
        let mut left = filled_store(4, 50, &mut rng);
        let before = left.combined_buffer().to_vec();
        let right = LevelStore::<i64>::new(4);
        let mut compactor = Compactor::new(RankAccuracy::LowRanks, &mut rng);
        merge_same_k(&mut left, &right, &mut compactor);
        assert_eq!(left.combined_buffer(), before.as_slice());
        assert_eq!(total_weight(&left), 50);
    }

    #[test]
    fn test_degrade_preserves_weight() {
        let mut rng = XorShift64::seeded(3);
        let source = filled_store(32, 5000, &mut rng);
        let mut compactor = Compactor::new(RankAccuracy::LowRanks, &mut rng);
        let degraded = degrade(&source, 4, &mut compactor);
        assert_eq!(degraded.k(), 4);
        assert_eq!(degraded.bit_pattern().bits(), 5000 / 8);
        assert_eq!(degraded.base_buffer_count(), 5000 % 8);
        assert_eq!(total_weight(&degraded), 5000);
        for (_, items) in degraded.levels() {
            assert!(items.is_sorted());
        }
    }

    #[test]
    fn test_degrade_to_same_k_copies() {
        let mut rng = XorShift64::seeded(4);
        let source = filled_store(8, 300, &mut rng);
        let mut compactor = Compactor::new(RankAccuracy::LowRanks, &mut rng);
        let copy = degrade(&source, 8, &mut compactor);
        assert_eq!(copy.bit_pattern(), source.bit_pattern());
        assert_eq!(copy.levels().collect::<Vec<_>>(), source.levels().collect::<Vec<_>>());
    }
}
