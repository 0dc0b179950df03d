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

use super::MIN_K;
use super::compactor::Compactor;
use super::compactor::merge_sorted_into;
use super::helper::level_capacity;
use super::item::QuantilesItem;
use crate::common::RandomSource;
use crate::error::Error;

/// Occupancy map of the sorted levels: bit `L` is set when level `L` holds
/// valid data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) struct BitPattern(u64);

impl BitPattern {
    pub fn new(bits: u64) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn is_level_valid(self, level: usize) -> bool {
        level < 64 && (self.0 >> level) & 1 == 1
    }

    pub fn set_level_valid(&mut self, level: usize, valid: bool) {
        assert!(level < 64, "level {level} exceeds the bit pattern width");
        if valid {
            self.0 |= 1 << level;
        } else {
            self.0 &= !(1 << level);
        }
    }

    /// Index of the first empty level at or above `level`.
    pub fn lowest_zero_bit_starting_at(self, level: usize) -> usize {
        level + (self.0 >> level).trailing_ones() as usize
    }

    /// Number of populated levels.
    pub fn num_valid_levels(self) -> usize {
        self.0.count_ones() as usize
    }

    /// One past the highest populated level.
    pub fn total_levels(self) -> usize {
        (u64::BITS - self.0.leading_zeros()) as usize
    }

    /// Indices of the populated levels, ascending.
    pub fn valid_levels(self) -> impl Iterator<Item = usize> {
        (0..self.total_levels()).filter(move |&level| self.is_level_valid(level))
    }
}

/// Backing storage of a quantiles sketch.
///
/// A single combined buffer holds the base buffer in `[0, 2k)` followed by
/// one `k`-sized region per level, level `L` at `[(2 + L) * k, (3 + L) * k)`.
/// Regions whose bit is clear hold stale data and are never read.
#[derive(Debug, Clone)]
pub(super) struct LevelStore<T> {
    k: usize,
    base_buffer_count: usize,
    bit_pattern: BitPattern,
    combined: Vec<T>,
}

impl<T: QuantilesItem> LevelStore<T> {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            base_buffer_count: 0,
            bit_pattern: BitPattern::default(),
            combined: vec![T::default(); (2 * MIN_K as usize).min(2 * k)],
        }
    }

    /// Rebuilds a store from decoded parts, allocating `capacity` slots.
    pub fn from_parts(
        k: usize,
        capacity: usize,
        base_buffer: &[T],
        levels: Vec<(usize, Vec<T>)>,
    ) -> Result<Self, Error> {
        if base_buffer.len() >= 2 * k {
            return Err(Error::deserial(format!(
                "base buffer holds {} items, must be below {}",
                base_buffer.len(),
                2 * k
            )));
        }
        let mut store = Self {
            k,
            base_buffer_count: base_buffer.len(),
            bit_pattern: BitPattern::default(),
            combined: vec![T::default(); capacity.max(base_buffer.len())],
        };
        store.combined[..base_buffer.len()].copy_from_slice(base_buffer);
        for (level, items) in levels {
            store.ensure_levels(level + 1);
            store.bit_pattern.set_level_valid(level, true);
            store.set_level(level, &items)?;
        }
        Ok(store)
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn base_buffer_count(&self) -> usize {
        self.base_buffer_count
    }

    pub fn bit_pattern(&self) -> BitPattern {
        self.bit_pattern
    }

    pub fn capacity(&self) -> usize {
        self.combined.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base_buffer_count == 0 && self.bit_pattern.bits() == 0
    }

    pub fn num_retained(&self) -> usize {
        self.base_buffer_count + self.k * self.bit_pattern.num_valid_levels()
    }

    /// The base buffer items in storage order (unsorted).
    pub fn base_buffer(&self) -> &[T] {
        &self.combined[..self.base_buffer_count]
    }

    /// The combined buffer including unused and stale slots.
    pub fn combined_buffer(&self) -> &[T] {
        &self.combined
    }

    /// The `k` sorted items of a populated level.
    pub fn level_items(&self, level: usize) -> Result<&[T], Error> {
        if !self.bit_pattern.is_level_valid(level) {
            return Err(Error::invalid_argument(format!(
                "level {level} is not populated"
            )));
        }
        Ok(self.level_slot(level))
    }

    /// Replaces the items of a populated level.
    pub fn set_level(&mut self, level: usize, items: &[T]) -> Result<(), Error> {
        if !self.bit_pattern.is_level_valid(level) {
            return Err(Error::invalid_argument(format!(
                "level {level} is not populated"
            )));
        }
        if items.len() != self.k {
            return Err(Error::invalid_argument(format!(
                "level must hold exactly {} items, got {}",
                self.k,
                items.len()
            )));
        }
        self.level_slot_mut(level).copy_from_slice(items);
        Ok(())
    }

    /// Populated levels paired with their level index, ascending.
    pub fn levels(&self) -> impl Iterator<Item = (usize, &[T])> + '_ {
        self.bit_pattern
            .valid_levels()
            .map(move |level| (level, self.level_slot(level)))
    }

    /// Appends an item to the base buffer and compacts it once it is full.
    pub fn insert<R: RandomSource>(&mut self, item: T, compactor: &mut Compactor<'_, R>) {
        if self.append_to_base_buffer(item) {
            self.compact_base_buffer(compactor);
        }
    }

    /// Appends an item, returning true when the base buffer reached `2k`.
    fn append_to_base_buffer(&mut self, item: T) -> bool {
        debug_assert!(self.base_buffer_count < 2 * self.k);
        if self.base_buffer_count == self.combined.len() {
            let new_len = (2 * self.combined.len()).clamp(1, 2 * self.k);
            self.combined.resize(new_len, T::default());
        }
        self.combined[self.base_buffer_count] = item;
        self.base_buffer_count += 1;
        self.base_buffer_count == 2 * self.k
    }

    /// Sorts the full base buffer, halves it and carries the result into level 0.
    ///
    /// # Panics
    ///
    /// Panics if the base buffer is not full.
    fn compact_base_buffer<R: RandomSource>(&mut self, compactor: &mut Compactor<'_, R>) {
        let two_k = 2 * self.k;
        assert_eq!(
            self.base_buffer_count, two_k,
            "base buffer must be full to compact"
        );
        let base = &mut self.combined[..two_k];
        base.sort_by(T::cmp);
        let mut carry = vec![T::default(); self.k];
        compactor.halve(base, &mut carry);
        self.base_buffer_count = 0;
        self.propagate_carry(0, &carry, compactor);
    }

    /// Adds `k` sorted items at `starting_level`, merging and halving through
    /// every populated level above it until an empty level absorbs the carry.
    ///
    /// The bit pattern afterwards equals the old pattern plus `1 << starting_level`.
    pub fn propagate_carry<R: RandomSource>(
        &mut self,
        starting_level: usize,
        items: &[T],
        compactor: &mut Compactor<'_, R>,
    ) {
        assert_eq!(items.len(), self.k, "carry must hold exactly k items");
        let ending_level = self.bit_pattern.lowest_zero_bit_starting_at(starting_level);
        self.ensure_levels(ending_level + 1);
        let expected = self.bit_pattern.bits() + (1u64 << starting_level);

        let mut carry = items.to_vec();
        let mut scratch = vec![T::default(); 2 * self.k];
        for level in starting_level..ending_level {
            merge_sorted_into(self.level_slot(level), &carry, &mut scratch);
            compactor.halve(&scratch, &mut carry);
            self.bit_pattern.set_level_valid(level, false);
        }
        self.level_slot_mut(ending_level).copy_from_slice(&carry);
        self.bit_pattern.set_level_valid(ending_level, true);
        debug_assert_eq!(self.bit_pattern.bits(), expected);
    }

    /// Grows the combined buffer so that `num_levels` levels fit.
    fn ensure_levels(&mut self, num_levels: usize) {
        let needed = level_capacity(self.k, num_levels);
        if self.combined.len() < needed {
            self.combined.resize(needed, T::default());
        }
    }

    fn level_slot(&self, level: usize) -> &[T] {
        let start = (2 + level) * self.k;
        &self.combined[start..start + self.k]
    }

    fn level_slot_mut(&mut self, level: usize) -> &mut [T] {
        let start = (2 + level) * self.k;
        &mut self.combined[start..start + self.k]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::XorShift64;
    use crate::quantiles::RankAccuracy;

    #[test]
    fn test_bit_pattern_accessors() {
        let mut bits = BitPattern::new(0b1011);
        assert!(bits.is_level_valid(0));
        assert!(bits.is_level_valid(1));
        assert!(!bits.is_level_valid(2));
        assert!(bits.is_level_valid(3));
        assert!(!bits.is_level_valid(64));
        assert_eq!(bits.num_valid_levels(), 3);
        assert_eq!(bits.total_levels(), 4);
        assert_eq!(bits.lowest_zero_bit_starting_at(0), 2);
        assert_eq!(bits.lowest_zero_bit_starting_at(3), 4);
        assert_eq!(bits.valid_levels().collect::<Vec<_>>(), vec![0, 1, 3]);

        bits.set_level_valid(2, true);
        bits.set_level_valid(0, false);
        assert_eq!(bits.bits(), 0b1110);
        assert_eq!(BitPattern::default().total_levels(), 0);
    }

    #[test]
    fn test_base_buffer_grows_then_compacts() {
        let mut rng = XorShift64::seeded(3);
        let mut compactor = Compactor::new(RankAccuracy::LowRanks, &mut rng);
        let mut store = LevelStore::<f64>::new(4);
        assert_eq!(store.capacity(), 4);

        for i in 0..7 {
            store.insert(i as f64, &mut compactor);
        }
        assert_eq!(store.base_buffer_count(), 7);
        assert_eq!(store.capacity(), 8);
        assert!(store.level_items(0).is_err());

        store.insert(7.0, &mut compactor);
        assert_eq!(store.base_buffer_count(), 0);
        assert_eq!(store.bit_pattern().bits(), 1);
        assert_eq!(store.capacity(), 12);
        assert_eq!(store.num_retained(), 4);

        let level = store.level_items(0).unwrap();
        assert!(level == [0.0, 2.0, 4.0, 6.0] || level == [1.0, 3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_carry_ripples_like_binary_addition() {
        let mut rng = XorShift64::seeded(11);
        let mut compactor = Compactor::new(RankAccuracy::HighRanks, &mut rng);
        let mut store = LevelStore::<i64>::new(2);
        for i in 0..28 {
            store.insert(i, &mut compactor);
        }
        // 28 items = 7 full base buffers of 4
        assert_eq!(store.bit_pattern().bits(), 7);
        assert_eq!(store.base_buffer_count(), 0);

        store.propagate_carry(0, &[100, 101], &mut compactor);
        assert_eq!(store.bit_pattern().bits(), 8);
        assert_eq!(store.num_retained(), 2);
        let top = store.level_items(3).unwrap();
        assert!(top.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_set_level_requires_populated_level() {
        let mut store = LevelStore::<i64>::new(2);
        let err = store.set_level(0, &[1, 2]).unwrap_err();
        assert!(err.message().contains("level 0 is not populated"));

        let mut store =
            LevelStore::<i64>::from_parts(2, 8, &[5], vec![(1, vec![1, 2])]).unwrap();
        assert!(store.set_level(1, &[3]).is_err());
        store.set_level(1, &[3, 4]).unwrap();
        assert_eq!(store.level_items(1).unwrap(), [3, 4]);
        assert_eq!(store.base_buffer(), [5]);
        assert_eq!(store.bit_pattern().bits(), 0b10);
    }
}
