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

//! Open-addressing hash map from `i64` keys to counts with median purging.

use crate::hash::DEFAULT_SEED;
use crate::hash::hash_i64;

const LOAD_FACTOR: f64 = 0.75;
const DRIFT_LIMIT: usize = 1024;
const MAX_SAMPLE_SIZE: usize = 1024;
// fractional part of the golden ratio, used to scatter iteration order
const GOLDEN_RATIO_FRACTION: f64 = 0.618_033_988_749_895;

/// Linear-probing map whose `states` entry records the probe distance of
/// each occupied slot (0 means empty).
#[derive(Debug, Clone)]
pub(super) struct ReversePurgeLongHashMap {
    lg_length: u8,
    load_threshold: usize,
    keys: Vec<i64>,
    values: Vec<i64>,
    states: Vec<u16>,
    num_active: usize,
}

impl ReversePurgeLongHashMap {
    pub fn new(map_size: usize) -> Self {
        assert!(map_size.is_power_of_two(), "map_size must be power of 2");
        Self {
            lg_length: map_size.trailing_zeros() as u8,
            load_threshold: (map_size as f64 * LOAD_FACTOR) as usize,
            keys: vec![0; map_size],
            values: vec![0; map_size],
            states: vec![0; map_size],
            num_active: 0,
        }
    }

    /// Returns the count of `key`, or 0 if it is not tracked.
    pub fn get(&self, key: i64) -> i64 {
        let probe = self.find(key);
        if self.is_active(probe) {
            self.values[probe]
        } else {
            0
        }
    }

    /// Adds `amount` to the count of `key`, inserting it if absent.
    pub fn adjust_or_insert(&mut self, key: i64, amount: i64) {
        let mask = self.mask();
        let mut probe = self.home_slot(key);
        let mut drift = 1usize;
        while self.is_active(probe) && self.keys[probe] != key {
            probe = (probe + 1) & mask;
            drift += 1;
            debug_assert!(drift < DRIFT_LIMIT, "drift limit exceeded");
        }
        if self.is_active(probe) {
            self.values[probe] += amount;
        } else {
            self.keys[probe] = key;
            self.values[probe] = amount;
            self.states[probe] = drift as u16;
            self.num_active += 1;
        }
    }

    /// Subtracts the median of a sample of counts from every count and drops
    /// the keys left without a positive count. Returns the subtracted median.
    pub fn purge(&mut self, sample_size: usize) -> i64 {
        let limit = sample_size.min(self.num_active).min(MAX_SAMPLE_SIZE);
        let mut samples: Vec<i64> = (0..self.keys.len())
            .filter(|&slot| self.is_active(slot))
            .map(|slot| self.values[slot])
            .take(limit)
            .collect();
        let mid = samples.len() / 2;
        let (_, &mut median, _) = samples.select_nth_unstable(mid);

        for value in &mut self.values {
            *value -= median;
        }
        self.retain_positive();
        median
    }

    /// Rehashes every key into a table of `new_size` slots.
    pub fn resize(&mut self, new_size: usize) {
        let old = std::mem::replace(self, Self::new(new_size));
        for slot in 0..old.keys.len() {
            if old.is_active(slot) {
                self.adjust_or_insert(old.keys[slot], old.values[slot]);
            }
        }
    }

    pub fn length(&self) -> usize {
        self.keys.len()
    }

    pub fn lg_length(&self) -> u8 {
        self.lg_length
    }

    /// Number of keys the map holds before it must grow or purge.
    pub fn capacity(&self) -> usize {
        self.load_threshold
    }

    pub fn num_active(&self) -> usize {
        self.num_active
    }

    pub fn iter(&self) -> ReversePurgeLongIter<'_> {
        ReversePurgeLongIter::new(self)
    }

    fn retain_positive(&mut self) {
        // Deleting shifts later entries of a cluster backwards, so walk in
        // reverse starting just below an empty slot.
        let len = self.keys.len();
        let mut first_probe = len - 1;
        while self.is_active(first_probe) {
            first_probe -= 1;
        }
        for probe in (0..first_probe).rev().chain((first_probe..len).rev()) {
            if self.is_active(probe) && self.values[probe] <= 0 {
                self.delete(probe);
                self.num_active -= 1;
            }
        }
    }

    fn is_active(&self, slot: usize) -> bool {
        self.states[slot] > 0
    }

    fn mask(&self) -> usize {
        self.keys.len() - 1
    }

    fn home_slot(&self, key: i64) -> usize {
        (hash_i64(key, DEFAULT_SEED) as usize) & self.mask()
    }

    fn find(&self, key: i64) -> usize {
        let mask = self.mask();
        let mut probe = self.home_slot(key);
        while self.is_active(probe) && self.keys[probe] != key {
            probe = (probe + 1) & mask;
        }
        probe
    }

    fn delete(&mut self, mut delete_probe: usize) {
        self.states[delete_probe] = 0;
        let mask = self.mask();
        let mut drift = 1usize;
        let mut probe = (delete_probe + drift) & mask;
        while self.is_active(probe) {
            if self.states[probe] as usize > drift {
                self.keys[delete_probe] = self.keys[probe];
                self.values[delete_probe] = self.values[probe];
                self.states[delete_probe] = self.states[probe] - drift as u16;
                self.states[probe] = 0;
                drift = 0;
                delete_probe = probe;
            }
            probe = (probe + 1) & mask;
            drift += 1;
            debug_assert!(drift < DRIFT_LIMIT, "drift limit exceeded");
        }
    }
}

/// Visits every active entry once, in a scattered order.
pub(super) struct ReversePurgeLongIter<'a> {
    map: &'a ReversePurgeLongHashMap,
    index: usize,
    visited: usize,
    stride: usize,
}

impl<'a> ReversePurgeLongIter<'a> {
    fn new(map: &'a ReversePurgeLongHashMap) -> Self {
        let stride = ((map.length() as f64 * GOLDEN_RATIO_FRACTION) as usize) | 1;
        Self {
            map,
            index: 0usize.wrapping_sub(stride),
            visited: 0,
            stride,
        }
    }
}

impl Iterator for ReversePurgeLongIter<'_> {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.visited >= self.map.num_active {
            return None;
        }
        loop {
            self.index = self.index.wrapping_add(self.stride) & self.map.mask();
            if self.map.is_active(self.index) {
                self.visited += 1;
                return Some((self.map.keys[self.index], self.map.values[self.index]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjust_and_get() {
        let mut map = ReversePurgeLongHashMap::new(8);
        map.adjust_or_insert(3, 2);
        map.adjust_or_insert(3, 5);
        map.adjust_or_insert(-9, 1);
        assert_eq!(map.get(3), 7);
        assert_eq!(map.get(-9), 1);
        assert_eq!(map.get(100), 0);
        assert_eq!(map.num_active(), 2);
        assert_eq!(map.capacity(), 6);
    }

    #[test]
    fn test_resize_keeps_entries() {
        let mut map = ReversePurgeLongHashMap::new(8);
        for key in 0..6 {
            map.adjust_or_insert(key, key + 1);
        }
        map.resize(32);
        assert_eq!(map.lg_length(), 5);
        assert_eq!(map.num_active(), 6);
        for key in 0..6 {
            assert_eq!(map.get(key), key + 1);
        }
    }

    #[test]
    fn test_purge_subtracts_median() {
        let mut map = ReversePurgeLongHashMap::new(16);
        for key in 1..=5 {
            map.adjust_or_insert(key, key * 10);
        }
        let median = map.purge(16);
        assert_eq!(median, 30);
        assert_eq!(map.num_active(), 2);
        assert_eq!(map.get(4), 10);
        assert_eq!(map.get(5), 20);
        assert_eq!(map.get(1), 0);
    }

    #[test]
    fn test_iter_visits_each_entry_once() {
        let mut map = ReversePurgeLongHashMap::new(16);
        for key in 0..10 {
            map.adjust_or_insert(key * 7, 1);
        }
        let mut keys: Vec<i64> = map.iter().map(|(key, _)| key).collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..10).map(|key| key * 7).collect::<Vec<_>>());
    }
}
