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

//! Frequent longs sketch.

use super::estimator::FrequencyEstimator;
use super::reverse_purge_long_hash_map::ReversePurgeLongHashMap;
use crate::error::Error;

const LG_MIN_MAP_SIZE: u8 = 3;
const SAMPLE_SIZE: usize = 1024;
const EPSILON_FACTOR: f64 = 3.5;
const LOAD_FACTOR_NUMERATOR: usize = 3;
const LOAD_FACTOR_DENOMINATOR: usize = 4;

/// Error guarantees for frequent item queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    /// Include items if upper bound exceeds threshold (no false negatives).
    NoFalseNegatives,
    /// Include items if lower bound exceeds threshold (no false positives).
    NoFalsePositives,
}

/// Result row for frequent item queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    key: i64,
    estimate: i64,
    upper_bound: i64,
    lower_bound: i64,
}

impl Row {
    /// Returns the key.
    pub fn key(&self) -> i64 {
        self.key
    }

    /// Returns the estimated frequency.
    pub fn estimate(&self) -> i64 {
        self.estimate
    }

    /// Returns the upper bound for the frequency.
    pub fn upper_bound(&self) -> i64 {
        self.upper_bound
    }

    /// Returns the lower bound for the frequency.
    pub fn lower_bound(&self) -> i64 {
        self.lower_bound
    }
}

/// Misra-Gries style heavy hitter sketch over `i64` keys.
///
/// Counts live in a hash map that doubles until it reaches the configured
/// maximum size. Once full, the median count of a sample is subtracted from
/// every key and non-positive keys are evicted; the accumulated subtractions
/// form the `offset` that bounds the error of every estimate.
#[derive(Debug, Clone)]
pub struct FrequentLongsSketch {
    lg_max_map_size: u8,
    cur_map_cap: usize,
    offset: i64,
    stream_weight: i64,
    sample_size: usize,
    hash_map: ReversePurgeLongHashMap,
}

impl FrequentLongsSketch {
    /// Creates a new sketch with the given maximum map size.
    ///
    /// Returns an error if `max_map_size` is not a power of two. Sizes below
    /// 8 are raised to 8.
    ///
    /// # Examples
    ///
    /// ```
    /// # use datasketches_quantiles::frequencies::FrequencyEstimator;
    /// # use datasketches_quantiles::frequencies::FrequentLongsSketch;
    /// let mut sketch = FrequentLongsSketch::new(64).unwrap();
    /// sketch.update(7);
    /// sketch.update_with_count(7, 2).unwrap();
    /// assert_eq!(sketch.estimate(7), 3);
    /// ```
    pub fn new(max_map_size: usize) -> Result<Self, Error> {
        if !max_map_size.is_power_of_two() {
            return Err(Error::invalid_argument(format!(
                "max_map_size must be a power of 2, got {max_map_size}"
            )));
        }
        let lg_max_map_size = max_map_size.trailing_zeros() as u8;
        Ok(Self::with_lg_map_sizes(lg_max_map_size, LG_MIN_MAP_SIZE))
    }

    /// Returns the number of keys currently tracked.
    pub fn num_active_items(&self) -> usize {
        self.hash_map.num_active()
    }

    /// Returns epsilon for this sketch.
    pub fn epsilon(&self) -> f64 {
        Self::epsilon_for_lg(self.lg_max_map_size)
    }

    /// Returns epsilon for a sketch configured with `lg_max_map_size`.
    pub fn epsilon_for_lg(lg_max_map_size: u8) -> f64 {
        EPSILON_FACTOR / (1u64 << lg_max_map_size) as f64
    }

    /// Returns the a priori error estimate for a stream of the given weight.
    pub fn apriori_error(lg_max_map_size: u8, estimated_total_weight: i64) -> f64 {
        Self::epsilon_for_lg(lg_max_map_size) * estimated_total_weight as f64
    }

    /// Returns the configured maximum map size in log2.
    pub fn lg_max_map_size(&self) -> u8 {
        self.lg_max_map_size
    }

    /// Returns the current map size in log2.
    pub fn lg_cur_map_size(&self) -> u8 {
        self.hash_map.lg_length()
    }

    /// Returns frequent items using the sketch maximum error as threshold.
    pub fn frequent_items(&self, error_type: ErrorType) -> Vec<Row> {
        self.frequent_items_with_threshold(error_type, self.offset)
    }

    /// Returns frequent items using a custom threshold, sorted by decreasing
    /// estimate. Thresholds below the maximum error are raised to it.
    pub fn frequent_items_with_threshold(&self, error_type: ErrorType, threshold: i64) -> Vec<Row> {
        let threshold = threshold.max(self.offset);
        let mut rows: Vec<Row> = self
            .hash_map
            .iter()
            .filter_map(|(key, count)| {
                let lower = count;
                let upper = count + self.offset;
                let include = match error_type {
                    ErrorType::NoFalseNegatives => upper > threshold,
                    ErrorType::NoFalsePositives => lower > threshold,
                };
                include.then_some(Row {
                    key,
                    estimate: upper,
                    upper_bound: upper,
                    lower_bound: lower,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.estimate.cmp(&a.estimate));
        rows
    }

    fn maximum_map_capacity(&self) -> usize {
        (1usize << self.lg_max_map_size) * LOAD_FACTOR_NUMERATOR / LOAD_FACTOR_DENOMINATOR
    }

    fn insert_count(&mut self, key: i64, count: i64) {
        self.stream_weight += count;
        self.hash_map.adjust_or_insert(key, count);
        self.maybe_resize_or_purge();
    }

    fn maybe_resize_or_purge(&mut self) {
        if self.hash_map.num_active() <= self.cur_map_cap {
            return;
        }
        if self.hash_map.lg_length() < self.lg_max_map_size {
            self.hash_map.resize(self.hash_map.length() * 2);
            self.cur_map_cap = self.hash_map.capacity();
        } else {
            self.offset += self.hash_map.purge(self.sample_size);
            assert!(
                self.hash_map.num_active() <= self.maximum_map_capacity(),
                "purge did not reduce the number of active items"
            );
        }
    }

    fn with_lg_map_sizes(lg_max_map_size: u8, lg_cur_map_size: u8) -> Self {
        let lg_max = lg_max_map_size.max(LG_MIN_MAP_SIZE);
        let lg_cur = lg_cur_map_size.max(LG_MIN_MAP_SIZE).min(lg_max);
        let hash_map = ReversePurgeLongHashMap::new(1usize << lg_cur);
        let max_map_cap = (1usize << lg_max) * LOAD_FACTOR_NUMERATOR / LOAD_FACTOR_DENOMINATOR;
        Self {
            lg_max_map_size: lg_max,
            cur_map_cap: hash_map.capacity(),
            offset: 0,
            stream_weight: 0,
            sample_size: SAMPLE_SIZE.min(max_map_cap),
            hash_map,
        }
    }
}

impl FrequencyEstimator for FrequentLongsSketch {
    fn update(&mut self, key: i64) {
        self.insert_count(key, 1);
    }

    fn update_with_count(&mut self, key: i64, count: i64) -> Result<(), Error> {
        if count < 0 {
            return Err(Error::invalid_argument(format!(
                "count may not be negative, got {count}"
            )));
        }
        if count > 0 {
            self.insert_count(key, count);
        }
        Ok(())
    }

    fn estimate(&self, key: i64) -> i64 {
        let count = self.hash_map.get(key);
        if count > 0 { count + self.offset } else { 0 }
    }

    fn lower_bound(&self, key: i64) -> i64 {
        self.hash_map.get(key)
    }

    fn upper_bound(&self, key: i64) -> i64 {
        self.hash_map.get(key) + self.offset
    }

    fn maximum_error(&self) -> i64 {
        self.offset
    }

    fn frequent_keys(&self, threshold: i64) -> Vec<i64> {
        self.hash_map
            .iter()
            .filter(|&(_, count)| count + self.offset >= threshold)
            .map(|(key, _)| key)
            .collect()
    }

    fn merge(&mut self, other: &Self) -> &mut Self {
        if other.is_empty() {
            return self;
        }
        let merged_weight = self.stream_weight + other.stream_weight;
        for (key, count) in other.hash_map.iter() {
            self.insert_count(key, count);
        }
        self.offset += other.offset;
        self.stream_weight = merged_weight;
        self
    }

    fn k(&self) -> usize {
        self.cur_map_cap
    }

    fn max_k(&self) -> usize {
        self.maximum_map_capacity()
    }

    fn is_empty(&self) -> bool {
        self.hash_map.num_active() == 0
    }

    fn stream_length(&self) -> i64 {
        self.stream_weight
    }

    fn reset(&mut self) {
        *self = Self::with_lg_map_sizes(self.lg_max_map_size, LG_MIN_MAP_SIZE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_stream_is_exact() {
        let mut sketch = FrequentLongsSketch::new(16).unwrap();
        sketch.update(1);
        sketch.update(1);
        sketch.update_with_count(2, 5).unwrap();
        assert_eq!(sketch.estimate(1), 2);
        assert_eq!(sketch.estimate(2), 5);
        assert_eq!(sketch.estimate(3), 0);
        assert_eq!(sketch.maximum_error(), 0);
        assert_eq!(sketch.stream_length(), 7);
    }

    #[test]
    fn test_map_grows_before_purging() {
        let mut sketch = FrequentLongsSketch::new(64).unwrap();
        assert_eq!(sketch.lg_cur_map_size(), 3);
        for key in 0..20 {
            sketch.update(key);
        }
        assert_eq!(sketch.lg_cur_map_size(), 5);
        assert_eq!(sketch.maximum_error(), 0);
        assert_eq!(sketch.num_active_items(), 20);
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(FrequentLongsSketch::new(100).is_err());
    }
}
