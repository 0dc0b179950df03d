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

use std::cmp::Ordering;

use super::DEFAULT_K;
use super::compactor::Compactor;
use super::compactor::RankAccuracy;
use super::helper::base_buffer_items;
use super::helper::bit_pattern_for;
use super::helper::check_k;
use super::helper::combined_buffer_capacity;
use super::helper::normalized_rank_error;
use super::helper::num_levels_needed;
use super::item::QuantilesItem;
use super::iter::QuantilesSketchIter;
use super::level_store::BitPattern;
use super::level_store::LevelStore;
use super::merge::degrade;
use super::merge::merge_same_k;
use super::serialization::DATA_START;
use super::serialization::EMPTY_SIZE_BYTES;
use super::serialization::FLAG_COMPACT;
use super::serialization::FLAG_EMPTY;
use super::serialization::FLAG_HIGH_RANK_ACCURACY;
use super::serialization::FLAG_ORDERED;
use super::serialization::MIN_SERIAL_VERSION;
use super::serialization::PREAMBLE_LONGS_EMPTY;
use super::serialization::PREAMBLE_LONGS_FULL;
use super::serialization::SERIAL_VERSION;
use super::sorted_view::SortedView;
use crate::codec::Family;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::codec::ensure_preamble_longs_in;
use crate::codec::ensure_serial_version_in;
use crate::common::QuantileSearchCriteria;
use crate::common::RandomSource;
use crate::common::XorShift64;
use crate::error::Error;

/// Classic quantiles sketch for estimating ranks and quantiles.
///
/// See the [quantiles module level documentation](crate::quantiles) for more.
#[allow(private_bounds)]
#[derive(Debug, Clone)]
pub struct QuantilesSketch<T: QuantilesItem, R: RandomSource = XorShift64> {
    k: u16,
    n: u64,
    accuracy: RankAccuracy,
    min_item: Option<T>,
    max_item: Option<T>,
    store: LevelStore<T>,
    rng: R,
}

#[allow(private_bounds)]
impl<T: QuantilesItem> Default for QuantilesSketch<T, XorShift64> {
    fn default() -> Self {
        Self::make(DEFAULT_K, RankAccuracy::default(), XorShift64::default())
    }
}

#[allow(private_bounds)]
impl<T: QuantilesItem> QuantilesSketch<T, XorShift64> {
    /// Creates a new sketch with the given value of k.
    ///
    /// Returns an error if k is not a power of two in [MIN_K, MAX_K].
    ///
    /// [MIN_K]: super::MIN_K
    /// [MAX_K]: super::MAX_K
    ///
    /// # Examples
    ///
    /// ```
    /// # use datasketches_quantiles::quantiles::QuantilesSketch;
    /// let sketch = QuantilesSketch::<f64>::new(256).unwrap();
    /// assert_eq!(sketch.k(), 256);
    /// assert!(QuantilesSketch::<f64>::new(100).is_err());
    /// ```
    pub fn new(k: u16) -> Result<Self, Error> {
        Self::with_accuracy(k, RankAccuracy::default())
    }

    /// Creates a new sketch with the given k and rank accuracy orientation.
    pub fn with_accuracy(k: u16, accuracy: RankAccuracy) -> Result<Self, Error> {
        Self::with_rng(k, accuracy, XorShift64::default())
    }

    /// Deserializes a sketch from bytes produced by [`serialize`] or
    /// [`serialize_updatable`].
    ///
    /// [`serialize`]: QuantilesSketch::serialize
    /// [`serialize_updatable`]: QuantilesSketch::serialize_updatable
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        Self::deserialize_with_rng(bytes, XorShift64::default())
    }
}

#[allow(private_bounds)]
impl<T: QuantilesItem, R: RandomSource> QuantilesSketch<T, R> {
    /// Creates a new sketch with a custom random source.
    ///
    /// # Examples
    ///
    /// ```
    /// # use datasketches_quantiles::common::XorShift64;
    /// # use datasketches_quantiles::quantiles::QuantilesSketch;
    /// # use datasketches_quantiles::quantiles::RankAccuracy;
    /// let rng = XorShift64::seeded(42);
    /// let sketch = QuantilesSketch::<f64, _>::with_rng(64, RankAccuracy::HighRanks, rng).unwrap();
    /// assert_eq!(sketch.rank_accuracy(), RankAccuracy::HighRanks);
    /// ```
    pub fn with_rng(k: u16, accuracy: RankAccuracy, rng: R) -> Result<Self, Error> {
        check_k(k)?;
        Ok(Self::make(k, accuracy, rng))
    }

    fn make(k: u16, accuracy: RankAccuracy, rng: R) -> Self {
        Self {
            k,
            n: 0,
            accuracy,
            min_item: None,
            max_item: None,
            store: LevelStore::new(k as usize),
            rng,
        }
    }

    /// Returns parameter k used to configure this sketch.
    pub fn k(&self) -> u16 {
        self.k
    }

    /// Returns the number of items presented to the sketch.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Returns true if the sketch has not seen any data.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns true if at least one compaction has happened, meaning queries
    /// return estimates rather than exact answers.
    pub fn is_estimation_mode(&self) -> bool {
        self.n >= 2 * self.k as u64
    }

    /// Returns the number of retained items.
    pub fn num_retained(&self) -> usize {
        self.store.num_retained()
    }

    /// Returns the minimum item seen by the sketch.
    pub fn min_item(&self) -> Option<T> {
        self.min_item
    }

    /// Returns the maximum item seen by the sketch.
    pub fn max_item(&self) -> Option<T> {
        self.max_item
    }

    /// Returns the rank accuracy orientation.
    pub fn rank_accuracy(&self) -> RankAccuracy {
        self.accuracy
    }

    /// Returns the number of items in the base buffer.
    pub fn base_buffer_count(&self) -> usize {
        self.store.base_buffer_count()
    }

    /// Returns the level occupancy bit pattern; bit `L` is set when level `L`
    /// holds data. Always equals `n / 2k`.
    pub fn bit_pattern(&self) -> u64 {
        self.store.bit_pattern().bits()
    }

    /// Returns the number of levels needed for the current `n`.
    pub fn num_levels_needed(&self) -> usize {
        num_levels_needed(self.k as usize, self.n)
    }

    /// Returns one past the highest populated level.
    pub fn total_levels(&self) -> usize {
        self.store.bit_pattern().total_levels()
    }

    /// Returns the number of populated levels.
    pub fn valid_levels(&self) -> usize {
        self.store.bit_pattern().num_valid_levels()
    }

    /// Returns the number of item slots currently allocated.
    pub fn combined_buffer_capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Returns the `k` sorted items of a populated level.
    pub fn level_items(&self, level: usize) -> Result<&[T], Error> {
        self.store.level_items(level)
    }

    /// Updates the sketch with a new item.
    ///
    /// NaN values are ignored for floating-point types.
    pub fn update(&mut self, item: T) {
        if T::is_nan(&item) {
            return;
        }
        self.update_min_max(item, item);
        let mut compactor = Compactor::new(self.accuracy, &mut self.rng);
        self.store.insert(item, &mut compactor);
        self.n += 1;
    }

    /// Merges another sketch into this one and returns `self`.
    ///
    /// If the sketches differ in k, the result takes the smaller k.
    ///
    /// # Examples
    ///
    /// ```
    /// # use datasketches_quantiles::quantiles::QuantilesSketch;
    /// let mut a = QuantilesSketch::<f64>::new(128).unwrap();
    /// let mut b = QuantilesSketch::<f64>::new(32).unwrap();
    /// a.update(1.0);
    /// b.update(2.0);
    /// a.merge(&b);
    /// assert_eq!(a.k(), 32);
    /// assert_eq!(a.n(), 2);
    /// ```
    pub fn merge<S: RandomSource>(&mut self, other: &QuantilesSketch<T, S>) -> &mut Self {
        if other.is_empty() {
            return self;
        }
        if let (Some(min), Some(max)) = (other.min_item, other.max_item) {
            self.update_min_max(min, max);
        }

        let mut compactor = Compactor::new(self.accuracy, &mut self.rng);
        if self.k > other.k {
            self.store = degrade(&self.store, other.k as usize, &mut compactor);
            self.k = other.k;
        }
        if other.k > self.k {
            let degraded = degrade(&other.store, self.k as usize, &mut compactor);
            merge_same_k(&mut self.store, &degraded, &mut compactor);
        } else {
            merge_same_k(&mut self.store, &other.store, &mut compactor);
        }
        self.n += other.n;

        debug_assert_eq!(
            self.store.bit_pattern().bits(),
            bit_pattern_for(self.k as usize, self.n),
            "bit pattern does not match n"
        );
        self
    }

    /// Returns the normalized rank of the given item.
    ///
    /// Returns an error if the sketch is empty or the item is NaN.
    pub fn rank(&self, item: &T, criteria: QuantileSearchCriteria) -> Result<f64, Error> {
        self.ensure_not_empty()?;
        self.sorted_view().rank(item, criteria)
    }

    /// Returns the quantile for the given normalized rank.
    ///
    /// Returns an error if the sketch is empty or rank is not in [0.0, 1.0].
    pub fn quantile(&self, rank: f64, criteria: QuantileSearchCriteria) -> Result<T, Error> {
        self.ensure_not_empty()?;
        self.sorted_view().quantile(rank, criteria)
    }

    /// Returns the quantiles for the given normalized ranks.
    pub fn quantiles(&self, ranks: &[f64], criteria: QuantileSearchCriteria) -> Result<Vec<T>, Error> {
        self.ensure_not_empty()?;
        let view = self.sorted_view();
        ranks
            .iter()
            .map(|&rank| view.quantile(rank, criteria))
            .collect()
    }

    /// Returns the approximate CDF for the given split points.
    pub fn cdf(&self, split_points: &[T], criteria: QuantileSearchCriteria) -> Result<Vec<f64>, Error> {
        self.ensure_not_empty()?;
        self.sorted_view().cdf(split_points, criteria)
    }

    /// Returns the approximate PMF for the given split points.
    pub fn pmf(&self, split_points: &[T], criteria: QuantileSearchCriteria) -> Result<Vec<f64>, Error> {
        self.ensure_not_empty()?;
        self.sorted_view().pmf(split_points, criteria)
    }

    /// Builds the value-ordered view of all retained items.
    pub fn sorted_view(&self) -> SortedView<T> {
        SortedView::new(&self.store)
    }

    /// Returns an iterator over the retained items and their weights.
    ///
    /// Base buffer items come first in storage order with weight 1, followed
    /// by each populated level in ascending order.
    pub fn iter(&self) -> QuantilesSketchIter<'_, T> {
        QuantilesSketchIter::new(&self.store)
    }

    /// Returns the a priori normalized rank error for this sketch's k.
    pub fn normalized_rank_error(&self, pmf: bool) -> f64 {
        normalized_rank_error(self.k, pmf)
    }

    /// Returns the a priori normalized rank error for the given k.
    ///
    /// With `pmf` set the bound applies to PMF and CDF queries; otherwise it
    /// applies to single rank queries. Both hold with 99% confidence.
    pub fn rank_error_for_k(k: u16, pmf: bool) -> f64 {
        normalized_rank_error(k, pmf)
    }

    /// Clears the sketch, keeping k, the orientation and the random source.
    pub fn reset(&mut self) {
        self.n = 0;
        self.min_item = None;
        self.max_item = None;
        self.store = LevelStore::new(self.k as usize);
    }

    /// Returns a copy of this sketch reduced to a smaller k.
    ///
    /// The copy draws from a generator forked off this sketch's own, so the
    /// two make independent coin flips afterwards.
    ///
    /// Returns an error if `new_k` is invalid or larger than the current k.
    pub fn downsample(&self, new_k: u16) -> Result<Self, Error> {
        check_k(new_k)?;
        if new_k > self.k {
            return Err(Error::invalid_argument(format!(
                "new k must not exceed the current k {}, got {new_k}",
                self.k
            )));
        }
        let mut rng = self.rng.fork();
        let store = {
            let mut compactor = Compactor::new(self.accuracy, &mut rng);
            degrade(&self.store, new_k as usize, &mut compactor)
        };
        Ok(Self {
            k: new_k,
            n: self.n,
            accuracy: self.accuracy,
            min_item: self.min_item,
            max_item: self.max_item,
            store,
            rng,
        })
    }

    /// Returns the size of the compact serialized form in bytes.
    pub fn compact_serialized_size_bytes(&self) -> usize {
        if self.is_empty() {
            return EMPTY_SIZE_BYTES;
        }
        DATA_START + (2 + self.num_retained()) * T::SERIALIZED_SIZE
    }

    /// Returns the size of the updatable serialized form in bytes.
    pub fn updatable_serialized_size_bytes(&self) -> usize {
        if self.is_empty() {
            return EMPTY_SIZE_BYTES;
        }
        let capacity = combined_buffer_capacity(self.k as usize, self.n);
        DATA_START + (2 + capacity) * T::SERIALIZED_SIZE
    }

    /// Serializes the sketch in compact form, holding only the retained items.
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = SketchBytes::with_capacity(self.compact_serialized_size_bytes());
        if !self.write_preamble(&mut bytes, true) {
            return bytes.into_bytes();
        }

        let mut base = self.store.base_buffer().to_vec();
        base.sort_by(T::cmp);
        for item in &base {
            T::serialize(item, &mut bytes);
        }
        for (_, items) in self.store.levels() {
            for item in items {
                T::serialize(item, &mut bytes);
            }
        }
        debug_assert_eq!(bytes.len(), self.compact_serialized_size_bytes());
        bytes.into_bytes()
    }

    /// Serializes the sketch in updatable form, holding the full combined
    /// buffer so that updates can resume without reallocation.
    pub fn serialize_updatable(&self) -> Vec<u8> {
        let mut bytes = SketchBytes::with_capacity(self.updatable_serialized_size_bytes());
        if !self.write_preamble(&mut bytes, false) {
            return bytes.into_bytes();
        }

        let capacity = combined_buffer_capacity(self.k as usize, self.n);
        let combined = self.store.combined_buffer();
        for i in 0..capacity {
            let item = combined.get(i).copied().unwrap_or_default();
            T::serialize(&item, &mut bytes);
        }
        debug_assert_eq!(bytes.len(), self.updatable_serialized_size_bytes());
        bytes.into_bytes()
    }

    /// Writes the preamble and, for a non-empty sketch, the min and max items.
    /// Returns false if the sketch is empty and nothing else follows.
    fn write_preamble(&self, bytes: &mut SketchBytes, compact: bool) -> bool {
        let is_empty = self.is_empty();
        let mut flags = 0;
        if is_empty {
            flags |= FLAG_EMPTY;
        }
        if compact {
            flags |= FLAG_COMPACT | FLAG_ORDERED;
        }
        if self.accuracy == RankAccuracy::HighRanks {
            flags |= FLAG_HIGH_RANK_ACCURACY;
        }
        let preamble_longs = if is_empty {
            PREAMBLE_LONGS_EMPTY
        } else {
            PREAMBLE_LONGS_FULL
        };

        bytes.write_u8(preamble_longs);
        bytes.write_u8(SERIAL_VERSION);
        bytes.write_u8(Family::QUANTILES.id);
        bytes.write_u8(flags);
        bytes.write_u16_le(self.k);
        bytes.write_zeros(2);
        if is_empty {
            return false;
        }

        bytes.write_u64_le(self.n);
        bytes.write_u64_le(self.store.bit_pattern().bits());
        bytes.write_u32_le(self.store.base_buffer_count() as u32);
        bytes.write_zeros(4);
        if let (Some(min), Some(max)) = (&self.min_item, &self.max_item) {
            T::serialize(min, bytes);
            T::serialize(max, bytes);
        }
        true
    }

    /// Deserializes a sketch using the provided random source.
    pub fn deserialize_with_rng(bytes: &[u8], rng: R) -> Result<Self, Error> {
        fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
            move |err| Error::insufficient_data(tag).set_source(err)
        }

        let mut cursor = SketchSlice::new(bytes);
        let preamble_longs = cursor.read_u8().map_err(make_error("preamble_longs"))?;
        let serial_version = cursor.read_u8().map_err(make_error("serial_version"))?;
        let family_id = cursor.read_u8().map_err(make_error("family_id"))?;
        let flags = cursor.read_u8().map_err(make_error("flags"))?;
        let k = cursor.read_u16_le().map_err(make_error("k"))?;
        let _unused = cursor.read_u16_le().map_err(make_error("unused"))?;

        Family::QUANTILES.validate_id(family_id)?;
        ensure_serial_version_in(MIN_SERIAL_VERSION..=SERIAL_VERSION, serial_version)?;
        let is_empty = (flags & FLAG_EMPTY) != 0;
        let expected_preamble = if is_empty {
            PREAMBLE_LONGS_EMPTY
        } else {
            PREAMBLE_LONGS_FULL
        };
        ensure_preamble_longs_in(&[expected_preamble], preamble_longs)?;
        check_k(k).map_err(|_| Error::deserial(format!("invalid k: {k}")))?;

        let accuracy = if (flags & FLAG_HIGH_RANK_ACCURACY) != 0 {
            RankAccuracy::HighRanks
        } else {
            RankAccuracy::LowRanks
        };
        if is_empty {
            return Ok(Self::make(k, accuracy, rng));
        }

        let n = cursor.read_u64_le().map_err(make_error("n"))?;
        let bits = cursor.read_u64_le().map_err(make_error("bit_pattern"))?;
        let base_buffer_count = cursor.read_u32_le().map_err(make_error("base_buffer_count"))?;
        let _unused = cursor.read_u32_le().map_err(make_error("unused"))?;

        let k_usize = k as usize;
        if n == 0 {
            return Err(Error::deserial("non-empty sketch must have n > 0"));
        }
        let expected_bits = bit_pattern_for(k_usize, n);
        if bits != expected_bits {
            return Err(Error::deserial(format!(
                "bit pattern {bits:#b} does not match n={n} and k={k}, expected {expected_bits:#b}"
            )));
        }
        let expected_base = base_buffer_items(k_usize, n);
        if base_buffer_count as usize != expected_base {
            return Err(Error::deserial(format!(
                "base buffer count {base_buffer_count} does not match n={n} and k={k}, expected {expected_base}"
            )));
        }

        let min_item = T::deserialize(&mut cursor).map_err(make_error("min_item"))?;
        let max_item = T::deserialize(&mut cursor).map_err(make_error("max_item"))?;
        if T::is_nan(&min_item) || T::is_nan(&max_item) {
            return Err(Error::deserial("min and max items must not be NaN"));
        }
        if T::cmp(&min_item, &max_item) == Ordering::Greater {
            return Err(Error::deserial(format!(
                "min item {min_item:?} is greater than max item {max_item:?}"
            )));
        }

        let bit_pattern = BitPattern::new(bits);
        let capacity = combined_buffer_capacity(k_usize, n);
        let (base_buffer, levels) = if (flags & FLAG_COMPACT) != 0 {
            let base_buffer = read_items::<T>(&mut cursor, expected_base, "base_buffer")?;
            let mut levels = Vec::with_capacity(bit_pattern.num_valid_levels());
            for level in bit_pattern.valid_levels() {
                levels.push((level, read_items::<T>(&mut cursor, k_usize, "levels")?));
            }
            (base_buffer, levels)
        } else {
            let mut combined = read_items::<T>(&mut cursor, capacity, "combined_buffer")?;
            let mut levels = Vec::with_capacity(bit_pattern.num_valid_levels());
            for level in bit_pattern.valid_levels() {
                let start = (2 + level) * k_usize;
                levels.push((level, combined[start..start + k_usize].to_vec()));
            }
            combined.truncate(expected_base);
            (combined, levels)
        };

        let store = LevelStore::from_parts(k_usize, capacity, &base_buffer, levels)?;
        Ok(Self {
            k,
            n,
            accuracy,
            min_item: Some(min_item),
            max_item: Some(max_item),
            store,
            rng,
        })
    }

    fn ensure_not_empty(&self) -> Result<(), Error> {
        if self.is_empty() {
            Err(Error::invalid_argument(
                "operation is undefined for an empty sketch",
            ))
        } else {
            Ok(())
        }
    }

    fn update_min_max(&mut self, min: T, max: T) {
        self.min_item = Some(match self.min_item {
            Some(current) if T::cmp(&current, &min) != Ordering::Greater => current,
            _ => min,
        });
        self.max_item = Some(match self.max_item {
            Some(current) if T::cmp(&current, &max) != Ordering::Less => current,
            _ => max,
        });
    }
}

fn read_items<T: QuantilesItem>(
    cursor: &mut SketchSlice<'_>,
    count: usize,
    tag: &'static str,
) -> Result<Vec<T>, Error> {
    if cursor.remaining() < count * T::SERIALIZED_SIZE {
        return Err(Error::insufficient_data(tag));
    }
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        let item = T::deserialize(cursor)
            .map_err(|err| Error::insufficient_data(tag).set_source(err))?;
        items.push(item);
    }
    Ok(items)
}

#[allow(private_bounds)]
impl<'a, T: QuantilesItem, R: RandomSource> IntoIterator for &'a QuantilesSketch<T, R> {
    type Item = (T, u64);
    type IntoIter = QuantilesSketchIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
