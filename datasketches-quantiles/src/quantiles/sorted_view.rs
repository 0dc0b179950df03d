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

use super::item::QuantilesItem;
use super::level_store::LevelStore;
use crate::common::QuantileSearchCriteria;
use crate::error::Error;

/// Value-ordered snapshot of every retained item with its weight.
///
/// The view is built from the sketch on demand and does not track later
/// updates; build a new one after mutating the sketch.
#[derive(Debug, Clone)]
pub struct SortedView<T> {
    items: Vec<T>,
    weights: Vec<u64>,
    // inclusive cumulative weight at each position
    cumulative: Vec<u64>,
    total_weight: u64,
}

#[allow(private_bounds)]
impl<T: QuantilesItem> SortedView<T> {
    pub(super) fn new(store: &LevelStore<T>) -> Self {
        let mut base = store.base_buffer().to_vec();
        base.sort_by(T::cmp);
        let mut runs = Vec::with_capacity(1 + store.bit_pattern().num_valid_levels());
        if !base.is_empty() {
            runs.push(Run::uniform(base, 1));
        }
        for (level, items) in store.levels() {
            runs.push(Run::uniform(items.to_vec(), 2u64 << level));
        }
        let Run { items, weights } = merge_runs(runs);

        let mut cumulative = Vec::with_capacity(weights.len());
        let mut total_weight = 0u64;
        for weight in &weights {
            total_weight += weight;
            cumulative.push(total_weight);
        }
        Self {
            items,
            weights,
            cumulative,
            total_weight,
        }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the view holds no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the sum of all entry weights.
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Returns the items in non-decreasing order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Returns the inclusive cumulative weight at each position.
    pub fn cumulative_weights(&self) -> &[u64] {
        &self.cumulative
    }

    /// Returns an iterator over the entries in value order.
    pub fn iter(&self) -> SortedViewIter<'_, T> {
        SortedViewIter {
            view: self,
            index: 0,
        }
    }

    /// Returns the normalized rank of the given item.
    pub fn rank(&self, item: &T, criteria: QuantileSearchCriteria) -> Result<f64, Error> {
        self.ensure_not_empty()?;
        if T::is_nan(item) {
            return Err(Error::invalid_argument("item must not be NaN"));
        }
        let idx = match criteria {
            QuantileSearchCriteria::Inclusive => {
                self.items
                    .partition_point(|x| T::cmp(x, item) != Ordering::Greater)
            }
            QuantileSearchCriteria::NonInclusive => {
                self.items
                    .partition_point(|x| T::cmp(x, item) == Ordering::Less)
            }
        };
        if idx == 0 {
            return Ok(0.0);
        }
        Ok(self.cumulative[idx - 1] as f64 / self.total_weight as f64)
    }

    /// Returns the item at the given normalized rank.
    pub fn quantile(&self, rank: f64, criteria: QuantileSearchCriteria) -> Result<T, Error> {
        self.ensure_not_empty()?;
        if !(0.0..=1.0).contains(&rank) {
            return Err(Error::invalid_argument(format!(
                "rank must be in [0.0, 1.0], got {rank}"
            )));
        }
        let total = self.total_weight as f64;
        let idx = match criteria {
            QuantileSearchCriteria::Inclusive => {
                let weight = (rank * total).ceil() as u64;
                self.cumulative.partition_point(|&w| w < weight)
            }
            QuantileSearchCriteria::NonInclusive => {
                let weight = (rank * total).floor() as u64;
                self.cumulative.partition_point(|&w| w <= weight)
            }
        };
        Ok(self.items[idx.min(self.items.len() - 1)])
    }

    /// Returns the approximate CDF at the given split points.
    ///
    /// The result has one more entry than `split_points`; the last is always 1.
    pub fn cdf(&self, split_points: &[T], criteria: QuantileSearchCriteria) -> Result<Vec<f64>, Error> {
        self.ensure_not_empty()?;
        check_split_points(split_points)?;
        let mut ranks = Vec::with_capacity(split_points.len() + 1);
        for item in split_points {
            ranks.push(self.rank(item, criteria)?);
        }
        ranks.push(1.0);
        Ok(ranks)
    }

    /// Returns the approximate PMF of the intervals defined by the split points.
    pub fn pmf(&self, split_points: &[T], criteria: QuantileSearchCriteria) -> Result<Vec<f64>, Error> {
        let mut buckets = self.cdf(split_points, criteria)?;
        for i in (1..buckets.len()).rev() {
            buckets[i] -= buckets[i - 1];
        }
        Ok(buckets)
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
}

/// One entry of a [`SortedView`], as produced by [`SortedViewIter`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortedViewEntry<T> {
    item: T,
    weight: u64,
    cumulative_weight: u64,
    total_weight: u64,
}

impl<T: Copy> SortedViewEntry<T> {
    /// Returns the retained item.
    pub fn item(&self) -> T {
        self.item
    }

    /// Returns the weight of this entry.
    pub fn weight(&self) -> u64 {
        self.weight
    }

    /// Returns the total weight of the entries before this one, plus this
    /// entry's own weight when the criteria is inclusive.
    pub fn cumulative_weight(&self, criteria: QuantileSearchCriteria) -> u64 {
        match criteria {
            QuantileSearchCriteria::Inclusive => self.cumulative_weight,
            QuantileSearchCriteria::NonInclusive => self.cumulative_weight - self.weight,
        }
    }

    /// Returns the cumulative weight divided by the total weight of the view.
    pub fn normalized_rank(&self, criteria: QuantileSearchCriteria) -> f64 {
        self.cumulative_weight(criteria) as f64 / self.total_weight as f64
    }
}

/// Iterator over the entries of a [`SortedView`] in value order.
#[derive(Debug, Clone)]
pub struct SortedViewIter<'a, T> {
    view: &'a SortedView<T>,
    index: usize,
}

impl<T: Copy> Iterator for SortedViewIter<'_, T> {
    type Item = SortedViewEntry<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let view = self.view;
        if self.index >= view.items.len() {
            return None;
        }
        let entry = SortedViewEntry {
            item: view.items[self.index],
            weight: view.weights[self.index],
            cumulative_weight: view.cumulative[self.index],
            total_weight: view.total_weight,
        };
        self.index += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.view.items.len() - self.index;
        (remaining, Some(remaining))
    }
}

#[allow(private_bounds)]
impl<'a, T: QuantilesItem> IntoIterator for &'a SortedView<T> {
    type Item = SortedViewEntry<T>;
    type IntoIter = SortedViewIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

struct Run<T> {
    items: Vec<T>,
    weights: Vec<u64>,
}

impl<T> Run<T> {
    fn uniform(items: Vec<T>, weight: u64) -> Self {
        let weights = vec![weight; items.len()];
        Self { items, weights }
    }
}

/// Merges sorted runs pairwise until one remains.
fn merge_runs<T: QuantilesItem>(mut runs: Vec<Run<T>>) -> Run<T> {
    while runs.len() > 1 {
        let mut next = Vec::with_capacity(runs.len().div_ceil(2));
        let mut pending = runs.into_iter();
        while let Some(left) = pending.next() {
            match pending.next() {
                Some(right) => next.push(merge_two_runs(left, right)),
                None => next.push(left),
            }
        }
        runs = next;
    }
    runs.pop().unwrap_or(Run {
        items: Vec::new(),
        weights: Vec::new(),
    })
}

fn merge_two_runs<T: QuantilesItem>(left: Run<T>, right: Run<T>) -> Run<T> {
    let len = left.items.len() + right.items.len();
    let mut items = Vec::with_capacity(len);
    let mut weights = Vec::with_capacity(len);
    let (mut i, mut j) = (0, 0);
    while i < left.items.len() && j < right.items.len() {
        if T::cmp(&left.items[i], &right.items[j]) != Ordering::Greater {
            items.push(left.items[i]);
            weights.push(left.weights[i]);
            i += 1;
        } else {
            items.push(right.items[j]);
            weights.push(right.weights[j]);
            j += 1;
        }
    }
    items.extend_from_slice(&left.items[i..]);
    weights.extend_from_slice(&left.weights[i..]);
    items.extend_from_slice(&right.items[j..]);
    weights.extend_from_slice(&right.weights[j..]);
    Run { items, weights }
}

fn check_split_points<T: QuantilesItem>(split_points: &[T]) -> Result<(), Error> {
    if split_points.iter().any(T::is_nan) {
        return Err(Error::invalid_argument(
            "split_points must not contain NaN values",
        ));
    }
    for pair in split_points.windows(2) {
        if T::cmp(&pair[0], &pair[1]) != Ordering::Less {
            return Err(Error::invalid_argument(
                "split_points must be unique and monotonically increasing",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_runs_keeps_weights_with_items() {
        let runs = vec![
            Run::uniform(vec![2i64, 7, 9], 1),
            Run::uniform(vec![1, 8], 2),
            Run::uniform(vec![3, 4], 4),
        ];
        let Run { items, weights } = merge_runs(runs);
        assert_eq!(items, vec![1, 2, 3, 4, 7, 8, 9]);
        assert_eq!(weights, vec![2, 1, 4, 4, 1, 2, 1]);
    }

    #[test]
    fn test_merge_no_runs() {
        let Run { items, weights } = merge_runs::<f64>(Vec::new());
        assert!(items.is_empty());
        assert!(weights.is_empty());
    }

    #[test]
    fn test_split_points() {
        assert!(check_split_points::<f64>(&[]).is_ok());
        assert!(check_split_points(&[1.0, 2.0, 3.0]).is_ok());
        assert!(check_split_points(&[1.0, 1.0]).is_err());
        assert!(check_split_points(&[f64::NAN]).is_err());
        assert!(check_split_points(&[1i64, 0]).is_err());
    }
}
