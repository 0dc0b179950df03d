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

use crate::error::Error;

/// Approximate per-key frequency counting over a stream of `i64` keys.
///
/// For every key, `lower_bound(key) <= estimate(key) <= upper_bound(key)`
/// and `upper_bound(key) - lower_bound(key) <= maximum_error()`.
pub trait FrequencyEstimator {
    /// Adds one occurrence of `key`.
    fn update(&mut self, key: i64);

    /// Adds `count` occurrences of `key`.
    ///
    /// A zero count is a no-op. Returns an error if `count` is negative, in
    /// which case the estimator is left unchanged.
    fn update_with_count(&mut self, key: i64, count: i64) -> Result<(), Error>;

    /// Returns the estimated frequency of `key`.
    fn estimate(&self, key: i64) -> i64;

    /// Returns a guaranteed lower bound on the true frequency of `key`.
    fn lower_bound(&self, key: i64) -> i64;

    /// Returns a guaranteed upper bound on the true frequency of `key`.
    fn upper_bound(&self, key: i64) -> i64;

    /// Returns the largest possible gap between the bounds of any key.
    fn maximum_error(&self) -> i64;

    /// Returns the keys whose frequency may be at least `threshold`.
    ///
    /// No key with a true frequency at or above `threshold` is missed as long
    /// as `threshold` exceeds [`maximum_error`], but keys below it may be
    /// reported.
    ///
    /// [`maximum_error`]: FrequencyEstimator::maximum_error
    fn frequent_keys(&self, threshold: i64) -> Vec<i64>;

    /// Folds `other` into this estimator and returns `self`.
    fn merge(&mut self, other: &Self) -> &mut Self
    where
        Self: Sized;

    /// Returns the number of keys that can currently be tracked.
    fn k(&self) -> usize;

    /// Returns the number of keys that can be tracked at full size.
    fn max_k(&self) -> usize;

    /// Returns true if no key has been counted.
    fn is_empty(&self) -> bool;

    /// Returns the sum of all counts presented to the estimator.
    fn stream_length(&self) -> i64;

    /// Returns to the empty state, keeping the configured maximum size.
    fn reset(&mut self);
}
