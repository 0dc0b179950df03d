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

use datasketches_quantiles::frequencies::ErrorType;
use datasketches_quantiles::frequencies::FrequencyEstimator;
use datasketches_quantiles::frequencies::FrequentLongsSketch;
use datasketches_quantiles::error::ErrorKind;
use googletest::assert_that;
use googletest::prelude::contains_substring;
use googletest::prelude::ge;
use googletest::prelude::le;

fn assert_bounds_hold<E: FrequencyEstimator>(sketch: &E, key: i64) {
    let lower = sketch.lower_bound(key);
    let estimate = sketch.estimate(key);
    let upper = sketch.upper_bound(key);
    assert_that!(estimate, ge(lower));
    assert_that!(estimate, le(upper));
    assert_that!(upper - lower, le(sketch.maximum_error()));
}

#[test]
fn longs_purge_keeps_heavy_hitters() {
    let mut sketch = FrequentLongsSketch::new(8).unwrap();
    sketch.update_with_count(1, 10).unwrap();
    for key in 2..=7 {
        sketch.update(key);
    }

    assert_eq!(sketch.stream_length(), 16);
    assert_eq!(sketch.maximum_error(), 1);
    assert_eq!(sketch.estimate(1), 10);
    assert_eq!(sketch.lower_bound(1), 9);

    let rows = sketch.frequent_items(ErrorType::NoFalsePositives);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].key(), 1);
    assert_eq!(rows[0].estimate(), 10);
    assert_eq!(sketch.frequent_keys(5), vec![1]);
}

#[test]
fn negative_count_is_rejected() {
    let mut sketch = FrequentLongsSketch::new(8).unwrap();
    sketch.update(3);
    let err = sketch.update_with_count(1, -1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_that!(err.message(), contains_substring("count may not be negative"));
    assert_eq!(sketch.stream_length(), 1);
    assert_eq!(sketch.estimate(1), 0);
}

#[test]
fn zero_count_is_noop() {
    let mut sketch = FrequentLongsSketch::new(8).unwrap();
    sketch.update_with_count(1, 0).unwrap();
    assert!(sketch.is_empty());
    assert_eq!(sketch.stream_length(), 0);
}

#[test]
fn bounds_hold_for_every_key() {
    let mut sketch = FrequentLongsSketch::new(32).unwrap();
    // key i occurs i times, far more keys than the map can hold
    for key in 1..=200i64 {
        sketch.update_with_count(key, key).unwrap();
    }
    assert!(sketch.maximum_error() > 0);
    for key in 0..=250 {
        assert_bounds_hold(&sketch, key);
    }
    assert!(sketch.num_active_items() <= sketch.max_k());
}

#[test]
fn frequent_keys_has_no_false_negatives() {
    let mut sketch = FrequentLongsSketch::new(16).unwrap();
    for round in 0..50 {
        sketch.update(-1);
        sketch.update(-2);
        sketch.update(round * 10);
        sketch.update(round * 10 + 1);
    }
    let threshold = sketch.maximum_error() + 1;
    assert!(threshold <= 50);
    let keys = sketch.frequent_keys(threshold);
    assert!(keys.contains(&-1));
    assert!(keys.contains(&-2));
    for key in keys {
        assert!(sketch.upper_bound(key) >= threshold);
    }
}

#[test]
fn merge_adds_stream_lengths() {
    let mut left = FrequentLongsSketch::new(64).unwrap();
    let mut right = FrequentLongsSketch::new(64).unwrap();
    left.update_with_count(1, 4).unwrap();
    left.update(2);
    right.update_with_count(1, 3).unwrap();
    right.update(3);

    let merged = left.merge(&right);
    assert_eq!(merged.stream_length(), 9);
    assert_eq!(merged.estimate(1), 7);
    assert_eq!(merged.estimate(2), 1);
    assert_eq!(merged.estimate(3), 1);
}

#[test]
fn merge_with_empty_is_noop() {
    let mut sketch = FrequentLongsSketch::new(64).unwrap();
    sketch.update_with_count(9, 2).unwrap();
    let empty = FrequentLongsSketch::new(64).unwrap();
    sketch.merge(&empty);
    assert_eq!(sketch.stream_length(), 2);
    assert_eq!(sketch.estimate(9), 2);
}

#[test]
fn reset_keeps_configuration() {
    let mut sketch = FrequentLongsSketch::new(64).unwrap();
    for key in 0..500 {
        sketch.update(key % 97);
    }
    let max_k = sketch.max_k();
    sketch.reset();
    assert!(sketch.is_empty());
    assert_eq!(sketch.stream_length(), 0);
    assert_eq!(sketch.maximum_error(), 0);
    assert_eq!(sketch.max_k(), max_k);
    assert_eq!(sketch.lg_max_map_size(), 6);
    assert_eq!(sketch.lg_cur_map_size(), 3);
}

#[test]
fn rejects_invalid_map_size() {
    let err = FrequentLongsSketch::new(12).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_that!(err.message(), contains_substring("power of 2"));
}
