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

use datasketches_quantiles::common::QuantileSearchCriteria::Inclusive;
use datasketches_quantiles::common::QuantileSearchCriteria::NonInclusive;
use datasketches_quantiles::common::XorShift64;
use datasketches_quantiles::error::ErrorKind;
use datasketches_quantiles::quantiles::QuantilesSketch;
use datasketches_quantiles::quantiles::RankAccuracy;

#[test]
fn test_empty_view() {
    let sketch = QuantilesSketch::<f64>::new(64).unwrap();
    let view = sketch.sorted_view();
    assert!(view.is_empty());
    assert_eq!(view.len(), 0);
    assert_eq!(view.total_weight(), 0);
    let mut iter = view.iter();
    assert!(iter.next().is_none());
    assert!(iter.next().is_none());

    let err = view.quantile(0.5, Inclusive).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_two_items() {
    let mut sketch = QuantilesSketch::<f64>::new(64).unwrap();
    sketch.update(1.0);
    sketch.update(2.0);
    let view = sketch.sorted_view();
    let mut iter = view.iter();

    let first = iter.next().unwrap();
    assert_eq!(first.item(), 1.0);
    assert_eq!(first.weight(), 1);
    assert_eq!(first.cumulative_weight(NonInclusive), 0);
    assert_eq!(first.cumulative_weight(Inclusive), 1);
    assert_eq!(first.normalized_rank(NonInclusive), 0.0);
    assert_eq!(first.normalized_rank(Inclusive), 0.5);

    let second = iter.next().unwrap();
    assert_eq!(second.item(), 2.0);
    assert_eq!(second.weight(), 1);
    assert_eq!(second.cumulative_weight(NonInclusive), 1);
    assert_eq!(second.cumulative_weight(Inclusive), 2);
    assert_eq!(second.normalized_rank(NonInclusive), 0.5);
    assert_eq!(second.normalized_rank(Inclusive), 1.0);

    assert!(iter.next().is_none());
}

#[test]
fn test_unsorted_input_is_ordered() {
    let mut sketch = QuantilesSketch::<i64>::new(64).unwrap();
    for item in [5, 3, 9, 1, 3] {
        sketch.update(item);
    }
    let view = sketch.sorted_view();
    assert_eq!(view.items(), &[1, 3, 3, 5, 9]);
    assert_eq!(view.cumulative_weights(), &[1, 2, 3, 4, 5]);
    assert_eq!(view.rank(&3, NonInclusive).unwrap(), 0.2);
    assert_eq!(view.rank(&3, Inclusive).unwrap(), 0.6);
}

#[test]
fn test_view_in_estimation_mode() {
    let rng = XorShift64::seeded(23);
    let mut sketch = QuantilesSketch::<f64, _>::with_rng(16, RankAccuracy::LowRanks, rng).unwrap();
    let n = 3000u64;
    for i in (0..n).rev() {
        sketch.update(i as f64);
    }
    let view = sketch.sorted_view();
    assert_eq!(view.len(), sketch.num_retained());
    assert_eq!(view.total_weight(), n);
    assert!(view.items().is_sorted());

    let mut previous = 0;
    for entry in &view {
        assert!(entry.weight() >= 1);
        assert!(entry.weight().is_power_of_two());
        assert_eq!(
            entry.cumulative_weight(Inclusive),
            previous + entry.weight()
        );
        assert_eq!(entry.cumulative_weight(NonInclusive), previous);
        previous = entry.cumulative_weight(Inclusive);
    }
    assert_eq!(previous, n);
    assert_eq!(view.cumulative_weights().last(), Some(&n));
}

#[test]
fn test_view_queries_match_sketch() {
    let mut sketch = QuantilesSketch::<f64>::new(32).unwrap();
    for i in 0..1000 {
        sketch.update(i as f64);
    }
    let view = sketch.sorted_view();
    for rank in [0.0, 0.1, 0.25, 0.5, 0.9, 1.0] {
        assert_eq!(
            view.quantile(rank, Inclusive).unwrap(),
            sketch.quantile(rank, Inclusive).unwrap()
        );
        assert_eq!(
            view.quantile(rank, NonInclusive).unwrap(),
            sketch.quantile(rank, NonInclusive).unwrap()
        );
    }
    let splits = [100.0, 500.0, 900.0];
    assert_eq!(
        view.cdf(&splits, Inclusive).unwrap(),
        sketch.cdf(&splits, Inclusive).unwrap()
    );
    let pmf = view.pmf(&splits, NonInclusive).unwrap();
    assert_eq!(pmf.len(), 4);
    let total: f64 = pmf.iter().sum();
    assert!((total - 1.0).abs() < 1e-9);
}
