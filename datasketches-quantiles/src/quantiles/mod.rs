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

//! Classic mergeable quantiles sketch for estimating ranks and quantiles.
//!
//! The sketch keeps an unsorted base buffer of up to `2k` items plus a stack
//! of sorted levels of exactly `k` items each. When the base buffer fills it
//! is sorted and halved into level 0; a full level is merged with the
//! incoming carry and halved again, rippling upward like binary addition. A
//! bit pattern records which levels are populated, and always equals
//! `n / 2k`.
//!
//! Base buffer items have weight 1; items on level `L` have weight
//! `2^(L + 1)`, so the retained weights always add up to `n`.
//!
//! Sketches built with different `k` can be merged. The result adopts the
//! smaller `k`, whose error bound is the larger of the two.
//!
//! # Usage
//!
//! ```rust
//! # use datasketches_quantiles::common::QuantileSearchCriteria;
//! # use datasketches_quantiles::quantiles::QuantilesSketch;
//! let mut sketch = QuantilesSketch::<f64>::new(128).unwrap();
//! for i in 0..1000 {
//!     sketch.update(i as f64);
//! }
//! let median = sketch.quantile(0.5, QuantileSearchCriteria::Inclusive).unwrap();
//! assert!((400.0..=600.0).contains(&median));
//! ```
//!
//! # Serialization
//!
//! ```rust
//! # use datasketches_quantiles::quantiles::QuantilesSketch;
//! let mut sketch = QuantilesSketch::<f64>::new(64).unwrap();
//! sketch.update(1.0);
//! sketch.update(2.0);
//!
//! let bytes = sketch.serialize();
//! let decoded = QuantilesSketch::<f64>::deserialize(&bytes).unwrap();
//! assert_eq!(decoded.n(), 2);
//! assert_eq!(decoded.max_item(), Some(2.0));
//! ```

mod compactor;
mod helper;
mod item;
mod iter;
mod level_store;
mod merge;
mod serialization;
mod sketch;
mod sorted_view;

pub use self::compactor::RankAccuracy;
pub use self::iter::QuantilesSketchIter;
pub use self::sketch::QuantilesSketch;
pub use self::sorted_view::SortedView;
pub use self::sorted_view::SortedViewEntry;
pub use self::sorted_view::SortedViewIter;

/// Default value of parameter k.
pub const DEFAULT_K: u16 = 128;
/// Minimum value of parameter k.
pub const MIN_K: u16 = 2;
/// Maximum value of parameter k.
pub const MAX_K: u16 = 1 << 15;
