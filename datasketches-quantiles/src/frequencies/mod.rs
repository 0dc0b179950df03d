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

//! Frequency estimation for heavy hitters over `i64` keys.
//!
//! [`FrequencyEstimator`] is the contract for approximate per-key counters;
//! [`FrequentLongsSketch`] implements it with a reverse-purge hash map that
//! keeps memory bounded while reporting explicit lower and upper bounds for
//! every key.
//!
//! # Usage
//!
//! ```rust
//! # use datasketches_quantiles::frequencies::ErrorType;
//! # use datasketches_quantiles::frequencies::FrequencyEstimator;
//! # use datasketches_quantiles::frequencies::FrequentLongsSketch;
//! let mut sketch = FrequentLongsSketch::new(64).unwrap();
//! sketch.update_with_count(1, 3).unwrap();
//! sketch.update(2);
//! let rows = sketch.frequent_items(ErrorType::NoFalseNegatives);
//! assert!(rows.iter().any(|row| row.key() == 1));
//! ```

mod estimator;
mod reverse_purge_long_hash_map;
mod sketch;

pub use self::estimator::FrequencyEstimator;
pub use self::sketch::ErrorType;
pub use self::sketch::FrequentLongsSketch;
pub use self::sketch::Row;
