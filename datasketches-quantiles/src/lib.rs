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

//! Streaming sketches for approximate quantiles and heavy hitters.
//!
//! - [`quantiles`]: the classic mergeable quantiles sketch, answering rank,
//!   quantile, CDF and PMF queries with bounded error.
//! - [`frequencies`]: approximate per-key frequency counting.
//!
//! Sketches are single-writer structures: mutate a sketch from one thread at
//! a time and merge per-thread sketches to combine concurrent producers.

pub mod common;
pub mod error;
pub mod frequencies;
pub mod quantiles;

mod codec;
mod hash;
