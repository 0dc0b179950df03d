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

use super::MAX_K;
use super::MIN_K;
use crate::error::Error;

/// Checks that k is a power of two within [MIN_K, MAX_K].
pub(super) fn check_k(k: u16) -> Result<(), Error> {
    if (MIN_K..=MAX_K).contains(&k) && k.is_power_of_two() {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "k must be a power of 2 in [{MIN_K}, {MAX_K}], got {k}"
        )))
    }
}

/// Number of levels needed to hold `n` items, i.e. the bit length of `n / 2k`.
pub(super) fn num_levels_needed(k: usize, n: u64) -> usize {
    let full_buffers = n / (2 * k as u64);
    (u64::BITS - full_buffers.leading_zeros()) as usize
}

/// The level bit pattern implied by `k` and `n`.
pub(super) fn bit_pattern_for(k: usize, n: u64) -> u64 {
    n / (2 * k as u64)
}

/// Number of items sitting in the base buffer after `n` updates.
pub(super) fn base_buffer_items(k: usize, n: u64) -> usize {
    (n % (2 * k as u64)) as usize
}

/// Combined buffer capacity (base buffer plus levels) for a sketch of `n` items.
///
/// Before the first compaction only the base buffer is allocated, and it
/// grows in powers of two up to `2k`.
pub(super) fn combined_buffer_capacity(k: usize, n: u64) -> usize {
    let levels = num_levels_needed(k, n);
    if levels == 0 {
        let base_items = base_buffer_items(k, n);
        return base_items.next_power_of_two().max(2 * MIN_K as usize);
    }
    (2 + levels) * k
}

/// Capacity needed to hold `num_levels` levels above a full base buffer.
pub(super) fn level_capacity(k: usize, num_levels: usize) -> usize {
    (2 + num_levels) * k
}

/// A priori normalized rank error at 99% confidence.
pub(super) fn normalized_rank_error(k: u16, pmf: bool) -> f64 {
    let k = k as f64;
    if pmf {
        1.854 / k.powf(0.9657)
    } else {
        1.576 / k.powf(0.9726)
    }
}
