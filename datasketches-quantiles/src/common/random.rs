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

//! Randomness used by randomized compaction.

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

const GOLDEN_GAMMA: u64 = 0x9e3779b97f4a7c15;

/// Random number source for sketches.
///
/// Compaction only needs fair coin flips, so any statistically uniform
/// generator is adequate. Tests supply a seeded source to pin outcomes.
pub trait RandomSource {
    /// Returns the next random 64-bit value.
    fn next_u64(&mut self) -> u64;

    /// Returns a random boolean value.
    fn next_bool(&mut self) -> bool {
        (self.next_u64() & 1) != 0
    }

    /// Returns a new source decorrelated from this one.
    ///
    /// The receiver is not advanced.
    fn fork(&self) -> Self
    where
        Self: Sized;
}

/// Xorshift-based random generator for sketch operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Creates a new generator using the provided seed.
    ///
    /// # Examples
    ///
    /// ```
    /// # use datasketches_quantiles::common::RandomSource;
    /// # use datasketches_quantiles::common::XorShift64;
    /// let mut a = XorShift64::seeded(7);
    /// let mut b = XorShift64::seeded(7);
    /// assert_eq!(a.next_u64(), b.next_u64());
    /// ```
    pub fn seeded(seed: u64) -> Self {
        let state = if seed == 0 { GOLDEN_GAMMA } else { seed };
        Self { state }
    }
}

impl Default for XorShift64 {
    fn default() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        Self::seeded(nanos as u64 ^ (std::process::id() as u64))
    }
}

impl RandomSource for XorShift64 {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn fork(&self) -> Self {
        // splitmix64 finalizer
        let mut z = self.state.wrapping_add(GOLDEN_GAMMA);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        Self::seeded(z ^ (z >> 31))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_seed_is_replaced() {
        let mut rng = XorShift64::seeded(0);
        assert_ne!(rng.next_u64(), 0);
    }

    #[test]
    fn test_coin_is_roughly_fair() {
        let mut rng = XorShift64::seeded(42);
        let heads = (0..10_000).filter(|_| rng.next_bool()).count();
        assert!((4_500..=5_500).contains(&heads), "heads = {heads}");
    }

    #[test]
    fn test_fork_diverges_from_parent() {
        let parent = XorShift64::seeded(42);
        let mut child = parent.fork();
        let mut original = parent;
        let parent_stream: Vec<u64> = (0..64).map(|_| original.next_u64()).collect();
        let child_stream: Vec<u64> = (0..64).map(|_| child.next_u64()).collect();
        assert_ne!(parent_stream, child_stream);
        assert!(child_stream.iter().all(|v| !parent_stream.contains(v)));

        assert_eq!(parent.fork(), parent.fork());
    }
}
