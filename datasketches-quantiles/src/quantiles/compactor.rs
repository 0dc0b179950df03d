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

use super::item::QuantilesItem;
use crate::common::RandomSource;

/// Which end of the rank domain a sketch orients its compactions toward.
///
/// Compaction always keeps one of the two interleaved halves of a sorted run,
/// chosen by a fair coin so rank estimates stay unbiased. The orientation
/// decides which half a given coin outcome selects: on heads, `LowRanks`
/// keeps the half holding the run's smallest item and `HighRanks` keeps the
/// half holding its largest. A sketch driven by a seeded generator therefore
/// makes mirrored choices under the two orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RankAccuracy {
    /// Favor the low end of the rank domain.
    #[default]
    LowRanks,
    /// Favor the high end of the rank domain.
    HighRanks,
}

/// One of the two interleaved halves of a sorted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Half {
    /// Items at indices 0, 2, 4, ...
    Even,
    /// Items at indices 1, 3, 5, ...
    Odd,
}

impl Half {
    fn offset(self) -> usize {
        match self {
            Half::Even => 0,
            Half::Odd => 1,
        }
    }
}

/// Chooses the half of a sorted run that survives a compaction.
pub(super) fn choose_retained_half<R: RandomSource>(accuracy: RankAccuracy, rng: &mut R) -> Half {
    let heads = rng.next_bool();
    match (accuracy, heads) {
        (RankAccuracy::LowRanks, true) | (RankAccuracy::HighRanks, false) => Half::Even,
        (RankAccuracy::LowRanks, false) | (RankAccuracy::HighRanks, true) => Half::Odd,
    }
}

/// Randomized halving step shared by updates, merges and downsampling.
pub(super) struct Compactor<'a, R> {
    accuracy: RankAccuracy,
    rng: &'a mut R,
}

impl<'a, R: RandomSource> Compactor<'a, R> {
    pub fn new(accuracy: RankAccuracy, rng: &'a mut R) -> Self {
        Self { accuracy, rng }
    }

    /// Halves a sorted run of `2 * dst.len()` items into `dst`.
    ///
    /// # Panics
    ///
    /// Panics if `src` is not exactly twice as long as `dst`.
    pub fn halve<T: Copy>(&mut self, src: &[T], dst: &mut [T]) {
        assert_eq!(
            src.len(),
            2 * dst.len(),
            "compaction requires a buffer at exactly twice the level size"
        );
        let half = choose_retained_half(self.accuracy, self.rng);
        zip_with_stride(src, dst, 2, half.offset());
    }

    /// Keeps every `stride`-th item of a sorted run, starting at a random offset.
    ///
    /// # Panics
    ///
    /// Panics if `src` is not exactly `stride` times as long as `dst`.
    pub fn decimate<T: Copy>(&mut self, src: &[T], dst: &mut [T], stride: usize) {
        assert_eq!(
            src.len(),
            stride * dst.len(),
            "decimation requires a buffer at exactly stride times the level size"
        );
        if stride == 1 {
            dst.copy_from_slice(src);
            return;
        }
        let drawn = (self.rng.next_u64() % stride as u64) as usize;
        let offset = match self.accuracy {
            RankAccuracy::LowRanks => drawn,
            RankAccuracy::HighRanks => stride - 1 - drawn,
        };
        zip_with_stride(src, dst, stride, offset);
    }
}

fn zip_with_stride<T: Copy>(src: &[T], dst: &mut [T], stride: usize, offset: usize) {
    for (slot, item) in dst.iter_mut().zip(src.iter().skip(offset).step_by(stride)) {
        *slot = *item;
    }
}

/// Merges two sorted runs into `dst`, which must hold exactly both runs.
pub(super) fn merge_sorted_into<T: QuantilesItem>(left: &[T], right: &[T], dst: &mut [T]) {
    debug_assert_eq!(left.len() + right.len(), dst.len());
    let (mut i, mut j) = (0, 0);
    for slot in dst.iter_mut() {
        let take_left = j == right.len()
            || (i < left.len() && T::cmp(&left[i], &right[j]) != std::cmp::Ordering::Greater);
        if take_left {
            *slot = left[i];
            i += 1;
        } else {
            *slot = right[j];
            j += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::XorShift64;

    struct Constant(u64);

    impl RandomSource for Constant {
        fn next_u64(&mut self) -> u64 {
            self.0
        }

        fn fork(&self) -> Self {
            Constant(self.0)
        }
    }

    #[test]
    fn test_halve_keeps_chosen_half() {
        let src = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let mut dst = [0.0; 4];

        let mut heads = Constant(1);
        Compactor::new(RankAccuracy::LowRanks, &mut heads).halve(&src, &mut dst);
        assert_eq!(dst, [1.0, 3.0, 5.0, 7.0]);

        Compactor::new(RankAccuracy::HighRanks, &mut heads).halve(&src, &mut dst);
        assert_eq!(dst, [2.0, 4.0, 6.0, 8.0]);

        let mut tails = Constant(0);
        Compactor::new(RankAccuracy::LowRanks, &mut tails).halve(&src, &mut dst);
        assert_eq!(dst, [2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    #[should_panic(expected = "compaction requires a buffer at exactly twice the level size")]
    fn test_halve_rejects_partial_buffer() {
        let mut rng = XorShift64::seeded(1);
        let src = [1.0, 2.0, 3.0];
        let mut dst = [0.0; 2];
        Compactor::new(RankAccuracy::LowRanks, &mut rng).halve(&src, &mut dst);
    }

    #[test]
    fn test_decimate_with_stride() {
        let src: Vec<i64> = (0..16).collect();
        let mut dst = [0i64; 4];

        let mut rng = Constant(6);
        Compactor::new(RankAccuracy::LowRanks, &mut rng).decimate(&src, &mut dst, 4);
        assert_eq!(dst, [2, 6, 10, 14]);

        Compactor::new(RankAccuracy::HighRanks, &mut rng).decimate(&src, &mut dst, 4);
        assert_eq!(dst, [1, 5, 9, 13]);
    }

    #[test]
    fn test_merge_sorted_into() {
        let left = [1i64, 4, 4, 9];
        let right = [2i64, 4, 10];
        let mut dst = [0i64; 7];
        merge_sorted_into(&left, &right, &mut dst);
        assert_eq!(dst, [1, 2, 4, 4, 4, 9, 10]);
    }
}
