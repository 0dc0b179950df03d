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

//! Binary serialization format constants for classic quantiles sketches.
//!
//! All multi-byte fields are little-endian. The preamble is one 8-byte long
//! for an empty sketch and four longs otherwise:
//!
//! ```text
//! byte 0      preamble longs
//! byte 1      serial version
//! byte 2      family id
//! byte 3      flags
//! bytes 4-5   k
//! bytes 6-7   unused
//! bytes 8-15  n
//! bytes 16-23 bit pattern
//! bytes 24-27 base buffer count
//! bytes 28-31 unused
//! ```
//!
//! A non-empty sketch continues with the min and max items, then either the
//! retained items (compact) or the whole combined buffer (updatable).

use crate::codec::Family;

/// Serial version written by this crate.
pub const SERIAL_VERSION: u8 = 3;
/// Oldest serial version this crate can read.
pub const MIN_SERIAL_VERSION: u8 = 3;

/// Preamble longs for an empty sketch.
pub const PREAMBLE_LONGS_EMPTY: u8 = Family::QUANTILES.min_pre_longs;
/// Preamble longs for a non-empty sketch.
pub const PREAMBLE_LONGS_FULL: u8 = Family::QUANTILES.max_pre_longs;

/// Flag indicating the sketch is empty.
pub const FLAG_EMPTY: u8 = 1 << 2;
/// Flag indicating only retained items follow the preamble.
pub const FLAG_COMPACT: u8 = 1 << 3;
/// Flag indicating the serialized base buffer is sorted.
pub const FLAG_ORDERED: u8 = 1 << 4;
/// Flag indicating the sketch favors high-rank accuracy.
pub const FLAG_HIGH_RANK_ACCURACY: u8 = 1 << 5;

/// Serialized size of an empty sketch in bytes.
pub const EMPTY_SIZE_BYTES: usize = 8;
/// Offset of the min and max items in a non-empty sketch.
pub const DATA_START: usize = 32;
