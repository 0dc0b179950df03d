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

use std::cmp::Ordering;
use std::fmt::Debug;
use std::io;

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;

/// Trait implemented by item types supported by [`QuantilesSketch`].
///
/// Items live in a preallocated combined buffer, so they must be `Copy` and
/// have a placeholder `Default` value for unused slots.
///
/// [`QuantilesSketch`]: super::QuantilesSketch
pub(crate) trait QuantilesItem: Copy + Default + Debug {
    /// Serialized size of one item in bytes.
    const SERIALIZED_SIZE: usize;

    /// Compare two items.
    fn cmp(a: &Self, b: &Self) -> Ordering;

    /// Returns true if the item is NaN.
    fn is_nan(_value: &Self) -> bool {
        false
    }

    /// Serialize a single item into the buffer.
    fn serialize(value: &Self, bytes: &mut SketchBytes);

    /// Deserialize a single item from the input.
    fn deserialize(input: &mut SketchSlice<'_>) -> io::Result<Self>;
}

impl QuantilesItem for f32 {
    const SERIALIZED_SIZE: usize = 4;

    fn cmp(a: &Self, b: &Self) -> Ordering {
        a.partial_cmp(b).unwrap_or(Ordering::Greater)
    }

    fn is_nan(value: &Self) -> bool {
        value.is_nan()
    }

    fn serialize(value: &Self, bytes: &mut SketchBytes) {
        bytes.write_f32_le(*value);
    }

    fn deserialize(input: &mut SketchSlice<'_>) -> io::Result<Self> {
        input.read_f32_le()
    }
}

impl QuantilesItem for f64 {
    const SERIALIZED_SIZE: usize = 8;

    fn cmp(a: &Self, b: &Self) -> Ordering {
        a.partial_cmp(b).unwrap_or(Ordering::Greater)
    }

    fn is_nan(value: &Self) -> bool {
        value.is_nan()
    }

    fn serialize(value: &Self, bytes: &mut SketchBytes) {
        bytes.write_f64_le(*value);
    }

    fn deserialize(input: &mut SketchSlice<'_>) -> io::Result<Self> {
        input.read_f64_le()
    }
}

impl QuantilesItem for i64 {
    const SERIALIZED_SIZE: usize = 8;

    fn cmp(a: &Self, b: &Self) -> Ordering {
        Ord::cmp(a, b)
    }

    fn serialize(value: &Self, bytes: &mut SketchBytes) {
        bytes.write_i64_le(*value);
    }

    fn deserialize(input: &mut SketchSlice<'_>) -> io::Result<Self> {
        input.read_i64_le()
    }
}
