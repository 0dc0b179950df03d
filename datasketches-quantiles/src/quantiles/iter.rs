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
use super::level_store::LevelStore;

/// Position of a [`QuantilesSketchIter`].
#[derive(Debug, Clone, Copy)]
enum Cursor {
    NotStarted,
    BaseBuffer { index: usize },
    Level { position: usize, index: usize },
    Exhausted,
}

/// Iterator over the raw retained items of a sketch and their weights.
///
/// Visits the base buffer first, in storage order with weight 1, then each
/// populated level in ascending order with weight `2^(level + 1)`. Items are
/// not ordered by value; use [`SortedView`](super::SortedView) for that.
#[derive(Debug, Clone)]
pub struct QuantilesSketchIter<'a, T> {
    base_buffer: &'a [T],
    levels: Vec<(usize, &'a [T])>,
    cursor: Cursor,
}

#[allow(private_bounds)]
impl<'a, T: QuantilesItem> QuantilesSketchIter<'a, T> {
    pub(super) fn new(store: &'a LevelStore<T>) -> Self {
        Self {
            base_buffer: store.base_buffer(),
            levels: store.levels().collect(),
            cursor: Cursor::NotStarted,
        }
    }
}

impl<T> QuantilesSketchIter<'_, T> {
    fn advance(&self, cursor: Cursor) -> Cursor {
        match cursor {
            Cursor::NotStarted => {
                if !self.base_buffer.is_empty() {
                    Cursor::BaseBuffer { index: 0 }
                } else {
                    self.first_in_level(0)
                }
            }
            Cursor::BaseBuffer { index } if index + 1 < self.base_buffer.len() => {
                Cursor::BaseBuffer { index: index + 1 }
            }
            Cursor::BaseBuffer { .. } => self.first_in_level(0),
            Cursor::Level { position, index } if index + 1 < self.levels[position].1.len() => {
                Cursor::Level {
                    position,
                    index: index + 1,
                }
            }
            Cursor::Level { position, .. } => self.first_in_level(position + 1),
            Cursor::Exhausted => Cursor::Exhausted,
        }
    }

    fn first_in_level(&self, position: usize) -> Cursor {
        if position < self.levels.len() {
            Cursor::Level { position, index: 0 }
        } else {
            Cursor::Exhausted
        }
    }
}

impl<T: Copy> Iterator for QuantilesSketchIter<'_, T> {
    type Item = (T, u64);

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor = self.advance(self.cursor);
        match self.cursor {
            Cursor::BaseBuffer { index } => Some((self.base_buffer[index], 1)),
            Cursor::Level { position, index } => {
                let (level, items) = self.levels[position];
                Some((items[index], 2u64 << level))
            }
            Cursor::NotStarted | Cursor::Exhausted => None,
        }
    }
}
