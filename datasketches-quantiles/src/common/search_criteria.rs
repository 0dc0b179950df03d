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

/// Selects whether the weight of an item equal to the query boundary counts
/// toward a cumulative weight or normalized rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuantileSearchCriteria {
    /// The boundary item's own weight is included.
    #[default]
    Inclusive,
    /// Only the weight strictly before the boundary item is counted.
    NonInclusive,
}

impl QuantileSearchCriteria {
    /// Returns true for [`QuantileSearchCriteria::Inclusive`].
    pub fn is_inclusive(self) -> bool {
        matches!(self, QuantileSearchCriteria::Inclusive)
    }
}
