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

use std::ops::RangeInclusive;

use crate::error::Error;

pub(crate) fn ensure_serial_version_in(
    supported: RangeInclusive<u8>,
    serial_version: u8,
) -> Result<(), Error> {
    if supported.contains(&serial_version) {
        Ok(())
    } else {
        Err(Error::unsupported_serial_version(
            *supported.start(),
            *supported.end(),
            serial_version,
        ))
    }
}

pub(crate) fn ensure_preamble_longs_in(expected: &[u8], preamble_longs: u8) -> Result<(), Error> {
    if expected.contains(&preamble_longs) {
        Ok(())
    } else {
        Err(Error::deserial(format!(
            "invalid preamble longs: expected one of {expected:?}, got {preamble_longs}"
        )))
    }
}
