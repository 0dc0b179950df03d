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

//! Hash functions used to place keys in hash tables.

/// Default seed for key hashing.
pub(crate) const DEFAULT_SEED: u32 = 9001;

/// Hashes a 64-bit key with MurmurHash3 x64/128 and returns the first half
/// of the 128-bit result.
pub(crate) fn hash_i64(key: i64, seed: u32) -> u64 {
    let (h1, _) = mur3::murmurhash3_x64_128(&key.to_le_bytes(), seed);
    h1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_murmur_reference_vectors() {
        // test a remainder < 8
        let key = "The quick brown fox jumps over the lazy dogdogdog";
        let (h1, h2) = mur3::murmurhash3_x64_128(key.as_bytes(), 0);
        assert_eq!(h1, 0x9c8205300e612fc4);
        assert_eq!(h2, 0xcbc0af6136aa3df9);

        // test a remainder = 0
        let key = "The quick brown fox jumps over t";
        let (h1, h2) = mur3::murmurhash3_x64_128(key.as_bytes(), 0);
        assert_eq!(h1, 0xdf6af91bb29bdacf);
        assert_eq!(h2, 0x91a341c58df1f3a6);
    }

    #[test]
    fn test_hash_i64_depends_on_seed() {
        assert_eq!(hash_i64(17, DEFAULT_SEED), hash_i64(17, DEFAULT_SEED));
        assert_ne!(hash_i64(17, DEFAULT_SEED), hash_i64(17, 0));
        assert_ne!(hash_i64(17, DEFAULT_SEED), hash_i64(18, DEFAULT_SEED));
    }
}
