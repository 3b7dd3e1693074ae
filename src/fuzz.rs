// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Interval fuzz. Cards reviewed together would otherwise come due together,
//! so review intervals are nudged by a few percent. The nudge is a hash of
//! the card id and the review index: the same review always lands on the
//! same day.

use crate::types::card_id::CardId;

/// Intervals shorter than this are never fuzzed.
const MIN_FUZZ_DAYS: u32 = 3;

/// A uniform value in `[0, 1)` derived from the card and review index.
pub fn unit(id: CardId, review_index: u32) -> f64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"fuzz");
    hasher.update(id.as_bytes());
    hasher.update(&review_index.to_le_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    // Keep the top 53 bits so the conversion to f64 is exact.
    let bits = u64::from_le_bytes(bytes) >> 11;
    bits as f64 / (1u64 << 53) as f64
}

/// Spread `days` by up to `factor` of itself in either direction (at least
/// one day). The result is not clamped.
pub fn fuzz_interval(days: u32, id: CardId, review_index: u32, factor: f64) -> u32 {
    if days < MIN_FUZZ_DAYS || factor <= 0.0 {
        return days;
    }
    let spread = (f64::from(days) * factor).max(1.0);
    let offset = (2.0 * unit(id, review_index) - 1.0) * spread;
    (f64::from(days) + offset).round().max(1.0) as u32
}
