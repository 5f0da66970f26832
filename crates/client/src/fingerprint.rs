// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::keccak256;

/// Low 64 bits of `keccak256(utf8(name))`. This is the value a participant encrypts instead
/// of their name.
pub fn fingerprint(name: &str) -> u64 {
    let hash = keccak256(name.as_bytes());
    let mut low = [0u8; 8];
    low.copy_from_slice(&hash[24..]);
    u64::from_be_bytes(low)
}
