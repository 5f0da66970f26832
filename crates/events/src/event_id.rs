// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    fmt,
    hash::{Hash, Hasher},
};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub [u8; 32]);

/// Streams every byte written by `Hash` straight into sha256.
struct DigestHasher(Sha256);

impl Hasher for DigestHasher {
    fn write(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    fn finish(&self) -> u64 {
        let digest = self.0.clone().finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(head)
    }
}

impl EventId {
    pub fn hash<T: Hash>(value: T) -> Self {
        let mut hasher = DigestHasher(Sha256::new());
        value.hash(&mut hasher);
        EventId(hasher.0.finalize().into())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = bs58::encode(&self.0).into_string();
        write!(f, "evt:{}", &encoded[..8.min(encoded.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::EventId;

    #[test]
    fn equal_values_share_an_id() {
        assert_eq!(EventId::hash(("draw", 1u32)), EventId::hash(("draw", 1u32)));
        assert_ne!(EventId::hash(("draw", 1u32)), EventId::hash(("draw", 2u32)));
    }

    #[test]
    fn display_is_short_base58() {
        let id = EventId::hash(42u64).to_string();
        assert!(id.starts_with("evt:"));
        assert_eq!(id.len(), 12);
    }
}
