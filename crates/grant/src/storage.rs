// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::GrantError;
use alloy::hex;
use alloy::primitives::{keccak256, Address};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};

/// Identifies a cached grant: the holder and the exact set of contracts it covers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GrantKey {
    scopes: BTreeSet<Address>,
    user: Address,
}

impl GrantKey {
    pub fn new(scopes: impl IntoIterator<Item = Address>, user: Address) -> Self {
        Self {
            scopes: scopes.into_iter().collect(),
            user,
        }
    }

    pub fn user(&self) -> Address {
        self.user
    }

    /// Sorted and de-duplicated.
    pub fn scopes(&self) -> Vec<Address> {
        self.scopes.iter().copied().collect()
    }

    pub fn storage_key(&self) -> String {
        let mut preimage = Vec::with_capacity(self.scopes.len() * 20);
        for scope in &self.scopes {
            preimage.extend_from_slice(scope.as_slice());
        }
        format!(
            "eld:grant:{}:{}",
            hex::encode(self.user),
            hex::encode(&keccak256(preimage)[..8])
        )
    }
}

/// String key/value persistence for serialized grants.
#[async_trait]
pub trait GrantStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, GrantError>;
    async fn set(&self, key: &str, value: String) -> Result<(), GrantError>;
    async fn remove(&self, key: &str) -> Result<(), GrantError>;
}

#[derive(Debug, Default)]
pub struct InMemoryGrantStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryGrantStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl GrantStorage for InMemoryGrantStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, GrantError> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), GrantError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), GrantError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_ignores_scope_order_and_duplicates() {
        let user = Address::repeat_byte(0xa1);
        let a = GrantKey::new([Address::repeat_byte(2), Address::repeat_byte(1)], user);
        let b = GrantKey::new(
            [
                Address::repeat_byte(1),
                Address::repeat_byte(2),
                Address::repeat_byte(1),
            ],
            user,
        );
        assert_eq!(a.storage_key(), b.storage_key());
        assert_eq!(a.scopes(), vec![Address::repeat_byte(1), Address::repeat_byte(2)]);

        let other_user = GrantKey::new([Address::repeat_byte(1)], Address::repeat_byte(0xb0));
        let fewer = GrantKey::new([Address::repeat_byte(1)], user);
        assert_ne!(fewer.storage_key(), other_user.storage_key());
        assert_ne!(fewer.storage_key(), a.storage_key());
    }

    #[tokio::test]
    async fn in_memory_storage_round_trips() {
        let storage = InMemoryGrantStorage::new();
        assert_eq!(storage.get("k").await.unwrap(), None);
        storage.set("k", "v".into()).await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("v"));
        storage.remove("k").await.unwrap();
        assert!(storage.is_empty());
    }
}
