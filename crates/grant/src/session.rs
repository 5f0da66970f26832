// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::GrantError;
use alloy::primitives::Address;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveAccount {
    pub address: Address,
    pub chain_id: u64,
}

/// The account and chain the application is currently acting for. Cloned handles observe the
/// same state, so a switch made anywhere is seen by in-flight decryptions.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Option<ActiveAccount>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connected(address: Address, chain_id: u64) -> Self {
        let session = Self::new();
        session.connect(address, chain_id);
        session
    }

    pub fn connect(&self, address: Address, chain_id: u64) {
        info!(%address, chain_id, "session connected");
        *self.write() = Some(ActiveAccount { address, chain_id });
    }

    pub fn switch_account(&self, address: Address) {
        let mut active = self.write();
        if let Some(account) = active.as_mut() {
            info!(from = %account.address, to = %address, "account switched");
            account.address = address;
        }
    }

    pub fn switch_chain(&self, chain_id: u64) {
        let mut active = self.write();
        if let Some(account) = active.as_mut() {
            info!(from = account.chain_id, to = chain_id, "chain switched");
            account.chain_id = chain_id;
        }
    }

    pub fn disconnect(&self) {
        info!("session disconnected");
        *self.write() = None;
    }

    pub fn current(&self) -> Option<ActiveAccount> {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fails with [`GrantError::ContextChanged`] unless `address` on `chain_id` is still active.
    pub fn ensure(&self, address: Address, chain_id: u64) -> Result<(), GrantError> {
        match self.current() {
            Some(active) if active == ActiveAccount { address, chain_id } => Ok(()),
            _ => Err(GrantError::ContextChanged),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Option<ActiveAccount>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
