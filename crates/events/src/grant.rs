// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::UserDecryptRequestVerification;
use alloy::primitives::{Address, Bytes, Signature, B256};
use anyhow::{anyhow, Result};
use derivative::Derivative;
use serde::{Deserialize, Serialize};

pub const SECONDS_PER_DAY: u64 = 86_400;

/// A holder's time bound permission to decrypt handles within a set of contract scopes.
///
/// The wallet signature covers the ephemeral public key, the scopes and the validity window
/// under a domain bound to `chain_id`. The ephemeral private key never leaves the client.
#[derive(Derivative, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[derivative(Debug)]
pub struct DecryptionGrant {
    /// Sorted and de-duplicated.
    pub contract_addresses: Vec<Address>,
    pub user_address: Address,
    pub chain_id: u64,
    pub public_key: Bytes,
    #[derivative(Debug = "ignore")]
    pub private_key: Bytes,
    pub start_timestamp: u64,
    pub duration_days: u32,
    #[derivative(Debug = "ignore")]
    pub signature: Bytes,
}

impl DecryptionGrant {
    /// Last second (inclusive) at which the grant is honoured.
    pub fn expires_at(&self) -> u64 {
        self.start_timestamp
            .saturating_add(u64::from(self.duration_days).saturating_mul(SECONDS_PER_DAY))
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expires_at()
    }

    pub fn is_active(&self, now: u64) -> bool {
        now >= self.start_timestamp && !self.is_expired(now)
    }

    pub fn is_bound_to(&self, user: Address, chain_id: u64) -> bool {
        self.user_address == user && self.chain_id == chain_id
    }

    pub fn covers(&self, contract: &Address) -> bool {
        self.contract_addresses.binary_search(contract).is_ok()
    }

    pub fn request(&self) -> UserDecryptRequestVerification {
        UserDecryptRequestVerification::for_grant(
            self.public_key.clone(),
            self.contract_addresses.clone(),
            self.start_timestamp,
            self.duration_days,
        )
    }

    pub fn signing_hash(&self) -> B256 {
        self.request().signing_hash(self.chain_id)
    }

    /// Recover the wallet that signed this grant.
    pub fn recover_signer(&self) -> Result<Address> {
        let sig = Signature::try_from(&self.signature[..])
            .map_err(|e| anyhow!("Invalid grant signature: {e}"))?;
        sig.recover_address_from_prehash(&self.signing_hash())
            .map_err(|e| anyhow!("Failed to recover grant signer: {e}"))
    }
}
