// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{GrantError, GrantKey, GrantSigner, GrantStorage, SessionContext};
use alloy::primitives::{Address, Bytes};
use eld_events::{CiphertextHandle, ClearValue, Clock, DecryptionGrant, SystemClock};
use eld_fhe::{generate_ephemeral_keypair, CiphertextCapability};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, instrument, warn};

pub const DEFAULT_GRANT_DURATION_DAYS: u32 = 365;

/// Issues decryption grants on demand and keeps them in [`GrantStorage`] for reuse.
///
/// Calls for the same [`GrantKey`] are coalesced so a holder is prompted at most once, and a
/// signing prompt that is dropped part way leaves nothing behind.
pub struct GrantManager {
    storage: Arc<dyn GrantStorage>,
    session: SessionContext,
    clock: Arc<dyn Clock>,
    duration_days: u32,
    gates: Gates,
}

impl GrantManager {
    pub fn new(storage: Arc<dyn GrantStorage>, session: SessionContext) -> Self {
        Self {
            storage,
            session,
            clock: Arc::new(SystemClock),
            duration_days: DEFAULT_GRANT_DURATION_DAYS,
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_duration_days(mut self, duration_days: u32) -> Self {
        self.duration_days = duration_days;
        self
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Return a usable grant for `user` over `scopes`, asking `signer` for a new one when the
    /// cached grant is missing, expired or bound to another account or chain.
    #[instrument(name = "load_or_sign", skip_all, fields(%user))]
    pub async fn load_or_sign(
        &self,
        scopes: impl IntoIterator<Item = Address>,
        user: Address,
        signer: Option<&dyn GrantSigner>,
    ) -> Result<DecryptionGrant, GrantError> {
        let signer = signer.ok_or(GrantError::GrantUnavailable)?;
        if signer.address() != user {
            return Err(GrantError::ContextChanged);
        }
        let key = GrantKey::new(scopes, user);
        let storage_key = key.storage_key();
        let chain_id = signer.chain_id();

        if let Some(grant) = self.cached(&key, &storage_key, chain_id).await? {
            return Ok(grant);
        }

        let gate = self.gate(&storage_key);
        let _guard = gate.lock().await;
        // Someone holding the gate before us may have just stored it.
        if let Some(grant) = self.cached(&key, &storage_key, chain_id).await? {
            return Ok(grant);
        }

        let grant = self.sign(&key, chain_id, signer).await?;
        self.storage
            .set(&storage_key, serde_json::to_string(&grant)?)
            .await?;
        info!(
            chain_id,
            scopes = grant.contract_addresses.len(),
            expires_at = grant.expires_at(),
            "decryption grant issued"
        );
        Ok(grant)
    }

    /// Drop the cached grant for `user` over `scopes`.
    pub async fn revoke(
        &self,
        scopes: impl IntoIterator<Item = Address>,
        user: Address,
    ) -> Result<(), GrantError> {
        let key = GrantKey::new(scopes, user);
        self.storage.remove(&key.storage_key()).await?;
        info!(%user, "decryption grant revoked");
        Ok(())
    }

    /// Decrypt `(handle, contract)` pairs with `grant`, provided the account and chain it was
    /// issued for are still the active ones.
    pub fn decrypt_with(
        &self,
        grant: &DecryptionGrant,
        handles: &[(CiphertextHandle, Address)],
        fhe: &dyn CiphertextCapability,
    ) -> Result<HashMap<CiphertextHandle, ClearValue>, GrantError> {
        self.session.ensure(grant.user_address, grant.chain_id)?;
        Ok(fhe.user_decrypt(handles, grant)?)
    }

    async fn cached(
        &self,
        key: &GrantKey,
        storage_key: &str,
        chain_id: u64,
    ) -> Result<Option<DecryptionGrant>, GrantError> {
        let Some(raw) = self.storage.get(storage_key).await? else {
            return Ok(None);
        };
        let grant: DecryptionGrant = match serde_json::from_str(&raw) {
            Ok(grant) => grant,
            Err(err) => {
                warn!(key = storage_key, "discarding unreadable grant: {err}");
                self.storage.remove(storage_key).await?;
                return Ok(None);
            }
        };

        let now = self.clock.now();
        let usable = grant.is_bound_to(key.user(), chain_id)
            && grant.is_active(now)
            && grant.contract_addresses == key.scopes()
            && grant.recover_signer().ok() == Some(key.user());
        if !usable {
            info!(
                key = storage_key,
                chain_id,
                expired = grant.is_expired(now),
                "cached grant is stale"
            );
            return Ok(None);
        }
        Ok(Some(grant))
    }

    async fn sign(
        &self,
        key: &GrantKey,
        chain_id: u64,
        signer: &dyn GrantSigner,
    ) -> Result<DecryptionGrant, GrantError> {
        let (public_key, private_key) = generate_ephemeral_keypair();
        let mut grant = DecryptionGrant {
            contract_addresses: key.scopes(),
            user_address: key.user(),
            chain_id,
            public_key,
            private_key,
            start_timestamp: self.clock.now(),
            duration_days: self.duration_days,
            signature: Bytes::new(),
        };
        let signature = signer.sign_hash(grant.signing_hash()).await?;
        grant.signature = Bytes::from(signature.as_bytes().to_vec());
        Ok(grant)
    }

    fn gate(&self, storage_key: &str) -> GateLease<'_> {
        let gate = self
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(storage_key.to_string())
            .or_default()
            .clone();
        GateLease {
            gates: &self.gates,
            key: storage_key.to_string(),
            gate,
        }
    }
}

type Gates = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// A caller's hold on the signing gate for one key. The last holder removes the gate.
struct GateLease<'a> {
    gates: &'a Gates,
    key: String,
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl GateLease<'_> {
    async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.gate.lock().await
    }
}

impl Drop for GateLease<'_> {
    fn drop(&mut self) {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map and ours.
        if Arc::strong_count(&self.gate) == 2 {
            gates.remove(&self.key);
        }
    }
}
