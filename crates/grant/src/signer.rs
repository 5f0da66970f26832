// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::GrantError;
use alloy::primitives::{Address, Signature, B256};
use alloy::signers::{local::PrivateKeySigner, Signer};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tracing::info;

/// A wallet able to sign the typed-data hash of a decryption grant.
#[async_trait]
pub trait GrantSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Chain the wallet is currently connected to.
    fn chain_id(&self) -> u64;

    async fn sign_hash(&self, hash: B256) -> Result<Signature, GrantError>;
}

/// In-process wallet backed by a local private key.
///
/// The chain can be switched at runtime and signing prompts can be refused, which is enough to
/// drive every grant path without a browser wallet.
#[derive(Debug)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
    chain_id: AtomicU64,
    approves: AtomicBool,
    signatures: AtomicUsize,
}

impl LocalWallet {
    pub fn new(signer: PrivateKeySigner, chain_id: u64) -> Self {
        Self {
            signer,
            chain_id: AtomicU64::new(chain_id),
            approves: AtomicBool::new(true),
            signatures: AtomicUsize::new(0),
        }
    }

    pub fn random(chain_id: u64) -> Self {
        Self::new(PrivateKeySigner::random(), chain_id)
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    pub fn switch_chain(&self, chain_id: u64) {
        info!(wallet = %self.signer.address(), chain_id, "switched chain");
        self.chain_id.store(chain_id, Ordering::SeqCst);
    }

    /// Whether future signing prompts are accepted.
    pub fn set_approval(&self, approves: bool) {
        self.approves.store(approves, Ordering::SeqCst);
    }

    /// Number of signatures this wallet has produced.
    pub fn signature_count(&self) -> usize {
        self.signatures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GrantSigner for LocalWallet {
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn chain_id(&self) -> u64 {
        self.chain_id.load(Ordering::SeqCst)
    }

    async fn sign_hash(&self, hash: B256) -> Result<Signature, GrantError> {
        if !self.approves.load(Ordering::SeqCst) {
            return Err(GrantError::SignatureDeclined(
                "user rejected the request".into(),
            ));
        }
        let signature = self
            .signer
            .sign_hash(&hash)
            .await
            .map_err(|e| GrantError::SignatureDeclined(e.to_string()))?;
        self.signatures.fetch_add(1, Ordering::SeqCst);
        Ok(signature)
    }
}
