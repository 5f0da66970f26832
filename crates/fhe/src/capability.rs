// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::FheError;
use alloy::primitives::Address;
use eld_events::{
    CiphertextHandle, ClearValue, DecryptionGrant, EncryptedInput, FheType, RevealRequestId,
    RevealResponse, Seed,
};
use std::collections::HashMap;
use std::sync::Arc;

pub type FheResult<T> = Result<T, FheError>;

pub type SharedCapability = Arc<dyn CiphertextCapability>;

/// The homomorphic ciphertext capability.
///
/// Callers only ever see [`CiphertextHandle`]s. Plaintext leaves the capability through exactly
/// two doors: the public reveal oracle ([`request_reveal`](Self::request_reveal) followed by
/// [`fulfill_reveal`](Self::fulfill_reveal)) and [`user_decrypt`](Self::user_decrypt), which
/// requires a valid [`DecryptionGrant`].
pub trait CiphertextCapability: Send + Sync {
    /// Chain the capability serves. Input proofs and grants are bound to it.
    fn chain_id(&self) -> u64;

    /// Client side encryption of `value` for use by `caller` inside `contract`.
    fn encrypt(
        &self,
        value: ClearValue,
        contract: Address,
        caller: Address,
    ) -> FheResult<EncryptedInput>;

    /// Check the validity proof of an encrypted input and admit its handle for `contract`.
    fn verify_input(
        &self,
        input: &EncryptedInput,
        contract: Address,
        caller: Address,
    ) -> FheResult<CiphertextHandle>;

    /// Encrypt a public constant.
    fn trivial_encrypt(&self, value: ClearValue) -> FheResult<CiphertextHandle>;

    /// Encrypted uniformly random value of `fhe_type` derived from `seed`.
    fn random(&self, seed: Seed, fhe_type: FheType) -> FheResult<CiphertextHandle>;

    /// `value mod modulus` with a plaintext modulus.
    fn rem_scalar(&self, value: &CiphertextHandle, modulus: u64) -> FheResult<CiphertextHandle>;

    /// Encrypted boolean `value == scalar`.
    fn eq_scalar(&self, value: &CiphertextHandle, scalar: u64) -> FheResult<CiphertextHandle>;

    /// Encrypted boolean `a == b`.
    fn eq(&self, a: &CiphertextHandle, b: &CiphertextHandle) -> FheResult<CiphertextHandle>;

    /// Encrypted multiplexer: `flag ? if_true : if_false`.
    fn select(
        &self,
        flag: &CiphertextHandle,
        if_true: &CiphertextHandle,
        if_false: &CiphertextHandle,
    ) -> FheResult<CiphertextHandle>;

    /// Grant `account` persistent decryption eligibility over `handle`.
    fn allow(&self, handle: &CiphertextHandle, account: Address) -> FheResult<()>;

    fn is_allowed(&self, handle: &CiphertextHandle, account: Address) -> bool;

    /// Ask the oracle to publicly reveal `handles`. `requester` must be allowed on each.
    fn request_reveal(
        &self,
        handles: &[CiphertextHandle],
        requester: Address,
    ) -> FheResult<RevealRequestId>;

    /// Produce the cleartexts for an outstanding reveal request. Each request is answered once.
    fn fulfill_reveal(&self, request_id: RevealRequestId) -> FheResult<RevealResponse>;

    /// Decrypt `(handle, contract)` pairs for the holder of `grant`.
    fn user_decrypt(
        &self,
        handles: &[(CiphertextHandle, Address)],
        grant: &DecryptionGrant,
    ) -> FheResult<HashMap<CiphertextHandle, ClearValue>>;

    /// Single handle form of [`user_decrypt`](Self::user_decrypt).
    fn reveal(
        &self,
        handle: &CiphertextHandle,
        contract: Address,
        grant: &DecryptionGrant,
    ) -> FheResult<ClearValue> {
        self.user_decrypt(&[(*handle, contract)], grant)?
            .remove(handle)
            .ok_or(FheError::UnknownHandle(*handle))
    }
}
