// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::acl::Acl;
use crate::user_decrypt::validate_grant;
use crate::{CiphertextCapability, FheError, FheResult};
use alloy::primitives::{keccak256, Address, Bytes, Signature};
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use eld_crypto::{Cipher, SealedBytes};
use eld_events::{
    CiphertextHandle, CiphertextVerification, ClearValue, Clock, DecryptionGrant, EncryptedInput,
    FheType, RevealRequestId, RevealResponse, Seed, SystemClock,
};
use rand::{rngs::OsRng, RngCore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

struct PendingReveal {
    handles: Vec<CiphertextHandle>,
    requester: Address,
}

#[derive(Default)]
struct Store {
    ciphertexts: HashMap<CiphertextHandle, SealedBytes>,
    acl: Acl,
    reveals: HashMap<RevealRequestId, PendingReveal>,
    next_reveal: u64,
}

/// In-process model of the ciphertext capability.
///
/// Values are kept sealed under AES-256-GCM and addressed by typed handles. Input proofs are
/// EIP-712 signatures by an input verifier key, the ACL is tracked per handle, and user
/// decryption enforces every grant check a real coprocessor would (signature, chain, scope,
/// ACL, validity window and possession of the ephemeral key). It does not compute on
/// ciphertexts: homomorphic operations open their operands internally and seal the result
/// under a fresh handle, so nothing observable to a caller depends on the plaintext.
pub struct LocalCoprocessor {
    chain_id: u64,
    instance: [u8; 32],
    cipher: Cipher,
    input_verifier: PrivateKeySigner,
    clock: Arc<dyn Clock>,
    counter: AtomicU64,
    store: RwLock<Store>,
}

fn storage_err(e: impl ToString) -> FheError {
    FheError::Storage(e.to_string())
}

fn int_value(fhe_type: FheType, value: u64) -> ClearValue {
    match fhe_type {
        FheType::Uint32 => ClearValue::Uint32(value as u32),
        _ => ClearValue::Uint64(value),
    }
}

impl LocalCoprocessor {
    /// Coprocessor with a random sealing key and a random input verifier.
    pub fn new(chain_id: u64) -> anyhow::Result<Self> {
        Ok(Self::with_cipher(chain_id, Cipher::random()?))
    }

    pub fn with_cipher(chain_id: u64, cipher: Cipher) -> Self {
        let mut instance = [0u8; 32];
        OsRng.fill_bytes(&mut instance);
        Self {
            chain_id,
            instance,
            cipher,
            input_verifier: PrivateKeySigner::random(),
            clock: Arc::new(SystemClock),
            counter: AtomicU64::new(0),
            store: RwLock::new(Store::default()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_input_verifier(mut self, signer: PrivateKeySigner) -> Self {
        self.input_verifier = signer;
        self
    }

    pub fn input_verifier(&self) -> Address {
        self.input_verifier.address()
    }

    fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_handle(&self, fhe_type: FheType) -> CiphertextHandle {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let mut preimage = Vec::with_capacity(48);
        preimage.extend_from_slice(&self.instance);
        preimage.extend_from_slice(&self.chain_id.to_be_bytes());
        preimage.extend_from_slice(&n.to_be_bytes());
        CiphertextHandle::derive(&preimage, fhe_type)
    }

    fn store_value(&self, value: ClearValue) -> FheResult<CiphertextHandle> {
        let handle = self.next_handle(value.fhe_type());
        let bytes = bincode::serialize(&value).map_err(storage_err)?;
        let sealed = SealedBytes::new(bytes, &self.cipher).map_err(storage_err)?;
        self.write().ciphertexts.insert(handle, sealed);
        Ok(handle)
    }

    fn load(&self, handle: &CiphertextHandle) -> FheResult<ClearValue> {
        let sealed = self
            .read()
            .ciphertexts
            .get(handle)
            .cloned()
            .ok_or(FheError::UnknownHandle(*handle))?;
        let bytes = sealed.access(&self.cipher).map_err(storage_err)?;
        bincode::deserialize(&bytes).map_err(storage_err)
    }

    fn load_int(&self, handle: &CiphertextHandle, op: &'static str) -> FheResult<(FheType, u64)> {
        let value = self.load(handle)?;
        match value.as_u64() {
            Some(v) => Ok((value.fhe_type(), v)),
            None => Err(FheError::Unsupported {
                op,
                fhe_type: value.fhe_type(),
            }),
        }
    }

    fn input_digest(
        &self,
        handle: &CiphertextHandle,
        contract: Address,
        caller: Address,
    ) -> alloy::primitives::B256 {
        CiphertextVerification::for_input(vec![handle.as_b256()], caller, contract, self.chain_id)
            .signing_hash(self.chain_id)
    }
}

impl CiphertextCapability for LocalCoprocessor {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn encrypt(
        &self,
        value: ClearValue,
        contract: Address,
        caller: Address,
    ) -> FheResult<EncryptedInput> {
        let handle = self.store_value(value)?;
        let signature = self
            .input_verifier
            .sign_hash_sync(&self.input_digest(&handle, contract, caller))
            .map_err(|e| FheError::InvalidProof(format!("could not sign input: {e}")))?;

        Ok(EncryptedInput {
            handle,
            proof: Bytes::from(signature.as_bytes().to_vec()),
        })
    }

    fn verify_input(
        &self,
        input: &EncryptedInput,
        contract: Address,
        caller: Address,
    ) -> FheResult<CiphertextHandle> {
        let signature = Signature::try_from(&input.proof[..])
            .map_err(|e| FheError::InvalidProof(e.to_string()))?;
        let signer = signature
            .recover_address_from_prehash(&self.input_digest(&input.handle, contract, caller))
            .map_err(|e| FheError::InvalidProof(e.to_string()))?;
        if signer != self.input_verifier.address() {
            return Err(FheError::InvalidProof(format!(
                "proof for {} was not issued for caller {caller} on {contract}",
                input.handle
            )));
        }

        let mut store = self.write();
        if !store.ciphertexts.contains_key(&input.handle) {
            return Err(FheError::UnknownHandle(input.handle));
        }
        store.acl.allow(input.handle, contract);
        debug!(handle = %input.handle, %contract, %caller, "input verified");
        Ok(input.handle)
    }

    fn trivial_encrypt(&self, value: ClearValue) -> FheResult<CiphertextHandle> {
        self.store_value(value)
    }

    fn random(&self, seed: Seed, fhe_type: FheType) -> FheResult<CiphertextHandle> {
        // Derived from public data only, so equal seeds on one chain give equal values.
        let mut preimage = Vec::with_capacity(40);
        preimage.extend_from_slice(&self.chain_id.to_be_bytes());
        preimage.extend_from_slice(seed.as_bytes());
        let digest = keccak256(&preimage);

        let mut word = [0u8; 8];
        word.copy_from_slice(&digest[..8]);
        let raw = u64::from_be_bytes(word);
        let value = match fhe_type {
            FheType::Bool => ClearValue::Bool(raw & 1 == 1),
            FheType::Uint32 => ClearValue::Uint32((raw >> 32) as u32),
            FheType::Uint64 => ClearValue::Uint64(raw),
            FheType::Address => {
                return Err(FheError::Unsupported {
                    op: "random",
                    fhe_type,
                })
            }
        };
        self.store_value(value)
    }

    fn rem_scalar(&self, value: &CiphertextHandle, modulus: u64) -> FheResult<CiphertextHandle> {
        if modulus == 0 {
            return Err(FheError::DivisionByZero);
        }
        let (fhe_type, v) = self.load_int(value, "rem")?;
        self.store_value(int_value(fhe_type, v % modulus))
    }

    fn eq_scalar(&self, value: &CiphertextHandle, scalar: u64) -> FheResult<CiphertextHandle> {
        let (_, v) = self.load_int(value, "eq")?;
        self.store_value(ClearValue::Bool(v == scalar))
    }

    fn eq(&self, a: &CiphertextHandle, b: &CiphertextHandle) -> FheResult<CiphertextHandle> {
        let lhs = self.load(a)?;
        let rhs = self.load(b)?;
        if lhs.fhe_type() != rhs.fhe_type() {
            return Err(FheError::TypeMismatch {
                handle: *b,
                expected: lhs.fhe_type(),
                found: rhs.fhe_type(),
            });
        }
        self.store_value(ClearValue::Bool(lhs == rhs))
    }

    fn select(
        &self,
        flag: &CiphertextHandle,
        if_true: &CiphertextHandle,
        if_false: &CiphertextHandle,
    ) -> FheResult<CiphertextHandle> {
        let condition = self.load(flag)?;
        let Some(condition) = condition.as_bool() else {
            return Err(FheError::TypeMismatch {
                handle: *flag,
                expected: FheType::Bool,
                found: condition.fhe_type(),
            });
        };
        let a = self.load(if_true)?;
        let b = self.load(if_false)?;
        if a.fhe_type() != b.fhe_type() {
            return Err(FheError::TypeMismatch {
                handle: *if_false,
                expected: a.fhe_type(),
                found: b.fhe_type(),
            });
        }
        self.store_value(if condition { a } else { b })
    }

    fn allow(&self, handle: &CiphertextHandle, account: Address) -> FheResult<()> {
        let mut store = self.write();
        if !store.ciphertexts.contains_key(handle) {
            return Err(FheError::UnknownHandle(*handle));
        }
        store.acl.allow(*handle, account);
        Ok(())
    }

    fn is_allowed(&self, handle: &CiphertextHandle, account: Address) -> bool {
        self.read().acl.is_allowed(handle, &account)
    }

    fn request_reveal(
        &self,
        handles: &[CiphertextHandle],
        requester: Address,
    ) -> FheResult<RevealRequestId> {
        let mut store = self.write();
        for handle in handles {
            if !store.ciphertexts.contains_key(handle) {
                return Err(FheError::UnknownHandle(*handle));
            }
            if !store.acl.is_allowed(handle, &requester) {
                return Err(FheError::Unauthorized {
                    handle: *handle,
                    account: requester,
                });
            }
        }

        store.next_reveal += 1;
        let request_id = RevealRequestId(store.next_reveal);
        store.reveals.insert(
            request_id,
            PendingReveal {
                handles: handles.to_vec(),
                requester,
            },
        );
        debug!(request = %request_id, %requester, count = handles.len(), "reveal requested");
        Ok(request_id)
    }

    fn fulfill_reveal(&self, request_id: RevealRequestId) -> FheResult<RevealResponse> {
        let pending = self
            .write()
            .reveals
            .remove(&request_id)
            .ok_or(FheError::UnknownRevealRequest(request_id))?;

        let cleartexts = pending
            .handles
            .iter()
            .map(|handle| Ok((*handle, self.load(handle)?)))
            .collect::<FheResult<Vec<_>>>()?;

        info!(request = %request_id, requester = %pending.requester, "reveal fulfilled");
        Ok(RevealResponse {
            request_id,
            cleartexts,
        })
    }

    fn user_decrypt(
        &self,
        handles: &[(CiphertextHandle, Address)],
        grant: &DecryptionGrant,
    ) -> FheResult<HashMap<CiphertextHandle, ClearValue>> {
        validate_grant(grant, self.chain_id, self.clock.now())?;

        {
            let store = self.read();
            for (handle, contract) in handles {
                if !grant.covers(contract) {
                    return Err(FheError::OutOfScope(*contract));
                }
                for account in [grant.user_address, *contract] {
                    if !store.acl.is_allowed(handle, &account) {
                        return Err(FheError::Unauthorized {
                            handle: *handle,
                            account,
                        });
                    }
                }
            }
        }

        let mut out = HashMap::with_capacity(handles.len());
        for (handle, _) in handles {
            out.insert(*handle, self.load(handle)?);
        }
        debug!(user = %grant.user_address, count = out.len(), "user decryption served");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_ephemeral_keypair;
    use eld_events::ManualClock;

    const CHAIN: u64 = 31337;

    fn contract() -> Address {
        Address::repeat_byte(0xc0)
    }

    fn coprocessor() -> LocalCoprocessor {
        LocalCoprocessor::new(CHAIN).unwrap()
    }

    fn grant_for(
        signer: &PrivateKeySigner,
        contracts: Vec<Address>,
        chain_id: u64,
        start: u64,
        days: u32,
    ) -> DecryptionGrant {
        let (public_key, private_key) = generate_ephemeral_keypair();
        let mut contract_addresses = contracts;
        contract_addresses.sort();
        let mut grant = DecryptionGrant {
            contract_addresses,
            user_address: signer.address(),
            chain_id,
            public_key,
            private_key,
            start_timestamp: start,
            duration_days: days,
            signature: Bytes::new(),
        };
        let sig = signer.sign_hash_sync(&grant.signing_hash()).unwrap();
        grant.signature = Bytes::from(sig.as_bytes().to_vec());
        grant
    }

    #[test]
    fn verified_input_is_allowed_to_contract() {
        let fhe = coprocessor();
        let alice = Address::repeat_byte(0xa1);
        let input = fhe.encrypt(ClearValue::Uint64(42), contract(), alice).unwrap();

        assert!(!fhe.is_allowed(&input.handle, contract()));
        let handle = fhe.verify_input(&input, contract(), alice).unwrap();
        assert_eq!(handle.fhe_type(), Some(FheType::Uint64));
        assert!(fhe.is_allowed(&handle, contract()));
    }

    #[test]
    fn proof_is_bound_to_caller_and_contract() {
        let fhe = coprocessor();
        let alice = Address::repeat_byte(0xa1);
        let bob = Address::repeat_byte(0xb0);
        let input = fhe.encrypt(ClearValue::Uint64(1), contract(), alice).unwrap();

        assert!(matches!(
            fhe.verify_input(&input, contract(), bob),
            Err(FheError::InvalidProof(_))
        ));
        assert!(matches!(
            fhe.verify_input(&input, Address::repeat_byte(0x01), alice),
            Err(FheError::InvalidProof(_))
        ));

        let mut tampered = input.clone();
        tampered.proof = Bytes::from(vec![0u8; 3]);
        assert!(matches!(
            fhe.verify_input(&tampered, contract(), alice),
            Err(FheError::InvalidProof(_))
        ));
    }

    #[test]
    fn proof_from_another_coprocessor_is_rejected() {
        let ours = coprocessor();
        let theirs = coprocessor();
        let alice = Address::repeat_byte(0xa1);
        let input = theirs.encrypt(ClearValue::Uint64(1), contract(), alice).unwrap();
        assert!(matches!(
            ours.verify_input(&input, contract(), alice),
            Err(FheError::InvalidProof(_))
        ));
    }

    #[test]
    fn arithmetic_is_typed() {
        let fhe = coprocessor();
        let me = contract();
        let seven = fhe.trivial_encrypt(ClearValue::Uint32(7)).unwrap();
        let rem = fhe.rem_scalar(&seven, 3).unwrap();
        assert_eq!(rem.fhe_type(), Some(FheType::Uint32));

        let is_one = fhe.eq_scalar(&rem, 1).unwrap();
        let is_two = fhe.eq_scalar(&rem, 2).unwrap();
        let a = fhe.trivial_encrypt(ClearValue::Address(Address::repeat_byte(0xaa))).unwrap();
        let b = fhe.trivial_encrypt(ClearValue::Address(Address::repeat_byte(0xbb))).unwrap();
        let picked = fhe.select(&is_one, &a, &b).unwrap();
        let not_picked = fhe.select(&is_two, &a, &b).unwrap();
        assert_ne!(picked, a);

        fhe.allow(&picked, me).unwrap();
        fhe.allow(&not_picked, me).unwrap();
        let id = fhe.request_reveal(&[picked, not_picked], me).unwrap();
        let response = fhe.fulfill_reveal(id).unwrap();
        assert_eq!(
            response.value_of(&picked),
            Some(ClearValue::Address(Address::repeat_byte(0xaa)))
        );
        assert_eq!(
            response.value_of(&not_picked),
            Some(ClearValue::Address(Address::repeat_byte(0xbb)))
        );

        assert_eq!(fhe.rem_scalar(&seven, 0), Err(FheError::DivisionByZero));
        assert!(matches!(
            fhe.select(&seven, &a, &b),
            Err(FheError::TypeMismatch { .. })
        ));
        assert!(matches!(
            fhe.select(&is_one, &a, &seven),
            Err(FheError::TypeMismatch { .. })
        ));
        assert!(matches!(
            fhe.rem_scalar(&a, 2),
            Err(FheError::Unsupported { op: "rem", .. })
        ));
    }

    #[test]
    fn random_is_determined_by_seed_and_chain() {
        let me = contract();
        let seed = Seed([9u8; 32]);
        let value_of = |fhe: &LocalCoprocessor, seed: Seed| {
            let r = fhe.random(seed, FheType::Uint32).unwrap();
            fhe.allow(&r, me).unwrap();
            let id = fhe.request_reveal(&[r], me).unwrap();
            fhe.fulfill_reveal(id).unwrap().value_of(&r).unwrap()
        };

        let first = coprocessor();
        let second = coprocessor();
        assert_eq!(value_of(&first, seed), value_of(&first, seed));
        assert_eq!(value_of(&first, seed), value_of(&second, seed));

        let other_chain = LocalCoprocessor::new(CHAIN + 1).unwrap();
        assert_ne!(value_of(&first, seed), value_of(&other_chain, seed));
        assert!(first.random(seed, FheType::Address).is_err());
    }

    #[test]
    fn reveal_requires_allowance_and_is_answered_once() {
        let fhe = coprocessor();
        let h = fhe.trivial_encrypt(ClearValue::Uint64(5)).unwrap();
        assert!(matches!(
            fhe.request_reveal(&[h], contract()),
            Err(FheError::Unauthorized { .. })
        ));
        fhe.allow(&h, contract()).unwrap();
        let id = fhe.request_reveal(&[h], contract()).unwrap();
        assert!(fhe.fulfill_reveal(id).is_ok());
        assert_eq!(
            fhe.fulfill_reveal(id),
            Err(FheError::UnknownRevealRequest(id))
        );
    }

    #[test]
    fn user_decrypt_checks_grant() {
        let clock = Arc::new(ManualClock::new(10_000));
        let fhe = coprocessor().with_clock(clock.clone());
        let holder = PrivateKeySigner::random();
        let h = fhe.trivial_encrypt(ClearValue::Uint64(77)).unwrap();
        fhe.allow(&h, contract()).unwrap();

        let grant = grant_for(&holder, vec![contract()], CHAIN, 10_000, 1);

        // holder not yet on the ACL
        assert!(matches!(
            fhe.user_decrypt(&[(h, contract())], &grant),
            Err(FheError::Unauthorized { .. })
        ));
        fhe.allow(&h, holder.address()).unwrap();
        assert_eq!(fhe.reveal(&h, contract(), &grant).unwrap(), ClearValue::Uint64(77));

        // scope
        let other = Address::repeat_byte(0x0f);
        assert_eq!(
            fhe.user_decrypt(&[(h, other)], &grant),
            Err(FheError::OutOfScope(other))
        );

        // chain
        let foreign = grant_for(&holder, vec![contract()], 1, 10_000, 1);
        assert!(matches!(
            fhe.user_decrypt(&[(h, contract())], &foreign),
            Err(FheError::InvalidGrant(_))
        ));

        // forged user
        let mut forged = grant.clone();
        forged.user_address = Address::repeat_byte(0x99);
        assert!(matches!(
            fhe.user_decrypt(&[(h, contract())], &forged),
            Err(FheError::InvalidGrant(_))
        ));

        // ephemeral key possession
        let mut swapped = grant.clone();
        swapped.private_key = generate_ephemeral_keypair().1;
        assert!(matches!(
            fhe.user_decrypt(&[(h, contract())], &swapped),
            Err(FheError::InvalidGrant(_))
        ));

        // expiry
        clock.advance(86_400 + 1);
        assert!(matches!(
            fhe.user_decrypt(&[(h, contract())], &grant),
            Err(FheError::Expired { .. })
        ));
    }

    #[test]
    fn sealing_with_password_works() {
        let cipher = Cipher::from_password("local-coprocessor").unwrap();
        let fhe = LocalCoprocessor::with_cipher(CHAIN, cipher);
        let h = fhe.trivial_encrypt(ClearValue::Bool(true)).unwrap();
        fhe.allow(&h, contract()).unwrap();
        let id = fhe.request_reveal(&[h], contract()).unwrap();
        assert_eq!(
            fhe.fulfill_reveal(id).unwrap().cleartexts,
            vec![(h, ClearValue::Bool(true))]
        );
    }
}
