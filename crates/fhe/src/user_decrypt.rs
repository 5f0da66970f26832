// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::FheError;
use alloy::primitives::Bytes;
use ed25519_dalek::SigningKey;
use eld_events::DecryptionGrant;
use rand::rngs::OsRng;

/// Fresh ephemeral key pair for a decryption grant, as `(public, private)`.
pub fn generate_ephemeral_keypair() -> (Bytes, Bytes) {
    let signing_key = SigningKey::generate(&mut OsRng);
    (
        Bytes::from(signing_key.verifying_key().to_bytes().to_vec()),
        Bytes::from(signing_key.to_bytes().to_vec()),
    )
}

pub fn ephemeral_public_key(private_key: &[u8]) -> Result<Bytes, FheError> {
    let secret: [u8; 32] = private_key
        .try_into()
        .map_err(|_| FheError::InvalidGrant("ephemeral private key must be 32 bytes".into()))?;
    let signing_key = SigningKey::from_bytes(&secret);
    Ok(Bytes::from(signing_key.verifying_key().to_bytes().to_vec()))
}

/// Everything about a grant that does not depend on the handles being decrypted.
pub(crate) fn validate_grant(
    grant: &DecryptionGrant,
    chain_id: u64,
    now: u64,
) -> Result<(), FheError> {
    if grant.chain_id != chain_id {
        return Err(FheError::InvalidGrant(format!(
            "grant is bound to chain {} but this coprocessor serves chain {}",
            grant.chain_id, chain_id
        )));
    }

    let signer = grant
        .recover_signer()
        .map_err(|e| FheError::InvalidGrant(e.to_string()))?;
    if signer != grant.user_address {
        return Err(FheError::InvalidGrant(format!(
            "grant was signed by {signer}, not {}",
            grant.user_address
        )));
    }

    if grant.is_expired(now) {
        return Err(FheError::Expired {
            expires_at: grant.expires_at(),
            now,
        });
    }
    if now < grant.start_timestamp {
        return Err(FheError::InvalidGrant(format!(
            "grant is not valid before {}",
            grant.start_timestamp
        )));
    }

    if ephemeral_public_key(&grant.private_key)? != grant.public_key {
        return Err(FheError::InvalidGrant(
            "ephemeral key pair does not match".into(),
        ));
    }

    Ok(())
}
