// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::{rngs::OsRng, RngCore};
use zeroize::{Zeroize, Zeroizing};

// ARGON2 PARAMS
// https://cheatsheetseries.owasp.org/cheatsheets/Password_Storage_Cheat_Sheet.html
const ARGON2_M_COST: u32 = 19 * 1024; // 19 MiB
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;
const ARGON2_OUTPUT_LEN: usize = 32;
const ARGON2_ALGORITHM: Algorithm = Algorithm::Argon2id;
const ARGON2_VERSION: Version = Version::V0x13;

// AES PARAMS
pub(crate) const SALT_LEN: usize = 32;
pub(crate) const NONCE_LEN: usize = 12;

/// Derives a 256 bit key from a password with Argon2id.
fn argon2_derive_key(password: &[u8], salt: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let mut derived_key = Zeroizing::new(vec![0u8; ARGON2_OUTPUT_LEN]);
    let params = Params::new(
        ARGON2_M_COST,
        ARGON2_T_COST,
        ARGON2_P_COST,
        Some(ARGON2_OUTPUT_LEN),
    )
    .map_err(|_| anyhow!("Could not create params"))?;

    Argon2::new(ARGON2_ALGORITHM, ARGON2_VERSION, params)
        .hash_password_into(password, salt, &mut derived_key)
        .map_err(|_| anyhow!("Key derivation error"))?;

    Ok(derived_key)
}

/// AES-256-GCM sealing with a key fixed at construction.
///
/// The coprocessor seals every stored plaintext, so unlike a file keystore the key is derived
/// once rather than per message. Output layout is `[nonce][ciphertext]`; a fresh random nonce
/// is drawn for every call to [`Cipher::encrypt_data`].
///
/// ```
/// # use anyhow::Result;
/// # use eld_crypto::Cipher;
/// # fn main() -> Result<()> {
/// let cipher = Cipher::random()?;
/// let mut data = b"fingerprint".to_vec();
/// let sealed = cipher.encrypt_data(&mut data)?;
/// assert_eq!(cipher.decrypt_data(&sealed)?, b"fingerprint");
/// # Ok(())
/// # }
/// ```
pub struct Cipher {
    key: Zeroizing<Vec<u8>>,
    salt: [u8; SALT_LEN],
}

impl Cipher {
    /// Derive the sealing key from `password` under a freshly generated salt.
    pub fn from_password(password: &str) -> Result<Self> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        Self::from_password_and_salt(password, salt)
    }

    /// Re-derive a key for data sealed earlier under `salt`.
    pub fn from_password_and_salt(password: &str, salt: [u8; SALT_LEN]) -> Result<Self> {
        let password = Zeroizing::new(password.as_bytes().to_vec());
        let key = argon2_derive_key(&password, &salt)?;
        Ok(Self { key, salt })
    }

    /// A cipher with a random key that lives only as long as this instance.
    pub fn random() -> Result<Self> {
        let mut key = Zeroizing::new(vec![0u8; ARGON2_OUTPUT_LEN]);
        OsRng
            .try_fill_bytes(&mut key)
            .map_err(|e| anyhow!("Could not generate key: {e}"))?;
        Ok(Self {
            key,
            salt: [0u8; SALT_LEN],
        })
    }

    pub fn salt(&self) -> [u8; SALT_LEN] {
        self.salt
    }

    /// Encrypt `data` and zeroize the input buffer.
    pub fn encrypt_data(&self, data: &mut Vec<u8>) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let cipher = Aes256Gcm::new_from_slice(&self.key)?;
        let ciphertext = cipher
            .encrypt(nonce, data.as_ref())
            .map_err(|_| anyhow!("Could not AES Encrypt given plaintext."))?;

        data.zeroize();

        let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        output.extend_from_slice(&nonce_bytes);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }

    pub fn decrypt_data(&self, encrypted_data: &[u8]) -> Result<Vec<u8>> {
        if encrypted_data.len() < NONCE_LEN {
            return Err(anyhow!("Invalid encrypted data length"));
        }

        let (nonce, ciphertext) = encrypted_data.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new_from_slice(&self.key)?;
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| anyhow!("Could not decrypt data"))
    }
}

impl Zeroize for Cipher {
    fn zeroize(&mut self) {
        self.key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_encryption_decryption() -> Result<()> {
        let data = b"Hello, world!";
        let cipher = Cipher::from_password("test_password")?;
        let encrypted = cipher.encrypt_data(&mut data.to_vec())?;
        let decrypted = cipher.decrypt_data(&encrypted)?;
        assert_eq!(data, &decrypted[..]);
        Ok(())
    }

    #[test]
    fn test_input_is_zeroized() -> Result<()> {
        let cipher = Cipher::random()?;
        let mut data = vec![0xAA; 16];
        cipher.encrypt_data(&mut data)?;
        assert!(data.iter().all(|b| *b == 0));
        Ok(())
    }

    #[test]
    fn test_same_salt_reopens() -> Result<()> {
        let first = Cipher::from_password("password1")?;
        let sealed = first.encrypt_data(&mut b"Secret message".to_vec())?;

        let again = Cipher::from_password_and_salt("password1", first.salt())?;
        assert_eq!(again.decrypt_data(&sealed)?, b"Secret message");

        let wrong = Cipher::from_password_and_salt("password2", first.salt())?;
        assert!(wrong.decrypt_data(&sealed).is_err());
        Ok(())
    }

    #[test]
    fn test_nonce_is_fresh() -> Result<()> {
        let cipher = Cipher::random()?;
        let a = cipher.encrypt_data(&mut b"same".to_vec())?;
        let b = cipher.encrypt_data(&mut b"same".to_vec())?;
        assert_ne!(a, b);
        Ok(())
    }

    #[test]
    #[should_panic(expected = "Invalid encrypted data length")]
    fn test_invalid_encrypted_data() {
        let cipher = Cipher::random().unwrap();
        cipher.decrypt_data(&[0u8; 4]).unwrap();
    }

    #[test]
    fn test_corrupted_data() -> Result<()> {
        let cipher = Cipher::random()?;
        let mut encrypted = cipher.encrypt_data(&mut b"Test corrupted data".to_vec())?;
        if let Some(byte) = encrypted.get_mut(NONCE_LEN) {
            *byte ^= 0xFF;
        }
        assert!(cipher.decrypt_data(&encrypted).is_err());
        Ok(())
    }
}
