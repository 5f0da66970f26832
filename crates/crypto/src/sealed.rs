// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::Cipher;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Bytes that are only ever held sealed. Reading them back requires the cipher.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SealedBytes {
    encrypted: Arc<Vec<u8>>,
}

impl SealedBytes {
    pub fn new(input: impl Into<Vec<u8>>, cipher: &Cipher) -> Result<Self> {
        let mut bytes = input.into();
        let encrypted = cipher.encrypt_data(&mut bytes)?;
        Ok(Self {
            encrypted: Arc::new(encrypted),
        })
    }

    pub fn access(&self, cipher: &Cipher) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(cipher.decrypt_data(&self.encrypted)?))
    }
}
