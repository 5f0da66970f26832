// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use eld_fhe::FheError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrantError {
    #[error("Signature request was declined: {0}")]
    SignatureDeclined(String),

    #[error("No signer is available to issue a decryption grant")]
    GrantUnavailable,

    #[error("Signer or chain changed")]
    ContextChanged,

    #[error("Grant storage failed: {0}")]
    Storage(String),

    #[error(transparent)]
    Capability(#[from] FheError),
}

impl From<serde_json::Error> for GrantError {
    fn from(value: serde_json::Error) -> Self {
        GrantError::Storage(value.to_string())
    }
}
