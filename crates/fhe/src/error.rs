// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use eld_events::{CiphertextHandle, FheType, RevealRequestId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FheError {
    #[error("Invalid input proof: {0}")]
    InvalidProof(String),

    #[error("Unknown ciphertext handle {0}")]
    UnknownHandle(CiphertextHandle),

    #[error("Type mismatch on {handle}: expected {expected}, found {found}")]
    TypeMismatch {
        handle: CiphertextHandle,
        expected: FheType,
        found: FheType,
    },

    #[error("Operation {op} is not supported on {fhe_type}")]
    Unsupported { op: &'static str, fhe_type: FheType },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("{account} is not allowed to use {handle}")]
    Unauthorized {
        handle: CiphertextHandle,
        account: Address,
    },

    #[error("Contract {0} is outside the scope of the decryption grant")]
    OutOfScope(Address),

    #[error("Decryption grant expired at {expires_at} (now {now})")]
    Expired { expires_at: u64, now: u64 },

    #[error("Invalid decryption grant: {0}")]
    InvalidGrant(String),

    #[error("Unknown reveal request {0}")]
    UnknownRevealRequest(RevealRequestId),

    #[error("Randomness source failed: {0}")]
    Randomness(String),

    #[error("Sealed storage failure: {0}")]
    Storage(String),
}
