// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use eld_fhe::FheError;
use thiserror::Error;

/// Rejections raised by the registry and the draw engine. None of them commit state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    #[error("Invalid ciphertext proof: {0}")]
    InvalidCiphertextProof(String),

    #[error("Need at least two participants (have {count})")]
    InsufficientParticipants { count: u32 },

    #[error("No winner yet")]
    NoWinnerYet,

    #[error("Index {index} out of range (participants: {count})")]
    IndexOutOfRange { index: u32, count: u32 },

    #[error("Participant registry is full")]
    RegistryFull,

    #[error("Ciphertext capability error: {0}")]
    Capability(#[from] FheError),
}
