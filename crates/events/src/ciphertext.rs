// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{keccak256, Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

const TYPE_BYTE: usize = 30;
const VERSION_BYTE: usize = 31;

/// Handle layout version written into the last byte of every handle.
pub const HANDLE_VERSION: u8 = 0;

/// Encrypted value types the capability understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FheType {
    Bool = 0,
    Uint32 = 4,
    Uint64 = 5,
    Address = 7,
}

impl FheType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(FheType::Bool),
            4 => Some(FheType::Uint32),
            5 => Some(FheType::Uint64),
            7 => Some(FheType::Address),
            _ => None,
        }
    }
}

impl Display for FheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FheType::Bool => "ebool",
            FheType::Uint32 => "euint32",
            FheType::Uint64 => "euint64",
            FheType::Address => "eaddress",
        };
        f.write_str(name)
    }
}

/// Opaque 32 byte reference to a ciphertext held by the capability.
///
/// Byte 30 carries the [`FheType`] of the referenced value so a handle can be type checked
/// without consulting the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CiphertextHandle(B256);

impl CiphertextHandle {
    /// Derive a handle from `preimage`, tagging it with `fhe_type`.
    pub fn derive(preimage: &[u8], fhe_type: FheType) -> Self {
        let mut bytes = keccak256(preimage).0;
        bytes[TYPE_BYTE] = fhe_type as u8;
        bytes[VERSION_BYTE] = HANDLE_VERSION;
        Self(B256::from(bytes))
    }

    pub fn fhe_type(&self) -> Option<FheType> {
        FheType::from_u8(self.0[TYPE_BYTE])
    }

    pub fn as_b256(&self) -> B256 {
        self.0
    }
}

impl From<B256> for CiphertextHandle {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

impl From<CiphertextHandle> for B256 {
    fn from(value: CiphertextHandle) -> Self {
        value.0
    }
}

impl Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A plaintext value as it goes into or comes out of the capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClearValue {
    Bool(bool),
    Uint32(u32),
    Uint64(u64),
    Address(Address),
}

impl ClearValue {
    pub fn fhe_type(&self) -> FheType {
        match self {
            ClearValue::Bool(_) => FheType::Bool,
            ClearValue::Uint32(_) => FheType::Uint32,
            ClearValue::Uint64(_) => FheType::Uint64,
            ClearValue::Address(_) => FheType::Address,
        }
    }

    /// Numeric view of integer values. Booleans and addresses have none.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ClearValue::Uint32(v) => Some(u64::from(*v)),
            ClearValue::Uint64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ClearValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            ClearValue::Address(v) => Some(*v),
            _ => None,
        }
    }
}

impl Display for ClearValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClearValue::Bool(v) => write!(f, "{v}"),
            ClearValue::Uint32(v) => write!(f, "{v}"),
            ClearValue::Uint64(v) => write!(f, "{v}"),
            ClearValue::Address(v) => write!(f, "{v}"),
        }
    }
}

/// Output of client side encryption: the handle plus the proof the registry hands back to the
/// capability for validation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncryptedInput {
    pub handle: CiphertextHandle,
    pub proof: Bytes,
}

/// Ticket for an asynchronous public reveal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RevealRequestId(pub u64);

impl Display for RevealRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reveal#{}", self.0)
    }
}

/// Cleartexts delivered back for a reveal request, in request order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevealResponse {
    pub request_id: RevealRequestId,
    pub cleartexts: Vec<(CiphertextHandle, ClearValue)>,
}

impl RevealResponse {
    pub fn value_of(&self, handle: &CiphertextHandle) -> Option<ClearValue> {
        self.cleartexts
            .iter()
            .find(|(h, _)| h == handle)
            .map(|(_, value)| *value)
    }
}
