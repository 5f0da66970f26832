// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use eld_events::{CiphertextHandle, RevealRequestId};
use serde::{Deserialize, Serialize};

/// Outputs of a completed draw. Only the account is plaintext.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WinnerPublication {
    pub account: Address,
    pub index_handle: CiphertextHandle,
    pub name_handle: CiphertextHandle,
}

/// A draw waiting for the oracle to reveal its winning account.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingDraw {
    /// Round version the draw was computed against.
    pub version: u64,
    pub request_id: RevealRequestId,
    pub participant_count: u32,
    pub account_handle: CiphertextHandle,
    pub index_handle: CiphertextHandle,
    pub name_handle: CiphertextHandle,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Publication {
    #[default]
    None,
    Pending(PendingDraw),
    Published(WinnerPublication),
}

impl Publication {
    pub fn published(&self) -> Option<&WinnerPublication> {
        match self {
            Publication::Published(p) => Some(p),
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<&PendingDraw> {
        match self {
            Publication::Pending(p) => Some(p),
            _ => None,
        }
    }
}
