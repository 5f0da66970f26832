// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use eld_events::CiphertextHandle;
use serde::{Deserialize, Serialize};

/// What a client could read about a draw at one moment.
///
/// Participants that could not be read show up as the zero address, and winner fields are
/// `None` while no winner is published.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawSnapshot {
    pub participants: Vec<Address>,
    pub winner: Option<Address>,
    pub winner_index_handle: Option<CiphertextHandle>,
    pub winner_name_handle: Option<CiphertextHandle>,
}

impl DrawSnapshot {
    pub fn can_draw(&self) -> bool {
        self.participants.len() >= 2
    }

    pub fn is_participant(&self, account: &Address) -> bool {
        self.participants.contains(account)
    }

    /// Whether both encrypted winner handles are available for decryption.
    pub fn has_encrypted_winner(&self) -> bool {
        self.winner_index_handle.is_some() && self.winner_name_handle.is_some()
    }
}

/// Cleartext view of the published winner, as seen by a grant holder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptedWinner {
    pub account: Address,
    pub index: u32,
    pub fingerprint: u64,
}
