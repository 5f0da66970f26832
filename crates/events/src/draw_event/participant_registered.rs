// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CiphertextHandle, DrawId};
use actix::Message;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct ParticipantRegistered {
    pub draw_id: DrawId,
    pub index: u32,
    pub account: Address,
    pub fingerprint_handle: CiphertextHandle,
    /// Round version after this registration.
    pub version: u64,
}

impl Display for ParticipantRegistered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "draw: {}, index: {}, account: {}",
            self.draw_id, self.index, self.account
        )
    }
}
