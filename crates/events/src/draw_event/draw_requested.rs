// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CiphertextHandle, DrawId, RevealRequestId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// The engine selected a winner obliviously and asked the oracle to reveal its account.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct DrawRequested {
    pub draw_id: DrawId,
    pub request_id: RevealRequestId,
    pub version: u64,
    pub participant_count: u32,
    pub account_handle: CiphertextHandle,
}

impl Display for DrawRequested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "draw: {}, request: {}, version: {}, participants: {}",
            self.draw_id, self.request_id, self.version, self.participant_count
        )
    }
}
