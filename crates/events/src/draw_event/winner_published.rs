// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CiphertextHandle, DrawId, RevealRequestId};
use actix::Message;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct WinnerPublished {
    pub draw_id: DrawId,
    pub request_id: RevealRequestId,
    pub account: Address,
    pub index_handle: CiphertextHandle,
    pub name_handle: CiphertextHandle,
}

impl Display for WinnerPublished {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "draw: {}, request: {}, winner: {}",
            self.draw_id, self.request_id, self.account
        )
    }
}
