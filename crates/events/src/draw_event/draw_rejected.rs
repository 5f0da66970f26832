// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::DrawId;
use actix::Message;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectedOperation {
    Register,
    Draw,
}

/// A state changing call was refused. Nothing was committed.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct DrawRejected {
    pub draw_id: DrawId,
    pub operation: RejectedOperation,
    pub caller: Address,
    pub message: String,
    /// Running count of rejections on this contract.
    pub attempt: u64,
}

impl Display for DrawRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "draw: {}, op: {:?}, caller: {}, error: {}",
            self.draw_id, self.operation, self.caller, self.message
        )
    }
}
