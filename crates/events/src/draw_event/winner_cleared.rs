// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::DrawId;
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A registration invalidated the current winner publication or a pending draw.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct WinnerCleared {
    pub draw_id: DrawId,
    pub version: u64,
    /// True when the cleared state was a draw still waiting for its reveal.
    pub was_pending: bool,
}

impl Display for WinnerCleared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "draw: {}, version: {}, was_pending: {}",
            self.draw_id, self.version, self.was_pending
        )
    }
}
