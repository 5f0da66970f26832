// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DrawId, RevealRequestId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscardReason {
    /// A registration landed between the draw and its reveal.
    RoundChanged,
    /// A later draw replaced the one this reveal belonged to.
    Superseded,
    /// The callback did not carry the account the draw asked for.
    MalformedResponse,
    /// No draw on this contract asked for the request.
    Unknown,
}

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct RevealDiscarded {
    pub draw_id: DrawId,
    pub request_id: RevealRequestId,
    pub reason: DiscardReason,
}

impl Display for RevealDiscarded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "draw: {}, request: {}, reason: {:?}",
            self.draw_id, self.request_id, self.reason
        )
    }
}
