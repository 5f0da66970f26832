// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod draw_rejected;
mod draw_requested;
mod participant_registered;
mod reveal_discarded;
mod winner_cleared;
mod winner_published;

pub use draw_rejected::*;
pub use draw_requested::*;
pub use participant_registered::*;
pub use reveal_discarded::*;
pub use winner_cleared::*;
pub use winner_published::*;

use crate::{DrawId, ErrorEvent, Event, EventId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to help define From traits for DrawEvent
macro_rules! impl_from_event {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for DrawEvent {
                fn from(data: $variant) -> Self {
                    DrawEvent::$variant {
                        id: EventId::hash(&data),
                        data,
                    }
                }
            }
        )*
    };
}

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub enum DrawEvent {
    ParticipantRegistered {
        id: EventId,
        data: ParticipantRegistered,
    },
    WinnerCleared {
        id: EventId,
        data: WinnerCleared,
    },
    DrawRequested {
        id: EventId,
        data: DrawRequested,
    },
    WinnerPublished {
        id: EventId,
        data: WinnerPublished,
    },
    RevealDiscarded {
        id: EventId,
        data: RevealDiscarded,
    },
    DrawRejected {
        id: EventId,
        data: DrawRejected,
    },
}

impl DrawEvent {
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    pub fn get_id(&self) -> EventId {
        match self {
            DrawEvent::ParticipantRegistered { id, .. }
            | DrawEvent::WinnerCleared { id, .. }
            | DrawEvent::DrawRequested { id, .. }
            | DrawEvent::WinnerPublished { id, .. }
            | DrawEvent::RevealDiscarded { id, .. }
            | DrawEvent::DrawRejected { id, .. } => id.clone(),
        }
    }

    pub fn get_draw_id(&self) -> DrawId {
        match self {
            DrawEvent::ParticipantRegistered { data, .. } => data.draw_id,
            DrawEvent::WinnerCleared { data, .. } => data.draw_id,
            DrawEvent::DrawRequested { data, .. } => data.draw_id,
            DrawEvent::WinnerPublished { data, .. } => data.draw_id,
            DrawEvent::RevealDiscarded { data, .. } => data.draw_id,
            DrawEvent::DrawRejected { data, .. } => data.draw_id,
        }
    }

    pub fn get_data(&self) -> String {
        match self {
            DrawEvent::ParticipantRegistered { data, .. } => data.to_string(),
            DrawEvent::WinnerCleared { data, .. } => data.to_string(),
            DrawEvent::DrawRequested { data, .. } => data.to_string(),
            DrawEvent::WinnerPublished { data, .. } => data.to_string(),
            DrawEvent::RevealDiscarded { data, .. } => data.to_string(),
            DrawEvent::DrawRejected { data, .. } => data.to_string(),
        }
    }
}

impl Event for DrawEvent {
    type Id = EventId;

    fn event_type(&self) -> String {
        let s = format!("{:?}", self);
        extract_draw_event_name(&s).to_string()
    }

    fn event_id(&self) -> Self::Id {
        self.get_id()
    }
}

impl ErrorEvent for DrawEvent {
    type Error = DrawRejected;

    fn as_error(&self) -> Option<&Self::Error> {
        match self {
            DrawEvent::DrawRejected { data, .. } => Some(data),
            _ => None,
        }
    }
}

impl_from_event!(
    ParticipantRegistered,
    WinnerCleared,
    DrawRequested,
    WinnerPublished,
    RevealDiscarded,
    DrawRejected
);

impl fmt::Display for DrawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.event_type(), self.get_data())
    }
}

fn extract_draw_event_name(s: &str) -> &str {
    let end = s.find([' ', '(', '{']).unwrap_or(s.len());
    &s[..end]
}
