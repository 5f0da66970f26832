// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod ciphertext;
mod clock;
mod draw_event;
mod draw_id;
mod eip712;
mod event_id;
mod eventbus;
mod grant;
mod seed;
mod traits;

pub use ciphertext::*;
pub use clock::*;
pub use draw_event::*;
pub use draw_id::*;
pub use eip712::*;
pub use event_id::*;
pub use eventbus::*;
pub use grant::*;
pub use seed::*;
pub use traits::*;

pub use alloy::primitives::{Address, Bytes, B256};
