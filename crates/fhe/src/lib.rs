// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod acl;
mod capability;
mod coprocessor;
mod error;
mod randomness;
mod user_decrypt;

pub use capability::*;
pub use coprocessor::*;
pub use error::*;
pub use randomness::*;
pub use user_decrypt::{ephemeral_public_key, generate_ephemeral_keypair};
