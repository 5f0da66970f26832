// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod client;
mod error;
mod fingerprint;
mod snapshot;

pub use client::*;
pub use error::*;
pub use fingerprint::*;
pub use snapshot::*;
