// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod error;
mod manager;
mod session;
mod signer;
mod storage;

pub use error::*;
pub use manager::*;
pub use session::*;
pub use signer::*;
pub use storage::*;
