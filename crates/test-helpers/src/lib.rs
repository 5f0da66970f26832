// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod accounts;
mod fixture;
mod utils;

pub use accounts::*;
pub use fixture::*;
pub use utils::*;
