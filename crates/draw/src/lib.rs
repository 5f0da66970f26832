// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod contract;
mod engine;
mod error;
mod publication;
mod registry;
mod relayer;

pub use contract::*;
pub use engine::*;
pub use error::*;
pub use publication::*;
pub use registry::*;
pub use relayer::*;
