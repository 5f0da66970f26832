// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use eld_client::fingerprint;

pub fn execute(name: &str) -> Result<()> {
    let value = fingerprint(name);
    println!("{value} (0x{value:016x})");
    Ok(())
}
