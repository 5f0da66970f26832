// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use eld_client::resolve_deployment;
use eld_config::AppConfig;

pub fn execute(config: &AppConfig) -> Result<()> {
    let chain_id = config.coprocessor().chain_id;
    let book = config.deployments();
    let draw_id = resolve_deployment(&book, chain_id)
        .context("Add the deployment to the `chains` section of your configuration")?;
    let name = book
        .lookup(chain_id)
        .map(|d| d.name.as_str())
        .unwrap_or_default();
    println!("{} ({name}, chain {chain_id})", draw_id.contract());
    Ok(())
}
