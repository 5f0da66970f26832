// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use eld_grant::LocalWallet;
use std::sync::Arc;

// Well known development keys (hardhat / anvil accounts 0..3). Never fund these anywhere real.
pub const DEPLOYER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const ALICE_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const BOB_KEY: &str = "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";
pub const CAROL_KEY: &str = "0x7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6";

pub fn dev_signer(key: &str) -> Result<PrivateKeySigner> {
    key.parse::<PrivateKeySigner>()
        .context("Invalid development private key")
}

pub fn dev_wallet(key: &str, chain_id: u64) -> Result<Arc<LocalWallet>> {
    Ok(Arc::new(LocalWallet::new(dev_signer(key)?, chain_id)))
}
