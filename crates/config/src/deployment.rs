// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ChainDeployment {
    pub name: String,
    pub chain_id: u64,
    /// Address of the lucky draw contract on this chain
    pub lucky_draw: Address,
}

/// Known lucky draw deployments keyed by chain id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentBook {
    entries: BTreeMap<u64, ChainDeployment>,
}

impl DeploymentBook {
    pub fn new(chains: impl IntoIterator<Item = ChainDeployment>) -> Self {
        let mut book = Self::default();
        for chain in chains {
            book.insert(chain);
        }
        book
    }

    /// Later entries for the same chain replace earlier ones.
    pub fn insert(&mut self, deployment: ChainDeployment) {
        self.entries.insert(deployment.chain_id, deployment);
    }

    /// The deployment on `chain_id`, or `None` when the chain is unknown or was registered with
    /// the zero address.
    pub fn lookup(&self, chain_id: u64) -> Option<&ChainDeployment> {
        self.entries
            .get(&chain_id)
            .filter(|d| d.lucky_draw != Address::ZERO)
    }

    pub fn address(&self, chain_id: u64) -> Option<Address> {
        self.lookup(chain_id).map(|d| d.lucky_draw)
    }

    pub fn chains(&self) -> impl Iterator<Item = &ChainDeployment> {
        self.entries.values()
    }
}
