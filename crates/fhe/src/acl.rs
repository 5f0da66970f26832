// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use eld_events::CiphertextHandle;
use std::collections::{HashMap, HashSet};

/// Who may decrypt which handle. Entries are only ever added.
#[derive(Debug, Default)]
pub(crate) struct Acl {
    entries: HashMap<CiphertextHandle, HashSet<Address>>,
}

impl Acl {
    pub fn allow(&mut self, handle: CiphertextHandle, account: Address) -> bool {
        self.entries.entry(handle).or_default().insert(account)
    }

    pub fn is_allowed(&self, handle: &CiphertextHandle, account: &Address) -> bool {
        self.entries
            .get(handle)
            .is_some_and(|accounts| accounts.contains(account))
    }
}
