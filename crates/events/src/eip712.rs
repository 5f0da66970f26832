// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! EIP-712 typed messages shared by the capability and its clients.
//!
//! Two messages cross the trust boundary:
//!
//! * [`CiphertextVerification`] is signed by the input verifier and proves that a set of
//!   handles was encrypted for a given `(contract, user)` pair. The signature is the
//!   "validity proof" a registry presents when storing an encrypted input.
//! * [`UserDecryptRequestVerification`] is signed by a holder's wallet and authorises the
//!   capability to re-encrypt values for that holder's ephemeral key. Its signature is the
//!   core of a decryption grant.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolStruct};
use std::borrow::Cow;

pub const DECRYPTION_DOMAIN_NAME: &str = "Decryption";
pub const INPUT_VERIFICATION_DOMAIN_NAME: &str = "InputVerification";
pub const DOMAIN_VERSION: &str = "1";

sol! {
    struct UserDecryptRequestVerification {
        bytes publicKey;
        address[] contractAddresses;
        uint256 startTimestamp;
        uint256 durationDays;
        bytes extraData;
    }

    struct CiphertextVerification {
        bytes32[] ctHandles;
        address userAddress;
        address contractAddress;
        uint256 contractChainId;
    }
}

fn domain(name: &'static str, chain_id: u64) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(name)),
        Some(Cow::Borrowed(DOMAIN_VERSION)),
        Some(U256::from(chain_id)),
        None,
        None,
    )
}

/// Domain for grant signatures. Binding the chain id means a grant signed on one chain never
/// verifies on another.
pub fn decryption_domain(chain_id: u64) -> Eip712Domain {
    domain(DECRYPTION_DOMAIN_NAME, chain_id)
}

pub fn input_verification_domain(chain_id: u64) -> Eip712Domain {
    domain(INPUT_VERIFICATION_DOMAIN_NAME, chain_id)
}

impl CiphertextVerification {
    pub fn for_input(
        handles: Vec<B256>,
        user: Address,
        contract: Address,
        chain_id: u64,
    ) -> Self {
        Self {
            ctHandles: handles,
            userAddress: user,
            contractAddress: contract,
            contractChainId: U256::from(chain_id),
        }
    }

    pub fn signing_hash(&self, chain_id: u64) -> B256 {
        self.eip712_signing_hash(&input_verification_domain(chain_id))
    }
}

impl UserDecryptRequestVerification {
    pub fn for_grant(
        public_key: Bytes,
        contracts: Vec<Address>,
        start_timestamp: u64,
        duration_days: u32,
    ) -> Self {
        Self {
            publicKey: public_key,
            contractAddresses: contracts,
            startTimestamp: U256::from(start_timestamp),
            durationDays: U256::from(duration_days),
            extraData: Bytes::new(),
        }
    }

    pub fn signing_hash(&self, chain_id: u64) -> B256 {
        self.eip712_signing_hash(&decryption_domain(chain_id))
    }
}
