// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::MailboxError;
use eld_draw::DrawError;
use eld_events::CiphertextHandle;
use eld_fhe::FheError;
use eld_grant::GrantError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("No lucky draw deployment on chain {0}")]
    NotDeployed(u64),

    #[error("Decryption returned no usable value for {0}")]
    MissingValue(CiphertextHandle),

    #[error(transparent)]
    Draw(#[from] DrawError),

    #[error(transparent)]
    Grant(#[from] GrantError),

    #[error(transparent)]
    Capability(#[from] FheError),

    #[error("Draw contract is unreachable: {0}")]
    Mailbox(#[from] MailboxError),
}
