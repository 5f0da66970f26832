// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{fingerprint, ClientError, DecryptedWinner, DrawSnapshot};
use actix::Addr;
use alloy::primitives::Address;
use eld_config::DeploymentBook;
use eld_draw::{
    Draw, DrawContract, GetParticipantAccount, GetParticipantCount, GetPublication,
    ParticipantRecord, Register, WinnerPublication,
};
use eld_events::{CiphertextHandle, ClearValue, DrawId, RevealRequestId};
use eld_fhe::SharedCapability;
use eld_grant::{ActiveAccount, GrantError, GrantManager, GrantSigner};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Find the draw deployed on `chain_id`.
pub fn resolve_deployment(book: &DeploymentBook, chain_id: u64) -> Result<DrawId, ClientError> {
    book.address(chain_id)
        .map(|contract| DrawId::new(contract, chain_id))
        .ok_or(ClientError::NotDeployed(chain_id))
}

/// A participant's handle on one draw deployment.
///
/// The client is bound to the wallet account and chain it was created with; if the wallet
/// moves to another account or chain every operation fails with `ContextChanged`.
pub struct LuckyDrawClient {
    draw_id: DrawId,
    contract: Addr<DrawContract>,
    fhe: SharedCapability,
    signer: Arc<dyn GrantSigner>,
    grants: Arc<GrantManager>,
    bound: ActiveAccount,
}

impl LuckyDrawClient {
    pub fn new(
        draw_id: DrawId,
        contract: Addr<DrawContract>,
        fhe: SharedCapability,
        signer: Arc<dyn GrantSigner>,
        grants: Arc<GrantManager>,
    ) -> Self {
        let bound = ActiveAccount {
            address: signer.address(),
            chain_id: signer.chain_id(),
        };
        Self {
            draw_id,
            contract,
            fhe,
            signer,
            grants,
            bound,
        }
    }

    pub fn account(&self) -> Address {
        self.bound.address
    }

    pub fn draw_id(&self) -> DrawId {
        self.draw_id
    }

    /// Encrypt the fingerprint of `name` and register the bound account with it.
    #[instrument(name = "register_participant", skip_all, fields(account = %self.bound.address))]
    pub async fn register_participant(&self, name: &str) -> Result<ParticipantRecord, ClientError> {
        self.ensure_context()?;
        let caller = self.bound.address;
        let input = self.fhe.encrypt(
            ClearValue::Uint64(fingerprint(name)),
            self.draw_id.contract(),
            caller,
        )?;
        let record = self.contract.send(Register { caller, input }).await??;
        info!(draw = %self.draw_id, index = record.index, "registered");
        Ok(record)
    }

    #[instrument(name = "draw_winner", skip_all, fields(account = %self.bound.address))]
    pub async fn draw_winner(&self) -> Result<RevealRequestId, ClientError> {
        self.ensure_context()?;
        let request_id = self
            .contract
            .send(Draw {
                caller: self.bound.address,
            })
            .await??;
        info!(draw = %self.draw_id, request = %request_id, "draw requested");
        Ok(request_id)
    }

    pub async fn can_draw(&self) -> bool {
        match self.contract.send(GetParticipantCount).await {
            Ok(count) => count >= 2,
            Err(err) => {
                warn!(draw = %self.draw_id, "could not read participant count: {err}");
                false
            }
        }
    }

    /// Read everything public about the draw. Individual failures degrade to the zero address
    /// or `None` instead of failing the whole refresh.
    pub async fn refresh_state(&self) -> DrawSnapshot {
        let count = match self.contract.send(GetParticipantCount).await {
            Ok(count) => count,
            Err(err) => {
                warn!(draw = %self.draw_id, "could not read participant count: {err}");
                return DrawSnapshot::default();
            }
        };

        let mut participants = Vec::with_capacity(count as usize);
        for index in 0..count {
            let account = match self.contract.send(GetParticipantAccount { index }).await {
                Ok(Ok(account)) => account,
                Ok(Err(err)) => {
                    warn!(draw = %self.draw_id, index, "could not read participant: {err}");
                    Address::ZERO
                }
                Err(err) => {
                    warn!(draw = %self.draw_id, index, "could not read participant: {err}");
                    Address::ZERO
                }
            };
            participants.push(account);
        }

        let publication = self.contract.send(GetPublication).await.ok().and_then(Result::ok);
        DrawSnapshot {
            participants,
            winner: publication.as_ref().map(|p| p.account),
            winner_index_handle: publication.as_ref().map(|p| p.index_handle),
            winner_name_handle: publication.as_ref().map(|p| p.name_handle),
        }
    }

    /// Decrypt the published winner index and name fingerprint with this account's grant,
    /// signing a new grant if none is cached.
    #[instrument(name = "decrypt_winner", skip_all, fields(account = %self.bound.address))]
    pub async fn decrypt_winner(&self) -> Result<DecryptedWinner, ClientError> {
        self.ensure_context()?;
        let WinnerPublication {
            account,
            index_handle,
            name_handle,
        } = self.contract.send(GetPublication).await??;

        let contract = self.draw_id.contract();
        let grant = self
            .grants
            .load_or_sign([contract], self.bound.address, Some(self.signer.as_ref()))
            .await?;
        // The wallet may have moved while the signing prompt was open.
        self.ensure_context()?;

        let values = self.grants.decrypt_with(
            &grant,
            &[(index_handle, contract), (name_handle, contract)],
            self.fhe.as_ref(),
        )?;
        let index = read_u64(&values, &index_handle)?;
        let index = u32::try_from(index).map_err(|_| ClientError::MissingValue(index_handle))?;
        let fingerprint = read_u64(&values, &name_handle)?;

        info!(draw = %self.draw_id, index, "winner decrypted");
        Ok(DecryptedWinner {
            account,
            index,
            fingerprint,
        })
    }

    fn ensure_context(&self) -> Result<(), ClientError> {
        let current = ActiveAccount {
            address: self.signer.address(),
            chain_id: self.signer.chain_id(),
        };
        if current != self.bound {
            warn!(bound = ?self.bound, current = ?current, "wallet context changed");
            return Err(GrantError::ContextChanged.into());
        }
        Ok(())
    }
}

fn read_u64(
    values: &HashMap<CiphertextHandle, ClearValue>,
    handle: &CiphertextHandle,
) -> Result<u64, ClientError> {
    values
        .get(handle)
        .and_then(ClearValue::as_u64)
        .ok_or(ClientError::MissingValue(*handle))
}
