// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DrawError, LuckyDraw, ParticipantRecord, Phase, RevealOutcome, WinnerPublication};
use actix::prelude::*;
use alloy::primitives::Address;
use eld_events::{
    CiphertextHandle, DrawEvent, DrawId, DrawRejected, DrawRequested, EncryptedInput, EventBus,
    ParticipantRegistered, RejectedOperation, RevealDiscarded, RevealRequestId, RevealResponse,
    WinnerCleared, WinnerPublished,
};
use tracing::{info, instrument, warn};

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<ParticipantRecord, DrawError>")]
pub struct Register {
    pub caller: Address,
    pub input: EncryptedInput,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<RevealRequestId, DrawError>")]
pub struct Draw {
    pub caller: Address,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "u32")]
pub struct GetParticipantCount;

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<Address, DrawError>")]
pub struct GetParticipantAccount {
    pub index: u32,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<Address, DrawError>")]
pub struct GetWinnerAccount;

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<CiphertextHandle, DrawError>")]
pub struct GetEncryptedWinnerIndex;

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<CiphertextHandle, DrawError>")]
pub struct GetEncryptedWinnerName;

/// Winner account and both encrypted handles, read in a single mailbox turn.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<WinnerPublication, DrawError>")]
pub struct GetPublication;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundStatus {
    pub phase: Phase,
    pub participant_count: u32,
    pub version: u64,
    pub pending: Option<RevealRequestId>,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "RoundStatus")]
pub struct GetRoundStatus;

/// Oracle callback carrying the cleartexts of a reveal request.
#[derive(Message, Clone, Debug)]
#[rtype(result = "()")]
pub struct RevealFulfilled(pub RevealResponse);

/// One lucky draw deployment. The mailbox totally orders registrations, draws and reveal
/// callbacks; every state change is published on the bus.
pub struct DrawContract {
    draw: LuckyDraw,
    bus: Addr<EventBus<DrawEvent>>,
    rejections: u64,
}

impl DrawContract {
    pub fn new(draw: LuckyDraw, bus: Addr<EventBus<DrawEvent>>) -> Self {
        Self {
            draw,
            bus,
            rejections: 0,
        }
    }

    pub fn attach(draw: LuckyDraw, bus: &Addr<EventBus<DrawEvent>>) -> Addr<Self> {
        let draw_id = draw.draw_id();
        let addr = Self::new(draw, bus.clone()).start();
        info!(draw = %draw_id, "DrawContract deployed");
        addr
    }

    fn draw_id(&self) -> DrawId {
        self.draw.draw_id()
    }

    fn publish(&self, event: impl Into<DrawEvent>) {
        self.bus.do_send(event.into());
    }

    fn reject(&mut self, operation: RejectedOperation, caller: Address, err: &DrawError) {
        self.rejections += 1;
        warn!(draw = %self.draw_id(), ?operation, %caller, "rejected: {err}");
        self.publish(DrawRejected {
            draw_id: self.draw_id(),
            operation,
            caller,
            message: err.to_string(),
            attempt: self.rejections,
        });
    }
}

impl Actor for DrawContract {
    type Context = Context<Self>;
}

impl Handler<Register> for DrawContract {
    type Result = Result<ParticipantRecord, DrawError>;

    #[instrument(name = "register", skip_all, fields(caller = %msg.caller))]
    fn handle(&mut self, msg: Register, _: &mut Self::Context) -> Self::Result {
        let registration = match self.draw.register(&msg.input, msg.caller) {
            Ok(registration) => registration,
            Err(err) => {
                self.reject(RejectedOperation::Register, msg.caller, &err);
                return Err(err);
            }
        };

        if let Some(was_pending) = registration.cleared {
            self.publish(WinnerCleared {
                draw_id: self.draw_id(),
                version: registration.version,
                was_pending,
            });
        }

        let record = registration.record;
        info!(draw = %self.draw_id(), index = record.index, account = %record.account, "participant registered");
        self.publish(ParticipantRegistered {
            draw_id: self.draw_id(),
            index: record.index,
            account: record.account,
            fingerprint_handle: record.fingerprint_handle,
            version: registration.version,
        });
        Ok(record)
    }
}

impl Handler<Draw> for DrawContract {
    type Result = Result<RevealRequestId, DrawError>;

    #[instrument(name = "draw", skip_all, fields(caller = %msg.caller))]
    fn handle(&mut self, msg: Draw, _: &mut Self::Context) -> Self::Result {
        let request = match self.draw.draw() {
            Ok(request) => request,
            Err(err) => {
                self.reject(RejectedOperation::Draw, msg.caller, &err);
                return Err(err);
            }
        };

        if let Some(previous) = request.superseded {
            info!(draw = %self.draw_id(), request = %previous, "pending draw superseded");
        }

        let pending = request.pending;
        info!(draw = %self.draw_id(), request = %pending.request_id, participants = pending.participant_count, "draw requested");
        self.publish(DrawRequested {
            draw_id: self.draw_id(),
            request_id: pending.request_id,
            version: pending.version,
            participant_count: pending.participant_count,
            account_handle: pending.account_handle,
        });
        Ok(pending.request_id)
    }
}

impl Handler<RevealFulfilled> for DrawContract {
    type Result = ();

    fn handle(&mut self, msg: RevealFulfilled, _: &mut Self::Context) -> Self::Result {
        let request_id = msg.0.request_id;
        match self.draw.on_reveal(&msg.0) {
            RevealOutcome::Published(publication) => {
                info!(draw = %self.draw_id(), request = %request_id, winner = %publication.account, "winner published");
                self.publish(WinnerPublished {
                    draw_id: self.draw_id(),
                    request_id,
                    account: publication.account,
                    index_handle: publication.index_handle,
                    name_handle: publication.name_handle,
                });
            }
            RevealOutcome::Discarded(reason) => {
                warn!(draw = %self.draw_id(), request = %request_id, ?reason, "reveal discarded");
                self.publish(RevealDiscarded {
                    draw_id: self.draw_id(),
                    request_id,
                    reason,
                });
            }
        }
    }
}

impl Handler<GetParticipantCount> for DrawContract {
    type Result = u32;

    fn handle(&mut self, _: GetParticipantCount, _: &mut Self::Context) -> Self::Result {
        self.draw.count()
    }
}

impl Handler<GetParticipantAccount> for DrawContract {
    type Result = Result<Address, DrawError>;

    fn handle(&mut self, msg: GetParticipantAccount, _: &mut Self::Context) -> Self::Result {
        self.draw.account_at(msg.index)
    }
}

impl Handler<GetWinnerAccount> for DrawContract {
    type Result = Result<Address, DrawError>;

    fn handle(&mut self, _: GetWinnerAccount, _: &mut Self::Context) -> Self::Result {
        self.draw.winner_account()
    }
}

impl Handler<GetEncryptedWinnerIndex> for DrawContract {
    type Result = Result<CiphertextHandle, DrawError>;

    fn handle(&mut self, _: GetEncryptedWinnerIndex, _: &mut Self::Context) -> Self::Result {
        self.draw.encrypted_winner_index()
    }
}

impl Handler<GetEncryptedWinnerName> for DrawContract {
    type Result = Result<CiphertextHandle, DrawError>;

    fn handle(&mut self, _: GetEncryptedWinnerName, _: &mut Self::Context) -> Self::Result {
        self.draw.encrypted_winner_name()
    }
}

impl Handler<GetPublication> for DrawContract {
    type Result = Result<WinnerPublication, DrawError>;

    fn handle(&mut self, _: GetPublication, _: &mut Self::Context) -> Self::Result {
        self.draw.winner_publication()
    }
}

impl Handler<GetRoundStatus> for DrawContract {
    type Result = MessageResult<GetRoundStatus>;

    fn handle(&mut self, _: GetRoundStatus, _: &mut Self::Context) -> Self::Result {
        MessageResult(RoundStatus {
            phase: self.draw.phase(),
            participant_count: self.draw.count(),
            version: self.draw.version(),
            pending: self.draw.publication().pending().map(|p| p.request_id),
        })
    }
}
