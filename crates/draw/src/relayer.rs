// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DrawContract, RevealFulfilled};
use actix::prelude::*;
use eld_events::{DrawEvent, DrawId, DrawRequested, EventBus, RevealRequestId, Subscribe};
use eld_fhe::SharedCapability;
use std::time::Duration;
use tracing::{error, info};

/// Plays the decryption oracle for one deployment: answers every `DrawRequested` by fulfilling
/// the reveal and calling the contract back after `delay`.
pub struct RevealRelayer {
    draw_id: DrawId,
    fhe: SharedCapability,
    contract: Addr<DrawContract>,
    delay: Duration,
}

impl RevealRelayer {
    pub fn new(
        draw_id: DrawId,
        fhe: SharedCapability,
        contract: Addr<DrawContract>,
        delay: Duration,
    ) -> Self {
        Self {
            draw_id,
            fhe,
            contract,
            delay,
        }
    }

    pub fn attach(self, bus: &Addr<EventBus<DrawEvent>>) -> Addr<Self> {
        let draw_id = self.draw_id;
        let addr = self.start();
        bus.do_send(Subscribe::new("DrawRequested", addr.clone().recipient()));
        info!(draw = %draw_id, "RevealRelayer attached");
        addr
    }

    fn deliver(&self, request_id: RevealRequestId) {
        match self.fhe.fulfill_reveal(request_id) {
            Ok(response) => self.contract.do_send(RevealFulfilled(response)),
            Err(err) => {
                error!(draw = %self.draw_id, request = %request_id, "could not fulfill reveal: {err}")
            }
        }
    }
}

impl Actor for RevealRelayer {
    type Context = Context<Self>;
}

impl Handler<DrawEvent> for RevealRelayer {
    type Result = ();

    fn handle(&mut self, msg: DrawEvent, ctx: &mut Self::Context) -> Self::Result {
        let DrawEvent::DrawRequested { data, .. } = msg else {
            return;
        };
        let DrawRequested {
            draw_id,
            request_id,
            ..
        } = data;
        if draw_id != self.draw_id {
            return;
        }

        if self.delay.is_zero() {
            self.deliver(request_id);
        } else {
            ctx.run_later(self.delay, move |act, _| act.deliver(request_id));
        }
    }
}
