// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{dev_signer, DEPLOYER_KEY};
use actix::Addr;
use alloy::primitives::Address;
use anyhow::{bail, Result};
use eld_draw::{DrawContract, GetWinnerAccount, LuckyDraw, RevealRelayer};
use eld_events::{
    new_event_bus_with_history, DrawEvent, DrawId, EventBus, HistoryCollector, ManualClock,
};
use eld_fhe::{LocalCoprocessor, SeededRandomness};
use eld_grant::{GrantManager, GrantSigner, InMemoryGrantStorage, SessionContext};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::info;

pub const TEST_CHAIN_ID: u64 = 31337;
pub const TEST_START_TIME: u64 = 1_700_000_000;

#[derive(Clone, Debug)]
pub struct FixtureParams {
    pub chain_id: u64,
    pub seed: u64,
    /// `None` leaves reveal requests unanswered
    pub reveal_delay: Option<Duration>,
}

impl Default for FixtureParams {
    fn default() -> Self {
        Self {
            chain_id: TEST_CHAIN_ID,
            seed: 42,
            reveal_delay: Some(Duration::ZERO),
        }
    }
}

/// A deployed lucky draw with everything it needs running in-process.
pub struct DrawFixture {
    pub fhe: Arc<LocalCoprocessor>,
    pub clock: Arc<ManualClock>,
    pub draw_id: DrawId,
    pub bus: Addr<EventBus<DrawEvent>>,
    pub history: Addr<HistoryCollector<DrawEvent>>,
    pub contract: Addr<DrawContract>,
}

impl DrawFixture {
    /// A grant manager for `signer` that shares the fixture clock.
    pub fn grant_manager(&self, signer: &dyn GrantSigner) -> GrantManager {
        GrantManager::new(
            Arc::new(InMemoryGrantStorage::new()),
            SessionContext::connected(signer.address(), signer.chain_id()),
        )
        .with_clock(self.clock.clone())
    }
}

/// Must be called from within an actix system.
pub fn deploy_fixture() -> Result<DrawFixture> {
    deploy_fixture_with(FixtureParams::default())
}

pub fn deploy_fixture_with(params: FixtureParams) -> Result<DrawFixture> {
    let clock = Arc::new(ManualClock::new(TEST_START_TIME));
    let fhe = Arc::new(LocalCoprocessor::new(params.chain_id)?.with_clock(clock.clone()));
    // First contract created by the deployer, as on a fresh dev chain.
    let contract_address = dev_signer(DEPLOYER_KEY)?.address().create(0);
    let draw_id = DrawId::new(contract_address, params.chain_id);

    let (bus, history) = new_event_bus_with_history::<DrawEvent>();
    let draw = LuckyDraw::new(
        draw_id,
        fhe.clone(),
        Arc::new(SeededRandomness::from_u64(params.seed)),
    );
    let contract = DrawContract::attach(draw, &bus);
    if let Some(delay) = params.reveal_delay {
        RevealRelayer::new(draw_id, fhe.clone(), contract.clone(), delay).attach(&bus);
    }
    info!(draw = %draw_id, seed = params.seed, "fixture deployed");

    Ok(DrawFixture {
        fhe,
        clock,
        draw_id,
        bus,
        history,
        contract,
    })
}

/// Poll the contract until a winner is published.
pub async fn wait_for_winner(contract: &Addr<DrawContract>) -> Result<Address> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(winner) = contract.send(GetWinnerAccount).await? {
            return Ok(winner);
        }
        if Instant::now() >= deadline {
            bail!("Timed out waiting for the winner to be published");
        }
        sleep(Duration::from_millis(5)).await;
    }
}
