// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::Actor;
use alloy::primitives::Address;
use anyhow::{bail, Context, Result};
use eld_client::{fingerprint, DecryptedWinner, LuckyDrawClient};
use eld_config::AppConfig;
use eld_crypto::Cipher;
use eld_draw::{DrawContract, LuckyDraw, RevealRelayer};
use eld_events::{DrawEvent, DrawId, EventBus};
use eld_fhe::{LocalCoprocessor, OsRandomness, RandomnessSource, SeededRandomness};
use eld_grant::{GrantManager, GrantSigner, InMemoryGrantStorage, LocalWallet, SessionContext};
use eld_logger::SimpleLogger;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::info;
use zeroize::Zeroizing;

#[derive(Serialize)]
struct ParticipantReport {
    name: String,
    account: Address,
    fingerprint: u64,
    decrypted: DecryptedWinner,
}

#[derive(Serialize)]
struct SimulationReport {
    draw: DrawId,
    winner_account: Address,
    winner_index: u32,
    winner_name: Option<String>,
    participants: Vec<ParticipantReport>,
}

pub async fn execute(
    config: &AppConfig,
    names: Vec<String>,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let chain_id = config.coprocessor().chain_id;
    let fhe = Arc::new(coprocessor(config)?);

    let deployer = LocalWallet::random(chain_id);
    let contract_address = config
        .deployments()
        .address(chain_id)
        .unwrap_or_else(|| deployer.address().create(0));
    let draw_id = DrawId::new(contract_address, chain_id);

    let randomness: Arc<dyn RandomnessSource> = match seed {
        Some(seed) => Arc::new(SeededRandomness::from_u64(seed)),
        None => Arc::new(OsRandomness),
    };

    let bus = EventBus::<DrawEvent>::default().start();
    SimpleLogger::<DrawEvent>::attach("simulate", bus.clone());
    let contract = DrawContract::attach(LuckyDraw::new(draw_id, fhe.clone(), randomness), &bus);
    let reveal_delay = Duration::from_millis(config.draw().reveal_delay_ms);
    RevealRelayer::new(draw_id, fhe.clone(), contract.clone(), reveal_delay).attach(&bus);
    info!(draw = %draw_id, participants = names.len(), "simulation deployed");

    let mut clients = Vec::with_capacity(names.len());
    for name in &names {
        let wallet: Arc<dyn GrantSigner> = Arc::new(LocalWallet::random(chain_id));
        let grants = GrantManager::new(
            Arc::new(InMemoryGrantStorage::new()),
            SessionContext::connected(wallet.address(), chain_id),
        )
        .with_duration_days(config.grant().duration_days);
        let client = LuckyDrawClient::new(
            draw_id,
            contract.clone(),
            fhe.clone(),
            wallet,
            Arc::new(grants),
        );
        client
            .register_participant(name)
            .await
            .with_context(|| format!("Could not register {name}"))?;
        clients.push(client);
    }

    let Some(first) = clients.first() else {
        bail!("At least one participant is required");
    };
    first.draw_winner().await.context("Draw failed")?;

    let deadline = Instant::now() + reveal_delay + Duration::from_secs(10);
    let snapshot = loop {
        let snapshot = first.refresh_state().await;
        if snapshot.winner.is_some() && snapshot.has_encrypted_winner() {
            break snapshot;
        }
        if Instant::now() >= deadline {
            bail!("Timed out waiting for the winner to be revealed");
        }
        sleep(Duration::from_millis(10)).await;
    };
    let winner_account = snapshot.winner.unwrap_or_default();

    let mut participants = Vec::with_capacity(clients.len());
    for (name, client) in names.iter().zip(&clients) {
        let decrypted = client
            .decrypt_winner()
            .await
            .with_context(|| format!("{name} could not decrypt the winner"))?;
        participants.push(ParticipantReport {
            name: name.clone(),
            account: client.account(),
            fingerprint: fingerprint(name),
            decrypted,
        });
    }

    let winner_index = participants
        .first()
        .map(|p| p.decrypted.index)
        .unwrap_or_default();
    let winner_name = participants
        .iter()
        .find(|p| p.fingerprint == p.decrypted.fingerprint)
        .map(|p| p.name.clone());
    let report = SimulationReport {
        draw: draw_id,
        winner_account,
        winner_index,
        winner_name,
        participants,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn coprocessor(config: &AppConfig) -> Result<LocalCoprocessor> {
    let chain_id = config.coprocessor().chain_id;
    let cipher = match &config.coprocessor().password {
        Some(password) => {
            let password = Zeroizing::new(password.clone());
            Cipher::from_password(&password)?
        }
        None => Cipher::random()?,
    };
    Ok(LocalCoprocessor::with_cipher(chain_id, cipher))
}

fn print_report(report: &SimulationReport) {
    println!("Draw {}", report.draw);
    for (index, p) in report.participants.iter().enumerate() {
        println!("  #{index} {} {} (0x{:016x})", p.account, p.name, p.fingerprint);
    }
    println!(
        "Winner: #{} {} {}",
        report.winner_index,
        report.winner_account,
        report.winner_name.as_deref().unwrap_or("<unknown>")
    );
    for p in &report.participants {
        println!(
            "  {} decrypted index {} fingerprint 0x{:016x}",
            p.name, p.decrypted.index, p.decrypted.fingerprint
        );
    }
}
