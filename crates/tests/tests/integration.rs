// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use anyhow::{Context, Result};
use eld_client::fingerprint;
use eld_draw::{
    Draw, DrawError, GetEncryptedWinnerIndex, GetEncryptedWinnerName, GetParticipantAccount,
    GetParticipantCount, GetRoundStatus, GetWinnerAccount, ParticipantRecord, Phase, Register,
};
use eld_events::{
    CiphertextHandle, ClearValue, DiscardReason, DrawEvent, Event, GetEvents, TakeEvents,
    SECONDS_PER_DAY,
};
use eld_fhe::{CiphertextCapability, FheError};
use eld_grant::{GrantError, GrantSigner, LocalWallet};
use eld_logger::SimpleLogger;
use eld_test_helpers::{
    deploy_fixture, deploy_fixture_with, dev_wallet, wait_for_winner, DrawFixture,
    FixtureParams, ALICE_KEY, BOB_KEY, CAROL_KEY, TEST_CHAIN_ID,
};
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

fn subscriber() -> tracing::subscriber::DefaultGuard {
    let subscriber = fmt()
        .with_env_filter(EnvFilter::new("info"))
        .with_test_writer()
        .finish();
    tracing::subscriber::set_default(subscriber)
}

async fn register(f: &DrawFixture, who: &LocalWallet, name: &str) -> Result<ParticipantRecord> {
    let input = f.fhe.encrypt(
        ClearValue::Uint64(fingerprint(name)),
        f.draw_id.contract(),
        who.address(),
    )?;
    Ok(f
        .contract
        .send(Register {
            caller: who.address(),
            input,
        })
        .await??)
}

async fn winner_handles(f: &DrawFixture) -> Result<(CiphertextHandle, CiphertextHandle)> {
    Ok((
        f.contract.send(GetEncryptedWinnerIndex).await??,
        f.contract.send(GetEncryptedWinnerName).await??,
    ))
}

/// Alice and Bob register, anyone draws and both decrypt the same winner.
#[actix::test]
#[serial_test::serial]
async fn test_two_participants_both_decrypt_winner() -> Result<()> {
    let _guard = subscriber();
    let f = deploy_fixture()?;
    SimpleLogger::<DrawEvent>::attach("integration", f.bus.clone());
    let alice = dev_wallet(ALICE_KEY, TEST_CHAIN_ID)?;
    let bob = dev_wallet(BOB_KEY, TEST_CHAIN_ID)?;

    assert_eq!(register(&f, &alice, "Alice").await?.index, 0);
    assert_eq!(register(&f, &bob, "Bob").await?.index, 1);
    f.contract
        .send(Draw {
            caller: bob.address(),
        })
        .await??;
    let winner = wait_for_winner(&f.contract).await?;
    assert!(winner == alice.address() || winner == bob.address());

    let events = f.history.send(TakeEvents::new(4)).await?;
    let types: Vec<String> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(
        types,
        vec![
            "ParticipantRegistered",
            "ParticipantRegistered",
            "DrawRequested",
            "WinnerPublished"
        ]
    );

    let contract = f.draw_id.contract();
    let (index_handle, name_handle) = winner_handles(&f).await?;
    let expected_name = if winner == alice.address() {
        fingerprint("Alice")
    } else {
        fingerprint("Bob")
    };

    for wallet in [&alice, &bob] {
        let grants = f.grant_manager(&**wallet);
        let grant = grants
            .load_or_sign([contract], wallet.address(), Some(&**wallet))
            .await?;
        let values = grants.decrypt_with(
            &grant,
            &[(index_handle, contract), (name_handle, contract)],
            &*f.fhe,
        )?;
        let index = values[&index_handle]
            .as_u64()
            .context("winner index should be an integer")?;
        assert_eq!(
            f.contract
                .send(GetParticipantAccount {
                    index: index as u32
                })
                .await??,
            winner
        );
        assert_eq!(values[&name_handle].as_u64(), Some(expected_name));
    }

    let status = f.contract.send(GetRoundStatus).await?;
    assert_eq!(status.phase, Phase::Drawn);
    Ok(())
}

/// A single participant cannot be drawn and nothing is published.
#[actix::test]
#[serial_test::serial]
async fn test_one_participant_cannot_draw() -> Result<()> {
    let _guard = subscriber();
    let f = deploy_fixture()?;
    let alice = dev_wallet(ALICE_KEY, TEST_CHAIN_ID)?;
    register(&f, &alice, "Alice").await?;

    let res = f
        .contract
        .send(Draw {
            caller: alice.address(),
        })
        .await?;
    assert_eq!(res, Err(DrawError::InsufficientParticipants { count: 1 }));
    assert_eq!(
        f.contract.send(GetWinnerAccount).await?,
        Err(DrawError::NoWinnerYet)
    );

    let status = f.contract.send(GetRoundStatus).await?;
    assert_eq!(status.phase, Phase::Registering);
    assert_eq!(status.pending, None);
    Ok(())
}

/// A third registration after the draw hides the winner until the next draw.
#[actix::test]
#[serial_test::serial]
async fn test_late_registration_clears_winner() -> Result<()> {
    let _guard = subscriber();
    let f = deploy_fixture()?;
    let alice = dev_wallet(ALICE_KEY, TEST_CHAIN_ID)?;
    let bob = dev_wallet(BOB_KEY, TEST_CHAIN_ID)?;
    let carol = dev_wallet(CAROL_KEY, TEST_CHAIN_ID)?;

    register(&f, &alice, "Alice").await?;
    register(&f, &bob, "Bob").await?;
    f.contract
        .send(Draw {
            caller: alice.address(),
        })
        .await??;
    wait_for_winner(&f.contract).await?;

    assert_eq!(register(&f, &carol, "Carol").await?.index, 2);
    assert_eq!(
        f.contract.send(GetEncryptedWinnerIndex).await?,
        Err(DrawError::NoWinnerYet)
    );
    assert_eq!(
        f.contract.send(GetWinnerAccount).await?,
        Err(DrawError::NoWinnerYet)
    );
    assert_eq!(f.contract.send(GetParticipantCount).await?, 3);

    f.contract
        .send(Draw {
            caller: carol.address(),
        })
        .await??;
    let winner = wait_for_winner(&f.contract).await?;
    assert!([alice.address(), bob.address(), carol.address()].contains(&winner));
    Ok(())
}

/// A registration landing while the reveal is in flight makes the callback stale.
#[actix::test]
#[serial_test::serial]
async fn test_registration_during_reveal_discards_it() -> Result<()> {
    let _guard = subscriber();
    let f = deploy_fixture_with(FixtureParams {
        reveal_delay: Some(Duration::from_millis(100)),
        ..Default::default()
    })?;
    let alice = dev_wallet(ALICE_KEY, TEST_CHAIN_ID)?;
    let bob = dev_wallet(BOB_KEY, TEST_CHAIN_ID)?;
    let carol = dev_wallet(CAROL_KEY, TEST_CHAIN_ID)?;

    register(&f, &alice, "Alice").await?;
    register(&f, &bob, "Bob").await?;
    f.contract
        .send(Draw {
            caller: alice.address(),
        })
        .await??;
    register(&f, &carol, "Carol").await?;

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        f.contract.send(GetWinnerAccount).await?,
        Err(DrawError::NoWinnerYet)
    );
    let events = f.history.send(GetEvents::new()).await?;
    assert!(events.iter().any(|e| matches!(
        e,
        DrawEvent::RevealDiscarded { data, .. } if data.reason == DiscardReason::RoundChanged
    )));

    f.contract
        .send(Draw {
            caller: carol.address(),
        })
        .await??;
    wait_for_winner(&f.contract).await?;
    Ok(())
}

/// Grants are bound to their chain, their validity window and the ACL of each handle.
#[actix::test]
#[serial_test::serial]
async fn test_grant_boundaries() -> Result<()> {
    let _guard = subscriber();
    let f = deploy_fixture()?;
    let alice = dev_wallet(ALICE_KEY, TEST_CHAIN_ID)?;
    let bob = dev_wallet(BOB_KEY, TEST_CHAIN_ID)?;
    let outsider = dev_wallet(CAROL_KEY, TEST_CHAIN_ID)?;
    register(&f, &alice, "Alice").await?;
    register(&f, &bob, "Bob").await?;
    f.contract
        .send(Draw {
            caller: alice.address(),
        })
        .await??;
    wait_for_winner(&f.contract).await?;

    let contract = f.draw_id.contract();
    let (index_handle, _) = winner_handles(&f).await?;
    let handles = [(index_handle, contract)];

    // Not a participant, so never allowed on the winner handles.
    let grants = f.grant_manager(&*outsider);
    let grant = grants
        .load_or_sign([contract], outsider.address(), Some(&*outsider))
        .await?;
    assert!(matches!(
        grants.decrypt_with(&grant, &handles, &*f.fhe),
        Err(GrantError::Capability(FheError::Unauthorized { .. }))
    ));

    // Scoped to another contract.
    let grants = f.grant_manager(&*alice);
    let grant = grants
        .load_or_sign([Address::repeat_byte(0xee)], alice.address(), Some(&*alice))
        .await?;
    assert!(matches!(
        grants.decrypt_with(&grant, &handles, &*f.fhe),
        Err(GrantError::Capability(FheError::OutOfScope(_)))
    ));

    // Signed for another chain.
    bob.switch_chain(1);
    let grants = f.grant_manager(&*bob);
    let grant = grants
        .load_or_sign([contract], bob.address(), Some(&*bob))
        .await?;
    assert!(matches!(
        grants.decrypt_with(&grant, &handles, &*f.fhe),
        Err(GrantError::Capability(FheError::InvalidGrant(_)))
    ));

    // Expired, then renewed with a second signature.
    let grants = f.grant_manager(&*alice).with_duration_days(1);
    let grant = grants
        .load_or_sign([contract], alice.address(), Some(&*alice))
        .await?;
    assert!(grants.decrypt_with(&grant, &handles, &*f.fhe).is_ok());
    f.clock.advance(SECONDS_PER_DAY + 1);
    assert!(matches!(
        grants.decrypt_with(&grant, &handles, &*f.fhe),
        Err(GrantError::Capability(FheError::Expired { .. }))
    ));
    let signatures = alice.signature_count();
    let renewed = grants
        .load_or_sign([contract], alice.address(), Some(&*alice))
        .await?;
    assert_eq!(alice.signature_count(), signatures + 1);
    assert!(grants.decrypt_with(&renewed, &handles, &*f.fhe).is_ok());
    Ok(())
}
