// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    DrawError, ParticipantRecord, PendingDraw, Phase, Publication, RoundState, WinnerPublication,
};
use alloy::primitives::Address;
use eld_events::{
    CiphertextHandle, ClearValue, DiscardReason, DrawId, EncryptedInput, FheType,
    RevealRequestId, RevealResponse,
};
use eld_fhe::{FheError, RandomnessSource, SharedCapability};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Result of a committed registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub record: ParticipantRecord,
    pub version: u64,
    /// `Some(was_pending)` when the registration invalidated a publication or a pending draw.
    pub cleared: Option<bool>,
}

/// Result of a committed draw request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawRequest {
    pub pending: PendingDraw,
    /// Request of an earlier draw that this one replaced before it was revealed.
    pub superseded: Option<RevealRequestId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    Published(WinnerPublication),
    Discarded(DiscardReason),
}

/// Registry and draw engine for one deployment.
///
/// Every method either commits completely or returns an error having changed nothing. All
/// ciphertext work goes through the injected capability and the engine never branches on an
/// encrypted value.
pub struct LuckyDraw {
    draw_id: DrawId,
    fhe: SharedCapability,
    randomness: Arc<dyn RandomnessSource>,
    round: RoundState,
    publication: Publication,
    version: u64,
    retired: HashMap<RevealRequestId, DiscardReason>,
}

impl LuckyDraw {
    pub fn new(
        draw_id: DrawId,
        fhe: SharedCapability,
        randomness: Arc<dyn RandomnessSource>,
    ) -> Self {
        Self {
            draw_id,
            fhe,
            randomness,
            round: RoundState::default(),
            publication: Publication::None,
            version: 0,
            retired: HashMap::new(),
        }
    }

    pub fn draw_id(&self) -> DrawId {
        self.draw_id
    }

    fn contract(&self) -> Address {
        self.draw_id.contract()
    }

    pub fn phase(&self) -> Phase {
        self.round.phase()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn publication(&self) -> &Publication {
        &self.publication
    }

    pub fn participants(&self) -> &[ParticipantRecord] {
        self.round.participants()
    }

    pub fn count(&self) -> u32 {
        self.round.count()
    }

    pub fn account_at(&self, index: u32) -> Result<Address, DrawError> {
        self.round.account_at(index)
    }

    /// Admit an encrypted fingerprint for `caller`.
    pub fn register(
        &mut self,
        input: &EncryptedInput,
        caller: Address,
    ) -> Result<Registration, DrawError> {
        let contract = self.contract();
        let index = self.round.next_index()?;

        let handle = self
            .fhe
            .verify_input(input, contract, caller)
            .map_err(|err| match err {
                FheError::InvalidProof(reason) => DrawError::InvalidCiphertextProof(reason),
                FheError::UnknownHandle(handle) => {
                    DrawError::InvalidCiphertextProof(format!("unknown handle {handle}"))
                }
                other => DrawError::Capability(other),
            })?;
        if handle.fhe_type() != Some(FheType::Uint64) {
            return Err(DrawError::InvalidCiphertextProof(format!(
                "expected an euint64 fingerprint, got {handle}"
            )));
        }

        self.fhe.allow(&handle, contract)?;
        self.fhe.allow(&handle, caller)?;

        let cleared = match std::mem::take(&mut self.publication) {
            Publication::None => None,
            Publication::Pending(pending) => {
                self.retired
                    .insert(pending.request_id, DiscardReason::RoundChanged);
                Some(true)
            }
            Publication::Published(_) => Some(false),
        };
        self.round.set_phase(Phase::Registering);
        self.version += 1;
        let record = self.round.push(index, caller, handle);

        Ok(Registration {
            record,
            version: self.version,
            cleared,
        })
    }

    /// Select a winner obliviously and ask the oracle to reveal its account.
    pub fn draw(&mut self) -> Result<DrawRequest, DrawError> {
        let count = self.round.count();
        if count < 2 {
            return Err(DrawError::InsufficientParticipants { count });
        }

        let fhe = &self.fhe;
        let contract = self.contract();

        let seed = self.randomness.next_seed()?;
        let random = fhe.random(seed, FheType::Uint32)?;
        let index_handle = fhe.rem_scalar(&random, u64::from(count))?;

        let mut name_handle = fhe.trivial_encrypt(ClearValue::Uint64(0))?;
        let mut account_handle = fhe.trivial_encrypt(ClearValue::Address(Address::ZERO))?;
        for participant in self.round.participants() {
            let is_winner = fhe.eq_scalar(&index_handle, u64::from(participant.index))?;
            let account = fhe.trivial_encrypt(ClearValue::Address(participant.account))?;
            name_handle = fhe.select(&is_winner, &participant.fingerprint_handle, &name_handle)?;
            account_handle = fhe.select(&is_winner, &account, &account_handle)?;
        }

        for handle in [&index_handle, &name_handle, &account_handle] {
            fhe.allow(handle, contract)?;
        }
        for participant in self.round.participants() {
            fhe.allow(&index_handle, participant.account)?;
            fhe.allow(&name_handle, participant.account)?;
        }

        let request_id = fhe.request_reveal(&[account_handle], contract)?;
        debug!(draw = %self.draw_id, request = %request_id, count, "winner selected obliviously");

        let pending = PendingDraw {
            version: self.version,
            request_id,
            participant_count: count,
            account_handle,
            index_handle,
            name_handle,
        };
        let superseded = match std::mem::replace(
            &mut self.publication,
            Publication::Pending(pending.clone()),
        ) {
            Publication::Pending(previous) => {
                self.retired
                    .insert(previous.request_id, DiscardReason::Superseded);
                Some(previous.request_id)
            }
            _ => None,
        };

        Ok(DrawRequest {
            pending,
            superseded,
        })
    }

    /// Apply the oracle callback for a reveal request.
    pub fn on_reveal(&mut self, response: &RevealResponse) -> RevealOutcome {
        let pending = match &self.publication {
            Publication::Pending(p) if p.request_id == response.request_id => p.clone(),
            _ => {
                let reason = self
                    .retired
                    .remove(&response.request_id)
                    .unwrap_or(DiscardReason::Unknown);
                return RevealOutcome::Discarded(reason);
            }
        };

        if pending.version != self.version {
            return RevealOutcome::Discarded(DiscardReason::RoundChanged);
        }

        let Some(account) = response
            .value_of(&pending.account_handle)
            .and_then(|v| v.as_address())
        else {
            return RevealOutcome::Discarded(DiscardReason::MalformedResponse);
        };

        let publication = WinnerPublication {
            account,
            index_handle: pending.index_handle,
            name_handle: pending.name_handle,
        };
        self.publication = Publication::Published(publication.clone());
        self.round.set_phase(Phase::Drawn);
        RevealOutcome::Published(publication)
    }

    fn current(&self) -> Result<&WinnerPublication, DrawError> {
        self.publication.published().ok_or(DrawError::NoWinnerYet)
    }

    /// The current publication as one consistent record.
    pub fn winner_publication(&self) -> Result<WinnerPublication, DrawError> {
        self.current().cloned()
    }

    pub fn winner_account(&self) -> Result<Address, DrawError> {
        Ok(self.current()?.account)
    }

    pub fn encrypted_winner_index(&self) -> Result<CiphertextHandle, DrawError> {
        Ok(self.current()?.index_handle)
    }

    pub fn encrypted_winner_name(&self) -> Result<CiphertextHandle, DrawError> {
        Ok(self.current()?.name_handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eld_events::DecryptionGrant;
    use eld_fhe::{CiphertextCapability, LocalCoprocessor, SeededRandomness};

    const CHAIN: u64 = 31337;

    fn contract() -> Address {
        Address::repeat_byte(0xd0)
    }

    fn setup() -> (Arc<LocalCoprocessor>, LuckyDraw) {
        let fhe = Arc::new(LocalCoprocessor::new(CHAIN).unwrap());
        let draw = LuckyDraw::new(
            DrawId::new(contract(), CHAIN),
            fhe.clone(),
            Arc::new(SeededRandomness::from_u64(1)),
        );
        (fhe, draw)
    }

    fn register(
        fhe: &LocalCoprocessor,
        draw: &mut LuckyDraw,
        who: u8,
        fingerprint: u64,
    ) -> Registration {
        let caller = Address::repeat_byte(who);
        let input = fhe
            .encrypt(ClearValue::Uint64(fingerprint), contract(), caller)
            .unwrap();
        draw.register(&input, caller).unwrap()
    }

    fn reveal(fhe: &LocalCoprocessor, draw: &mut LuckyDraw, request: &DrawRequest) -> RevealOutcome {
        let response = fhe.fulfill_reveal(request.pending.request_id).unwrap();
        draw.on_reveal(&response)
    }

    #[test]
    fn register_assigns_sequential_indices() {
        let (fhe, mut draw) = setup();
        for i in 0..4u8 {
            let reg = register(&fhe, &mut draw, i + 1, u64::from(i));
            assert_eq!(reg.record.index, u32::from(i));
            assert_eq!(reg.version, u64::from(i) + 1);
            assert!(fhe.is_allowed(&reg.record.fingerprint_handle, contract()));
            assert!(fhe.is_allowed(&reg.record.fingerprint_handle, reg.record.account));
        }
        assert_eq!(draw.count(), 4);
        assert_eq!(draw.account_at(1).unwrap(), Address::repeat_byte(2));
    }

    #[test]
    fn invalid_proof_commits_nothing() {
        let (fhe, mut draw) = setup();
        let alice = Address::repeat_byte(1);
        let input = fhe.encrypt(ClearValue::Uint64(1), contract(), alice).unwrap();

        let err = draw.register(&input, Address::repeat_byte(2)).unwrap_err();
        assert!(matches!(err, DrawError::InvalidCiphertextProof(_)));
        assert_eq!(draw.count(), 0);
        assert_eq!(draw.version(), 0);
    }

    #[test]
    fn wrongly_typed_input_is_rejected() {
        let (fhe, mut draw) = setup();
        let alice = Address::repeat_byte(1);
        let input = fhe.encrypt(ClearValue::Uint32(1), contract(), alice).unwrap();
        assert!(matches!(
            draw.register(&input, alice),
            Err(DrawError::InvalidCiphertextProof(_))
        ));
        assert_eq!(draw.count(), 0);
    }

    #[test]
    fn draw_needs_two_participants() {
        let (fhe, mut draw) = setup();
        assert_eq!(
            draw.draw().unwrap_err(),
            DrawError::InsufficientParticipants { count: 0 }
        );
        register(&fhe, &mut draw, 1, 11);
        assert_eq!(
            draw.draw().unwrap_err(),
            DrawError::InsufficientParticipants { count: 1 }
        );
        assert_eq!(draw.publication(), &Publication::None);
    }

    #[test]
    fn winner_reads_wait_for_reveal() {
        let (fhe, mut draw) = setup();
        register(&fhe, &mut draw, 1, 11);
        register(&fhe, &mut draw, 2, 22);

        let request = draw.draw().unwrap();
        assert_eq!(draw.winner_account(), Err(DrawError::NoWinnerYet));
        assert_eq!(draw.phase(), Phase::Registering);

        let RevealOutcome::Published(publication) = reveal(&fhe, &mut draw, &request) else {
            panic!("reveal should publish");
        };
        assert_eq!(draw.phase(), Phase::Drawn);
        assert_eq!(draw.winner_account().unwrap(), publication.account);
        assert!([Address::repeat_byte(1), Address::repeat_byte(2)].contains(&publication.account));
    }

    #[test]
    fn published_handles_decrypt_to_winner() {
        use alloy::primitives::Bytes;
        use alloy::signers::{local::PrivateKeySigner, SignerSync};

        let (fhe, mut draw) = setup();
        let holders: Vec<PrivateKeySigner> = (0..3).map(|_| PrivateKeySigner::random()).collect();
        for (i, holder) in holders.iter().enumerate() {
            let input = fhe
                .encrypt(ClearValue::Uint64(100 + i as u64), contract(), holder.address())
                .unwrap();
            draw.register(&input, holder.address()).unwrap();
        }
        let request = draw.draw().unwrap();
        reveal(&fhe, &mut draw, &request);

        let winner = draw.winner_account().unwrap();
        for holder in &holders {
            let (public_key, private_key) = eld_fhe::generate_ephemeral_keypair();
            let mut grant = DecryptionGrant {
                contract_addresses: vec![contract()],
                user_address: holder.address(),
                chain_id: CHAIN,
                public_key,
                private_key,
                start_timestamp: 0,
                duration_days: 365_000,
                signature: Bytes::new(),
            };
            let sig = holder.sign_hash_sync(&grant.signing_hash()).unwrap();
            grant.signature = Bytes::from(sig.as_bytes().to_vec());

            let index = fhe
                .reveal(&draw.encrypted_winner_index().unwrap(), contract(), &grant)
                .unwrap()
                .as_u64()
                .unwrap() as u32;
            let name = fhe
                .reveal(&draw.encrypted_winner_name().unwrap(), contract(), &grant)
                .unwrap();
            assert_eq!(draw.account_at(index).unwrap(), winner);
            assert_eq!(name, ClearValue::Uint64(100 + u64::from(index)));
        }
    }

    #[test]
    fn registration_during_pending_draw_discards_reveal() {
        let (fhe, mut draw) = setup();
        register(&fhe, &mut draw, 1, 11);
        register(&fhe, &mut draw, 2, 22);
        let request = draw.draw().unwrap();

        let reg = register(&fhe, &mut draw, 3, 33);
        assert_eq!(reg.cleared, Some(true));
        assert_eq!(
            reveal(&fhe, &mut draw, &request),
            RevealOutcome::Discarded(DiscardReason::RoundChanged)
        );
        assert_eq!(draw.encrypted_winner_index(), Err(DrawError::NoWinnerYet));
    }

    #[test]
    fn registration_after_draw_clears_publication() {
        let (fhe, mut draw) = setup();
        register(&fhe, &mut draw, 1, 11);
        register(&fhe, &mut draw, 2, 22);
        let request = draw.draw().unwrap();
        reveal(&fhe, &mut draw, &request);

        let reg = register(&fhe, &mut draw, 3, 33);
        assert_eq!(reg.cleared, Some(false));
        assert_eq!(draw.phase(), Phase::Registering);
        assert_eq!(draw.winner_account(), Err(DrawError::NoWinnerYet));
        assert_eq!(draw.encrypted_winner_name(), Err(DrawError::NoWinnerYet));

        let again = draw.draw().unwrap();
        assert!(matches!(
            reveal(&fhe, &mut draw, &again),
            RevealOutcome::Published(_)
        ));
    }

    #[test]
    fn newer_draw_supersedes_pending_one() {
        let (fhe, mut draw) = setup();
        register(&fhe, &mut draw, 1, 11);
        register(&fhe, &mut draw, 2, 22);
        let first = draw.draw().unwrap();
        let second = draw.draw().unwrap();
        assert_eq!(second.superseded, Some(first.pending.request_id));

        assert_eq!(
            reveal(&fhe, &mut draw, &first),
            RevealOutcome::Discarded(DiscardReason::Superseded)
        );
        assert!(matches!(
            reveal(&fhe, &mut draw, &second),
            RevealOutcome::Published(_)
        ));
    }

    #[test]
    fn same_seed_and_registrations_pick_same_winner() {
        let run = |seed: u64| {
            let fhe = Arc::new(LocalCoprocessor::new(CHAIN).unwrap());
            let mut draw = LuckyDraw::new(
                DrawId::new(contract(), CHAIN),
                fhe.clone(),
                Arc::new(SeededRandomness::from_u64(seed)),
            );
            for who in 1..=5u8 {
                register(&fhe, &mut draw, who, u64::from(who) * 11);
            }
            let request = draw.draw().unwrap();
            reveal(&fhe, &mut draw, &request);
            draw.winner_account().unwrap()
        };

        for seed in [0, 7, 42] {
            assert_eq!(run(seed), run(seed));
        }
    }

    #[test]
    fn answered_requests_are_forgotten() {
        let (fhe, mut draw) = setup();
        register(&fhe, &mut draw, 1, 11);
        register(&fhe, &mut draw, 2, 22);
        let first = draw.draw().unwrap();
        let second = draw.draw().unwrap();
        assert_eq!(draw.retired.len(), 1);

        let stale = fhe.fulfill_reveal(first.pending.request_id).unwrap();
        assert_eq!(
            draw.on_reveal(&stale),
            RevealOutcome::Discarded(DiscardReason::Superseded)
        );
        assert!(draw.retired.is_empty());
        assert_eq!(
            draw.on_reveal(&stale),
            RevealOutcome::Discarded(DiscardReason::Unknown)
        );
        assert!(matches!(
            reveal(&fhe, &mut draw, &second),
            RevealOutcome::Published(_)
        ));
    }

    #[test]
    fn unknown_reveal_is_ignored() {
        let (_, mut draw) = setup();
        let response = RevealResponse {
            request_id: RevealRequestId(99),
            cleartexts: vec![],
        };
        assert_eq!(
            draw.on_reveal(&response),
            RevealOutcome::Discarded(DiscardReason::Unknown)
        );
    }
}
