// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::DrawError;
use alloy::primitives::Address;
use eld_events::CiphertextHandle;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub index: u32,
    pub account: Address,
    pub fingerprint_handle: CiphertextHandle,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Registering,
    Drawn,
}

/// Append-only participant list for the current round.
#[derive(Clone, Debug, Default)]
pub struct RoundState {
    phase: Phase,
    participants: Vec<ParticipantRecord>,
}

impl RoundState {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn participants(&self) -> &[ParticipantRecord] {
        &self.participants
    }

    pub fn count(&self) -> u32 {
        // bounded by `next_index`
        self.participants.len() as u32
    }

    pub fn account_at(&self, index: u32) -> Result<Address, DrawError> {
        self.participants
            .get(index as usize)
            .map(|p| p.account)
            .ok_or(DrawError::IndexOutOfRange {
                index,
                count: self.count(),
            })
    }

    pub(crate) fn next_index(&self) -> Result<u32, DrawError> {
        u32::try_from(self.participants.len())
            .ok()
            .filter(|i| *i < u32::MAX)
            .ok_or(DrawError::RegistryFull)
    }

    pub(crate) fn push(
        &mut self,
        index: u32,
        account: Address,
        fingerprint_handle: CiphertextHandle,
    ) -> ParticipantRecord {
        let record = ParticipantRecord {
            index,
            account,
            fingerprint_handle,
        };
        self.participants.push(record.clone());
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eld_events::FheType;

    #[test]
    fn indices_are_contiguous() {
        let mut round = RoundState::default();
        for i in 0..3u8 {
            let index = round.next_index().unwrap();
            let record = round.push(
                index,
                Address::repeat_byte(i),
                CiphertextHandle::derive(&[i], FheType::Uint64),
            );
            assert_eq!(record.index, u32::from(i));
        }
        assert_eq!(round.count(), 3);
        assert_eq!(round.account_at(2).unwrap(), Address::repeat_byte(2));
        assert_eq!(
            round.account_at(3),
            Err(DrawError::IndexOutOfRange { index: 3, count: 3 })
        );
    }
}
