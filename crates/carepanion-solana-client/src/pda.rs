//! Derived address (PDA) computation for the Carepanion program.
//!
//! A derived address is a deterministic, off-curve account address with no
//! private key. It is found by trying bump seeds from 255 down to 0 and keeping
//! the first one whose hash of `seed ∥ identity ∥ [bump] ∥ program_id` is not a
//! valid ed25519 point. The hashing and curve test are Solana's
//! `create_program_address`, so results match the on-chain program's own
//! `find_program_address` call.

use carepanion_core::model::ParticipantId;
use carepanion_core::{AttestError, AttestResult};
use solana_program::pubkey::{Pubkey, PubkeyError};

use crate::constants::SEED_USER_STATS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedAddress {
    pub address: Pubkey,
    pub bump: u8,
}

/// Derive the program address for `seed ∥ identity`.
///
/// `NoValidAddress` is returned only if every bump lands on the curve; callers
/// treat it as a fatal configuration error.
pub fn derive_address(seed: &[u8], identity: &[u8], program_id: &Pubkey) -> AttestResult<DerivedAddress> {
    for bump in (0..=u8::MAX).rev() {
        match Pubkey::create_program_address(&[seed, identity, &[bump]], program_id) {
            Ok(address) => return Ok(DerivedAddress { address, bump }),
            Err(PubkeyError::InvalidSeeds) => continue,
            Err(e) => {
                return Err(AttestError::validation(format!(
                    "derived address seeds rejected: {e}"
                )))
            }
        }
    }
    Err(AttestError::NoValidAddress)
}

/// Derive a participant's stats account.
pub fn derive_user_stats(program_id: &Pubkey, participant: &ParticipantId) -> AttestResult<DerivedAddress> {
    derive_address(SEED_USER_STATS, participant.as_bytes(), program_id)
}
