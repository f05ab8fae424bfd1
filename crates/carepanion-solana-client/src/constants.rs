//! Constants shared between the on-chain program and clients.
//!
//! Keep these stable because they affect PDA derivation and the instruction wire
//! format.

use std::str::FromStr;

use carepanion_core::{AttestError, AttestResult};
use solana_program::pubkey::Pubkey;

/// PDA seed for per-participant stats accounts.
pub const SEED_USER_STATS: &[u8] = b"user_stats";

/// Instruction tag for `RecordLabel`.
pub const RECORD_LABEL_DISCRIMINANT: u8 = 0x00;

/// Encoded `RecordLabel` length: tag + 32-byte hash + u64 audio id.
pub const RECORD_LABEL_LEN: usize = 1 + 32 + 8;

/// Parse a base58 program id.
pub fn parse_program_id(s: &str) -> AttestResult<Pubkey> {
    Pubkey::from_str(s.trim())
        .map_err(|e| AttestError::validation(format!("invalid program id {s:?}: {e}")))
}
