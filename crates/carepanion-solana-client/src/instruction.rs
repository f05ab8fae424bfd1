//! `RecordLabel` instruction encoding (program interface v1).
//!
//! Wire layout, exactly 41 bytes, no padding:
//!
//! | Offset | Length | Field        | Encoding               |
//! |--------|--------|--------------|------------------------|
//! | 0      | 1      | discriminant | constant `0x00`        |
//! | 1      | 32     | content_hash | raw digest bytes       |
//! | 33     | 8      | audio_id     | little-endian unsigned |
//!
//! Accounts, in order:
//! 0. treasury: signer, writable (fee payer)
//! 1. participant stats PDA: writable
//! 2. system program: readonly
//! 3. clock sysvar: readonly
//!
//! Layout and account order are part of the contract with the deployed program.

use carepanion_core::hashing::ContentHash;
use carepanion_core::version::ProgramVersion;
use carepanion_core::{AttestError, AttestResult};
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;
use solana_program::{system_program, sysvar};

use crate::constants::{RECORD_LABEL_DISCRIMINANT, RECORD_LABEL_LEN};

/// Program interface version this encoder targets.
pub const TARGET_VERSION: ProgramVersion = ProgramVersion::V1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttestationInstruction {
    discriminant: u8,
    content_hash: ContentHash,
    audio_id: u64,
}

impl AttestationInstruction {
    pub fn record_label(content_hash: ContentHash, audio_id: u64) -> Self {
        Self {
            discriminant: RECORD_LABEL_DISCRIMINANT,
            content_hash,
            audio_id,
        }
    }

    pub fn discriminant(&self) -> u8 {
        self.discriminant
    }

    pub fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    pub fn audio_id(&self) -> u64 {
        self.audio_id
    }

    pub fn encode(&self) -> [u8; RECORD_LABEL_LEN] {
        let mut out = [0u8; RECORD_LABEL_LEN];
        out[0] = self.discriminant;
        out[1..33].copy_from_slice(&self.content_hash);
        out[33..41].copy_from_slice(&self.audio_id.to_le_bytes());
        out
    }

    /// Decode instruction data, e.g. to verify a transaction fetched from the ledger.
    pub fn decode(data: &[u8]) -> AttestResult<Self> {
        if data.len() != RECORD_LABEL_LEN {
            return Err(AttestError::validation(format!(
                "record_label data must be {RECORD_LABEL_LEN} bytes, got {}",
                data.len()
            )));
        }
        if data[0] != RECORD_LABEL_DISCRIMINANT {
            return Err(AttestError::validation(format!(
                "unknown instruction tag {:#04x}",
                data[0]
            )));
        }
        let mut content_hash = [0u8; 32];
        content_hash.copy_from_slice(&data[1..33]);
        let mut audio_id = [0u8; 8];
        audio_id.copy_from_slice(&data[33..41]);
        Ok(Self::record_label(content_hash, u64::from_le_bytes(audio_id)))
    }
}

/// Account list for `RecordLabel`.
pub fn record_label_accounts(treasury: Pubkey, user_stats: Pubkey) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(treasury, true),
        AccountMeta::new(user_stats, false),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(sysvar::clock::id(), false),
    ]
}

/// Build the full `RecordLabel` instruction.
pub fn build_record_label(
    program_id: Pubkey,
    treasury: Pubkey,
    user_stats: Pubkey,
    ix: &AttestationInstruction,
) -> Instruction {
    Instruction {
        program_id,
        accounts: record_label_accounts(treasury, user_stats),
        data: ix.encode().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const REFERENCE_HASH: &str = "342d71aa76952a1f757aecf1f4cab933cd3dee18fb4404ed7490bf86d0fbe8f4";

    fn reference_hash() -> ContentHash {
        let mut h = [0u8; 32];
        h.copy_from_slice(&hex::decode(REFERENCE_HASH).unwrap());
        h
    }

    #[test]
    fn reference_layout() {
        let data = AttestationInstruction::record_label(reference_hash(), 42).encode();
        let expected = format!("00{REFERENCE_HASH}2a00000000000000");
        assert_eq!(hex::encode(data), expected);
    }

    #[test]
    fn account_order_and_flags() {
        let treasury = Pubkey::new_unique();
        let stats = Pubkey::new_unique();
        let metas = record_label_accounts(treasury, stats);

        assert_eq!(metas.len(), 4);
        assert_eq!((metas[0].pubkey, metas[0].is_signer, metas[0].is_writable), (treasury, true, true));
        assert_eq!((metas[1].pubkey, metas[1].is_signer, metas[1].is_writable), (stats, false, true));
        assert_eq!(
            (metas[2].pubkey, metas[2].is_signer, metas[2].is_writable),
            (system_program::id(), false, false)
        );
        assert_eq!(metas[2].pubkey.to_string(), "11111111111111111111111111111111");
        assert_eq!(
            (metas[3].pubkey, metas[3].is_signer, metas[3].is_writable),
            (sysvar::clock::id(), false, false)
        );
        assert_eq!(metas[3].pubkey.to_string(), "SysvarC1ock11111111111111111111111111111111");
    }

    #[test]
    fn decode_rejects_bad_input() {
        assert!(AttestationInstruction::decode(&[0u8; 40]).is_err());
        let mut data = AttestationInstruction::record_label([1u8; 32], 7).encode();
        data[0] = 1;
        assert!(AttestationInstruction::decode(&data).is_err());
    }

    #[test]
    fn build_embeds_program_and_data() {
        let program_id = Pubkey::new_unique();
        let payload = AttestationInstruction::record_label(reference_hash(), 42);
        let ix = build_record_label(program_id, Pubkey::new_unique(), Pubkey::new_unique(), &payload);
        assert_eq!(ix.program_id, program_id);
        assert_eq!(ix.data, payload.encode().to_vec());
        assert_eq!(TARGET_VERSION, ProgramVersion::V1);
    }

    proptest! {
        #[test]
        fn layout_holds_for_any_input(hash in any::<[u8; 32]>(), audio_id in any::<u64>()) {
            let ix = AttestationInstruction::record_label(hash, audio_id);
            let data = ix.encode();
            prop_assert_eq!(data.len(), 41);
            prop_assert_eq!(data[0], 0x00);
            prop_assert_eq!(&data[1..33], &hash[..]);
            let mut le = [0u8; 8];
            le.copy_from_slice(&data[33..41]);
            prop_assert_eq!(u64::from_le_bytes(le), audio_id);
            prop_assert_eq!(AttestationInstruction::decode(&data).unwrap(), ix);
        }
    }
}
