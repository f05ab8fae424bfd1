//! carepanion-solana-client
//!
//! A small, focused client for recording rating attestations with the
//! Carepanion on-chain program.
//!
//! It includes:
//! - derived address (PDA) computation for per-participant stats accounts
//! - the fixed 41-byte `RecordLabel` instruction and its account list
//! - treasury key loading with an ephemeral fallback
//! - a transaction submitter behind the async `LedgerRpc` seam
//!
//! The on-chain program id is always provided by the consumer.

pub mod constants;
pub mod instruction;
pub mod keys;
pub mod pda;
pub mod submitter;

pub use constants::*;
pub use instruction::{build_record_label, record_label_accounts, AttestationInstruction};
pub use keys::{KeyError, SigningError, TreasuryKey};
pub use pda::{derive_address, derive_user_stats, DerivedAddress};
pub use submitter::{LedgerRpc, Prepared, RpcFailure, TransactionSubmitter, BLOCKHASH_VALIDITY};

pub use solana_sdk::pubkey::Pubkey;
