//! Signed transaction submission.
//!
//! Submission is two steps. `prepare` fetches a recent blockhash, wraps one
//! instruction in a transaction paid for by the treasury and signs it.
//! `broadcast` sends a signed transaction with preflight simulation skipped.
//! `submit` runs both once.
//!
//! A prepared transaction can be broadcast again while its blockhash is valid.
//! The ledger dedupes by signature, so a rebroadcast never produces a second
//! attestation. Signing a fresh transaction after a broadcast whose answer was
//! lost can.
//!
//! There is no retry here. Retrying a ledger write is a policy decision that
//! belongs to the caller.

use std::time::Duration;

use async_trait::async_trait;
use carepanion_core::model::SubmissionResult;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_client::rpc_request::RpcError;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::signature::{Signature, Signer};
use solana_sdk::transaction::{Transaction, TransactionError};

use crate::keys::{SigningError, TreasuryKey};

/// How long a fetched blockhash stays usable for (re)broadcast. The cluster
/// accepts a blockhash for 150 slots; this leaves margin below that.
pub const BLOCKHASH_VALIDITY: Duration = Duration::from_secs(60);

/// Why an RPC round-trip produced no usable answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcFailure {
    /// Transport failure, timeout, or malformed response.
    Unavailable(String),
    /// The node or the runtime refused the request.
    Rejected(String),
}

impl RpcFailure {
    pub fn reason(&self) -> &str {
        match self {
            Self::Unavailable(r) | Self::Rejected(r) => r,
        }
    }
}

impl From<RpcFailure> for SubmissionResult {
    fn from(f: RpcFailure) -> Self {
        match f {
            RpcFailure::Unavailable(reason) => SubmissionResult::Unavailable(reason),
            RpcFailure::Rejected(reason) => SubmissionResult::Rejected(reason),
        }
    }
}

/// The two ledger RPC calls the pipeline needs.
///
/// Implementations must be safe for concurrent use; the pipeline shares one
/// instance across all in-flight submissions.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    async fn fetch_blockhash(&self) -> Result<Hash, RpcFailure>;

    /// Broadcast a signed transaction without preflight simulation.
    async fn broadcast(&self, tx: &Transaction) -> Result<Signature, RpcFailure>;
}

#[async_trait]
impl LedgerRpc for RpcClient {
    async fn fetch_blockhash(&self) -> Result<Hash, RpcFailure> {
        self.get_latest_blockhash()
            .await
            .map_err(|e| blockhash_failure(&e))
    }

    async fn broadcast(&self, tx: &Transaction) -> Result<Signature, RpcFailure> {
        let config = RpcSendTransactionConfig {
            skip_preflight: true,
            ..RpcSendTransactionConfig::default()
        };
        match self.send_transaction_with_config(tx, config).await {
            Ok(sig) => Ok(sig),
            // A rebroadcast of a transaction that already landed.
            Err(e) if is_already_processed(e.kind()) => tx
                .signatures
                .first()
                .copied()
                .ok_or_else(|| classify_client_error(&e)),
            Err(e) => Err(classify_client_error(&e)),
        }
    }
}

/// Nothing has been sent when a blockhash fetch fails, so the ledger cannot
/// have refused anything: every such failure is `Unavailable`.
pub fn blockhash_failure(err: &ClientError) -> RpcFailure {
    RpcFailure::Unavailable(format!("blockhash fetch failed: {err}"))
}

/// Classify a broadcast failure as refused or unanswered.
pub fn classify_client_error(err: &ClientError) -> RpcFailure {
    classify_error_kind(err.kind())
}

pub fn classify_error_kind(kind: &ClientErrorKind) -> RpcFailure {
    match kind {
        ClientErrorKind::RpcError(RpcError::RpcResponseError { code, message, .. }) => {
            RpcFailure::Rejected(format!("rpc error {code}: {message}"))
        }
        ClientErrorKind::RpcError(RpcError::ForUser(msg)) => RpcFailure::Rejected(msg.clone()),
        ClientErrorKind::TransactionError(e) => RpcFailure::Rejected(e.to_string()),
        ClientErrorKind::SigningError(e) => RpcFailure::Rejected(e.to_string()),
        other => RpcFailure::Unavailable(other.to_string()),
    }
}

pub fn is_already_processed(kind: &ClientErrorKind) -> bool {
    matches!(kind, ClientErrorKind::TransactionError(TransactionError::AlreadyProcessed))
}

/// Result of `TransactionSubmitter::prepare`.
#[derive(Debug)]
pub enum Prepared {
    Signed(Transaction),
    /// No blockhash could be fetched; nothing was sent.
    Unavailable(String),
}

pub struct TransactionSubmitter<R> {
    rpc: R,
}

impl<R: LedgerRpc> TransactionSubmitter<R> {
    pub fn new(rpc: R) -> Self {
        Self { rpc }
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Build and sign a transaction for one instruction paid for by the treasury.
    pub async fn prepare(
        &self,
        instruction: &Instruction,
        treasury: &TreasuryKey,
    ) -> Result<Prepared, SigningError> {
        let payer = treasury.keypair()?;

        let blockhash = match self.rpc.fetch_blockhash().await {
            Ok(h) => h,
            Err(f) => {
                tracing::debug!(failure = ?f, "blockhash fetch failed");
                return Ok(Prepared::Unavailable(f.reason().to_string()));
            }
        };

        let message = Message::new(std::slice::from_ref(instruction), Some(&payer.pubkey()));
        let mut tx = Transaction::new_unsigned(message);
        tx.try_sign(&[payer], blockhash)
            .map_err(|e| SigningError(e.to_string()))?;
        Ok(Prepared::Signed(tx))
    }

    /// Broadcast a signed transaction. Safe to repeat for the same transaction.
    pub async fn broadcast(&self, tx: &Transaction) -> SubmissionResult {
        match self.rpc.broadcast(tx).await {
            Ok(sig) if sig == Signature::default() => {
                SubmissionResult::Unavailable("rpc returned no signature".to_string())
            }
            Ok(sig) => {
                tracing::debug!(signature = %sig, "transaction broadcast");
                SubmissionResult::Signature(sig.to_string())
            }
            Err(f) => {
                tracing::debug!(failure = ?f, "broadcast failed");
                f.into()
            }
        }
    }

    /// Prepare and broadcast once.
    pub async fn submit(
        &self,
        instruction: Instruction,
        treasury: &TreasuryKey,
    ) -> Result<SubmissionResult, SigningError> {
        Ok(match self.prepare(&instruction, treasury).await? {
            Prepared::Signed(tx) => self.broadcast(&tx).await,
            Prepared::Unavailable(reason) => SubmissionResult::Unavailable(reason),
        })
    }
}
