//! Process-wide attestation context.
//!
//! Built once at startup and shared by reference with every coordinator. It owns
//! the RPC client, the store, the program id, the treasury key and the retry
//! policy. Nothing in it is mutated after construction.

use carepanion_core::config::{validate_config, AttestationConfig};
use carepanion_core::retry::RetryPolicy;
use carepanion_core::AttestResult;
use carepanion_solana_client::{parse_program_id, LedgerRpc, Pubkey, TransactionSubmitter, TreasuryKey};
use carepanion_store::LabelStore;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;

pub struct AttestationContext<R, S> {
    pub(crate) submitter: TransactionSubmitter<R>,
    pub(crate) store: S,
    pub(crate) program_id: Option<Pubkey>,
    pub(crate) treasury: TreasuryKey,
    pub(crate) retry: RetryPolicy,
}

impl<R: LedgerRpc, S: LabelStore> AttestationContext<R, S> {
    pub fn new(rpc: R, store: S, program_id: Option<Pubkey>, treasury: TreasuryKey) -> Self {
        Self {
            submitter: TransactionSubmitter::new(rpc),
            store,
            program_id,
            treasury,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn rpc(&self) -> &R {
        self.submitter.rpc()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn program_id(&self) -> Option<Pubkey> {
        self.program_id
    }

    pub fn treasury(&self) -> &TreasuryKey {
        &self.treasury
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }
}

impl<S: LabelStore> AttestationContext<RpcClient, S> {
    /// Build a context talking to a real Solana RPC endpoint.
    ///
    /// A missing program id does not fail here; submissions will report
    /// `NotConfigured` instead.
    pub fn from_config(cfg: &AttestationConfig, store: S) -> AttestResult<Self> {
        validate_config(cfg)?;

        let program_id = cfg
            .program_id
            .as_deref()
            .map(parse_program_id)
            .transpose()?;
        match program_id {
            Some(id) => tracing::info!(program_id = %id, rpc_url = %cfg.rpc_url, "ledger submission enabled"),
            None => tracing::warn!("program id not configured; ledger submission disabled"),
        }

        let rpc = RpcClient::new_with_commitment(cfg.rpc_url.clone(), CommitmentConfig::confirmed());
        let treasury = TreasuryKey::load(cfg.treasury_key_json.as_deref());

        Ok(Self::new(rpc, store, program_id, treasury).with_retry(cfg.retry))
    }
}
