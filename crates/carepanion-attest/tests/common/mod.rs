//! Shared test doubles for coordinator tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use carepanion_attest::{AttestationContext, AttestationCoordinator};
use carepanion_core::model::{ParticipantId, RatingRequest};
use carepanion_core::retry::RetryPolicy;
use carepanion_solana_client::{parse_program_id, LedgerRpc, Pubkey, RpcFailure, TreasuryKey};
use carepanion_store::{LabelStore, MemoryLabelStore};
use solana_sdk::hash::Hash;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::transaction::Transaction;
use tokio::sync::{Barrier, Notify};

pub const PROGRAM_ID: &str = "431uCPYwa2niRi2xpsbvrwmS74wC7gyfAfHkGz8VmkvK";

/// How the fake ledger answers broadcasts.
#[derive(Debug, Clone)]
pub enum Answer {
    /// Accept and return the transaction's own signature.
    Accept,
    Reject(String),
    Unavailable(String),
    /// Respond without a signature.
    NoSignature,
    /// Answer `Unavailable` for the first `n` broadcasts, then accept.
    FlakyThenAccept(usize),
    /// Land the first `n` broadcasts but answer `Unavailable`, then accept.
    LostThenAccept(usize),
}

pub struct FakeLedger {
    answer: Answer,
    pub blockhash_calls: AtomicUsize,
    pub broadcasts: AtomicUsize,
    /// When set, every broadcast waits here until all parties arrive.
    pub barrier: Option<Barrier>,
    /// Notified when a broadcast starts.
    pub entered: Notify,
    /// When set, broadcasts block until released.
    pub gate: Option<Notify>,
    /// Blockhash fetches still to refuse.
    blockhash_failures: AtomicUsize,
    /// Every broadcast transaction, in order.
    pub sent: accepted::Accepted,
    /// Transactions that landed on the ledger.
    pub accepted: accepted::Accepted,
}

impl FakeLedger {
    pub fn new(answer: Answer) -> Self {
        Self {
            answer,
            blockhash_calls: AtomicUsize::new(0),
            broadcasts: AtomicUsize::new(0),
            barrier: None,
            entered: Notify::new(),
            gate: None,
            blockhash_failures: AtomicUsize::new(0),
            sent: Default::default(),
            accepted: Default::default(),
        }
    }

    pub fn with_barrier(mut self, parties: usize) -> Self {
        self.barrier = Some(Barrier::new(parties));
        self
    }

    /// Refuse the first `n` blockhash fetches with an RPC error response.
    pub fn with_blockhash_failures(self, n: usize) -> Self {
        self.blockhash_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Notify::new());
        self
    }

    pub fn rpc_calls(&self) -> usize {
        self.blockhash_calls.load(Ordering::SeqCst) + self.broadcasts.load(Ordering::SeqCst)
    }

    pub fn broadcast_count(&self) -> usize {
        self.broadcasts.load(Ordering::SeqCst)
    }

    pub fn blockhash_count(&self) -> usize {
        self.blockhash_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerRpc for FakeLedger {
    async fn fetch_blockhash(&self) -> Result<Hash, RpcFailure> {
        self.blockhash_calls.fetch_add(1, Ordering::SeqCst);
        let refuse = self
            .blockhash_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refuse {
            return Err(RpcFailure::Rejected("rpc error -32005: Node is behind".to_string()));
        }
        Ok(Hash::new_unique())
    }

    async fn broadcast(&self, tx: &Transaction) -> Result<Signature, RpcFailure> {
        let n = self.broadcasts.fetch_add(1, Ordering::SeqCst);
        self.sent.record(tx);
        self.entered.notify_one();
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.answer {
            Answer::Accept => Ok(self.accepted.record(tx)),
            Answer::Reject(reason) => Err(RpcFailure::Rejected(reason.clone())),
            Answer::Unavailable(reason) => Err(RpcFailure::Unavailable(reason.clone())),
            Answer::NoSignature => Ok(Signature::default()),
            Answer::FlakyThenAccept(failures) if n < *failures => {
                Err(RpcFailure::Unavailable("connection reset".to_string()))
            }
            Answer::FlakyThenAccept(_) => Ok(self.accepted.record(tx)),
            Answer::LostThenAccept(lost) if n < *lost => {
                self.accepted.record(tx);
                Err(RpcFailure::Unavailable("response timed out".to_string()))
            }
            Answer::LostThenAccept(_) => Ok(self.accepted.record(tx)),
        }
    }
}

/// Transactions kept for inspection.
pub mod accepted {
    use std::sync::Mutex;

    use solana_sdk::signature::Signature;
    use solana_sdk::transaction::Transaction;

    #[derive(Default)]
    pub struct Accepted(Mutex<Vec<Transaction>>);

    impl Accepted {
        pub fn record(&self, tx: &Transaction) -> Signature {
            self.0.lock().unwrap().push(tx.clone());
            tx.signatures[0]
        }

        pub fn all(&self) -> Vec<Transaction> {
            self.0.lock().unwrap().clone()
        }

        /// Distinct first signatures, in order of appearance.
        pub fn signatures(&self) -> Vec<Signature> {
            let mut out: Vec<Signature> = Vec::new();
            for tx in self.0.lock().unwrap().iter() {
                if !out.contains(&tx.signatures[0]) {
                    out.push(tx.signatures[0]);
                }
            }
            out
        }
    }
}

pub type TestCoordinator = AttestationCoordinator<FakeLedger, MemoryLabelStore>;

pub fn program_id() -> Pubkey {
    parse_program_id(PROGRAM_ID).unwrap()
}

pub fn treasury() -> TreasuryKey {
    TreasuryKey::Configured(Keypair::new())
}

pub fn coordinator(ledger: FakeLedger) -> TestCoordinator {
    coordinator_with(ledger, MemoryLabelStore::with_catalog(50), Some(program_id()), treasury())
}

pub fn coordinator_with(
    ledger: FakeLedger,
    store: MemoryLabelStore,
    program_id: Option<Pubkey>,
    treasury: TreasuryKey,
) -> TestCoordinator {
    build(ledger, store, program_id, treasury, RetryPolicy::none())
}

pub fn build<S: LabelStore + 'static>(
    ledger: FakeLedger,
    store: S,
    program_id: Option<Pubkey>,
    treasury: TreasuryKey,
    retry: RetryPolicy,
) -> AttestationCoordinator<FakeLedger, S> {
    init_tracing();
    let ctx = AttestationContext::new(ledger, store, program_id, treasury).with_retry(retry);
    AttestationCoordinator::new(Arc::new(ctx))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn participant(byte: u8) -> String {
    ParticipantId::from_bytes([byte; 32]).to_string()
}

pub fn rating(audio_id: u64) -> RatingRequest {
    RatingRequest {
        audio_id,
        comfort_level: 4,
        clarity: 5,
        speaking_rate: "Fast".to_string(),
        perceived_empathy: "High".to_string(),
        notes: Some(String::new()),
    }
}

/// A tracing layer that keeps every event for later assertions.
pub mod capture {
    use std::collections::HashMap;
    use std::fmt;
    use std::sync::{Arc, Mutex};

    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer};

    #[derive(Debug, Clone)]
    pub struct CapturedEvent {
        pub target: String,
        pub level: Level,
        pub fields: HashMap<String, String>,
    }

    #[derive(Clone, Default)]
    pub struct Captured(Arc<Mutex<Vec<CapturedEvent>>>);

    impl Captured {
        pub fn on_target(&self, target: &str) -> Vec<CapturedEvent> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.target == target)
                .cloned()
                .collect()
        }
    }

    #[derive(Default)]
    struct Fields(HashMap<String, String>);

    impl Visit for Fields {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name().to_string(), value.to_string());
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.insert(field.name().to_string(), format!("{value:?}"));
        }
    }

    impl<S: Subscriber> Layer<S> for Captured {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = Fields::default();
            event.record(&mut fields);
            self.0.lock().unwrap().push(CapturedEvent {
                target: event.metadata().target().to_string(),
                level: *event.metadata().level(),
                fields: fields.0,
            });
        }
    }
}
