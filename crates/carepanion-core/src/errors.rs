//! Error taxonomy for the attestation pipeline.
//!
//! Every failure a submission can end in is a variant here. Variants are grouped
//! by whether anything outside the process may have changed:
//! - side-effect free: validation, lookups, deduplication, all chain failures
//! - divergent: `PersistFailure`, where the ledger holds a record the store lacks,
//!   and `Interrupted`, where it may

use thiserror::Error;

pub type AttestResult<T> = Result<T, AttestError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttestError {
    /// Malformed input. Never recorded, never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced audio content does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The participant already has a label for this audio clip.
    #[error("participant {participant} already labeled audio {audio_id}")]
    Conflict { participant: String, audio_id: u64 },

    /// The relational store failed before any ledger write was attempted.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Ledger submission is disabled (no program id).
    #[error("ledger submission not configured: {0}")]
    NotConfigured(String),

    /// No bump in 0..=255 produced an off-curve derived address.
    #[error("no valid derived address for the given seeds")]
    NoValidAddress,

    /// No definitive answer from the RPC endpoint.
    #[error("ledger unavailable: {0}")]
    ChainUnavailable(String),

    /// The ledger actively refused the transaction.
    #[error("ledger rejected transaction: {0}")]
    ChainRejected(String),

    /// Treasury key absent or malformed.
    #[error("signing error: {0}")]
    Signing(String),

    /// The ledger write succeeded but the label row was not written.
    #[error("ledger write {signature} succeeded but label was not persisted: {reason}")]
    PersistFailure { signature: String, reason: String },

    /// The attempt stopped after Submitting began; the ledger may or may not
    /// hold the transaction.
    #[error("attestation interrupted, ledger state unknown: {0}")]
    Interrupted(String),
}

impl AttestError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }

    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    /// Stable machine-readable code for transport mapping.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::NotConfigured(_) => "not_configured",
            Self::NoValidAddress => "no_valid_address",
            Self::ChainUnavailable(_) => "chain_unavailable",
            Self::ChainRejected(_) => "chain_rejected",
            Self::Signing(_) => "signing_error",
            Self::PersistFailure { .. } => "persist_failure",
            Self::Interrupted(_) => "interrupted",
        }
    }

    /// True for every outcome of the Submitting phase that means no attestation occurred.
    pub fn is_chain_failure(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured(_)
                | Self::NoValidAddress
                | Self::ChainUnavailable(_)
                | Self::ChainRejected(_)
                | Self::Signing(_)
        )
    }

    /// False when the ledger may hold a record the store lacks.
    pub fn is_side_effect_free(&self) -> bool {
        !matches!(self, Self::PersistFailure { .. } | Self::Interrupted(_))
    }

    /// Default retry predicate: only an unanswered RPC round-trip is worth repeating.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ChainUnavailable(_))
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_chain_unavailable_is_retryable() {
        assert!(AttestError::ChainUnavailable("timeout".into()).is_retryable());
        assert!(!AttestError::ChainRejected("blockhash not found".into()).is_retryable());
        assert!(!AttestError::signing("bad key").is_retryable());
        let persist = AttestError::PersistFailure {
            signature: "sig".into(),
            reason: "unique".into(),
        };
        assert!(!persist.is_retryable());
        assert!(!persist.is_side_effect_free());
    }

    #[test]
    fn interruption_is_neither_retryable_nor_clean() {
        let e = AttestError::Interrupted("task cancelled".into());
        assert!(!e.is_retryable());
        assert!(!e.is_side_effect_free());
        assert!(!e.is_chain_failure());
        assert_eq!(e.code(), "interrupted");
    }

    #[test]
    fn chain_failures_are_classified() {
        assert!(AttestError::not_configured("program id").is_chain_failure());
        assert!(AttestError::NoValidAddress.is_chain_failure());
        assert!(!AttestError::validation("x").is_chain_failure());
        assert!(!AttestError::Conflict {
            participant: "p".into(),
            audio_id: 1
        }
        .is_chain_failure());
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(AttestError::validation("x").code(), "validation_error");
        assert_eq!(AttestError::ChainUnavailable("x".into()).code(), "chain_unavailable");
        assert_eq!(
            AttestError::PersistFailure {
                signature: "s".into(),
                reason: "r".into()
            }
            .code(),
            "persist_failure"
        );
    }
}
