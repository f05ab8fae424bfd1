//! carepanion-core
//!
//! Core primitives for the Carepanion attestation pipeline:
//! - Rating and label models
//! - Deterministic content hashing of ratings
//! - The attestation error taxonomy
//! - Explicit configuration and retry policy values
//!
//! The core crate performs no network, filesystem, or environment I/O. Ledger
//! access lives in `carepanion-solana-client`, persistence in `carepanion-store`.

pub mod config;
pub mod errors;
pub mod hashing;
pub mod model;
pub mod pipeline;
pub mod retry;
pub mod version;

pub use crate::errors::{AttestError, AttestResult};

/// Convenience re-exports.
pub mod prelude {
    pub use crate::config::{validate_config, AttestationConfig};
    pub use crate::hashing::{canonical_string, content_hash, content_hash_hex, ContentHash};
    pub use crate::model::{
        Attestation, AudioFile, LabelRecord, NewLabel, ParticipantId, PerceivedEmpathy, Rating,
        RatingRequest, SpeakingRate, SubmissionResult,
    };
    pub use crate::pipeline::Phase;
    pub use crate::retry::RetryPolicy;
    pub use crate::version::ProgramVersion;
    pub use crate::{AttestError, AttestResult};
}
