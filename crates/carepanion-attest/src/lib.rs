//! carepanion-attest
//!
//! Orchestrates one rating submission end to end:
//!
//! 1. validate the rating and the referenced audio clip
//! 2. reject duplicates for the same participant and clip
//! 3. hash the rating
//! 4. attest the hash on Solana
//! 5. persist the label with the ledger signature
//!
//! The ledger and the relational store share no transaction. The one accepted
//! divergence is a successful ledger write followed by a failed persist, which
//! surfaces as `AttestError::PersistFailure` and is logged on the
//! [`RECONCILE_TARGET`] log target.

pub mod context;
pub mod coordinator;

pub use context::AttestationContext;
pub use coordinator::{AttestationCoordinator, RECONCILE_TARGET};
