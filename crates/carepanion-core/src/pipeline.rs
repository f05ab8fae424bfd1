//! Phases of one attestation attempt.
//!
//! A submission moves strictly forward:
//!
//! `validating -> deduplicating -> hashing -> submitting -> persisting -> completed`
//!
//! Phase ids are stable, dot-free strings so they can be used as log fields.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Validating,
    Deduplicating,
    Hashing,
    Submitting,
    Persisting,
    Completed,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Validating,
        Phase::Deduplicating,
        Phase::Hashing,
        Phase::Submitting,
        Phase::Persisting,
        Phase::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Deduplicating => "deduplicating",
            Self::Hashing => "hashing",
            Self::Submitting => "submitting",
            Self::Persisting => "persisting",
            Self::Completed => "completed",
        }
    }

    /// Once this phase starts, the ledger may hold a record for the attempt.
    pub fn has_external_effects(&self) -> bool {
        *self >= Self::Submitting
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
