//! Version helpers for the on-ledger program interface.
//!
//! The attestation instruction layout is a wire contract with the deployed
//! program. Any layout change needs a new variant here and a program upgrade.

/// Known program interface versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramVersion {
    /// `RecordLabel`: tag `0x00`, 32-byte label hash, little-endian u64 audio id.
    V1,
}

impl ProgramVersion {
    /// Return the canonical string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
        }
    }
}
