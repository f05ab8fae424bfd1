//! Treasury key loading.
//!
//! The treasury keypair pays fees and signs every attestation. It is read once
//! at startup and shared read-only afterwards.
//!
//! - configured and valid: used as is
//! - not configured: an ephemeral, unfunded keypair is generated so the process
//!   still starts; broadcasts will then be refused by the ledger
//! - configured but malformed: held as `Invalid`; every submission fails with a
//!   `SigningError` instead of the process crashing

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use thiserror::Error;

/// Problems decoding treasury key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("treasury key is not a JSON byte array: {0}")]
    NotJson(String),
    #[error("treasury key bytes are malformed: {0}")]
    Malformed(String),
}

/// Fatal signing problem. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("signing error: {0}")]
pub struct SigningError(pub String);

#[derive(Debug)]
pub enum TreasuryKey {
    Configured(Keypair),
    Ephemeral(Keypair),
    Invalid(KeyError),
}

impl TreasuryKey {
    /// Decode a keypair from a JSON array of 64 bytes (Solana CLI keypair format).
    pub fn parse_json(raw: &str) -> Result<Keypair, KeyError> {
        let bytes: Vec<u8> =
            serde_json::from_str(raw.trim()).map_err(|e| KeyError::NotJson(e.to_string()))?;
        Keypair::from_bytes(&bytes).map_err(|e| KeyError::Malformed(e.to_string()))
    }

    /// Load the treasury key from optional configuration.
    pub fn load(raw: Option<&str>) -> Self {
        match raw {
            Some(raw) => match Self::parse_json(raw) {
                Ok(kp) => {
                    tracing::info!(treasury = %kp.pubkey(), "treasury keypair loaded");
                    Self::Configured(kp)
                }
                Err(e) => {
                    tracing::error!(error = %e, "treasury key is malformed; ledger submissions will fail");
                    Self::Invalid(e)
                }
            },
            None => {
                let kp = Keypair::new();
                tracing::warn!(
                    treasury = %kp.pubkey(),
                    "no treasury key configured; generated an ephemeral unfunded keypair"
                );
                Self::Ephemeral(kp)
            }
        }
    }

    pub fn keypair(&self) -> Result<&Keypair, SigningError> {
        match self {
            Self::Configured(kp) | Self::Ephemeral(kp) => Ok(kp),
            Self::Invalid(e) => Err(SigningError(e.to_string())),
        }
    }

    pub fn pubkey(&self) -> Option<Pubkey> {
        self.keypair().ok().map(|kp| kp.pubkey())
    }

    pub fn is_ephemeral(&self) -> bool {
        matches!(self, Self::Ephemeral(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            Self::Configured(_) => "configured",
            Self::Ephemeral(_) => "ephemeral",
            Self::Invalid(_) => "invalid",
        }
    }
}
