//! Configuration structures for the attestation pipeline.
//!
//! The core crate does not read environment variables. Binaries collect values
//! (env, flags, files) and hand an explicit `AttestationConfig` to the pipeline.

use std::fmt;

use crate::errors::{AttestError, AttestResult};
use crate::retry::RetryPolicy;

/// Public devnet endpoint used when no RPC URL is given.
pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

/// SQLite database path used when none is given.
pub const DEFAULT_DATABASE_URL: &str = "carepanion.db";

/// Global configuration container.
#[derive(Clone)]
pub struct AttestationConfig {
    /// Ledger RPC endpoint.
    pub rpc_url: String,
    /// Base58 program id. `None` disables ledger submission.
    pub program_id: Option<String>,
    /// Treasury secret key as a JSON array of bytes. `None` means an
    /// ephemeral, unfunded key is generated.
    pub treasury_key_json: Option<String>,
    pub database_url: String,
    pub retry: RetryPolicy,
}

impl Default for AttestationConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            program_id: None,
            treasury_key_json: None,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl AttestationConfig {
    pub fn submission_enabled(&self) -> bool {
        self.program_id.is_some()
    }
}

// Keeps the treasury secret out of logs.
impl fmt::Debug for AttestationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttestationConfig")
            .field("rpc_url", &self.rpc_url)
            .field("program_id", &self.program_id)
            .field(
                "treasury_key_json",
                &self.treasury_key_json.as_ref().map(|_| "<redacted>"),
            )
            .field("database_url", &self.database_url)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Validate a full configuration object.
pub fn validate_config(cfg: &AttestationConfig) -> AttestResult<()> {
    let url = cfg.rpc_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AttestError::validation(format!(
            "rpc_url must be an http(s) URL, got {url:?}"
        )));
    }

    if let Some(program_id) = &cfg.program_id {
        let decoded = bs58::decode(program_id.trim())
            .into_vec()
            .map_err(|e| AttestError::validation(format!("program_id is not base58: {e}")))?;
        if decoded.len() != 32 {
            return Err(AttestError::validation(format!(
                "program_id must decode to 32 bytes, got {}",
                decoded.len()
            )));
        }
    }

    if cfg.database_url.trim().is_empty() {
        return Err(AttestError::validation("database_url must not be empty"));
    }

    if cfg.retry.max_attempts == 0 {
        return Err(AttestError::validation(
            "retry.max_attempts must be at least 1",
        ));
    }

    if cfg.retry.initial_backoff > cfg.retry.max_backoff {
        return Err(AttestError::validation(
            "retry.initial_backoff must not exceed retry.max_backoff",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = AttestationConfig::default();
        validate_config(&cfg).unwrap();
        assert!(!cfg.submission_enabled());
    }

    #[test]
    fn program_id_must_be_a_key() {
        let mut cfg = AttestationConfig::default();
        cfg.program_id = Some("431uCPYwa2niRi2xpsbvrwmS74wC7gyfAfHkGz8VmkvK".to_string());
        validate_config(&cfg).unwrap();

        cfg.program_id = Some("abc".to_string());
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn invalid_values_detected() {
        let mut cfg = AttestationConfig::default();
        cfg.rpc_url = "devnet".to_string();
        assert!(validate_config(&cfg).is_err());

        let mut cfg = AttestationConfig::default();
        cfg.retry.max_attempts = 0;
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn debug_redacts_treasury_key() {
        let mut cfg = AttestationConfig::default();
        cfg.treasury_key_json = Some("[1,2,3]".to_string());
        let s = format!("{cfg:?}");
        assert!(s.contains("<redacted>"));
        assert!(!s.contains("[1,2,3]"));
    }
}
