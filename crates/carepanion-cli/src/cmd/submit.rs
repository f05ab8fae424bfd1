use anyhow::{anyhow, Result};
use carepanion_core::config::AttestationConfig;
use carepanion_core::model::RatingRequest;
use carepanion_core::AttestError;
use serde::Serialize;

use crate::output;

#[derive(Debug, Serialize)]
pub struct SubmitError {
    pub status: &'static str,
    pub code: &'static str,
    pub message: String,
    /// Set only when the ledger holds a record the store lacks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_signature: Option<String>,
}

impl From<&AttestError> for SubmitError {
    fn from(e: &AttestError) -> Self {
        let transaction_signature = match e {
            AttestError::PersistFailure { signature, .. } => Some(signature.clone()),
            _ => None,
        };
        Self {
            status: "error",
            code: e.code(),
            message: e.to_string(),
            transaction_signature,
        }
    }
}

pub async fn run(cfg: &AttestationConfig, participant: &str, request: RatingRequest) -> Result<()> {
    let coord = super::coordinator(cfg)?;
    match coord.submit(participant, request).await {
        Ok(attestation) => output::print(&attestation),
        Err(e) => {
            if output::is_json() {
                output::print(&SubmitError::from(&e))?;
            }
            Err(anyhow!(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_failure_keeps_signature() {
        let e = AttestError::PersistFailure {
            signature: "5sig".into(),
            reason: "locked".into(),
        };
        let out = SubmitError::from(&e);
        assert_eq!(out.transaction_signature.as_deref(), Some("5sig"));

        let json = serde_json::to_value(SubmitError::from(&AttestError::validation("bad"))).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], AttestError::validation("bad").code());
        assert!(json.get("transaction_signature").is_none());
    }
}
