use anyhow::{bail, Result};
use carepanion_core::config::{validate_config, AttestationConfig};
use carepanion_solana_client::{parse_program_id, LedgerRpc, TreasuryKey};
use serde::Serialize;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;

use crate::output;

#[derive(Debug, Serialize)]
pub struct Check {
    pub name: String,
    pub ok: bool,
    /// A failing optional check is reported but does not fail the run.
    pub required: bool,
    pub detail: String,
}

impl Check {
    fn new(name: &str, required: bool, outcome: Result<String, String>) -> Self {
        let (ok, detail) = match outcome {
            Ok(detail) => (true, detail),
            Err(detail) => (false, detail),
        };
        Self {
            name: name.to_string(),
            ok,
            required,
            detail,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DoctorOut {
    pub ok: bool,
    pub checks: Vec<Check>,
}

pub async fn run(cfg: &AttestationConfig, offline: bool) -> Result<()> {
    let mut checks = local_checks(cfg);

    if !offline {
        let rpc = RpcClient::new_with_commitment(cfg.rpc_url.clone(), CommitmentConfig::confirmed());
        let outcome = match rpc.fetch_blockhash().await {
            Ok(hash) => Ok(format!("{} (blockhash {hash})", cfg.rpc_url)),
            Err(e) => Err(format!("{}: {}", cfg.rpc_url, e.reason())),
        };
        checks.push(Check::new("rpc", cfg.submission_enabled(), outcome));
    }

    let ok = checks.iter().all(|c| c.ok || !c.required);
    if output::is_json() {
        output::print(&DoctorOut { ok, checks })?;
    } else {
        for c in &checks {
            output::status_line(&c.name, c.ok, &c.detail)?;
        }
    }

    if !ok {
        bail!("one or more required checks failed");
    }
    Ok(())
}

fn local_checks(cfg: &AttestationConfig) -> Vec<Check> {
    let mut checks = Vec::new();

    checks.push(Check::new(
        "config",
        true,
        validate_config(cfg).map(|()| "valid".to_string()).map_err(|e| e.to_string()),
    ));

    let program = match cfg.program_id.as_deref() {
        Some(id) => parse_program_id(id).map(|p| p.to_string()).map_err(|e| e.to_string()),
        None => Err("not configured; submissions will fail".to_string()),
    };
    checks.push(Check::new("program_id", false, program));

    let treasury = TreasuryKey::load(cfg.treasury_key_json.as_deref());
    let detail = match (treasury.status(), treasury.pubkey()) {
        (status, Some(pk)) if !treasury.is_ephemeral() => Ok(format!("{status} ({pk})")),
        (status, Some(pk)) => Err(format!("{status} ({pk}), unfunded")),
        (status, None) => Err(status.to_string()),
    };
    checks.push(Check::new("treasury", cfg.treasury_key_json.is_some(), detail));

    checks.push(Check::new(
        "database",
        true,
        super::open_store(cfg)
            .map(|_| cfg.database_url.clone())
            .map_err(|e| format!("{e:#}")),
    ));

    checks
}
