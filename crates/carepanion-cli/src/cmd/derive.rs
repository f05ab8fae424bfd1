use anyhow::{anyhow, Result};
use carepanion_core::config::AttestationConfig;
use carepanion_core::model::ParticipantId;
use carepanion_solana_client::{derive_user_stats, parse_program_id, SEED_USER_STATS};
use serde::Serialize;

use crate::output;

#[derive(Debug, Serialize)]
pub struct DeriveOut {
    pub participant: String,
    pub program_id: String,
    pub seed: String,
    pub address: String,
    pub bump: u8,
}

pub fn run(cfg: &AttestationConfig, participant: &str) -> Result<()> {
    output::print(&derive(cfg, participant)?)
}

fn derive(cfg: &AttestationConfig, participant: &str) -> Result<DeriveOut> {
    let program_id = cfg
        .program_id
        .as_deref()
        .ok_or_else(|| anyhow!("no program id configured (set SOLANA_PROGRAM_ID or --program-id)"))?;
    let program_id = parse_program_id(program_id)?;
    let participant = ParticipantId::parse(participant)?;
    let derived = derive_user_stats(&program_id, &participant)?;

    Ok(DeriveOut {
        participant: participant.to_string(),
        program_id: program_id.to_string(),
        seed: String::from_utf8_lossy(SEED_USER_STATS).into_owned(),
        address: derived.address.to_string(),
        bump: derived.bump,
    })
}
