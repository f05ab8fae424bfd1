use std::sync::Arc;

use anyhow::{Context, Result};
use carepanion_attest::{AttestationContext, AttestationCoordinator};
use carepanion_core::config::AttestationConfig;
use carepanion_store::SqliteLabelStore;
use solana_client::nonblocking::rpc_client::RpcClient;

use crate::args::{Cli, Command};

mod add_audio;
mod derive;
mod doctor;
mod encode;
mod labels;
mod next_audio;
mod submit;

pub async fn dispatch(cli: Cli) -> Result<()> {
    let cfg = cli.config.to_config();
    match cli.command {
        Command::Submit { participant, rating } => submit::run(&cfg, &participant, rating.into()).await,
        Command::NextAudio { participant } => next_audio::run(&cfg, &participant).await,
        Command::AddAudio { file_url, duration } => add_audio::run(&cfg, &file_url, duration).await,
        Command::Labels { participant } => labels::run(&cfg, &participant).await,
        Command::Derive { participant } => derive::run(&cfg, &participant),
        Command::Encode { rating } => encode::run(rating.into()),
        Command::Doctor { offline } => doctor::run(&cfg, offline).await,
    }
}

pub(crate) fn open_store(cfg: &AttestationConfig) -> Result<SqliteLabelStore> {
    SqliteLabelStore::open(&cfg.database_url)
        .with_context(|| format!("opening database {}", cfg.database_url))
}

pub(crate) fn coordinator(cfg: &AttestationConfig) -> Result<AttestationCoordinator<RpcClient, SqliteLabelStore>> {
    let store = open_store(cfg)?;
    let ctx = AttestationContext::from_config(cfg, store)?;
    Ok(AttestationCoordinator::new(Arc::new(ctx)))
}
