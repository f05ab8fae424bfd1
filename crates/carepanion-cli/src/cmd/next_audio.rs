use anyhow::Result;
use carepanion_core::config::AttestationConfig;

use crate::output;

pub async fn run(cfg: &AttestationConfig, participant: &str) -> Result<()> {
    let coord = super::coordinator(cfg)?;
    let audio = coord.next_audio(participant).await?;
    output::print(&audio)
}
