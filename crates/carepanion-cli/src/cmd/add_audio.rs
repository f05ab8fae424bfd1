use anyhow::{bail, Result};
use carepanion_core::config::AttestationConfig;
use carepanion_store::LabelStore;

use crate::output;

pub async fn run(cfg: &AttestationConfig, file_url: &str, duration: Option<u32>) -> Result<()> {
    if file_url.trim().is_empty() {
        bail!("file_url must not be empty");
    }
    let store = super::open_store(cfg)?;
    let audio = store.add_audio(file_url.trim(), duration).await?;
    tracing::info!(audio_id = audio.id, file_url = %audio.file_url, "audio registered");
    output::print(&audio)
}
