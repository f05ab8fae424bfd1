use anyhow::Result;
use carepanion_core::config::AttestationConfig;
use carepanion_core::model::ParticipantId;
use carepanion_store::LabelStore;

use crate::output;

pub async fn run(cfg: &AttestationConfig, participant: &str) -> Result<()> {
    let participant = ParticipantId::parse(participant)?;
    let store = super::open_store(cfg)?;
    let labels = store.labels_for(&participant).await?;
    output::print(&labels)
}
