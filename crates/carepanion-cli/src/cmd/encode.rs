use anyhow::Result;
use carepanion_core::hashing::{canonical_string, content_hash};
use carepanion_core::model::{Rating, RatingRequest};
use carepanion_solana_client::instruction::TARGET_VERSION;
use carepanion_solana_client::AttestationInstruction;
use serde::Serialize;

use crate::output;

#[derive(Debug, Serialize)]
pub struct EncodeOut {
    pub canonical: String,
    pub content_hash: String,
    pub instruction: String,
    pub instruction_len: usize,
    pub program_version: &'static str,
}

pub fn run(request: RatingRequest) -> Result<()> {
    output::print(&encode(request)?)
}

fn encode(request: RatingRequest) -> Result<EncodeOut> {
    let rating = Rating::try_from(request)?;
    let digest = content_hash(&rating);
    let data = AttestationInstruction::record_label(digest, rating.audio_id()).encode();

    Ok(EncodeOut {
        canonical: canonical_string(&rating),
        content_hash: hex::encode(digest),
        instruction: hex::encode(data),
        instruction_len: data.len(),
        program_version: TARGET_VERSION.as_str(),
    })
}
