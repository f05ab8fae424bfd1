//! carepanion-store
//!
//! Persistence for the audio catalog and attested labels.
//!
//! The attestation pipeline only relies on three guarantees from a store:
//! - `find_label` sees every committed label
//! - `insert_label` is atomic
//! - `insert_label` rejects a second row for the same `(participant, audio_id)`
//!
//! The last one is the backstop for concurrent duplicate submissions; the
//! pipeline does not lock around its own dedupe check.

use async_trait::async_trait;
use carepanion_core::model::{AudioFile, LabelRecord, NewLabel, ParticipantId};
use thiserror::Error;

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryLabelStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteLabelStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("label already exists for participant {participant} and audio {audio_id}")]
    Duplicate { participant: String, audio_id: u64 },

    #[error("unknown audio id {0}")]
    UnknownAudio(u64),

    #[error("audio file already registered: {0}")]
    DuplicateAudio(String),

    #[error("audio id {0} does not fit the store's integer range")]
    OutOfRange(u64),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[cfg(feature = "sqlite")]
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store task failed: {0}")]
    Task(String),
}

impl StoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Catalog and label persistence used by the attestation pipeline.
#[async_trait]
pub trait LabelStore: Send + Sync {
    async fn audio_exists(&self, audio_id: u64) -> StoreResult<bool>;

    async fn add_audio(&self, file_url: &str, duration_seconds: Option<u32>) -> StoreResult<AudioFile>;

    async fn find_label(&self, participant: &ParticipantId, audio_id: u64) -> StoreResult<Option<LabelRecord>>;

    /// Insert a label. Fails with `StoreError::Duplicate` if one already exists.
    async fn insert_label(&self, label: NewLabel) -> StoreResult<LabelRecord>;

    /// All labels written by a participant, oldest first.
    async fn labels_for(&self, participant: &ParticipantId) -> StoreResult<Vec<LabelRecord>>;

    /// Lowest-id catalog entry the participant has not labeled yet.
    async fn next_unlabeled_audio(&self, participant: &ParticipantId) -> StoreResult<Option<AudioFile>>;
}

pub(crate) fn now_unix() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
