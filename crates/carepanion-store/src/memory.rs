//! In-process label store.
//!
//! Same contract as the SQLite store, held in a `parking_lot::Mutex`. Useful for
//! tests and for running the pipeline without a database file.

use std::collections::BTreeMap;

use async_trait::async_trait;
use carepanion_core::model::{AudioFile, LabelRecord, NewLabel, ParticipantId};
use parking_lot::Mutex;

use crate::{now_unix, LabelStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct State {
    audio: BTreeMap<u64, AudioFile>,
    labels: Vec<LabelRecord>,
    next_label_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryLabelStore {
    state: Mutex<State>,
}

impl MemoryLabelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `count` catalog entries, ids `1..=count`.
    pub fn with_catalog(count: u64) -> Self {
        let store = Self::new();
        {
            let mut st = store.state.lock();
            for id in 1..=count {
                st.audio.insert(
                    id,
                    AudioFile {
                        id,
                        file_url: format!("https://example.com/audio/sample{id}.mp3"),
                        duration_seconds: Some(5 + (id % 5) as u32),
                    },
                );
            }
        }
        store
    }

    pub fn label_count(&self) -> usize {
        self.state.lock().labels.len()
    }
}

#[async_trait]
impl LabelStore for MemoryLabelStore {
    async fn audio_exists(&self, audio_id: u64) -> StoreResult<bool> {
        Ok(self.state.lock().audio.contains_key(&audio_id))
    }

    async fn add_audio(&self, file_url: &str, duration_seconds: Option<u32>) -> StoreResult<AudioFile> {
        let mut st = self.state.lock();
        if st.audio.values().any(|a| a.file_url == file_url) {
            return Err(StoreError::DuplicateAudio(file_url.to_string()));
        }
        let id = st.audio.keys().next_back().map_or(1, |last| last + 1);
        let audio = AudioFile {
            id,
            file_url: file_url.to_string(),
            duration_seconds,
        };
        st.audio.insert(id, audio.clone());
        Ok(audio)
    }

    async fn find_label(&self, participant: &ParticipantId, audio_id: u64) -> StoreResult<Option<LabelRecord>> {
        let owner = participant.to_string();
        Ok(self
            .state
            .lock()
            .labels
            .iter()
            .find(|l| l.participant == owner && l.audio_id == audio_id)
            .cloned())
    }

    async fn insert_label(&self, label: NewLabel) -> StoreResult<LabelRecord> {
        let owner = label.participant.to_string();
        let audio_id = label.rating.audio_id();

        let mut st = self.state.lock();
        if !st.audio.contains_key(&audio_id) {
            return Err(StoreError::UnknownAudio(audio_id));
        }
        if st
            .labels
            .iter()
            .any(|l| l.participant == owner && l.audio_id == audio_id)
        {
            return Err(StoreError::Duplicate {
                participant: owner,
                audio_id,
            });
        }

        st.next_label_id += 1;
        let rating = &label.rating;
        let record = LabelRecord {
            id: st.next_label_id,
            participant: owner,
            audio_id,
            comfort_level: rating.comfort_level(),
            clarity: rating.clarity(),
            speaking_rate: rating.speaking_rate(),
            perceived_empathy: rating.perceived_empathy(),
            notes: rating.notes().map(str::to_string),
            transaction_hash: Some(label.transaction_hash),
            created_at: now_unix(),
        };
        st.labels.push(record.clone());
        Ok(record)
    }

    async fn labels_for(&self, participant: &ParticipantId) -> StoreResult<Vec<LabelRecord>> {
        let owner = participant.to_string();
        Ok(self
            .state
            .lock()
            .labels
            .iter()
            .filter(|l| l.participant == owner)
            .cloned()
            .collect())
    }

    async fn next_unlabeled_audio(&self, participant: &ParticipantId) -> StoreResult<Option<AudioFile>> {
        let owner = participant.to_string();
        let st = self.state.lock();
        Ok(st
            .audio
            .values()
            .find(|a| {
                !st.labels
                    .iter()
                    .any(|l| l.participant == owner && l.audio_id == a.id)
            })
            .cloned())
    }
}
