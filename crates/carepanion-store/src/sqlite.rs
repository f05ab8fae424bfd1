//! SQLite-backed label store.
//!
//! One connection behind a mutex; every statement runs on tokio's blocking pool
//! so callers never block the async executor. `UNIQUE(owner_wallet, audio_id)`
//! on `labels` enforces one label per participant and clip.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use carepanion_core::model::{AudioFile, LabelRecord, NewLabel, ParticipantId};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use crate::{now_unix, LabelStore, StoreError, StoreResult};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS audio_files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_url TEXT NOT NULL UNIQUE,
    duration_seconds INTEGER,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS labels (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_wallet TEXT NOT NULL,
    audio_id INTEGER NOT NULL REFERENCES audio_files(id),
    created_at INTEGER NOT NULL,
    comfort_level INTEGER NOT NULL,
    clarity INTEGER NOT NULL,
    speaking_rate TEXT NOT NULL,
    perceived_empathy TEXT NOT NULL,
    notes TEXT,
    transaction_hash TEXT,
    UNIQUE (owner_wallet, audio_id)
);

CREATE INDEX IF NOT EXISTS idx_labels_transaction_hash ON labels(transaction_hash);
"#;

const LABEL_COLUMNS: &str = "id, owner_wallet, audio_id, comfort_level, clarity, speaking_rate, \
     perceived_empathy, notes, transaction_hash, created_at";

#[derive(Clone)]
pub struct SqliteLabelStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLabelStore {
    /// Open (or create) a database file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "opened label store");
        Self::init(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn to_sql_id(audio_id: u64) -> StoreResult<i64> {
    i64::try_from(audio_id).map_err(|_| StoreError::OutOfRange(audio_id))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

fn parse_column<T: std::str::FromStr>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn label_from_row(row: &Row<'_>) -> rusqlite::Result<LabelRecord> {
    let audio_id: i64 = row.get(2)?;
    Ok(LabelRecord {
        id: row.get(0)?,
        participant: row.get(1)?,
        audio_id: audio_id as u64,
        comfort_level: row.get(3)?,
        clarity: row.get(4)?,
        speaking_rate: parse_column(row, 5)?,
        perceived_empathy: parse_column(row, 6)?,
        notes: row.get(7)?,
        transaction_hash: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn audio_from_row(row: &Row<'_>) -> rusqlite::Result<AudioFile> {
    let id: i64 = row.get(0)?;
    Ok(AudioFile {
        id: id as u64,
        file_url: row.get(1)?,
        duration_seconds: row.get(2)?,
    })
}

#[async_trait]
impl LabelStore for SqliteLabelStore {
    async fn audio_exists(&self, audio_id: u64) -> StoreResult<bool> {
        let Ok(id) = to_sql_id(audio_id) else {
            return Ok(false);
        };
        self.with_conn(move |conn| {
            let found = conn
                .query_row("SELECT 1 FROM audio_files WHERE id = ?1", params![id], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn add_audio(&self, file_url: &str, duration_seconds: Option<u32>) -> StoreResult<AudioFile> {
        let url = file_url.to_string();
        self.with_conn(move |conn| {
            match conn.execute(
                "INSERT INTO audio_files (file_url, duration_seconds, created_at) VALUES (?1, ?2, ?3)",
                params![&url, duration_seconds, now_unix()],
            ) {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Err(StoreError::DuplicateAudio(url)),
                Err(e) => return Err(e.into()),
            }
            Ok(AudioFile {
                id: conn.last_insert_rowid() as u64,
                file_url: url,
                duration_seconds,
            })
        })
        .await
    }

    async fn find_label(&self, participant: &ParticipantId, audio_id: u64) -> StoreResult<Option<LabelRecord>> {
        let owner = participant.to_string();
        let Ok(id) = to_sql_id(audio_id) else {
            return Ok(None);
        };
        self.with_conn(move |conn| {
            let sql = format!("SELECT {LABEL_COLUMNS} FROM labels WHERE owner_wallet = ?1 AND audio_id = ?2");
            Ok(conn
                .query_row(&sql, params![owner, id], label_from_row)
                .optional()?)
        })
        .await
    }

    async fn insert_label(&self, label: NewLabel) -> StoreResult<LabelRecord> {
        let audio_id = label.rating.audio_id();
        let id = to_sql_id(audio_id)?;
        let owner = label.participant.to_string();

        self.with_conn(move |conn| {
            let rating = &label.rating;
            let tx = conn.transaction()?;
            let inserted = tx.execute(
                "INSERT INTO labels (owner_wallet, audio_id, created_at, comfort_level, clarity, \
                 speaking_rate, perceived_empathy, notes, transaction_hash) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    &owner,
                    id,
                    now_unix(),
                    rating.comfort_level(),
                    rating.clarity(),
                    rating.speaking_rate().as_str(),
                    rating.perceived_empathy().as_str(),
                    rating.notes(),
                    &label.transaction_hash,
                ],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    return Err(StoreError::Duplicate {
                        participant: owner,
                        audio_id,
                    })
                }
                Err(e) if is_foreign_key_violation(&e) => return Err(StoreError::UnknownAudio(audio_id)),
                Err(e) => return Err(e.into()),
            }

            let row_id = tx.last_insert_rowid();
            let sql = format!("SELECT {LABEL_COLUMNS} FROM labels WHERE id = ?1");
            let record = tx.query_row(&sql, params![row_id], label_from_row)?;
            tx.commit()?;
            Ok(record)
        })
        .await
    }

    async fn labels_for(&self, participant: &ParticipantId) -> StoreResult<Vec<LabelRecord>> {
        let owner = participant.to_string();
        self.with_conn(move |conn| {
            let sql = format!("SELECT {LABEL_COLUMNS} FROM labels WHERE owner_wallet = ?1 ORDER BY id");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![owner], label_from_row)?;
            let labels = rows.collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(labels)
        })
        .await
    }

    async fn next_unlabeled_audio(&self, participant: &ParticipantId) -> StoreResult<Option<AudioFile>> {
        let owner = participant.to_string();
        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT a.id, a.file_url, a.duration_seconds FROM audio_files a \
                     WHERE NOT EXISTS (SELECT 1 FROM labels l WHERE l.audio_id = a.id AND l.owner_wallet = ?1) \
                     ORDER BY a.id LIMIT 1",
                    params![owner],
                    audio_from_row,
                )
                .optional()?)
        })
        .await
    }
}
