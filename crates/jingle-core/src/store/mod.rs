//! Clip persistence
//!
//! The board stores one record per tile: the clip bytes with their MIME type,
//! the display name and the tile color. Storage goes through the [`ClipStore`]
//! trait so the registry does not care where the bytes live:
//!
//! - [`CozoClipStore`]: CozoDB relation (SQLite on disk, or in memory)
//! - [`EphemeralStore`]: session-only map used when the database can't be opened
//!
//! # Schema versioning
//!
//! Records carry no version of their own; the database keeps a single
//! [`SCHEMA_VERSION`]. Fields added in later versions must have defaulting
//! rules so older rows stay readable (a missing color reads as `dark`).

mod cozo_store;
mod ephemeral;
mod schema;

pub use cozo_store::CozoClipStore;
pub use ephemeral::EphemeralStore;
pub use schema::SCHEMA_VERSION;

use std::path::Path;

use crate::types::{ColorKey, TileId};

/// Clip bytes plus their MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// A validated stored clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRecord {
    pub id: TileId,
    pub name: String,
    pub blob: ClipBlob,
    pub color: ColorKey,
}

/// A clip that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClip {
    pub name: String,
    pub blob: ClipBlob,
    pub color: ColorKey,
}

impl ClipRecord {
    /// Build a record from raw row fields, applying the defaulting rules
    ///
    /// A missing or unknown color becomes [`ColorKey::default`]; a missing
    /// MIME type becomes `application/octet-stream`.
    pub fn from_row(
        id: i64,
        name: String,
        mime_type: Option<String>,
        bytes: Vec<u8>,
        color: Option<&str>,
    ) -> Self {
        Self {
            id: TileId(id),
            name,
            blob: ClipBlob {
                bytes,
                mime_type: mime_type
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
            },
            color: color.map(ColorKey::parse_or_default).unwrap_or_default(),
        }
    }
}

/// Clip store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open clip store: {0}")]
    Open(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable key-value store of clip records keyed by auto-assigned id
pub trait ClipStore {
    /// Every stored record, in id order
    fn get_all(&self) -> StoreResult<Vec<ClipRecord>>;

    /// Insert a new record and return its id
    fn add(&mut self, clip: &NewClip) -> StoreResult<TileId>;

    /// Insert or replace a record by id
    fn put(&mut self, record: &ClipRecord) -> StoreResult<()>;

    fn delete(&mut self, id: TileId) -> StoreResult<()>;

    fn clear(&mut self) -> StoreResult<()>;

    /// Schema version of the backing store
    fn schema_version(&self) -> u32 {
        SCHEMA_VERSION
    }

    /// Whether records survive the process
    fn is_durable(&self) -> bool;
}

/// Open the on-disk clip database, falling back to a session-only store
///
/// Returns the store and, when the database could not be opened, the error
/// that caused the fallback.
pub fn open_or_ephemeral(path: &Path) -> (Box<dyn ClipStore>, Option<StoreError>) {
    match CozoClipStore::open(path) {
        Ok(store) => {
            log::info!("open_or_ephemeral: Clip database opened at {:?}", path);
            (Box::new(store), None)
        }
        Err(e) => {
            log::warn!(
                "open_or_ephemeral: Storage unavailable ({}), clips will not survive this session",
                e
            );
            (Box::new(EphemeralStore::new()), Some(e))
        }
    }
}
