//! CozoDB-backed clip store

use std::collections::BTreeMap;
use std::path::Path;

use cozo::{DataValue, DbInstance, NamedRows, ScriptMutability};

use super::schema::ensure_schema;
use super::{ClipRecord, ClipStore, NewClip, StoreError, StoreResult};
use crate::types::TileId;

/// `board_meta` key of the id counter
const NEXT_ID_KEY: &str = "next_clip_id";

/// Clip store on a CozoDB instance
pub struct CozoClipStore {
    db: DbInstance,
    durable: bool,
}

impl CozoClipStore {
    /// Open or create a database at the given path
    ///
    /// Uses the SQLite backend so clips survive restarts.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Open(format!("Failed to create {:?}: {}", parent, e))
            })?;
        }

        let db = DbInstance::new("sqlite", path, "").map_err(|e| StoreError::Open(e.to_string()))?;
        Self::with_instance(db, true)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let db = DbInstance::new("mem", "", "").map_err(|e| StoreError::Open(e.to_string()))?;
        Self::with_instance(db, false)
    }

    fn with_instance(db: DbInstance, durable: bool) -> StoreResult<Self> {
        ensure_schema(&db)?;
        Ok(Self { db, durable })
    }

    fn run_mutation(&self, script: &str, params: BTreeMap<String, DataValue>) -> StoreResult<NamedRows> {
        self.db
            .run_script(script, params, ScriptMutability::Mutable)
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    fn run_query(&self, script: &str, params: BTreeMap<String, DataValue>) -> StoreResult<NamedRows> {
        self.db
            .run_script(script, params, ScriptMutability::Immutable)
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    /// Next id to hand out
    ///
    /// The `next_clip_id` counter only grows, so ids of deleted or cleared
    /// clips are never handed out again. Stores written before the counter
    /// existed fall back to one past the largest stored id.
    fn next_id(&self) -> StoreResult<i64> {
        let mut params = BTreeMap::new();
        params.insert("key".to_string(), DataValue::Str(NEXT_ID_KEY.into()));
        let counter = self
            .run_query("?[value] := *board_meta{key, value}, key = $key", params)?
            .rows
            .first()
            .and_then(|row| row.first())
            .and_then(|v| v.get_int())
            .unwrap_or(1);

        let stored_max = self
            .run_query("?[id] := *clips{id}", BTreeMap::new())?
            .rows
            .iter()
            .filter_map(|row| row.first().and_then(|v| v.get_int()))
            .max()
            .unwrap_or(0);

        Ok(counter.max(stored_max + 1).max(1))
    }

    fn upsert(&self, id: i64, name: &str, mime: &str, bytes: &[u8], color: &str) -> StoreResult<()> {
        self.run_mutation(
            r#"
            ?[id, name, mime, bytes, color] <- [[$id, $name, $mime, $bytes, $color]]
            :put clips {id => name, mime, bytes, color}
        "#,
            clip_params(id, name, mime, bytes, color),
        )?;
        Ok(())
    }
}

fn clip_params(id: i64, name: &str, mime: &str, bytes: &[u8], color: &str) -> BTreeMap<String, DataValue> {
    let mut params = BTreeMap::new();
    params.insert("id".to_string(), DataValue::from(id));
    params.insert("name".to_string(), DataValue::Str(name.into()));
    params.insert("mime".to_string(), DataValue::Str(mime.into()));
    params.insert("bytes".to_string(), DataValue::Bytes(bytes.to_vec()));
    params.insert("color".to_string(), DataValue::Str(color.into()));
    params
}

/// Convert query rows `[id, name, mime, bytes, color]` into records
fn rows_to_records(rows: &NamedRows) -> StoreResult<Vec<ClipRecord>> {
    rows.rows
        .iter()
        .map(|row| {
            let id = row
                .first()
                .and_then(|v| v.get_int())
                .ok_or_else(|| StoreError::InvalidRow("missing id".to_string()))?;
            let name = row
                .get(1)
                .and_then(|v| v.get_str())
                .map(str::to_string)
                .unwrap_or_default();
            let mime = row.get(2).and_then(|v| v.get_str()).map(str::to_string);
            let bytes = match row.get(3) {
                Some(DataValue::Bytes(bytes)) => bytes.clone(),
                _ => return Err(StoreError::InvalidRow(format!("clip {} has no bytes", id))),
            };
            let color = row.get(4).and_then(|v| v.get_str());

            Ok(ClipRecord::from_row(id, name, mime, bytes, color))
        })
        .collect()
}

impl ClipStore for CozoClipStore {
    fn get_all(&self) -> StoreResult<Vec<ClipRecord>> {
        let result = self.run_query(
            r#"
            ?[id, name, mime, bytes, color] := *clips{id, name, mime, bytes, color}
            :order id
        "#,
            BTreeMap::new(),
        )?;

        let records = rows_to_records(&result)?;
        log::debug!("CozoClipStore::get_all: {} clips", records.len());
        Ok(records)
    }

    fn add(&mut self, clip: &NewClip) -> StoreResult<TileId> {
        let id = self.next_id()?;
        let mut params = clip_params(
            id,
            &clip.name,
            &clip.blob.mime_type,
            &clip.blob.bytes,
            clip.color.as_str(),
        );
        params.insert("key".to_string(), DataValue::Str(NEXT_ID_KEY.into()));
        params.insert("next".to_string(), DataValue::from(id + 1));

        // Row and counter are written in one transaction
        self.run_mutation(
            r#"
            {
                ?[id, name, mime, bytes, color] <- [[$id, $name, $mime, $bytes, $color]]
                :put clips {id => name, mime, bytes, color}
            }
            {
                ?[key, value] <- [[$key, $next]]
                :put board_meta {key => value}
            }
        "#,
            params,
        )?;
        log::debug!("CozoClipStore::add: '{}' stored as {}", clip.name, id);
        Ok(TileId(id))
    }

    fn put(&mut self, record: &ClipRecord) -> StoreResult<()> {
        self.upsert(
            record.id.0,
            &record.name,
            &record.blob.mime_type,
            &record.blob.bytes,
            record.color.as_str(),
        )
    }

    fn delete(&mut self, id: TileId) -> StoreResult<()> {
        let mut params = BTreeMap::new();
        params.insert("id".to_string(), DataValue::from(id.0));

        self.run_mutation(
            r#"
            ?[id] <- [[$id]]
            :rm clips {id}
        "#,
            params,
        )?;
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.run_mutation(
            r#"
            ?[id] := *clips{id}
            :rm clips {id}
        "#,
            BTreeMap::new(),
        )?;
        log::info!("CozoClipStore::clear: All clips removed");
        Ok(())
    }

    fn is_durable(&self) -> bool {
        self.durable
    }
}
