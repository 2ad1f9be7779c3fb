//! Session-only clip store

use std::collections::BTreeMap;

use super::{ClipRecord, ClipStore, NewClip, StoreResult};
use crate::types::TileId;

/// In-process clip store; nothing survives the session
#[derive(Debug, Default)]
pub struct EphemeralStore {
    records: BTreeMap<TileId, ClipRecord>,
    next_id: i64,
}

impl EphemeralStore {
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl ClipStore for EphemeralStore {
    fn get_all(&self) -> StoreResult<Vec<ClipRecord>> {
        Ok(self.records.values().cloned().collect())
    }

    fn add(&mut self, clip: &NewClip) -> StoreResult<TileId> {
        let id = TileId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.records.insert(
            id,
            ClipRecord {
                id,
                name: clip.name.clone(),
                blob: clip.blob.clone(),
                color: clip.color,
            },
        );
        Ok(id)
    }

    fn put(&mut self, record: &ClipRecord) -> StoreResult<()> {
        self.next_id = self.next_id.max(record.id.0 + 1);
        self.records.insert(record.id, record.clone());
        Ok(())
    }

    fn delete(&mut self, id: TileId) -> StoreResult<()> {
        self.records.remove(&id);
        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.records.clear();
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }
}
