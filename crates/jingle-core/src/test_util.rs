//! Shared fixtures for unit tests

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::clip::{Clip, ClipFactory, VirtualClip};
use crate::store::{
    ClipBlob, ClipRecord, ClipStore, EphemeralStore, NewClip, StoreError, StoreResult,
};
use crate::timing::{ManualClock, SharedClock};
use crate::types::TileId;

/// Clip factory whose clips all last the same time, regardless of bytes
pub struct FixedClipFactory {
    clock: SharedClock,
    duration: Option<Duration>,
}

impl FixedClipFactory {
    pub fn new(clock: Arc<ManualClock>, duration: Option<Duration>) -> Self {
        Self { clock, duration }
    }
}

impl ClipFactory for FixedClipFactory {
    fn open(&self, _blob: &ClipBlob) -> Box<dyn Clip> {
        Box::new(VirtualClip::new(self.clock.clone(), self.duration))
    }
}

/// Store that rejects every operation
pub struct FailingStore;

impl ClipStore for FailingStore {
    fn get_all(&self) -> StoreResult<Vec<ClipRecord>> {
        Err(StoreError::Query("disk on fire".to_string()))
    }

    fn add(&mut self, _clip: &NewClip) -> StoreResult<TileId> {
        Err(StoreError::Query("disk on fire".to_string()))
    }

    fn put(&mut self, _record: &ClipRecord) -> StoreResult<()> {
        Err(StoreError::Query("disk on fire".to_string()))
    }

    fn delete(&mut self, _id: TileId) -> StoreResult<()> {
        Err(StoreError::Query("disk on fire".to_string()))
    }

    fn clear(&mut self) -> StoreResult<()> {
        Err(StoreError::Query("disk on fire".to_string()))
    }

    fn is_durable(&self) -> bool {
        false
    }
}

/// Failures a [`FlakyStore`] injects, switchable while the store is in use
#[derive(Debug, Default)]
pub struct Faults {
    /// `get_all` fails
    pub reads: AtomicBool,
    /// `put` fails for this tile id (0 disables)
    pub put_for: AtomicI64,
}

/// In-memory store with switchable failures
#[derive(Default)]
pub struct FlakyStore {
    inner: EphemeralStore,
    faults: Arc<Faults>,
}

impl FlakyStore {
    pub fn new() -> (Self, Arc<Faults>) {
        let store = Self {
            inner: EphemeralStore::new(),
            faults: Arc::new(Faults::default()),
        };
        let faults = store.faults.clone();
        (store, faults)
    }
}

impl ClipStore for FlakyStore {
    fn get_all(&self) -> StoreResult<Vec<ClipRecord>> {
        if self.faults.reads.load(Ordering::SeqCst) {
            return Err(StoreError::Query("read failed".to_string()));
        }
        self.inner.get_all()
    }

    fn add(&mut self, clip: &NewClip) -> StoreResult<TileId> {
        self.inner.add(clip)
    }

    fn put(&mut self, record: &ClipRecord) -> StoreResult<()> {
        if self.faults.put_for.load(Ordering::SeqCst) == record.id.0 {
            return Err(StoreError::Query(format!("write of {} failed", record.id)));
        }
        self.inner.put(record)
    }

    fn delete(&mut self, id: TileId) -> StoreResult<()> {
        self.inner.delete(id)
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.inner.clear()
    }

    fn is_durable(&self) -> bool {
        false
    }
}

pub fn blob() -> ClipBlob {
    ClipBlob {
        bytes: vec![0xAB; 16],
        mime_type: "audio/mpeg".to_string(),
    }
}

pub fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
