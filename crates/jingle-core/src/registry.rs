//! Tile registry
//!
//! Single source of truth for which tiles exist and in which order they are
//! presented. Every structural change goes through the [`ClipStore`] first;
//! the in-memory registry is only touched once the store accepted it, so a
//! failed write never leaves a half-created or half-deleted tile behind.

use std::collections::HashMap;

use crate::clip::ClipFactory;
use crate::collation::compare_names;
use crate::store::{ClipBlob, ClipRecord, ClipStore, NewClip, StoreResult};
use crate::tile::Tile;
use crate::timing::Scheduler;
use crate::types::{ColorKey, TileId};

/// Tiles keyed by id, plus their presentation order
pub struct TileRegistry {
    tiles: HashMap<TileId, Tile>,
    order: Vec<TileId>,
    store: Box<dyn ClipStore>,
    factory: Box<dyn ClipFactory>,
}

impl TileRegistry {
    pub fn new(store: Box<dyn ClipStore>, factory: Box<dyn ClipFactory>) -> Self {
        Self {
            tiles: HashMap::new(),
            order: Vec::new(),
            store,
            factory,
        }
    }

    /// Replace the current tiles with everything in the store
    ///
    /// Tiles are presented in Polish alphabetical order; equal names keep
    /// their id order.
    pub fn load(&mut self, scheduler: &mut Scheduler) -> StoreResult<usize> {
        let mut records = self.store.get_all()?;
        records.sort_by(|a, b| compare_names(&a.name, &b.name));

        self.dispose_all(scheduler);
        for record in records {
            let clip = self.factory.open(&record.blob);
            let id = record.id;
            self.tiles.insert(id, Tile::new(record, clip));
            self.order.push(id);
        }

        log::info!("TileRegistry::load: Materialized {} tiles", self.order.len());
        Ok(self.order.len())
    }

    /// Persist a new clip and materialize its tile in sorted position
    pub fn create(&mut self, name: &str, blob: ClipBlob, color: Option<ColorKey>) -> StoreResult<TileId> {
        let new_clip = NewClip {
            name: name.to_string(),
            blob,
            color: color.unwrap_or_default(),
        };
        let id = self.store.add(&new_clip)?;

        let record = ClipRecord {
            id,
            name: new_clip.name,
            blob: new_clip.blob,
            color: new_clip.color,
        };
        let clip = self.factory.open(&record.blob);
        let tile = Tile::new(record, clip);

        let index = self
            .order
            .iter()
            .position(|other| {
                self.tiles
                    .get(other)
                    .is_some_and(|t| compare_names(name, t.name()).is_lt())
            })
            .unwrap_or(self.order.len());
        self.order.insert(index, id);
        self.tiles.insert(id, tile);

        log::info!("TileRegistry::create: '{}' added as tile {} at {}", name, id, index);
        Ok(id)
    }

    /// Remove a tile from the store and the registry, releasing its clip
    ///
    /// Unknown ids are ignored. Returns whether a tile was removed.
    pub fn delete(&mut self, id: TileId, scheduler: &mut Scheduler) -> StoreResult<bool> {
        if !self.tiles.contains_key(&id) {
            log::debug!("TileRegistry::delete: No tile {}", id);
            return Ok(false);
        }

        self.store.delete(id)?;
        self.order.retain(|other| *other != id);
        if let Some(mut tile) = self.tiles.remove(&id) {
            tile.dispose(scheduler);
            log::info!("TileRegistry::delete: Removed tile {} '{}'", id, tile.name());
        }
        Ok(true)
    }

    /// Persist a new color for a tile; returns false for unknown ids
    pub fn set_color(&mut self, id: TileId, color: ColorKey) -> StoreResult<bool> {
        let Some(tile) = self.tiles.get_mut(&id) else {
            return Ok(false);
        };
        if tile.color() == color {
            return Ok(true);
        }

        self.store.put(&tile.record_with_color(color))?;
        tile.set_color(color);
        log::debug!("TileRegistry::set_color: Tile {} is now {}", id, color);
        Ok(true)
    }

    /// Delete every stored clip and every tile
    pub fn clear(&mut self, scheduler: &mut Scheduler) -> StoreResult<()> {
        self.store.clear()?;
        let count = self.order.len();
        self.dispose_all(scheduler);
        log::info!("TileRegistry::clear: Removed {} tiles", count);
        Ok(())
    }

    fn dispose_all(&mut self, scheduler: &mut Scheduler) {
        for tile in self.tiles.values_mut() {
            tile.dispose(scheduler);
        }
        self.tiles.clear();
        self.order.clear();
    }

    /// Move a tile to `index` in presentation order (clamped to the end)
    pub fn move_tile(&mut self, id: TileId, index: usize) -> bool {
        let Some(from) = self.order.iter().position(|other| *other == id) else {
            return false;
        };
        self.order.remove(from);
        let index = index.min(self.order.len());
        self.order.insert(index, id);
        true
    }

    /// Put `leading` first (in the given order), then every other tile
    /// in its current order
    pub fn apply_order(&mut self, leading: &[TileId]) {
        let mut order = Vec::with_capacity(self.order.len());
        for id in leading {
            if self.tiles.contains_key(id) && !order.contains(id) {
                order.push(*id);
            }
        }
        for id in &self.order {
            if !order.contains(id) {
                order.push(*id);
            }
        }
        self.order = order;
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    pub fn get_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(&id)
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.tiles.contains_key(&id)
    }

    /// Tile ids in presentation order
    pub fn ids(&self) -> &[TileId] {
        &self.order
    }

    /// Tiles in presentation order
    pub fn list(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.order.iter().filter_map(|id| self.tiles.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn store(&self) -> &dyn ClipStore {
        self.store.as_ref()
    }
}
