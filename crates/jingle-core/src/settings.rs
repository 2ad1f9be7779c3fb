//! Settings export and import
//!
//! The exported document carries the board-wide crossfade settings and, per
//! tile, its name, color and presentation order:
//!
//! ```json
//! {
//!   "version": 1,
//!   "settings": { "crossfadeEnabled": true, "fadeSeconds": 5 },
//!   "tiles": [ { "name": "Intro", "colorKey": "success", "order": 0 } ]
//! }
//! ```
//!
//! Import matches tiles by name after folding case, diacritics and
//! whitespace. The whole document is validated before anything is applied.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collation::match_key;
use crate::error::{BoardError, BoardResult};
use crate::registry::TileRegistry;
use crate::store::StoreResult;
use crate::types::{effective_fade_seconds, parse_fade_seconds, ColorKey, TileId};

/// Version written into exported documents
pub const SETTINGS_VERSION: u32 = 1;

/// Exported settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDocument {
    pub version: u32,
    pub settings: BoardSettings,
    pub tiles: Vec<TileSettings>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSettings {
    pub crossfade_enabled: bool,
    pub fade_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSettings {
    pub name: String,
    pub color_key: ColorKey,
    pub order: usize,
}

impl SettingsDocument {
    /// Snapshot the board in presentation order
    pub fn capture(registry: &TileRegistry, settings: BoardSettings) -> Self {
        Self {
            version: SETTINGS_VERSION,
            settings,
            tiles: registry
                .list()
                .enumerate()
                .map(|(order, tile)| TileSettings {
                    name: tile.name().to_string(),
                    color_key: tile.color(),
                    order,
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One tile entry accepted from an import document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    pub name: String,
    pub color_key: ColorKey,
    pub order: Option<usize>,
}

/// A validated import document, not yet applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPlan {
    pub crossfade_enabled: Option<bool>,
    pub fade_seconds: Option<u32>,
    pub entries: Vec<ImportEntry>,
    /// Entries that could not be read at all
    pub malformed_entries: usize,
}

/// Outcome of applying an import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Tiles whose settings were applied
    pub matched: Vec<TileId>,
    /// Names that matched no tile
    pub unmatched: Vec<String>,
    pub malformed_entries: usize,
}

impl ImportPlan {
    /// Validate an import document
    ///
    /// Fails only if the text is not JSON or not an object. Missing or
    /// mistyped fields are ignored; unknown colors fall back to the default.
    pub fn parse(text: &str) -> BoardResult<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| BoardError::MalformedImport(e.to_string()))?;
        let Value::Object(root) = value else {
            return Err(BoardError::MalformedImport(
                "document is not a JSON object".to_string(),
            ));
        };

        let mut plan = ImportPlan::default();

        if let Some(Value::Object(settings)) = root.get("settings") {
            plan.crossfade_enabled = settings.get("crossfadeEnabled").and_then(Value::as_bool);
            plan.fade_seconds = settings.get("fadeSeconds").and_then(fade_seconds_value);
        }

        if let Some(Value::Array(tiles)) = root.get("tiles") {
            for entry in tiles {
                match import_entry(entry) {
                    Some(entry) => plan.entries.push(entry),
                    None => {
                        log::warn!("ImportPlan::parse: Skipping unreadable tile entry {}", entry);
                        plan.malformed_entries += 1;
                    }
                }
            }
        }

        Ok(plan)
    }

    /// Apply colors and order to matching tiles
    ///
    /// Each entry claims the first unclaimed tile (in presentation order)
    /// whose name matches. Matched tiles are moved to the front, sorted by
    /// their `order`; the rest keep their relative order.
    ///
    /// If persisting a color fails, the colors already written are put back
    /// and the order is left alone.
    pub fn apply_tiles(&self, registry: &mut TileRegistry) -> StoreResult<ImportReport> {
        let mut candidates: HashMap<String, VecDeque<TileId>> = HashMap::new();
        for tile in registry.list() {
            candidates
                .entry(match_key(tile.name()))
                .or_default()
                .push_back(tile.id());
        }

        let mut report = ImportReport {
            malformed_entries: self.malformed_entries,
            ..Default::default()
        };
        let mut staged: Vec<(TileId, ColorKey)> = Vec::new();
        let mut ordered: Vec<(usize, usize, TileId)> = Vec::new();

        for (index, entry) in self.entries.iter().enumerate() {
            let Some(id) = candidates
                .get_mut(&match_key(&entry.name))
                .and_then(VecDeque::pop_front)
            else {
                log::info!(
                    "ImportPlan::apply_tiles: No tile named '{}', entry skipped",
                    entry.name
                );
                report.unmatched.push(entry.name.clone());
                continue;
            };

            staged.push((id, entry.color_key));
            ordered.push((entry.order.unwrap_or(usize::MAX), index, id));
            report.matched.push(id);
        }

        let mut previous: Vec<(TileId, ColorKey)> = Vec::with_capacity(staged.len());
        for &(id, color) in &staged {
            let Some(before) = registry.get(id).map(|t| t.color()) else {
                continue;
            };
            if let Err(e) = registry.set_color(id, color) {
                log::warn!(
                    "ImportPlan::apply_tiles: Storing color of tile {} failed ({}), rolling back",
                    id,
                    e
                );
                for &(id, color) in previous.iter().rev() {
                    if let Err(e) = registry.set_color(id, color) {
                        log::error!("ImportPlan::apply_tiles: Rollback of tile {} failed: {}", id, e);
                    }
                }
                return Err(e);
            }
            previous.push((id, before));
        }

        ordered.sort();
        let leading: Vec<TileId> = ordered.into_iter().map(|(_, _, id)| id).collect();
        registry.apply_order(&leading);

        log::info!(
            "ImportPlan::apply_tiles: {} applied, {} unmatched, {} unreadable",
            report.matched.len(),
            report.unmatched.len(),
            report.malformed_entries
        );
        Ok(report)
    }
}

fn fade_seconds_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .map(effective_fade_seconds),
        Value::String(s) => Some(parse_fade_seconds(s)),
        _ => None,
    }
}

fn import_entry(value: &Value) -> Option<ImportEntry> {
    let entry = value.as_object()?;
    let name = entry.get("name")?.as_str()?.to_string();
    let color_key = entry
        .get("colorKey")
        .and_then(Value::as_str)
        .map(ColorKey::parse_or_default)
        .unwrap_or_default();
    let order = entry
        .get("order")
        .and_then(Value::as_u64)
        .and_then(|o| usize::try_from(o).ok());
    Some(ImportEntry {
        name,
        color_key,
        order,
    })
}
