//! Text rendering of the board
//!
//! Rendering is a pure projection of tile state: nothing here feeds back
//! into the board.

use jingle_core::tile::Tile;
use jingle_core::{BoardEvent, ColorKey, PlaybackState, TileId, TileSize};

/// What a grid cell shows for one tile
#[derive(Debug, Clone, PartialEq)]
pub struct TileView {
    pub id: TileId,
    pub name: String,
    pub color: ColorKey,
    pub state: PlaybackState,
    pub progress: Option<f32>,
    pub volume: f32,
}

impl From<&Tile> for TileView {
    fn from(tile: &Tile) -> Self {
        Self {
            id: tile.id(),
            name: tile.name().to_string(),
            color: tile.color(),
            state: tile.state(),
            progress: tile.progress(),
            volume: tile.volume(),
        }
    }
}

/// Cell width in characters for each tile size
fn cell_width(size: TileSize) -> usize {
    match size {
        TileSize::Small => 18,
        TileSize::Medium => 26,
        TileSize::Large => 38,
    }
}

fn state_marker(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Idle => "  ",
        PlaybackState::Playing => "▶ ",
        PlaybackState::FadingIn => "↗ ",
        PlaybackState::FadingOut => "↘ ",
    }
}

/// Truncate to `width` characters, padding with spaces
fn fit(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - len));
    out
}

fn cell(tile: &TileView, width: usize) -> String {
    let progress = match (tile.state.is_playing(), tile.progress) {
        (true, Some(percent)) => format!(" {:>3.0}%", percent),
        _ => String::new(),
    };
    let label = format!(
        "{}{:>3} {} [{}]{}",
        state_marker(tile.state),
        tile.id.0,
        tile.name,
        tile.color,
        progress
    );
    format!("|{}", fit(&label, width))
}

/// Lay the tiles out in rows of `size.columns()` cells
pub fn render_grid(tiles: &[TileView], size: TileSize) -> String {
    if tiles.is_empty() {
        return "(no tiles, use 'add <file>')".to_string();
    }

    let width = cell_width(size);
    tiles
        .chunks(size.columns())
        .map(|row| {
            let mut line: String = row.iter().map(|t| cell(t, width)).collect();
            line.push('|');
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line description of an event worth printing
///
/// Progress updates are too frequent to print and return `None`.
pub fn describe_event(event: &BoardEvent) -> Option<String> {
    match event {
        BoardEvent::TileAdded { id, name } => Some(format!("added tile {} '{}'", id, name)),
        BoardEvent::TileRemoved(id) => Some(format!("removed tile {}", id)),
        BoardEvent::StateChanged { id, from, to } => {
            Some(format!("tile {}: {} -> {}", id, from.name(), to.name()))
        }
        BoardEvent::ColorChanged { id, color } => Some(format!("tile {} is now {}", id, color)),
        BoardEvent::FadeStarted { outgoing, incoming } => {
            Some(format!("crossfade {} -> {}", outgoing, incoming))
        }
        BoardEvent::FadeFinished { outgoing, incoming } => {
            Some(format!("crossfade {} -> {} done", outgoing, incoming))
        }
        BoardEvent::ImportSkipped { name } => Some(format!("no tile named '{}', skipped", name)),
        BoardEvent::Cleared => Some("board cleared".to_string()),
        BoardEvent::Progress { .. } | BoardEvent::Reordered => None,
    }
}
