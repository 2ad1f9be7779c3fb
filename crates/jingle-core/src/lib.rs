//! Jingle Core - Tile playback and crossfade engine for the jingle soundboard

pub mod board;
pub mod clip;
pub mod collation;
pub mod config;
pub mod crossfade;
pub mod error;
pub mod playback;
pub mod registry;
pub mod settings;
pub mod store;
pub mod tile;
pub mod timing;
pub mod types;

#[cfg(test)]
mod test_util;

pub use board::{Board, BoardEvent};
pub use error::{BoardError, BoardResult};
pub use types::*;
