//! Common types for Jingle
//!
//! Tile identities, the color palette, playback states and the timing
//! constants shared by the playback controller and the crossfade engine.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of volume steps in a crossfade
pub const FADE_STEPS: u32 = 50;

/// Fade duration used when the configured value is missing or not positive
pub const DEFAULT_FADE_SECONDS: u32 = 5;

/// Delay before a faded-out clip gets its volume back
pub const VOLUME_RESTORE_DELAY: Duration = Duration::from_secs(10);

/// Store-assigned tile identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub i64);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tile color from the fixed palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorKey {
    Primary,
    Success,
    Danger,
    Warning,
    Info,
    #[default]
    Dark,
}

/// A color name outside the palette
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid color key: {0:?}")]
pub struct InvalidColorKey(pub String);

impl ColorKey {
    /// All palette entries in picker order
    pub const ALL: [ColorKey; 6] = [
        ColorKey::Primary,
        ColorKey::Success,
        ColorKey::Danger,
        ColorKey::Warning,
        ColorKey::Info,
        ColorKey::Dark,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorKey::Primary => "primary",
            ColorKey::Success => "success",
            ColorKey::Danger => "danger",
            ColorKey::Warning => "warning",
            ColorKey::Info => "info",
            ColorKey::Dark => "dark",
        }
    }

    /// Parse a palette name, falling back to the default color
    ///
    /// Invalid input is not an error for the user; it is logged and coerced.
    pub fn parse_or_default(value: &str) -> Self {
        match value.parse() {
            Ok(color) => color,
            Err(e) => {
                log::debug!("{}, using {}", e, ColorKey::default().as_str());
                ColorKey::default()
            }
        }
    }
}

impl FromStr for ColorKey {
    type Err = InvalidColorKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ColorKey::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| InvalidColorKey(s.to_string()))
    }
}

impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live playback state of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    /// Incoming side of the live crossfade
    FadingIn,
    /// Outgoing side of the live crossfade
    FadingOut,
}

impl PlaybackState {
    /// Whether the clip is audible (anything but `Idle`)
    pub fn is_playing(&self) -> bool {
        !matches!(self, PlaybackState::Idle)
    }

    pub fn is_fading(&self) -> bool {
        matches!(self, PlaybackState::FadingIn | PlaybackState::FadingOut)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Playing => "playing",
            PlaybackState::FadingIn => "fading-in",
            PlaybackState::FadingOut => "fading-out",
        }
    }
}

/// Presentation size of the tile grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl TileSize {
    /// Tiles per row on a wide layout
    pub fn columns(&self) -> usize {
        match self {
            TileSize::Small => 6,
            TileSize::Medium => 4,
            TileSize::Large => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TileSize::Small => "small",
            TileSize::Medium => "medium",
            TileSize::Large => "large",
        }
    }
}

impl FromStr for TileSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(TileSize::Small),
            "medium" => Ok(TileSize::Medium),
            "large" => Ok(TileSize::Large),
            other => Err(format!("Unknown tile size: {}", other)),
        }
    }
}

/// Clamp a configured fade length to a positive number of seconds
pub fn effective_fade_seconds(raw: i64) -> u32 {
    if raw <= 0 {
        DEFAULT_FADE_SECONDS
    } else {
        u32::try_from(raw).unwrap_or(DEFAULT_FADE_SECONDS)
    }
}

/// Parse fade-duration input the way a number field reports it
///
/// Leading whitespace is skipped and the longest integer prefix is used
/// ("7s" is 7). Anything without digits, or a non-positive value, falls back
/// to [`DEFAULT_FADE_SECONDS`].
pub fn parse_fade_seconds(input: &str) -> u32 {
    let s = input.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());

    match digits[..end].parse::<i64>() {
        Ok(value) => effective_fade_seconds(sign * value),
        Err(_) => DEFAULT_FADE_SECONDS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_parse() {
        assert_eq!("danger".parse::<ColorKey>(), Ok(ColorKey::Danger));
        assert_eq!(" Info ".parse::<ColorKey>(), Ok(ColorKey::Info));
        assert!("purple".parse::<ColorKey>().is_err());
    }

    #[test]
    fn test_invalid_color_coerced_to_dark() {
        assert_eq!(ColorKey::parse_or_default("purple"), ColorKey::Dark);
        assert_eq!(ColorKey::parse_or_default(""), ColorKey::Dark);
        assert_eq!(ColorKey::parse_or_default("success"), ColorKey::Success);
    }

    #[test]
    fn test_playback_state_flags() {
        assert!(!PlaybackState::Idle.is_playing());
        assert!(PlaybackState::FadingOut.is_playing());
        assert!(PlaybackState::FadingIn.is_fading());
        assert!(!PlaybackState::Playing.is_fading());
    }

    #[test]
    fn test_fade_seconds_fallback() {
        assert_eq!(effective_fade_seconds(0), DEFAULT_FADE_SECONDS);
        assert_eq!(effective_fade_seconds(-3), DEFAULT_FADE_SECONDS);
        assert_eq!(effective_fade_seconds(2), 2);
    }

    #[test]
    fn test_parse_fade_seconds() {
        assert_eq!(parse_fade_seconds("8"), 8);
        assert_eq!(parse_fade_seconds(" 7s"), 7);
        assert_eq!(parse_fade_seconds("abc"), DEFAULT_FADE_SECONDS);
        assert_eq!(parse_fade_seconds("0"), DEFAULT_FADE_SECONDS);
        assert_eq!(parse_fade_seconds("-4"), DEFAULT_FADE_SECONDS);
        assert_eq!(parse_fade_seconds(""), DEFAULT_FADE_SECONDS);
    }

    #[test]
    fn test_tile_size_columns() {
        assert_eq!("large".parse::<TileSize>(), Ok(TileSize::Large));
        assert_eq!(TileSize::Small.columns(), 6);
        assert!("huge".parse::<TileSize>().is_err());
    }
}
