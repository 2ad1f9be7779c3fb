//! Crossfade between two tiles
//!
//! When crossfade mode is on, clicking an idle tile while another one plays
//! fades the playing tile out and the clicked tile in over a configurable
//! number of seconds, in [`FADE_STEPS`](crate::types::FADE_STEPS) volume
//! steps driven by the board's scheduler.
//!
//! ```text
//!  outgoing  Playing ──click other──▶ FadingOut ──done──▶ Idle (volume 0, restore in 10 s)
//!  incoming  Idle    ──────────────▶ FadingIn  ──done──▶ Playing (volume 1)
//! ```
//!
//! At most one session is live; the engine also remembers the tile a new
//! crossfade would fade *from* (the active target).

mod curve;
mod engine;

pub use curve::FadeCurve;
pub use engine::{CrossfadeEngine, CrossfadeSession};
