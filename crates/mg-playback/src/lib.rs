//! mg-playback: a small transport-control facade over a playback engine.
//!
//! A [`Player`] binds one [`MediaSource`] to one [`PlaybackEngine`]
//! instance and exposes play, pause, seek, position and duration in
//! seconds. Engines work in [`MediaTime`] ticks; the facade does the
//! translation. Every operation returns [`mg_core::Result`], so playback
//! failures travel the same error channel as conversion failures.

pub mod clock;
pub mod player;
pub mod time;

pub use clock::ClockEngine;
pub use player::{MediaSource, PlaybackEngine, Player};
pub use time::{MediaTime, TICKS_PER_SECOND};
