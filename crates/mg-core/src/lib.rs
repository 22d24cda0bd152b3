//! mg-core: shared error type and configuration.
//!
//! This crate is the foundational dependency for the other mg-* crates,
//! providing the unified [`Error`] every gateway and playback operation
//! reports through, plus the [`config::Config`] tree.

pub mod config;
pub mod error;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
