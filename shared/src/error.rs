//! Error taxonomy shared by all relight crates.
//!
//! Configuration errors are raised synchronously from the offending
//! call before any state is mutated. Shape mismatches are recoverable:
//! the offending channel is skipped and blending continues.

use thiserror::Error;

use crate::channel::LightmapChannel;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlendError {
    #[error("blending requires at least 2 presets, got {count}")]
    InsufficientPresets { count: usize },

    #[error("surface mask has {actual} entries, expected {expected}")]
    MaskSize { expected: usize, actual: usize },

    #[error("invalid mockup preset: {0}")]
    InvalidMockup(String),

    #[error("pixel data size mismatch: expected {expected} bytes, got {actual}")]
    PixelData { expected: usize, actual: usize },

    #[error("preset '{preset}' {channel} channel at surface {surface} does not match the runtime shape")]
    ShapeMismatch {
        preset: String,
        surface: usize,
        channel: LightmapChannel,
    },
}
