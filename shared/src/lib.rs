//! Shared types for the relight lightmap blending toolkit.
//!
//! This crate is GPU-free on purpose: everything here can be used by
//! asset pipelines and editor tooling without pulling in wgpu.
//!
//! # Modules
//!
//! - [`blend`] - blend-value parameterization across a preset sequence
//! - [`channel`] - lightmap channel enumeration and per-surface masks
//! - [`config`] - host-persisted manager configuration
//! - [`error`] - the error taxonomy shared by all relight crates

pub mod blend;
pub mod channel;
pub mod config;
pub mod error;

pub use blend::{BLEND_EPSILON, BlendSegment, approx_eq};
pub use channel::{LightmapChannel, SurfaceMask};
pub use config::{LightingMode, ManagerConfig};
pub use error::BlendError;
