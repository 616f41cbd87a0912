//! Runtime lightmap preset blending on top of wgpu.
//!
//! Manages precomputed lightmap bakes ("presets") and interpolates
//! between adjacent presets along a 1-D blend value, or switches
//! between them instantly. The interpolated result lives in a single
//! runtime preset whose textures are overwritten each update and
//! published to the host renderer through the [`LightingSink`]
//! boundary.
//!
//! Lightmap baking, asset scanning, and the renderer itself are the
//! host's business; this crate starts at assembled [`LightmapPreset`]s
//! and ends at published texture views.
//!
//! # Modules
//!
//! - [`preset`] - immutable baked presets and the published data views
//! - [`probes`] - CPU-side light probe sets
//! - [`runtime`] - the live runtime preset factory and teardown
//! - [`pipeline`] - the GPU blend pass
//! - [`transition`] - the transition engine (segment selection,
//!   scratch lifecycle, dirty tracking)
//! - [`manager`] - top-level mode/blend orchestration

pub mod manager;
pub mod pipeline;
pub mod preset;
pub mod probes;
pub mod runtime;
pub mod transition;

pub use manager::{LightingManager, LightingSink};
pub use preset::{
    ChannelShape, ChannelTexture, LightmapData, LightmapPreset, PresetBuilder, SurfaceShape,
    TexturesSet,
};
pub use probes::{LightProbe, LightProbes};
pub use runtime::{ImmediateReleaser, ResourceReleaser, RuntimePreset};
pub use transition::TransitionEngine;

// Re-export the GPU-free shared types alongside the engine
pub use relight_shared::{
    BLEND_EPSILON, BlendError, BlendSegment, LightingMode, LightmapChannel, ManagerConfig,
    SurfaceMask, approx_eq,
};
