//! The lightmap transition engine.
//!
//! Owns the ordered list of presets participating in a blend, the live
//! runtime preset, one reusable scratch render target per channel per
//! surface, and the staleness state. Each update selects the two
//! presets bounding the blend value, mixes their channels on the GPU
//! into scratch, and copies scratch into the runtime preset.

use std::sync::Arc;

use hashbrown::HashMap;
use relight_shared::{BlendError, BlendSegment, LightmapChannel, SurfaceMask, approx_eq};

use crate::pipeline::BlendPipeline;
use crate::preset::{ChannelTexture, LightmapPreset, SurfaceShape};
use crate::probes::LightProbes;
use crate::runtime::{ImmediateReleaser, ResourceReleaser, RuntimePreset};

/// One scratch render target per channel for a single surface index.
#[derive(Debug, Default)]
struct ScratchSet {
    channels: [Option<ChannelTexture>; LightmapChannel::COUNT],
}

/// Pairwise blender over an ordered sequence of lightmap presets.
///
/// Two macro-states: not ready (no presets assigned, no GPU resources)
/// and ready (at least two presets assigned, runtime preset and
/// scratch targets allocated). Allocation happens once, on the first
/// successful [`set_presets_to_blend`](Self::set_presets_to_blend);
/// later preset-list swaps reuse the same resources.
pub struct TransitionEngine {
    blended_presets: Vec<Arc<LightmapPreset>>,
    /// Name -> first blend order index; later duplicates are ignored.
    mapped_blended_presets: HashMap<String, usize>,
    allowed_surfaces: SurfaceMask,
    /// Which (surface, channel) pairs every blended preset agrees on.
    blendable: Vec<[bool; LightmapChannel::COUNT]>,
    runtime_preset: Option<RuntimePreset>,
    scratch_targets: Vec<ScratchSet>,
    pipeline: Option<BlendPipeline>,
    last_blend_value: f32,
    is_dirty: bool,
    disposed: bool,
    ready_listeners: Vec<Box<dyn FnOnce()>>,
    releaser: Box<dyn ResourceReleaser>,
}

impl Default for TransitionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionEngine {
    pub fn new() -> Self {
        Self::with_releaser(Box::new(ImmediateReleaser))
    }

    /// Build an engine that tears resources down through `releaser`
    /// instead of destroying them immediately.
    pub fn with_releaser(releaser: Box<dyn ResourceReleaser>) -> Self {
        Self {
            blended_presets: Vec::new(),
            mapped_blended_presets: HashMap::new(),
            allowed_surfaces: SurfaceMask::default(),
            blendable: Vec::new(),
            runtime_preset: None,
            scratch_targets: Vec::new(),
            pipeline: None,
            last_blend_value: 0.0,
            is_dirty: false,
            disposed: false,
            ready_listeners: Vec::new(),
            releaser,
        }
    }

    /// Whether the runtime preset and scratch targets are allocated.
    pub fn is_ready(&self) -> bool {
        self.runtime_preset.is_some()
    }

    pub fn presets_to_blend_count(&self) -> usize {
        self.blended_presets.len()
    }

    /// Surface count of the runtime preset; 0 while not ready.
    pub fn surface_count(&self) -> usize {
        self.runtime_preset
            .as_ref()
            .map_or(0, RuntimePreset::surface_count)
    }

    /// The live preset the renderer should consume. `None` while not
    /// ready.
    pub fn runtime_preset(&self) -> Option<&LightmapPreset> {
        self.runtime_preset.as_ref().map(RuntimePreset::preset)
    }

    pub fn allowed_surfaces(&self) -> &SurfaceMask {
        &self.allowed_surfaces
    }

    /// Register a callback fired once the runtime allocation
    /// completes. Fires immediately if the engine is already ready;
    /// allocation happens at most once per engine lifetime, so each
    /// listener runs at most once.
    pub fn on_ready(&mut self, listener: impl FnOnce() + 'static) {
        if self.is_ready() {
            listener();
        } else {
            self.ready_listeners.push(Box::new(listener));
        }
    }

    /// Replace the set of presets participating in the blend.
    ///
    /// Requires at least two presets. On the first successful call the
    /// runtime preset and scratch targets are allocated from the shape
    /// of `presets[0]`; the engine is marked dirty so the next update
    /// runs even with an unchanged blend value. Returns the list of
    /// (surface, channel) pairs that will be skipped because some
    /// preset's shape disagrees with the runtime shape; these are
    /// recoverable and also logged.
    pub fn set_presets_to_blend(
        &mut self,
        device: &wgpu::Device,
        presets: Vec<Arc<LightmapPreset>>,
    ) -> Result<Vec<BlendError>, BlendError> {
        if presets.len() < 2 {
            return Err(BlendError::InsufficientPresets {
                count: presets.len(),
            });
        }

        if self.runtime_preset.is_none() {
            self.allocate(device, &presets[0])?;
        }

        self.mapped_blended_presets = map_preset_names(presets.iter().map(|p| p.name()));
        if self.mapped_blended_presets.len() < presets.len() {
            tracing::warn!(
                "Duplicate preset names in blend list; membership keeps the first occurrence"
            );
        }

        let runtime_shape = self
            .runtime_preset
            .as_ref()
            .map(|runtime| runtime.preset().shape())
            .unwrap_or_default();
        let preset_shapes: Vec<(String, Vec<SurfaceShape>)> = presets
            .iter()
            .map(|p| (p.name().to_owned(), p.shape()))
            .collect();
        let (blendable, mismatches) = blendable_channels(&runtime_shape, &preset_shapes);
        for mismatch in &mismatches {
            tracing::warn!("Skipping channel: {}", mismatch);
        }

        self.blendable = blendable;
        self.blended_presets = presets;
        self.is_dirty = true;
        self.disposed = false;

        Ok(mismatches)
    }

    /// Replace the per-surface participation mask wholesale.
    /// Fails without partial mutation when the length differs from the
    /// runtime surface count.
    pub fn set_allowed_surfaces(&mut self, mask: Vec<bool>) -> Result<(), BlendError> {
        self.allowed_surfaces.replace(mask)?;
        self.is_dirty = true;
        Ok(())
    }

    /// Toggle a single surface. Out-of-range indices are ignored.
    pub fn set_surface_allowed(&mut self, surface: usize, allowed: bool) {
        self.allowed_surfaces.set_allowed(surface, allowed);
        self.is_dirty = true;
    }

    /// Blend order of the named preset, or `None` when the engine is
    /// not ready or the preset is not part of the blend.
    pub fn is_preset_blended(&self, name: &str) -> Option<usize> {
        self.mapped_blended_presets.get(name).copied()
    }

    /// Run one blend step at `blend_value`.
    ///
    /// The value is clamped to `[0, 1]` before anything else. Returns
    /// `false` without touching the GPU when the engine is not ready,
    /// or when the clamped value is unchanged (within epsilon) and
    /// nothing marked the engine dirty. Otherwise selects the bounding
    /// segment, blends every allowed surface's compatible channels
    /// into scratch, copies scratch into the runtime preset, and
    /// refreshes the blended light probes.
    pub fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        blend_value: f32,
    ) -> bool {
        if self.runtime_preset.is_none() {
            return false;
        }

        let Some(blend_value) = pending_blend(self.last_blend_value, blend_value, self.is_dirty)
        else {
            return false;
        };

        let Some(segment) = BlendSegment::select(blend_value, self.blended_presets.len()) else {
            return false;
        };

        let preset_a = Arc::clone(&self.blended_presets[segment.index_a]);
        let preset_b = Arc::clone(&self.blended_presets[segment.index_b]);

        self.encode_and_submit(device, queue, &preset_a, &preset_b, segment.local_t);
        self.update_probes(&preset_a, &preset_b, segment.local_t);

        self.last_blend_value = blend_value;
        self.is_dirty = false;
        true
    }

    /// Release the runtime preset's textures, the scratch targets, and
    /// the blend pipeline, in that order. Idempotent; safe to call on
    /// a never-ready engine. After disposal the engine must be
    /// reconfigured with a fresh `set_presets_to_blend` before use.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }

        if let Some(mut runtime) = self.runtime_preset.take() {
            runtime.release(self.releaser.as_ref());
        }

        for mut scratch in self.scratch_targets.drain(..) {
            for texture in scratch.channels.iter_mut().filter_map(Option::take) {
                self.releaser.release_texture(texture.texture());
            }
        }

        if let Some(pipeline) = self.pipeline.take() {
            pipeline.release();
        }

        self.blended_presets.clear();
        self.mapped_blended_presets.clear();
        self.blendable.clear();
        self.allowed_surfaces = SurfaceMask::default();
        self.last_blend_value = 0.0;
        self.is_dirty = false;
        self.disposed = true;

        tracing::debug!("Transition engine disposed");
    }

    /// One-time allocation of runtime preset, scratch targets, and
    /// blend pipeline from the mockup's shape.
    fn allocate(&mut self, device: &wgpu::Device, mockup: &LightmapPreset) -> Result<(), BlendError> {
        let runtime = RuntimePreset::new(device, mockup)?;

        let mut scratch_targets = Vec::with_capacity(runtime.surface_count());
        for (surface, set) in runtime.preset().textures_sets().iter().enumerate() {
            let mut scratch = ScratchSet::default();
            for channel in LightmapChannel::ALL {
                scratch.channels[channel.slot()] = set
                    .channel(channel)
                    .map(|texture| create_scratch_target(device, texture, surface, channel));
            }
            scratch_targets.push(scratch);
        }

        self.allowed_surfaces = SurfaceMask::all_allowed(runtime.surface_count());
        self.scratch_targets = scratch_targets;
        self.runtime_preset = Some(runtime);
        self.pipeline = Some(BlendPipeline::new(device));

        tracing::debug!(
            "Transition engine ready: {} surfaces",
            self.surface_count()
        );

        for listener in self.ready_listeners.drain(..) {
            listener();
        }

        Ok(())
    }

    fn encode_and_submit(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        preset_a: &LightmapPreset,
        preset_b: &LightmapPreset,
        local_t: f32,
    ) {
        let Some(runtime) = self.runtime_preset.as_ref() else {
            return;
        };
        let Some(pipeline) = self.pipeline.as_mut() else {
            return;
        };

        pipeline.set_blend(queue, local_t);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Lightmap Blend Encoder"),
        });

        for surface in 0..runtime.surface_count() {
            if !self.allowed_surfaces.is_allowed(surface) {
                continue;
            }

            for channel in LightmapChannel::ALL {
                if !self.blendable[surface][channel.slot()] {
                    continue;
                }

                let (Some(scratch), Some(target), Some(source_a), Some(source_b)) = (
                    self.scratch_targets[surface].channels[channel.slot()].as_ref(),
                    runtime.channel(surface, channel),
                    preset_a
                        .textures_sets()
                        .get(surface)
                        .and_then(|set| set.channel(channel)),
                    preset_b
                        .textures_sets()
                        .get(surface)
                        .and_then(|set| set.channel(channel)),
                ) else {
                    continue;
                };

                // Blendable guarantees the mip counts agree, so the
                // whole chain is rewritten and nothing published stays
                // undefined.
                let shape = scratch.shape();
                for mip in 0..shape.mip_level_count {
                    let source_a_view = source_a.mip_view(mip);
                    let source_b_view = source_b.mip_view(mip);
                    let scratch_view = scratch.mip_view(mip);
                    pipeline.encode_blend(
                        device,
                        &mut encoder,
                        &source_a_view,
                        &source_b_view,
                        &scratch_view,
                        shape.format,
                    );

                    encoder.copy_texture_to_texture(
                        wgpu::TexelCopyTextureInfo {
                            texture: scratch.texture(),
                            mip_level: mip,
                            origin: wgpu::Origin3d::ZERO,
                            aspect: wgpu::TextureAspect::All,
                        },
                        wgpu::TexelCopyTextureInfo {
                            texture: target.texture(),
                            mip_level: mip,
                            origin: wgpu::Origin3d::ZERO,
                            aspect: wgpu::TextureAspect::All,
                        },
                        shape.mip_extent(mip),
                    );
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Refresh the runtime preset's probe set. Probes interpolate only
    /// when both bounding presets carry matching sets; otherwise the
    /// lower preset's probes pass through unchanged.
    fn update_probes(&mut self, preset_a: &LightmapPreset, preset_b: &LightmapPreset, t: f32) {
        let Some(runtime) = self.runtime_preset.as_mut() else {
            return;
        };

        let blended = match (preset_a.light_probes(), preset_b.light_probes()) {
            (Some(a), Some(b)) => match LightProbes::lerp(a, b, t) {
                Some(probes) => Some(probes),
                None => {
                    tracing::warn!(
                        "Probe counts differ between '{}' and '{}'; passing '{}' probes through",
                        preset_a.name(),
                        preset_b.name(),
                        preset_a.name()
                    );
                    Some(a.clone())
                }
            },
            (probes, _) => probes.cloned(),
        };

        runtime.set_light_probes(blended);
    }
}

impl Drop for TransitionEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Scratch targets mirror the runtime texture's size, format, and mip
/// chain as render attachments; every level is blended individually.
fn create_scratch_target(
    device: &wgpu::Device,
    runtime_texture: &ChannelTexture,
    surface: usize,
    channel: LightmapChannel,
) -> ChannelTexture {
    let shape = runtime_texture.shape();
    let label = format!("scratch {} surface {}", channel, surface);
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(&label),
        size: wgpu::Extent3d {
            width: shape.width,
            height: shape.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: shape.mip_level_count,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: shape.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    ChannelTexture::new(texture)
}

/// Decide whether an update at `requested` must perform blend work.
///
/// Returns the clamped value to run at, or `None` when it matches the
/// last applied value within epsilon and nothing marked the engine
/// dirty. Clamping happens before the comparison so successive
/// out-of-range values do not re-run identical work.
fn pending_blend(last_value: f32, requested: f32, dirty: bool) -> Option<f32> {
    let value = requested.clamp(0.0, 1.0);
    if approx_eq(last_value, value) && !dirty {
        return None;
    }
    Some(value)
}

/// Build the name -> first-index membership map; duplicate names keep
/// their first occurrence.
fn map_preset_names<'a>(names: impl Iterator<Item = &'a str>) -> HashMap<String, usize> {
    let mut mapped = HashMap::new();
    for (index, name) in names.enumerate() {
        mapped.entry(name.to_owned()).or_insert(index);
    }
    mapped
}

/// Decide which (surface, channel) pairs are blendable: the channel
/// must exist in the runtime shape and every preset must agree on its
/// presence, size, mips, and format. Disagreements are reported as
/// recoverable `ShapeMismatch` errors.
fn blendable_channels(
    runtime_shape: &[SurfaceShape],
    presets: &[(String, Vec<SurfaceShape>)],
) -> (Vec<[bool; LightmapChannel::COUNT]>, Vec<BlendError>) {
    let mut blendable = vec![[false; LightmapChannel::COUNT]; runtime_shape.len()];
    let mut mismatches = Vec::new();

    for (surface, surface_shape) in runtime_shape.iter().enumerate() {
        for channel in LightmapChannel::ALL {
            let Some(expected) = surface_shape.channel(channel) else {
                continue;
            };

            let mut ok = true;
            for (name, shape) in presets {
                let actual = shape.get(surface).and_then(|s| s.channel(channel));
                if actual != Some(expected) {
                    mismatches.push(BlendError::ShapeMismatch {
                        preset: name.clone(),
                        surface,
                        channel,
                    });
                    ok = false;
                }
            }

            blendable[surface][channel.slot()] = ok;
        }
    }

    (blendable, mismatches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::ChannelShape;

    fn shape(width: u32) -> ChannelShape {
        ChannelShape {
            width,
            height: width,
            mip_level_count: 1,
            format: wgpu::TextureFormat::Rgba8Unorm,
        }
    }

    fn full_surface(width: u32) -> SurfaceShape {
        SurfaceShape {
            channels: [Some(shape(width)); LightmapChannel::COUNT],
        }
    }

    #[test]
    fn test_map_preset_names_first_occurrence_wins() {
        let mapped = map_preset_names(["day", "dusk", "day", "night"].into_iter());
        assert_eq!(mapped.get("day"), Some(&0));
        assert_eq!(mapped.get("dusk"), Some(&1));
        assert_eq!(mapped.get("night"), Some(&3));
        assert_eq!(mapped.get("noon"), None);
    }

    #[test]
    fn test_blendable_all_matching() {
        let runtime = vec![full_surface(64); 3];
        let presets = vec![
            ("day".to_owned(), vec![full_surface(64); 3]),
            ("night".to_owned(), vec![full_surface(64); 3]),
        ];

        let (blendable, mismatches) = blendable_channels(&runtime, &presets);
        assert!(mismatches.is_empty());
        assert_eq!(blendable.len(), 3);
        assert!(blendable.iter().all(|s| s.iter().all(|&c| c)));
    }

    #[test]
    fn test_blendable_skips_size_mismatch() {
        let runtime = vec![full_surface(64)];
        let mut odd = full_surface(64);
        odd.channels[LightmapChannel::Color.slot()] = Some(shape(32));
        let presets = vec![
            ("day".to_owned(), vec![full_surface(64)]),
            ("night".to_owned(), vec![odd]),
        ];

        let (blendable, mismatches) = blendable_channels(&runtime, &presets);
        assert_eq!(
            mismatches,
            vec![BlendError::ShapeMismatch {
                preset: "night".to_owned(),
                surface: 0,
                channel: LightmapChannel::Color,
            }]
        );
        assert!(blendable[0][LightmapChannel::ShadowMask.slot()]);
        assert!(blendable[0][LightmapChannel::Directional.slot()]);
        assert!(!blendable[0][LightmapChannel::Color.slot()]);
    }

    #[test]
    fn test_blendable_skips_missing_channel() {
        let runtime = vec![full_surface(64)];
        let mut missing = full_surface(64);
        missing.channels[LightmapChannel::ShadowMask.slot()] = None;
        let presets = vec![
            ("day".to_owned(), vec![full_surface(64)]),
            ("night".to_owned(), vec![missing]),
        ];

        let (blendable, mismatches) = blendable_channels(&runtime, &presets);
        assert_eq!(mismatches.len(), 1);
        assert!(!blendable[0][LightmapChannel::ShadowMask.slot()]);
        assert!(blendable[0][LightmapChannel::Color.slot()]);
    }

    #[test]
    fn test_blendable_short_preset_reported_per_channel() {
        let runtime = vec![full_surface(64), full_surface(64)];
        let presets = vec![
            ("day".to_owned(), vec![full_surface(64), full_surface(64)]),
            ("night".to_owned(), vec![full_surface(64)]),
        ];

        let (blendable, mismatches) = blendable_channels(&runtime, &presets);
        // Surface 1 loses all three channels against the short preset
        assert_eq!(mismatches.len(), 3);
        assert!(blendable[0].iter().all(|&c| c));
        assert!(blendable[1].iter().all(|&c| !c));
    }

    #[test]
    fn test_pending_blend_unchanged_value_skips() {
        assert_eq!(pending_blend(0.5, 0.5, false), None);
        assert_eq!(pending_blend(0.0, 0.0, false), None);
    }

    #[test]
    fn test_pending_blend_dirty_forces_run() {
        assert_eq!(pending_blend(0.5, 0.5, true), Some(0.5));
    }

    #[test]
    fn test_pending_blend_epsilon_close_treated_equal() {
        use relight_shared::BLEND_EPSILON;
        assert_eq!(pending_blend(0.5, 0.5 + BLEND_EPSILON * 0.5, false), None);
        assert_eq!(pending_blend(0.5, 0.502, false), Some(0.502));
    }

    #[test]
    fn test_pending_blend_clamps_before_comparing() {
        // 1.5 and 2.0 both clamp to an already-applied 1.0
        assert_eq!(pending_blend(1.0, 1.5, false), None);
        assert_eq!(pending_blend(1.0, 2.0, false), None);
        assert_eq!(pending_blend(0.0, -0.5, false), None);
        assert_eq!(pending_blend(0.5, 2.0, false), Some(1.0));
    }

    #[test]
    fn test_not_ready_defaults() {
        let engine = TransitionEngine::new();
        assert!(!engine.is_ready());
        assert_eq!(engine.surface_count(), 0);
        assert_eq!(engine.presets_to_blend_count(), 0);
        assert!(engine.runtime_preset().is_none());
        assert_eq!(engine.is_preset_blended("day"), None);
    }

    #[test]
    fn test_mask_replace_requires_ready_length() {
        let mut engine = TransitionEngine::new();
        // Not ready: surface count is 0, so any non-empty mask is rejected
        let result = engine.set_allowed_surfaces(vec![true, false]);
        assert_eq!(
            result,
            Err(BlendError::MaskSize {
                expected: 0,
                actual: 2
            })
        );
    }

    #[test]
    fn test_dispose_is_idempotent_when_never_ready() {
        let mut engine = TransitionEngine::new();
        engine.dispose();
        engine.dispose();
        assert!(!engine.is_ready());
    }
}
