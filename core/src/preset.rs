//! Baked lightmap presets.
//!
//! A preset is an immutable-at-runtime, named bundle of per-surface
//! lightmap textures (shadow mask, directional, color) plus an
//! optional light probe set. Presets are produced by an external bake
//! or import step; the transition engine only reads them.

use relight_shared::{BlendError, LightmapChannel};
use wgpu::util::DeviceExt;

use crate::probes::LightProbes;

/// Shape of a single channel texture, used for mismatch checks
/// without touching GPU handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelShape {
    pub width: u32,
    pub height: u32,
    pub mip_level_count: u32,
    pub format: wgpu::TextureFormat,
}

impl ChannelShape {
    /// Extent of one mip level; each level halves, clamped at 1.
    pub fn mip_extent(&self, mip: u32) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: (self.width >> mip).max(1),
            height: (self.height >> mip).max(1),
            depth_or_array_layers: 1,
        }
    }
}

/// A texture together with its cached default view.
#[derive(Debug)]
pub struct ChannelTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl ChannelTexture {
    pub fn new(texture: wgpu::Texture) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// A view restricted to a single mip level, for per-mip blend
    /// passes and copies.
    pub fn mip_view(&self, mip: u32) -> wgpu::TextureView {
        self.texture.create_view(&wgpu::TextureViewDescriptor {
            base_mip_level: mip,
            mip_level_count: Some(1),
            ..Default::default()
        })
    }

    pub fn shape(&self) -> ChannelShape {
        ChannelShape {
            width: self.texture.width(),
            height: self.texture.height(),
            mip_level_count: self.texture.mip_level_count(),
            format: self.texture.format(),
        }
    }
}

/// The three optional channel textures of one lightmap surface.
#[derive(Debug, Default)]
pub struct TexturesSet {
    pub shadow_mask: Option<ChannelTexture>,
    pub directional: Option<ChannelTexture>,
    pub color: Option<ChannelTexture>,
}

impl TexturesSet {
    pub fn channel(&self, channel: LightmapChannel) -> Option<&ChannelTexture> {
        match channel {
            LightmapChannel::ShadowMask => self.shadow_mask.as_ref(),
            LightmapChannel::Directional => self.directional.as_ref(),
            LightmapChannel::Color => self.color.as_ref(),
        }
    }

    pub fn set_channel(&mut self, channel: LightmapChannel, texture: Option<ChannelTexture>) {
        match channel {
            LightmapChannel::ShadowMask => self.shadow_mask = texture,
            LightmapChannel::Directional => self.directional = texture,
            LightmapChannel::Color => self.color = texture,
        }
    }

    pub fn shape(&self) -> SurfaceShape {
        let mut channels = [None; LightmapChannel::COUNT];
        for channel in LightmapChannel::ALL {
            channels[channel.slot()] = self.channel(channel).map(ChannelTexture::shape);
        }
        SurfaceShape { channels }
    }
}

/// Per-surface presence/shape pattern, one slot per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceShape {
    pub channels: [Option<ChannelShape>; LightmapChannel::COUNT],
}

impl SurfaceShape {
    pub fn channel(&self, channel: LightmapChannel) -> Option<ChannelShape> {
        self.channels[channel.slot()]
    }
}

/// Published view of one surface's channel textures.
///
/// This is what crosses the rendering-engine boundary; the views are
/// read-only borrows into the owning preset.
#[derive(Debug, Clone, Copy)]
pub struct LightmapData<'a> {
    pub shadow_mask: Option<&'a wgpu::TextureView>,
    pub directional: Option<&'a wgpu::TextureView>,
    pub color: Option<&'a wgpu::TextureView>,
}

/// A named, complete bake of lightmaps plus optional light probes.
#[derive(Debug)]
pub struct LightmapPreset {
    name: String,
    textures_sets: Vec<TexturesSet>,
    light_probes: Option<LightProbes>,
}

impl LightmapPreset {
    pub fn new(
        name: impl Into<String>,
        textures_sets: Vec<TexturesSet>,
        light_probes: Option<LightProbes>,
    ) -> Self {
        Self {
            name: name.into(),
            textures_sets,
            light_probes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn textures_sets(&self) -> &[TexturesSet] {
        &self.textures_sets
    }

    pub fn surface_count(&self) -> usize {
        self.textures_sets.len()
    }

    pub fn light_probes(&self) -> Option<&LightProbes> {
        self.light_probes.as_ref()
    }

    pub(crate) fn set_light_probes(&mut self, probes: Option<LightProbes>) {
        self.light_probes = probes;
    }

    pub(crate) fn textures_sets_mut(&mut self) -> &mut [TexturesSet] {
        &mut self.textures_sets
    }

    /// Per-surface shape pattern, used to check blend compatibility.
    pub fn shape(&self) -> Vec<SurfaceShape> {
        self.textures_sets.iter().map(TexturesSet::shape).collect()
    }

    /// Build the published per-surface data array.
    ///
    /// Constructed on demand; it is a handful of borrows, so there is
    /// nothing worth caching (and nothing to invalidate).
    pub fn lightmap_data(&self) -> Vec<LightmapData<'_>> {
        self.textures_sets
            .iter()
            .map(|set| LightmapData {
                shadow_mask: set.shadow_mask.as_ref().map(ChannelTexture::view),
                directional: set.directional.as_ref().map(ChannelTexture::view),
                color: set.color.as_ref().map(ChannelTexture::view),
            })
            .collect()
    }
}

/// Assembles a [`LightmapPreset`] from decoded pixel data.
///
/// Directory scanning and filename classification stay outside the
/// engine; this builder starts where that tooling ends, with decoded
/// channel images per surface index.
pub struct PresetBuilder {
    name: String,
    sets: Vec<TexturesSet>,
    light_probes: Option<LightProbes>,
}

impl PresetBuilder {
    pub fn new(name: impl Into<String>, surface_count: usize) -> Self {
        let mut sets = Vec::with_capacity(surface_count);
        sets.resize_with(surface_count, TexturesSet::default);
        Self {
            name: name.into(),
            sets,
            light_probes: None,
        }
    }

    pub fn light_probes(mut self, probes: LightProbes) -> Self {
        self.light_probes = Some(probes);
        self
    }

    /// Attach an already-created texture to a channel slot.
    pub fn channel_texture(
        mut self,
        surface: usize,
        channel: LightmapChannel,
        texture: ChannelTexture,
    ) -> Self {
        if let Some(set) = self.sets.get_mut(surface) {
            set.set_channel(channel, Some(texture));
        }
        self
    }

    /// Upload RGBA8 pixel data into a channel slot.
    pub fn channel_rgba8(
        self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface: usize,
        channel: LightmapChannel,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Self, BlendError> {
        let expected = (width as usize) * (height as usize) * 4;
        if pixels.len() != expected {
            return Err(BlendError::PixelData {
                expected,
                actual: pixels.len(),
            });
        }

        let label = format!("{} surface {} {}", self.name, surface, channel);
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(&label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            pixels,
        );

        tracing::debug!(
            "Uploaded {} channel for preset '{}' surface {}: {}x{}",
            channel,
            self.name,
            surface,
            width,
            height
        );

        Ok(self.channel_texture(surface, channel, ChannelTexture::new(texture)))
    }

    pub fn build(self) -> LightmapPreset {
        LightmapPreset::new(self.name, self.sets, self.light_probes)
    }
}
