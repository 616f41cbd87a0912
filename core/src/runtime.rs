//! Runtime preset factory and resource teardown.
//!
//! The runtime preset is the single live preset whose textures are
//! overwritten each update and published to the renderer. It is shaped
//! after a mockup preset: same surface count, same per-channel
//! presence pattern, same sizes, mips, and formats.

use relight_shared::{BlendError, LightmapChannel};

use crate::preset::{ChannelTexture, LightmapPreset, TexturesSet};

/// Injected teardown capability.
///
/// The engine calls this uniformly for every GPU texture it owns; the
/// host decides whether release is immediate or deferred (for example
/// until in-flight frames retire).
pub trait ResourceReleaser {
    fn release_texture(&self, texture: &wgpu::Texture);
}

/// Default releaser: destroys textures on the spot.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateReleaser;

impl ResourceReleaser for ImmediateReleaser {
    fn release_texture(&self, texture: &wgpu::Texture) {
        texture.destroy();
    }
}

/// The live, GPU-writable preset the renderer actually consumes.
///
/// Exclusively owned by the transition engine; nothing else may write
/// to or release these textures.
#[derive(Debug)]
pub struct RuntimePreset {
    preset: LightmapPreset,
    released: bool,
}

impl RuntimePreset {
    /// Allocate a runtime preset matching `mockup`'s shape.
    ///
    /// Texture contents start undefined; the engine always blends into
    /// them before the first publish. Fails with `InvalidMockup` when
    /// the mockup has no texture sets.
    pub fn new(device: &wgpu::Device, mockup: &LightmapPreset) -> Result<Self, BlendError> {
        if mockup.surface_count() == 0 {
            return Err(BlendError::InvalidMockup(format!(
                "preset '{}' has no texture sets",
                mockup.name()
            )));
        }

        let mut sets = Vec::with_capacity(mockup.surface_count());
        for (surface, mockup_set) in mockup.textures_sets().iter().enumerate() {
            let mut set = TexturesSet::default();
            for channel in LightmapChannel::ALL {
                let runtime = mockup_set
                    .channel(channel)
                    .map(|source| create_runtime_texture(device, source, surface, channel));
                set.set_channel(channel, runtime);
            }
            sets.push(set);
        }

        tracing::debug!(
            "Allocated runtime preset from mockup '{}': {} surfaces",
            mockup.name(),
            mockup.surface_count()
        );

        let mut preset = LightmapPreset::new(format!("{} (runtime)", mockup.name()), sets, None);
        preset.set_light_probes(mockup.light_probes().cloned());

        Ok(Self {
            preset,
            released: false,
        })
    }

    pub fn preset(&self) -> &LightmapPreset {
        &self.preset
    }

    pub fn surface_count(&self) -> usize {
        self.preset.surface_count()
    }

    pub fn channel(&self, surface: usize, channel: LightmapChannel) -> Option<&ChannelTexture> {
        self.preset.textures_sets().get(surface)?.channel(channel)
    }

    pub(crate) fn set_light_probes(&mut self, probes: Option<crate::probes::LightProbes>) {
        self.preset.set_light_probes(probes);
    }

    /// Release every texture through the injected capability.
    /// Idempotent.
    pub fn release(&mut self, releaser: &dyn ResourceReleaser) {
        if self.released {
            return;
        }

        for set in self.preset.textures_sets_mut() {
            for channel in LightmapChannel::ALL {
                if let Some(texture) = set.channel(channel) {
                    releaser.release_texture(texture.texture());
                }
                set.set_channel(channel, None);
            }
        }
        self.released = true;
    }
}

/// Allocate one mutable runtime texture mirroring `source`'s shape.
fn create_runtime_texture(
    device: &wgpu::Device,
    source: &ChannelTexture,
    surface: usize,
    channel: LightmapChannel,
) -> ChannelTexture {
    let shape = source.shape();
    let label = format!("runtime {} surface {}", channel, surface);
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
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    ChannelTexture::new(texture)
}
