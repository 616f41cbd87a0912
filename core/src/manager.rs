//! Top-level lighting state holder.
//!
//! Thin orchestration above the transition engine: current mode, the
//! candidate presets, the published blend scalar, and the once-per-tick
//! drive of `update`. Interpolated (or switched) lighting is handed to
//! the host renderer through the [`LightingSink`] boundary.

use std::sync::Arc;

use relight_shared::{BlendError, LightingMode, ManagerConfig};

use crate::preset::{LightmapData, LightmapPreset};
use crate::probes::LightProbes;
use crate::runtime::ResourceReleaser;
use crate::transition::TransitionEngine;

/// Rendering-engine boundary: receives the live lighting state.
///
/// The data is read-only; the sink must not retain the borrows past
/// the call.
pub trait LightingSink {
    fn publish(&mut self, lightmaps: &[LightmapData<'_>], light_probes: Option<&LightProbes>);
}

/// Orchestrates preset switching and blending.
pub struct LightingManager {
    mode: LightingMode,
    initial_presets: Vec<Arc<LightmapPreset>>,
    engine: TransitionEngine,
    blend_value: f32,
    use_in_edit_mode: bool,
}

impl Default for LightingManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LightingManager {
    pub fn new() -> Self {
        Self {
            mode: LightingMode::Blend,
            initial_presets: Vec::new(),
            engine: TransitionEngine::new(),
            blend_value: 0.0,
            use_in_edit_mode: true,
        }
    }

    /// Build a manager whose engine tears down GPU resources through
    /// `releaser`.
    pub fn with_releaser(releaser: Box<dyn ResourceReleaser>) -> Self {
        Self {
            engine: TransitionEngine::with_releaser(releaser),
            ..Self::new()
        }
    }

    pub fn mode(&self) -> LightingMode {
        self.mode
    }

    /// Explicit mode change; never implicit. Publishing follows on the
    /// next tick or switch call.
    pub fn change_mode(&mut self, mode: LightingMode) {
        self.mode = mode;
    }

    pub fn blend_value(&self) -> f32 {
        self.blend_value
    }

    /// Set the published blend scalar, clamped to `[0, 1]`.
    pub fn set_blend_value(&mut self, value: f32) {
        self.blend_value = value.clamp(0.0, 1.0);
    }

    pub fn use_in_edit_mode(&self) -> bool {
        self.use_in_edit_mode
    }

    pub fn set_use_in_edit_mode(&mut self, enabled: bool) {
        self.use_in_edit_mode = enabled;
    }

    /// Candidate presets available for blending or switching.
    pub fn initial_presets(&self) -> &[Arc<LightmapPreset>] {
        &self.initial_presets
    }

    pub fn set_initial_presets(&mut self, presets: Vec<Arc<LightmapPreset>>) {
        self.initial_presets = presets;
    }

    pub fn engine(&self) -> &TransitionEngine {
        &self.engine
    }

    pub fn presets_to_blend_count(&self) -> usize {
        self.engine.presets_to_blend_count()
    }

    pub fn is_able_to_blend(&self) -> bool {
        self.engine.is_ready()
    }

    /// Configure the blend list and immediately warm the runtime
    /// preset up so it never publishes undefined texture contents.
    ///
    /// In Switch mode this is a logged no-op.
    pub fn set_presets_to_blend(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        sink: &mut dyn LightingSink,
        presets: Vec<Arc<LightmapPreset>>,
    ) -> Result<Vec<BlendError>, BlendError> {
        if self.mode == LightingMode::Switch {
            self.log_mode_error("set_presets_to_blend");
            return Ok(Vec::new());
        }

        let mismatches = self.engine.set_presets_to_blend(device, presets)?;

        // The configuration marked the engine dirty, so this update
        // always performs the blend work.
        if self.engine.update(device, queue, self.blend_value) {
            self.publish_runtime(sink);
        }

        Ok(mismatches)
    }

    /// Replace the per-surface participation mask. Logged no-op in
    /// Switch mode.
    pub fn set_allowed_surfaces(&mut self, mask: Vec<bool>) -> Result<(), BlendError> {
        if self.mode == LightingMode::Switch {
            self.log_mode_error("set_allowed_surfaces");
            return Ok(());
        }

        self.engine.set_allowed_surfaces(mask)
    }

    /// Toggle one surface's participation. Logged no-op in Switch mode.
    pub fn set_surface_allowed(&mut self, surface: usize, allowed: bool) {
        if self.mode == LightingMode::Switch {
            self.log_mode_error("set_surface_allowed");
            return;
        }

        self.engine.set_surface_allowed(surface, allowed);
    }

    /// Blend order of the named preset. `None` in Switch mode, when
    /// the engine is not ready, or when the preset is not blended.
    pub fn is_preset_blended(&self, name: &str) -> Option<usize> {
        if self.mode == LightingMode::Switch {
            return None;
        }

        self.engine.is_preset_blended(name)
    }

    /// Directly publish a single preset's lighting. Only valid in
    /// Switch mode; in Blend mode this is a logged no-op returning
    /// `false`.
    pub fn switch_lightmaps(&self, preset: &LightmapPreset, sink: &mut dyn LightingSink) -> bool {
        if self.mode == LightingMode::Blend {
            self.log_mode_error("switch_lightmaps");
            return false;
        }

        sink.publish(&preset.lightmap_data(), preset.light_probes());
        true
    }

    /// Per-frame drive. In Blend mode runs the engine at the current
    /// blend value and republishes only when work was performed;
    /// returns whether a publish happened. In Switch mode this is a
    /// no-op, switching publishes explicitly.
    pub fn tick(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        sink: &mut dyn LightingSink,
    ) -> bool {
        if self.mode != LightingMode::Blend {
            return false;
        }

        if self.engine.update(device, queue, self.blend_value) {
            self.publish_runtime(sink);
            return true;
        }

        false
    }

    /// Release all engine-owned GPU resources. Idempotent.
    pub fn dispose(&mut self) {
        self.engine.dispose();
    }

    /// Snapshot the host-persisted state.
    pub fn to_config(&self) -> ManagerConfig {
        let initial_presets = self
            .initial_presets
            .iter()
            .map(|p| p.name().to_owned())
            .collect();
        let allowed_surfaces = if self.engine.is_ready() {
            Some(self.engine.allowed_surfaces().as_slice().to_vec())
        } else {
            None
        };

        ManagerConfig {
            mode: self.mode,
            blend_value: self.blend_value,
            use_in_edit_mode: self.use_in_edit_mode,
            initial_presets,
            allowed_surfaces,
        }
    }

    /// Restore host-persisted state. Preset names are resolved against
    /// the candidates set via [`set_initial_presets`](Self::set_initial_presets);
    /// unknown names are logged and skipped.
    pub fn apply_config(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        sink: &mut dyn LightingSink,
        config: &ManagerConfig,
    ) -> Result<Vec<BlendError>, BlendError> {
        self.mode = config.mode;
        self.use_in_edit_mode = config.use_in_edit_mode;
        self.set_blend_value(config.blend_value);

        let mut resolved = Vec::with_capacity(config.initial_presets.len());
        for name in &config.initial_presets {
            match self.initial_presets.iter().find(|p| p.name() == name) {
                Some(preset) => resolved.push(Arc::clone(preset)),
                None => tracing::warn!("Unknown preset '{}' in saved configuration", name),
            }
        }

        let mut mismatches = Vec::new();
        if self.mode == LightingMode::Blend && resolved.len() >= 2 {
            mismatches = self.set_presets_to_blend(device, queue, sink, resolved)?;

            if let Some(mask) = &config.allowed_surfaces
                && let Err(error) = self.engine.set_allowed_surfaces(mask.clone())
            {
                tracing::warn!("Saved surface mask rejected: {}", error);
            }
        }

        Ok(mismatches)
    }

    fn publish_runtime(&self, sink: &mut dyn LightingSink) {
        if let Some(runtime) = self.engine.runtime_preset() {
            sink.publish(&runtime.lightmap_data(), runtime.light_probes());
        }
    }

    fn log_mode_error(&self, operation: &str) {
        tracing::warn!(
            "Cannot perform operation ({}) in current mode ({:?})",
            operation,
            self.mode
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        publishes: usize,
        last_surface_count: usize,
        last_had_probes: bool,
    }

    impl LightingSink for RecordingSink {
        fn publish(&mut self, lightmaps: &[LightmapData<'_>], light_probes: Option<&LightProbes>) {
            self.publishes += 1;
            self.last_surface_count = lightmaps.len();
            self.last_had_probes = light_probes.is_some();
        }
    }

    #[test]
    fn test_defaults() {
        let manager = LightingManager::new();
        assert_eq!(manager.mode(), LightingMode::Blend);
        assert_eq!(manager.blend_value(), 0.0);
        assert!(!manager.is_able_to_blend());
        assert_eq!(manager.presets_to_blend_count(), 0);
    }

    #[test]
    fn test_blend_value_clamped() {
        let mut manager = LightingManager::new();
        manager.set_blend_value(1.5);
        assert_eq!(manager.blend_value(), 1.0);
        manager.set_blend_value(-0.25);
        assert_eq!(manager.blend_value(), 0.0);
    }

    #[test]
    fn test_is_preset_blended_safe_defaults() {
        let mut manager = LightingManager::new();
        assert_eq!(manager.is_preset_blended("day"), None);

        manager.change_mode(LightingMode::Switch);
        assert_eq!(manager.is_preset_blended("day"), None);
    }

    #[test]
    fn test_switch_lightmaps_guarded_by_mode() {
        let mut manager = LightingManager::new();
        let preset = LightmapPreset::new("day", Vec::new(), None);
        let mut sink = RecordingSink::default();

        // Blend mode: no-op
        assert!(!manager.switch_lightmaps(&preset, &mut sink));
        assert_eq!(sink.publishes, 0);

        manager.change_mode(LightingMode::Switch);
        assert!(manager.switch_lightmaps(&preset, &mut sink));
        assert_eq!(sink.publishes, 1);
        assert_eq!(sink.last_surface_count, 0);
        assert!(!sink.last_had_probes);
    }

    #[test]
    fn test_mask_calls_guarded_in_switch_mode() {
        let mut manager = LightingManager::new();
        manager.change_mode(LightingMode::Switch);

        // Wrong mode is a logged no-op, not an error
        assert_eq!(manager.set_allowed_surfaces(vec![true, false]), Ok(()));
        manager.set_surface_allowed(0, false);
    }

    #[test]
    fn test_config_snapshot_roundtrip_without_engine() {
        let mut manager = LightingManager::new();
        manager.change_mode(LightingMode::Switch);
        manager.set_blend_value(0.75);
        manager.set_use_in_edit_mode(false);

        let config = manager.to_config();
        assert_eq!(config.mode, LightingMode::Switch);
        assert_eq!(config.blend_value, 0.75);
        assert!(!config.use_in_edit_mode);
        assert!(config.initial_presets.is_empty());
        assert_eq!(config.allowed_surfaces, None);
    }

    #[test]
    fn test_dispose_idempotent() {
        let mut manager = LightingManager::new();
        manager.dispose();
        manager.dispose();
        assert!(!manager.is_able_to_blend());
    }
}
