//! Host-persisted manager configuration.
//!
//! The host engine serializes this alongside its scene data; field
//! names are part of the saved-scene format and must stay stable.

use serde::{Deserialize, Serialize};

/// How the lighting manager applies presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingMode {
    /// Apply a single preset directly, no interpolation.
    Switch,
    /// Interpolate between adjacent presets along the blend value.
    #[default]
    Blend,
}

/// Serialized state of a lighting manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub mode: LightingMode,
    /// Blend scalar in `[0, 1]`.
    pub blend_value: f32,
    /// Whether the manager should also run while the host is in its
    /// edit (non-playing) mode.
    pub use_in_edit_mode: bool,
    /// Names of the presets participating in the initial blend, in
    /// blend order.
    pub initial_presets: Vec<String>,
    /// Persisted per-surface participation mask, if one was set.
    pub allowed_surfaces: Option<Vec<bool>>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            mode: LightingMode::Blend,
            blend_value: 0.0,
            use_in_edit_mode: true,
            initial_presets: Vec::new(),
            allowed_surfaces: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let config = ManagerConfig {
            mode: LightingMode::Switch,
            blend_value: 0.35,
            use_in_edit_mode: false,
            initial_presets: vec!["day".into(), "dusk".into(), "night".into()],
            allowed_surfaces: Some(vec![true, false, true]),
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: ManagerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: ManagerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ManagerConfig::default());
        assert_eq!(config.mode, LightingMode::Blend);
        assert!(config.use_in_edit_mode);
    }

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&LightingMode::Switch).unwrap(),
            "\"switch\""
        );
        assert_eq!(
            serde_json::to_string(&LightingMode::Blend).unwrap(),
            "\"blend\""
        );
    }
}
