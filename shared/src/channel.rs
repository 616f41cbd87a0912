//! Lightmap channel enumeration and per-surface participation masks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BlendError;

/// One of the three texture channels a baked lightmap surface can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightmapChannel {
    /// Per-light occlusion mask for mixed-mode lights.
    ShadowMask,
    /// Dominant light direction encoding.
    Directional,
    /// Baked color/intensity contribution.
    Color,
}

impl LightmapChannel {
    /// All channels, in the order texture sets store them.
    pub const ALL: [LightmapChannel; 3] = [
        LightmapChannel::ShadowMask,
        LightmapChannel::Directional,
        LightmapChannel::Color,
    ];

    /// Number of channels per surface.
    pub const COUNT: usize = 3;

    /// Stable slot index of this channel within a texture set.
    pub fn slot(self) -> usize {
        match self {
            LightmapChannel::ShadowMask => 0,
            LightmapChannel::Directional => 1,
            LightmapChannel::Color => 2,
        }
    }

    /// Human-readable name for logs and error messages.
    pub fn label(self) -> &'static str {
        match self {
            LightmapChannel::ShadowMask => "shadow mask",
            LightmapChannel::Directional => "directional",
            LightmapChannel::Color => "color",
        }
    }
}

impl fmt::Display for LightmapChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-surface participation mask.
///
/// One entry per lightmap surface index; surfaces whose entry is
/// `false` are left untouched by the transition engine. The mask is
/// sized to the surface count when the runtime preset is allocated and
/// can only be replaced wholesale by a mask of the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceMask {
    allowed: Vec<bool>,
}

impl SurfaceMask {
    /// A mask allowing every surface in `0..surface_count`.
    pub fn all_allowed(surface_count: usize) -> Self {
        Self {
            allowed: vec![true; surface_count],
        }
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Whether the surface at `index` participates in blending.
    /// Out-of-range indices are treated as not allowed.
    pub fn is_allowed(&self, index: usize) -> bool {
        self.allowed.get(index).copied().unwrap_or(false)
    }

    /// Set a single surface's participation. Out-of-range indices are
    /// ignored.
    pub fn set_allowed(&mut self, index: usize, allowed: bool) {
        if let Some(slot) = self.allowed.get_mut(index) {
            *slot = allowed;
        }
    }

    /// Replace the whole mask. Fails without mutating when the new
    /// mask's length does not match the current surface count.
    pub fn replace(&mut self, mask: Vec<bool>) -> Result<(), BlendError> {
        if mask.len() != self.allowed.len() {
            return Err(BlendError::MaskSize {
                expected: self.allowed.len(),
                actual: mask.len(),
            });
        }

        self.allowed = mask;
        Ok(())
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_allowed() {
        let mask = SurfaceMask::all_allowed(3);
        assert_eq!(mask.len(), 3);
        assert!(mask.is_allowed(0));
        assert!(mask.is_allowed(2));
        assert!(!mask.is_allowed(3));
    }

    #[test]
    fn test_set_allowed() {
        let mut mask = SurfaceMask::all_allowed(2);
        mask.set_allowed(1, false);
        assert!(mask.is_allowed(0));
        assert!(!mask.is_allowed(1));

        // Out-of-range writes are ignored
        mask.set_allowed(5, true);
        assert_eq!(mask.len(), 2);
    }

    #[test]
    fn test_replace_checks_length() {
        let mut mask = SurfaceMask::all_allowed(3);
        let result = mask.replace(vec![false, true]);
        assert_eq!(
            result,
            Err(BlendError::MaskSize {
                expected: 3,
                actual: 2
            })
        );
        // No partial mutation
        assert!(mask.is_allowed(0));

        mask.replace(vec![false, true, false]).unwrap();
        assert!(!mask.is_allowed(0));
        assert!(mask.is_allowed(1));
        assert!(!mask.is_allowed(2));
    }

    #[test]
    fn test_channel_slots_match_order() {
        for (i, channel) in LightmapChannel::ALL.iter().enumerate() {
            assert_eq!(channel.slot(), i);
        }
    }
}
