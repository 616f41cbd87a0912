//! Blend-value parameterization across an ordered preset sequence.
//!
//! A blend value in `[0, 1]` spans the whole sequence of N presets as
//! N-1 equal-width segments. Selecting a segment yields the two
//! bounding preset indices and the position inside that segment,
//! renormalized back to `[0, 1]`.

/// Tolerance used when deciding whether a blend value actually changed.
pub const BLEND_EPSILON: f32 = 1e-5;

/// Whether two blend values are close enough to be treated as equal.
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() <= BLEND_EPSILON
}

/// A pair of adjacent presets bounding the current blend value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendSegment {
    /// Index of the lower bounding preset.
    pub index_a: usize,
    /// Index of the upper bounding preset, always `index_a + 1`.
    pub index_b: usize,
    /// Position inside the segment, renormalized to `[0, 1]`.
    pub local_t: f32,
}

impl BlendSegment {
    /// Select the segment for `blend_value` in a sequence of
    /// `preset_count` presets.
    ///
    /// Returns `None` when there are fewer than two presets; a single
    /// preset has no segment to interpolate within. The blend value is
    /// clamped to `[0, 1]` before selection.
    pub fn select(blend_value: f32, preset_count: usize) -> Option<Self> {
        if preset_count < 2 {
            return None;
        }

        let value = blend_value.clamp(0.0, 1.0);
        let step = 1.0 / (preset_count - 1) as f32;
        let index_a = ((value / step) as usize).min(preset_count - 2);
        let local_t = ((value - index_a as f32 * step) / step).clamp(0.0, 1.0);

        Some(Self {
            index_a,
            index_b: index_a + 1,
            local_t,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_selects_first_segment() {
        for count in 2..8 {
            let segment = BlendSegment::select(0.0, count).unwrap();
            assert_eq!(segment.index_a, 0);
            assert_eq!(segment.index_b, 1);
            assert_eq!(segment.local_t, 0.0);
        }
    }

    #[test]
    fn test_one_selects_last_segment() {
        for count in 2..8 {
            let segment = BlendSegment::select(1.0, count).unwrap();
            assert_eq!(segment.index_a, count - 2);
            assert_eq!(segment.index_b, count - 1);
            assert_eq!(segment.local_t, 1.0);
        }
    }

    #[test]
    fn test_two_presets_midpoint() {
        let segment = BlendSegment::select(0.5, 2).unwrap();
        assert_eq!(segment.index_a, 0);
        assert_eq!(segment.index_b, 1);
        assert!((segment.local_t - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_three_presets_first_half() {
        // step = 0.5, so 0.25 lands halfway into segment (0, 1)
        let segment = BlendSegment::select(0.25, 3).unwrap();
        assert_eq!(segment.index_a, 0);
        assert_eq!(segment.index_b, 1);
        assert!((segment.local_t - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_three_presets_second_half() {
        // 0.75 lands halfway into segment (1, 2)
        let segment = BlendSegment::select(0.75, 3).unwrap();
        assert_eq!(segment.index_a, 1);
        assert_eq!(segment.index_b, 2);
        assert!((segment.local_t - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_segment_indices_always_in_range() {
        for count in 2..10 {
            for i in 0..=1000 {
                let value = i as f32 / 1000.0;
                let segment = BlendSegment::select(value, count).unwrap();
                assert!(segment.index_a <= count - 2);
                assert_eq!(segment.index_b, segment.index_a + 1);
                assert!((0.0..=1.0).contains(&segment.local_t));
            }
        }
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let below = BlendSegment::select(-0.5, 4).unwrap();
        assert_eq!(below.index_a, 0);
        assert_eq!(below.local_t, 0.0);

        let above = BlendSegment::select(1.5, 4).unwrap();
        assert_eq!(above.index_a, 2);
        assert_eq!(above.local_t, 1.0);
    }

    #[test]
    fn test_too_few_presets() {
        assert_eq!(BlendSegment::select(0.5, 0), None);
        assert_eq!(BlendSegment::select(0.5, 1), None);
    }

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(0.5, 0.5));
        assert!(approx_eq(0.5, 0.5 + BLEND_EPSILON * 0.5));
        assert!(!approx_eq(0.5, 0.5002));
        assert!(!approx_eq(0.0, 1.0));
    }
}
