//! CPU-side light probe sets.
//!
//! A probe stores L2 spherical harmonics (9 RGB coefficients) sampled
//! at a world position. Probe sets ride along with a preset and are
//! interpolated on the CPU; they are tiny compared to the lightmap
//! textures.

use glam::Vec3;

/// A single baked light probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightProbe {
    pub position: Vec3,
    /// L2 SH coefficients, one RGB triple per basis function.
    pub coefficients: [Vec3; 9],
}

/// An ordered set of baked light probes belonging to one preset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightProbes {
    probes: Vec<LightProbe>,
}

impl LightProbes {
    pub fn new(probes: Vec<LightProbe>) -> Self {
        Self { probes }
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn probes(&self) -> &[LightProbe] {
        &self.probes
    }

    /// Linearly interpolate two probe sets.
    ///
    /// Returns `None` when the sets have different probe counts; the
    /// caller falls back to passing one set through unchanged.
    pub fn lerp(a: &Self, b: &Self, t: f32) -> Option<Self> {
        if a.len() != b.len() {
            return None;
        }

        let probes = a
            .probes
            .iter()
            .zip(&b.probes)
            .map(|(pa, pb)| {
                let mut coefficients = [Vec3::ZERO; 9];
                for (slot, (ca, cb)) in coefficients
                    .iter_mut()
                    .zip(pa.coefficients.iter().zip(&pb.coefficients))
                {
                    *slot = ca.lerp(*cb, t);
                }
                LightProbe {
                    position: pa.position.lerp(pb.position, t),
                    coefficients,
                }
            })
            .collect();

        Some(Self { probes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(value: f32) -> LightProbe {
        LightProbe {
            position: Vec3::splat(value),
            coefficients: [Vec3::splat(value); 9],
        }
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = LightProbes::new(vec![probe(0.0), probe(1.0)]);
        let b = LightProbes::new(vec![probe(2.0), probe(3.0)]);

        assert_eq!(LightProbes::lerp(&a, &b, 0.0).unwrap(), a);
        assert_eq!(LightProbes::lerp(&a, &b, 1.0).unwrap(), b);
    }

    #[test]
    fn test_lerp_midpoint() {
        let a = LightProbes::new(vec![probe(0.0)]);
        let b = LightProbes::new(vec![probe(2.0)]);

        let mid = LightProbes::lerp(&a, &b, 0.5).unwrap();
        assert_eq!(mid.probes()[0].position, Vec3::splat(1.0));
        assert_eq!(mid.probes()[0].coefficients[4], Vec3::splat(1.0));
    }

    #[test]
    fn test_lerp_count_mismatch() {
        let a = LightProbes::new(vec![probe(0.0)]);
        let b = LightProbes::new(vec![probe(0.0), probe(1.0)]);
        assert_eq!(LightProbes::lerp(&a, &b, 0.5), None);
    }
}
