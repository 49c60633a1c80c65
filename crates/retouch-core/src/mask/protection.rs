//! Highlight and shadow protection masks.
//!
//! Each mask is a linear luminance ramp starting at `threshold` and reaching
//! full weight `range` further into the protected zone, scaled by `strength`.

use serde::{Deserialize, Serialize};

use crate::blend::BlendMode;
use crate::buffer::FloatImage;
use crate::luminance::luminance_map;

/// Guard added to the ramp width so a zero range does not divide by zero.
const RANGE_EPSILON: f32 = 1e-7;

/// Settings for one protected tonal zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtectionConfig {
    /// When false the zone's mask is zero everywhere.
    pub enabled: bool,
    /// Luminance where the ramp starts.
    pub threshold: f32,
    /// Luminance distance over which the ramp reaches full weight.
    pub range: f32,
    /// Peak weight of the mask.
    pub strength: f32,
    /// Blend mode used inside the zone.
    pub blend_mode: BlendMode,
}

impl ProtectionConfig {
    /// Highlight defaults: ramp from 0.7 up to 0.9, soft light.
    pub fn highlights() -> Self {
        Self {
            enabled: true,
            threshold: 0.7,
            range: 0.2,
            strength: 0.5,
            blend_mode: BlendMode::SoftLight,
        }
    }

    /// Shadow defaults: ramp from 0.3 down to 0.1, multiply.
    pub fn shadows() -> Self {
        Self {
            enabled: true,
            threshold: 0.3,
            range: 0.2,
            strength: 0.5,
            blend_mode: BlendMode::Multiply,
        }
    }

    /// The same settings with protection switched off.
    pub fn disabled(self) -> Self {
        Self {
            enabled: false,
            ..self
        }
    }

    /// Highlight weight for a luminance value.
    #[inline]
    pub fn highlight_weight(&self, lum: f32) -> f32 {
        if !self.enabled || lum <= self.threshold {
            return 0.0;
        }
        let ramp = ((lum - self.threshold) / (self.range + RANGE_EPSILON)).clamp(0.0, 1.0);
        (ramp * self.strength).clamp(0.0, 1.0)
    }

    /// Shadow weight for a luminance value.
    #[inline]
    pub fn shadow_weight(&self, lum: f32) -> f32 {
        if !self.enabled || lum >= self.threshold {
            return 0.0;
        }
        let ramp = ((self.threshold - lum) / (self.range + RANGE_EPSILON)).clamp(0.0, 1.0);
        (ramp * self.strength).clamp(0.0, 1.0)
    }
}

/// Single-channel highlight and shadow weights for a background.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtectionMasks {
    pub highlight: FloatImage,
    pub shadow: FloatImage,
}

impl ProtectionMasks {
    /// Compute both masks from the background's luminance.
    ///
    /// Each mask is its own clamped ramp. Overlapping zones may sum past 1;
    /// only [`ProtectionMasks::mid_weight`] caps the total.
    pub fn compute(
        background: &FloatImage,
        highlights: &ProtectionConfig,
        shadows: &ProtectionConfig,
    ) -> Self {
        let lum = luminance_map(background);
        let mut highlight = FloatImage::zeros(lum.width, lum.height, 1);
        let mut shadow = FloatImage::zeros(lum.width, lum.height, 1);

        for ((&l, h), s) in lum
            .data
            .iter()
            .zip(highlight.data.iter_mut())
            .zip(shadow.data.iter_mut())
        {
            *h = highlights.highlight_weight(l);
            *s = shadows.shadow_weight(l);
        }

        Self { highlight, shadow }
    }

    /// Weight left for the mid-tone blend at sample index `i`, zero where
    /// the zones together cover the pixel.
    #[inline]
    pub fn mid_weight(&self, i: usize) -> f32 {
        1.0 - (self.highlight.data[i] + self.shadow.data[i]).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn gray(v: f32) -> FloatImage {
        FloatImage::filled(2, 2, &[v, v, v])
    }

    #[test]
    fn test_highlight_ramp() {
        let cfg = ProtectionConfig {
            strength: 1.0,
            ..ProtectionConfig::highlights()
        };
        assert_eq!(cfg.highlight_weight(0.5), 0.0);
        assert_eq!(cfg.highlight_weight(0.7), 0.0);
        assert_abs_diff_eq!(cfg.highlight_weight(0.8), 0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(cfg.highlight_weight(0.95), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_shadow_ramp() {
        let cfg = ProtectionConfig::shadows();
        assert_eq!(cfg.shadow_weight(0.3), 0.0);
        assert_eq!(cfg.shadow_weight(0.8), 0.0);
        // halfway down the ramp, scaled by strength 0.5
        assert_abs_diff_eq!(cfg.shadow_weight(0.2), 0.25, epsilon = 1e-5);
        assert_abs_diff_eq!(cfg.shadow_weight(0.0), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_range_is_a_step() {
        let cfg = ProtectionConfig {
            range: 0.0,
            strength: 1.0,
            ..ProtectionConfig::highlights()
        };
        assert_eq!(cfg.highlight_weight(0.71), 1.0);
        assert_eq!(cfg.highlight_weight(0.7), 0.0);
    }

    #[test]
    fn test_disabled_masks_are_zero() {
        let hl = ProtectionConfig::highlights().disabled();
        let sh = ProtectionConfig::shadows().disabled();
        for v in [0.0, 0.2, 0.5, 0.9, 1.0] {
            let masks = ProtectionMasks::compute(&gray(v), &hl, &sh);
            assert!(masks.highlight.data.iter().all(|&m| m == 0.0));
            assert!(masks.shadow.data.iter().all(|&m| m == 0.0));
            assert_eq!(masks.mid_weight(0), 1.0);
        }
    }

    #[test]
    fn test_masks_are_single_channel() {
        let masks = ProtectionMasks::compute(
            &gray(0.95),
            &ProtectionConfig::highlights(),
            &ProtectionConfig::shadows(),
        );
        assert_eq!(masks.highlight.channels, 1);
        assert_eq!(masks.highlight.dimensions(), (2, 2));
        assert_abs_diff_eq!(masks.highlight.data[0], 0.5, epsilon = 1e-5);
        assert_eq!(masks.shadow.data[0], 0.0);
        assert_abs_diff_eq!(masks.mid_weight(0), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_overlapping_masks_keep_full_weight() {
        // Highlight ramp starts below the shadow threshold so both fire.
        let hl = ProtectionConfig {
            threshold: 0.1,
            range: 0.1,
            strength: 1.0,
            ..ProtectionConfig::highlights()
        };
        let sh = ProtectionConfig {
            threshold: 0.9,
            range: 0.1,
            strength: 1.0,
            ..ProtectionConfig::shadows()
        };
        let masks = ProtectionMasks::compute(&gray(0.5), &hl, &sh);
        assert_eq!(masks.highlight.data[0], 1.0);
        assert_eq!(masks.shadow.data[0], 1.0);
        assert_eq!(masks.mid_weight(0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_mask_weights_in_unit_range(
            lum in 0.0f32..=1.0,
            ht in 0.0f32..=1.0, hr in 0.0f32..=1.0, hs in 0.0f32..=1.0,
            st in 0.0f32..=1.0, sr in 0.0f32..=1.0, ss in 0.0f32..=1.0,
        ) {
            let hl = ProtectionConfig { threshold: ht, range: hr, strength: hs, ..ProtectionConfig::highlights() };
            let sh = ProtectionConfig { threshold: st, range: sr, strength: ss, ..ProtectionConfig::shadows() };
            let masks = ProtectionMasks::compute(&gray(lum), &hl, &sh);
            let h = masks.highlight.data[0];
            let s = masks.shadow.data[0];
            prop_assert!((0.0..=1.0).contains(&h));
            prop_assert!((0.0..=1.0).contains(&s));
            let mid = masks.mid_weight(0);
            prop_assert!((0.0..=1.0).contains(&mid));
            prop_assert!(mid + h + s >= 1.0 - 1e-6);
        }
    }
}
