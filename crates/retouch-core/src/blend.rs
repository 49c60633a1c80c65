//! Photoshop-style blend modes.
//!
//! Every mode is a pure per-channel operator `blend(b, f)` over background
//! `b` and foreground `f` samples in `[0, 1]`. Opacity then interpolates the
//! blended value back toward the background:
//! `result = blended * opacity + b * (1 - opacity)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::buffer::FloatImage;
use crate::error::ParamError;
use crate::parallel::for_each_row;

/// Guard added to the dodge/burn denominators.
const EPSILON: f32 = 1e-7;

// ============================================================================
// Blend Mode
// ============================================================================

/// Blend mode applied between a background and a foreground layer.
///
/// Payloads name modes in snake_case; an unknown name deserializes as
/// [`BlendMode::Normal`] instead of failing the enclosing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum BlendMode {
    /// Foreground replaces background.
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    SoftLight,
    HardLight,
    ColorDodge,
    ColorBurn,
    Darken,
    Lighten,
    Difference,
    Exclusion,
    LinearBurn,
    LinearDodge,
    VividLight,
    LinearLight,
    PinLight,
    /// Overlay posterized to 0 or 1.
    HardMix,
}

impl BlendMode {
    /// All modes, in the order the blend-mode selector lists them.
    pub const ALL: [BlendMode; 18] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::SoftLight,
        BlendMode::HardLight,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::LinearBurn,
        BlendMode::LinearDodge,
        BlendMode::VividLight,
        BlendMode::LinearLight,
        BlendMode::PinLight,
        BlendMode::HardMix,
    ];

    /// The snake_case name used in parameter payloads.
    pub fn name(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::SoftLight => "soft_light",
            BlendMode::HardLight => "hard_light",
            BlendMode::ColorDodge => "color_dodge",
            BlendMode::ColorBurn => "color_burn",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
            BlendMode::LinearBurn => "linear_burn",
            BlendMode::LinearDodge => "linear_dodge",
            BlendMode::VividLight => "vivid_light",
            BlendMode::LinearLight => "linear_light",
            BlendMode::PinLight => "pin_light",
            BlendMode::HardMix => "hard_mix",
        }
    }

    /// Parse a mode name, treating unknown names as [`BlendMode::Normal`].
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|err: ParamError| {
            tracing::warn!(%err, "falling back to normal blend mode");
            BlendMode::Normal
        })
    }

    /// Blend one background sample with one foreground sample.
    #[inline]
    pub fn blend(self, b: f32, f: f32) -> f32 {
        match self {
            BlendMode::Normal => f,
            BlendMode::Multiply => b * f,
            BlendMode::Screen => 1.0 - (1.0 - b) * (1.0 - f),
            BlendMode::Overlay => overlay(b, f),
            BlendMode::SoftLight => {
                if f < 0.5 {
                    2.0 * b * f + b * b * (1.0 - 2.0 * f)
                } else {
                    b.max(0.0).sqrt() * (2.0 * f - 1.0) + 2.0 * b * (1.0 - f)
                }
            }
            BlendMode::HardLight => {
                if f < 0.5 {
                    2.0 * b * f
                } else {
                    1.0 - 2.0 * (1.0 - b) * (1.0 - f)
                }
            }
            BlendMode::ColorDodge => color_dodge(b, f),
            BlendMode::ColorBurn => color_burn(b, f),
            BlendMode::Darken => b.min(f),
            BlendMode::Lighten => b.max(f),
            BlendMode::Difference => (b - f).abs(),
            BlendMode::Exclusion => b + f - 2.0 * b * f,
            BlendMode::LinearBurn => (b + f - 1.0).clamp(0.0, 1.0),
            BlendMode::LinearDodge => (b + f).clamp(0.0, 1.0),
            BlendMode::VividLight => {
                if f < 0.5 {
                    color_burn(b, f)
                } else {
                    color_dodge(b, f)
                }
            }
            BlendMode::LinearLight => (b + 2.0 * f - 1.0).clamp(0.0, 1.0),
            BlendMode::PinLight => {
                if f < 0.5 {
                    b.min(2.0 * f)
                } else {
                    b.max(2.0 * (f - 0.5))
                }
            }
            BlendMode::HardMix => {
                if overlay(b, f) < 0.5 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    /// Blend, then interpolate toward the background by `opacity`.
    #[inline]
    pub fn blend_with_opacity(self, b: f32, f: f32, opacity: f32) -> f32 {
        self.blend(b, f) * opacity + b * (1.0 - opacity)
    }
}

#[inline]
fn overlay(b: f32, f: f32) -> f32 {
    if b < 0.5 {
        2.0 * b * f
    } else {
        1.0 - 2.0 * (1.0 - b) * (1.0 - f)
    }
}

#[inline]
fn color_dodge(b: f32, f: f32) -> f32 {
    if f >= 1.0 {
        1.0
    } else {
        (b / (1.0 - f + EPSILON)).clamp(0.0, 1.0)
    }
}

#[inline]
fn color_burn(b: f32, f: f32) -> f32 {
    if f <= 0.0 {
        0.0
    } else {
        (1.0 - (1.0 - b) / (f + EPSILON)).clamp(0.0, 1.0)
    }
}

impl FromStr for BlendMode {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        BlendMode::ALL
            .into_iter()
            .find(|mode| mode.name() == name)
            .ok_or_else(|| ParamError::UnknownBlendMode(s.to_string()))
    }
}

impl From<String> for BlendMode {
    fn from(name: String) -> Self {
        BlendMode::from_name_or_default(&name)
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Blend Spec
// ============================================================================

/// A blend mode paired with an opacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendSpec {
    pub mode: BlendMode,
    /// Opacity in `[0, 1]`; out-of-range values are clamped on use.
    pub opacity: f32,
}

impl Default for BlendSpec {
    fn default() -> Self {
        Self {
            mode: BlendMode::Normal,
            opacity: 1.0,
        }
    }
}

impl BlendSpec {
    pub fn new(mode: BlendMode, opacity: f32) -> Self {
        Self { mode, opacity }
    }

    /// Opacity clamped to `[0, 1]` (NaN counts as fully opaque).
    pub fn effective_opacity(&self) -> f32 {
        if self.opacity.is_nan() {
            1.0
        } else {
            self.opacity.clamp(0.0, 1.0)
        }
    }

    /// Blend one sample pair with this spec's mode and opacity.
    #[inline]
    pub fn apply(&self, b: f32, f: f32) -> f32 {
        self.mode.blend_with_opacity(b, f, self.effective_opacity())
    }
}

/// Blend `foreground` over `background` sample by sample.
///
/// Both images must share dimensions and channel layout. The output takes
/// the background's layout; alpha, when present, is kept from the
/// background.
pub fn blend_images(background: &FloatImage, foreground: &FloatImage, spec: BlendSpec) -> FloatImage {
    debug_assert_eq!(background.dimensions(), foreground.dimensions());
    debug_assert_eq!(background.channels, foreground.channels);

    let mut output = background.clone();
    let channels = output.channels;
    let colors = output.color_channels();
    let row_len = output.row_len();
    let fg = &foreground.data;

    for_each_row(&mut output.data, row_len, |y, row| {
        let fg_row = &fg[y * row_len..(y + 1) * row_len];
        for (px, fg_px) in row
            .chunks_exact_mut(channels)
            .zip(fg_row.chunks_exact(channels))
        {
            for (b, &f) in px[..colors].iter_mut().zip(&fg_px[..colors]) {
                *b = spec.apply(*b, f);
            }
        }
    });

    output
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_mode_names_round_trip() {
        for mode in BlendMode::ALL {
            assert_eq!(mode.name().parse::<BlendMode>().unwrap(), mode);
        }
        assert_eq!("Soft_Light".parse::<BlendMode>().unwrap(), BlendMode::SoftLight);
    }

    #[test]
    fn test_unknown_mode_falls_back_to_normal() {
        assert!("glow".parse::<BlendMode>().is_err());
        assert_eq!(BlendMode::from_name_or_default("glow"), BlendMode::Normal);
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&BlendMode::LinearDodge).unwrap();
        assert_eq!(json, "\"linear_dodge\"");
        let spec: BlendSpec = serde_json::from_str(r#"{"mode": "hard_mix"}"#).unwrap();
        assert_eq!(spec.mode, BlendMode::HardMix);
        assert_eq!(spec.opacity, 1.0);
    }

    #[test]
    fn test_unknown_mode_in_payload_keeps_other_fields() {
        let spec: BlendSpec = serde_json::from_str(r#"{"mode": "glow", "opacity": 0.25}"#).unwrap();
        assert_eq!(spec.mode, BlendMode::Normal);
        assert_eq!(spec.opacity, 0.25);
    }

    #[test]
    fn test_basic_formulas() {
        assert_abs_diff_eq!(BlendMode::Multiply.blend(0.5, 0.5), 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(BlendMode::Screen.blend(0.5, 0.5), 0.75, epsilon = 1e-6);
        assert_abs_diff_eq!(BlendMode::Overlay.blend(0.25, 0.5), 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(BlendMode::Overlay.blend(0.75, 0.5), 0.75, epsilon = 1e-6);
        assert_abs_diff_eq!(BlendMode::Difference.blend(0.2, 0.7), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(BlendMode::Exclusion.blend(0.5, 0.5), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(BlendMode::LinearBurn.blend(0.3, 0.3), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(BlendMode::LinearDodge.blend(0.7, 0.7), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(BlendMode::LinearLight.blend(0.5, 0.5), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_soft_light_neutral_at_half() {
        for b in [0.0f32, 0.2, 0.5, 0.9, 1.0] {
            assert_abs_diff_eq!(BlendMode::SoftLight.blend(b, 0.5), b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_dodge_and_burn_guards() {
        assert_eq!(BlendMode::ColorDodge.blend(0.3, 1.0), 1.0);
        assert_eq!(BlendMode::ColorBurn.blend(0.3, 0.0), 0.0);
        assert_abs_diff_eq!(BlendMode::ColorDodge.blend(0.25, 0.5), 0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(BlendMode::ColorBurn.blend(0.75, 0.5), 0.5, epsilon = 1e-5);
        assert!(BlendMode::ColorDodge.blend(0.5, 0.9999999).is_finite());
    }

    #[test]
    fn test_vivid_light_switches_at_half() {
        assert_eq!(BlendMode::VividLight.blend(0.4, 0.0), 0.0);
        assert_eq!(BlendMode::VividLight.blend(0.4, 1.0), 1.0);
    }

    #[test]
    fn test_pin_light() {
        assert_abs_diff_eq!(BlendMode::PinLight.blend(0.8, 0.2), 0.4, epsilon = 1e-6);
        assert_abs_diff_eq!(BlendMode::PinLight.blend(0.2, 0.8), 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_hard_mix_is_binary() {
        assert_eq!(BlendMode::HardMix.blend(0.2, 0.2), 0.0);
        assert_eq!(BlendMode::HardMix.blend(0.8, 0.8), 1.0);
    }

    #[test]
    fn test_opacity_interpolates() {
        let spec = BlendSpec::new(BlendMode::Normal, 0.25);
        assert_abs_diff_eq!(spec.apply(0.0, 1.0), 0.25);
        let transparent = BlendSpec::new(BlendMode::Multiply, 0.0);
        assert_abs_diff_eq!(transparent.apply(0.6, 0.1), 0.6);
    }

    #[test]
    fn test_opacity_clamped() {
        assert_eq!(BlendSpec::new(BlendMode::Normal, 3.0).effective_opacity(), 1.0);
        assert_eq!(BlendSpec::new(BlendMode::Normal, -1.0).effective_opacity(), 0.0);
        assert_eq!(BlendSpec::new(BlendMode::Normal, f32::NAN).effective_opacity(), 1.0);
    }

    #[test]
    fn test_blend_images_keeps_background_alpha() {
        let bg = FloatImage::filled(2, 2, &[0.5, 0.5, 0.5, 0.4]);
        let fg = FloatImage::filled(2, 2, &[1.0, 0.5, 0.0, 1.0]);
        let out = blend_images(&bg, &fg, BlendSpec::new(BlendMode::Multiply, 1.0));
        assert_eq!(out.pixel(1, 1), &[0.5, 0.25, 0.0, 0.4]);
    }

    proptest! {
        #[test]
        fn prop_blend_output_in_range(b in 0.0f32..=1.0, f in 0.0f32..=1.0, opacity in 0.0f32..=1.0) {
            for mode in BlendMode::ALL {
                let v = BlendSpec::new(mode, opacity).apply(b, f);
                prop_assert!(v.is_finite(), "{mode} produced {v}");
                prop_assert!((-1e-5..=1.0 + 1e-5).contains(&v), "{mode} produced {v}");
            }
        }

        #[test]
        fn prop_normal_full_opacity_is_foreground(b in 0.0f32..=1.0, f in 0.0f32..=1.0) {
            prop_assert_eq!(BlendSpec::new(BlendMode::Normal, 1.0).apply(b, f), f);
        }

        #[test]
        fn prop_darken_lighten_commute(b in 0.0f32..=1.0, f in 0.0f32..=1.0) {
            prop_assert_eq!(BlendMode::Darken.blend(b, f), BlendMode::Darken.blend(f, b));
            prop_assert_eq!(BlendMode::Lighten.blend(b, f), BlendMode::Lighten.blend(f, b));
        }
    }
}
