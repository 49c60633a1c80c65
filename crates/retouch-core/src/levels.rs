//! Levels adjustment: input black/white points, midpoint and output range.
//!
//! The midpoint is an input level (not a gamma value). The gamma is solved
//! so that the midpoint lands on the middle of the output range:
//!
//! ```text
//! ((in_mid - in_black) / (in_white - in_black)) ^ gamma = 0.5
//! ```
//!
//! The levels panel stores one parameter record per channel as JSON:
//! `{"RGB": {...}, "R": {...}, "G": {...}, "B": {...}}`. The composite RGB
//! levels are applied first, then each channel's own levels:
//! `final_r = r[rgb[v]]`. This is the reverse of the curves tool.

use serde::{Deserialize, Serialize};

use crate::buffer::FloatImage;
use crate::error::ParamError;
use crate::lut::{ChannelLuts, Lut};

/// Levels parameters for one channel. All values are on the 0-255 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelsParams {
    /// Input level mapped to `out_black`.
    pub in_black: f64,
    /// Input level mapped to the middle of the output range.
    pub in_mid: f64,
    /// Input level mapped to `out_white`.
    pub in_white: f64,
    /// Output level for `in_black` and below.
    pub out_black: f64,
    /// Output level for `in_white` and above.
    pub out_white: f64,
}

impl Default for LevelsParams {
    fn default() -> Self {
        Self {
            in_black: 0.0,
            in_mid: 128.0,
            in_white: 255.0,
            out_black: 0.0,
            out_white: 255.0,
        }
    }
}

impl LevelsParams {
    /// Width of the input range, with a zero range treated as 1.
    fn input_span(&self) -> f64 {
        let span = self.in_white - self.in_black;
        if span == 0.0 {
            1.0
        } else {
            span
        }
    }

    /// Solve the gamma exponent from the midpoint.
    ///
    /// The midpoint is first clamped to `[in_black + 1, in_white - 1]`.
    /// A midpoint within half a level of the range centre is neutral (the
    /// panel's integer handle cannot sit on the exact centre), and a ratio
    /// outside the open interval `(0, 1)` also yields gamma 1. On a narrow
    /// input range that half level is a large share of the span, so small
    /// midpoint nudges there are flattened to gamma 1 as well.
    pub fn gamma(&self) -> f64 {
        let span = self.input_span();
        let mid = self.in_mid.min(self.in_white - 1.0).max(self.in_black + 1.0);

        let centre = (self.in_black + self.in_white) / 2.0;
        if (mid - centre).abs() <= 0.5 {
            return 1.0;
        }

        let ratio = (mid - self.in_black) / span;
        if ratio > 0.0 && ratio < 1.0 {
            let gamma = 0.5f64.ln() / ratio.ln();
            if gamma.is_finite() {
                return gamma;
            }
        }
        1.0
    }

    /// Tabulate the levels mapping.
    pub fn to_lut(&self) -> Lut {
        let span = self.input_span();
        let gamma = self.gamma();
        Lut::from_fn(|v| {
            let mut t = (v as f64 - self.in_black) / span;
            if !t.is_finite() {
                t = 0.0;
            }
            let t = t.clamp(0.0, 1.0);
            let mapped = if t > 0.0 { t.powf(gamma) } else { 0.0 };
            self.out_black + mapped * (self.out_white - self.out_black)
        })
    }

    /// Check if these parameters leave every level unchanged.
    pub fn is_identity(&self) -> bool {
        self.to_lut().is_identity()
    }
}

/// Levels parameters for the composite and each colour channel.
///
/// Channels missing from the payload, and fields missing from a channel,
/// take their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelsConfig {
    #[serde(rename = "RGB")]
    pub rgb: LevelsParams,
    #[serde(rename = "R")]
    pub r: LevelsParams,
    #[serde(rename = "G")]
    pub g: LevelsParams,
    #[serde(rename = "B")]
    pub b: LevelsParams,
}

impl LevelsConfig {
    /// Parse a levels JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a JSON object of the expected
    /// shape.
    pub fn parse(payload: &str) -> Result<Self, ParamError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Parse a levels JSON payload, falling back to default (identity)
    /// parameters.
    pub fn parse_or_default(payload: &str) -> Self {
        Self::parse(payload).unwrap_or_else(|err| {
            tracing::warn!(%err, "malformed levels payload, using defaults");
            Self::default()
        })
    }

    /// Build the composed LUTs: composite first, then each channel.
    pub fn to_luts(&self) -> ChannelLuts {
        let per_channel = ChannelLuts {
            r: self.r.to_lut(),
            g: self.g.to_lut(),
            b: self.b.to_lut(),
        };
        per_channel.after_composite(&self.rgb.to_lut())
    }
}

/// Build per-channel LUTs from a levels payload.
pub fn build_luts(payload: &str) -> ChannelLuts {
    LevelsConfig::parse_or_default(payload).to_luts()
}

/// Apply a levels payload to an image.
pub fn apply_levels(image: &FloatImage, payload: &str) -> FloatImage {
    tracing::debug!(
        width = image.width,
        height = image.height,
        "Applying levels"
    );
    build_luts(payload).apply(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params(in_black: f64, in_mid: f64, in_white: f64, out_black: f64, out_white: f64) -> LevelsParams {
        LevelsParams {
            in_black,
            in_mid,
            in_white,
            out_black,
            out_white,
        }
    }

    #[test]
    fn test_default_levels_are_identity() {
        let lut = LevelsParams::default().to_lut();
        assert!(lut.is_identity());
        assert_eq!(lut.get(0), 0);
        assert_eq!(lut.get(128), 128);
        assert_eq!(lut.get(255), 255);
    }

    #[test]
    fn test_midpoint_maps_to_half_output() {
        let p = params(0.0, 64.0, 255.0, 0.0, 255.0);
        let gamma = p.gamma();
        assert!(gamma < 1.0, "lower midpoint brightens");
        let lut = p.to_lut();
        assert!((lut.get(64) as i32 - 128).abs() <= 1);
    }

    #[test]
    fn test_black_and_white_points() {
        let lut = params(50.0, 127.5, 205.0, 0.0, 255.0).to_lut();
        assert_eq!(lut.get(0), 0);
        assert_eq!(lut.get(50), 0);
        assert_eq!(lut.get(205), 255);
        assert_eq!(lut.get(255), 255);
        // Linear between the points since the midpoint is centred
        assert_eq!(lut.get(128), 128);
    }

    #[test]
    fn test_output_range() {
        let lut = params(0.0, 128.0, 255.0, 20.0, 200.0).to_lut();
        assert_eq!(lut.get(0), 20);
        assert_eq!(lut.get(255), 200);
    }

    #[test]
    fn test_zero_input_span_does_not_divide_by_zero() {
        let lut = params(100.0, 100.0, 100.0, 0.0, 255.0).to_lut();
        assert_eq!(lut.get(99), 0);
        assert_eq!(lut.get(101), 255);
    }

    #[test]
    fn test_midpoint_clamped_inside_range() {
        // in_mid at in_black would give log(0); it is pulled to in_black + 1.
        let p = params(0.0, 0.0, 255.0, 0.0, 255.0);
        assert!(p.gamma().is_finite());
        assert!(p.gamma() > 0.0);
    }

    #[test]
    fn test_half_level_from_centre_is_neutral() {
        assert_eq!(params(0.0, 128.0, 255.0, 0.0, 255.0).gamma(), 1.0);
        // Range 100..=104: 102.5 is within half a level of the centre.
        assert_eq!(params(100.0, 102.5, 104.0, 0.0, 255.0).gamma(), 1.0);
        assert!(params(100.0, 103.0, 104.0, 0.0, 255.0).gamma() > 1.0);
    }

    #[test]
    fn test_inverted_input_range_falls_back_to_gamma_one() {
        let p = params(200.0, 100.0, 50.0, 0.0, 255.0);
        assert_eq!(p.gamma(), 1.0);
    }

    #[test]
    fn test_config_partial_payload_uses_defaults() {
        let config = LevelsConfig::parse(r#"{"R": {"in_black": 10}}"#).unwrap();
        assert_eq!(config.r.in_black, 10.0);
        assert_eq!(config.r.in_mid, 128.0);
        assert_eq!(config.g, LevelsParams::default());
    }

    #[test]
    fn test_malformed_payloads_are_identity() {
        assert!(build_luts("{").is_identity());
        assert!(build_luts("[1, 2]").is_identity());
        assert!(build_luts(r#"{"RGB": {"in_black": "dark"}}"#).is_identity());
        assert!(build_luts("{}").is_identity());
    }

    #[test]
    fn test_composite_applied_before_channel() {
        // RGB clips everything below 128 to black; R inverts.
        let payload = r#"{
            "RGB": {"in_black": 128, "in_mid": 191.5, "in_white": 255},
            "R": {"out_black": 255, "out_white": 0}
        }"#;
        let luts = build_luts(payload);
        // r[rgb[0]] = r[0] = 255
        assert_eq!(luts.r.get(0), 255);
        // g[rgb[0]] = 0
        assert_eq!(luts.g.get(0), 0);
    }

    #[test]
    fn test_apply_levels_stretches_image() {
        let img = FloatImage::filled(1, 1, &[0.5, 0.5, 0.5]);
        let payload = r#"{"RGB": {"in_black": 0, "in_mid": 63.5, "in_white": 127}}"#;
        let out = apply_levels(&img, payload);
        // 0.5 quantizes to 127 which is the new white point
        assert_eq!(out.data, vec![1.0, 1.0, 1.0]);
    }

    proptest! {
        #[test]
        fn prop_levels_never_panic(
            in_black in -300.0f64..600.0,
            in_mid in -300.0f64..600.0,
            in_white in -300.0f64..600.0,
            out_black in -300.0f64..600.0,
            out_white in -300.0f64..600.0,
        ) {
            let p = params(in_black, in_mid, in_white, out_black, out_white);
            let gamma = p.gamma();
            prop_assert!(gamma.is_finite() && gamma > 0.0);
            let _ = p.to_lut();
        }
    }
}
