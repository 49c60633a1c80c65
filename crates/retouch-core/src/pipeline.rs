//! The displacement tool: transform a texture, warp it over a surface and
//! composite it onto a background.
//!
//! # Stages
//!
//! 1. Scale the texture (explicit size, uniform factor, or unchanged)
//! 2. Rotate it clockwise about its centre, expanding the canvas
//! 3. Fit the displacement map to the transformed texture and warp
//! 4. With a background: paste the warped texture centred plus offset,
//!    clamp, and composite with tonal protection
//! 5. Without one: return the clamped warp

use serde::{Deserialize, Serialize};

use crate::buffer::FloatImage;
use crate::composite::{composite, CompositeOptions};
use crate::error::ParamError;
use crate::parallel::map_pairs;
use crate::transform::{apply_transform, resize, FilterType, TransformParams};
use crate::warp::{warp, DisplacementField};

/// Share of the displacement map in the preview overlay.
const PREVIEW_MAP_WEIGHT: f32 = 0.3;

/// Parameters of the displacement tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplacementParams {
    /// Offset in pixels for a full-white (or full-black) map value.
    pub strength: f32,
    pub horizontal_scale: f32,
    pub vertical_scale: f32,
    /// Gaussian blur radius applied to the map, 0 to 20.
    pub blur_radius: u32,
    /// Placement of the texture layer.
    pub transform: TransformParams,
}

impl Default for DisplacementParams {
    fn default() -> Self {
        Self {
            strength: 10.0,
            horizontal_scale: 1.0,
            vertical_scale: 1.0,
            blur_radius: 0,
            transform: TransformParams::default(),
        }
    }
}

impl DisplacementParams {
    /// Parse parameters from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::Json`] if the payload is not valid JSON or a
    /// field has the wrong type.
    pub fn parse(payload: &str) -> Result<Self, ParamError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Parse parameters, falling back to the defaults on any error.
    pub fn parse_or_default(payload: &str) -> Self {
        Self::parse(payload).unwrap_or_else(|err| {
            tracing::warn!(%err, "falling back to default displacement parameters");
            Self::default()
        })
    }

    /// `(strength, horizontal, vertical)` with non-finite values zeroed.
    fn factors(&self) -> (f32, f32, f32) {
        let finite = |v: f32| if v.is_finite() { v } else { 0.0 };
        (
            finite(self.strength),
            finite(self.horizontal_scale),
            finite(self.vertical_scale),
        )
    }
}

/// Run the displacement tool on one image.
///
/// # Arguments
///
/// * `texture` - Layer to wrap onto the surface
/// * `displacement` - Map whose brightness pushes the texture around
/// * `background` - Surface to composite onto, if any
/// * `params` - Warp and texture placement settings
/// * `options` - Blend mode, opacity and tonal protection
///
/// # Returns
///
/// An image of the background's size when a background is given,
/// otherwise of the transformed texture's size. Values are in `[0, 1]`.
pub fn apply_displacement(
    texture: &FloatImage,
    displacement: &FloatImage,
    background: Option<&FloatImage>,
    params: &DisplacementParams,
    options: &CompositeOptions,
) -> FloatImage {
    tracing::debug!(
        width = texture.width,
        height = texture.height,
        map_width = displacement.width,
        map_height = displacement.height,
        has_background = background.is_some(),
        "Applying displacement"
    );

    let transformed = apply_transform(texture, &params.transform);
    let field = DisplacementField::from_image(
        displacement,
        transformed.width,
        transformed.height,
        params.blur_radius,
    );
    let (strength, horizontal, vertical) = params.factors();
    let warped = warp(&transformed, &field, horizontal, vertical, strength);

    match background {
        Some(bg) => {
            let placed = params
                .transform
                .place(&warped, bg.width, bg.height, bg.channels)
                .clamped();
            composite(Some(bg), &placed, options)
        }
        None => warped.clamped(),
    }
}

/// Run the displacement tool over a batch.
///
/// Textures and maps are paired by index and the longer list is truncated.
/// Backgrounds, when given, are paired the same way; a shorter background
/// list reuses its last entry.
pub fn apply_displacement_batch(
    textures: &[FloatImage],
    displacements: &[FloatImage],
    backgrounds: Option<&[FloatImage]>,
    params: &DisplacementParams,
    options: &CompositeOptions,
) -> Vec<FloatImage> {
    if textures.len() != displacements.len() {
        tracing::warn!(
            textures = textures.len(),
            maps = displacements.len(),
            "batch sizes differ, truncating to the shorter"
        );
    }

    let backgrounds = backgrounds.filter(|b| !b.is_empty());
    map_pairs(textures, displacements, |i, texture, displacement| {
        let background = backgrounds.map(|b| &b[i.min(b.len() - 1)]);
        apply_displacement(texture, displacement, background, params, options)
    })
}

/// Preview for the displacement panel: the result with the map laid over
/// it at 30% (map resized bilinearly to the result).
pub fn displacement_preview(result: &FloatImage, displacement: &FloatImage) -> FloatImage {
    let base = result.to_rgb();
    let overlay = displacement.to_rgb();
    let overlay = if overlay.dimensions() == base.dimensions() {
        overlay
    } else {
        match resize(&overlay, base.width, base.height, FilterType::Bilinear) {
            Ok(resized) => resized,
            Err(err) => {
                tracing::warn!(%err, "displacement preview without overlay");
                return base;
            }
        }
    };

    let data = base
        .data
        .iter()
        .zip(&overlay.data)
        .map(|(&r, &d)| r * (1.0 - PREVIEW_MAP_WEIGHT) + d * PREVIEW_MAP_WEIGHT)
        .collect();
    FloatImage { data, ..base }
}
