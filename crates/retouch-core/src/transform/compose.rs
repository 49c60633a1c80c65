//! Texture layer transform: scale, then rotate, then translate.
//!
//! The order is fixed. Scaling resamples with Lanczos3; rotation is about
//! the centre with an expanded canvas; translation happens when the layer
//! is pasted onto a target canvas ([`TransformParams::place`]).

use serde::{Deserialize, Serialize};

use super::fill::FillColor;
use super::paste::place_on_canvas;
use super::resize::{resize, scaled_dimensions, FilterType};
use super::rotation::rotate_clockwise;
use super::sample::InterpolationFilter;
use crate::buffer::FloatImage;

/// Smallest and largest uniform scale accepted for a texture.
const MIN_SCALE: f64 = 0.1;
const MAX_SCALE: f64 = 5.0;

/// Placement of a texture layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformParams {
    /// Uniform scale, used when `width`/`height` are not both set.
    pub scale: f64,
    /// Degrees, positive = clockwise.
    pub rotation_degrees: f64,
    pub offset_x: i64,
    pub offset_y: i64,
    /// Explicit target width; 0 keeps the scaled width.
    pub width: u32,
    /// Explicit target height; 0 keeps the scaled height.
    pub height: u32,
    /// Colour of the corners exposed by rotation.
    pub fill_color: FillColor,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation_degrees: 0.0,
            offset_x: 0,
            offset_y: 0,
            width: 0,
            height: 0,
            fill_color: FillColor::Black,
        }
    }
}

impl TransformParams {
    /// Scale clamped to `[0.1, 5.0]`; non-finite values mean 1.0.
    pub fn effective_scale(&self) -> f64 {
        if self.scale.is_finite() {
            self.scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            1.0
        }
    }

    /// Size of a `width x height` layer after the scale step.
    ///
    /// Explicit dimensions win when both are non-zero; otherwise the scale
    /// factor applies (floored, at least 1 pixel).
    pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        if self.width > 0 && self.height > 0 {
            return (self.width, self.height);
        }
        let scale = self.effective_scale();
        if scale != 1.0 {
            scaled_dimensions(width, height, scale)
        } else {
            (width, height)
        }
    }

    /// Whether the transform leaves a `width x height` layer untouched.
    pub fn is_identity(&self, width: u32, height: u32) -> bool {
        self.target_size(width, height) == (width, height)
            && self.rotation_degrees == 0.0
            && self.offset_x == 0
            && self.offset_y == 0
    }

    /// Paste a transformed layer onto a `canvas_width x canvas_height`
    /// canvas, centred and shifted by the offset.
    pub fn place(
        &self,
        layer: &FloatImage,
        canvas_width: u32,
        canvas_height: u32,
        channels: usize,
    ) -> FloatImage {
        place_on_canvas(
            layer,
            canvas_width,
            canvas_height,
            channels,
            self.offset_x,
            self.offset_y,
        )
    }
}

/// Resize `image` to the target size.
///
/// An empty image is returned unchanged.
pub fn scale_layer(image: &FloatImage, params: &TransformParams) -> FloatImage {
    let (width, height) = params.target_size(image.width, image.height);
    if (width, height) == image.dimensions() {
        return image.clone();
    }
    resize(image, width, height, FilterType::Lanczos3).unwrap_or_else(|err| {
        tracing::warn!(%err, "keeping texture at its original size");
        image.clone()
    })
}

/// Apply the scale and rotation steps. Translation is left to
/// [`TransformParams::place`].
pub fn apply_transform(image: &FloatImage, params: &TransformParams) -> FloatImage {
    tracing::debug!(
        width = image.width,
        height = image.height,
        scale = params.effective_scale(),
        rotation = params.rotation_degrees,
        target_width = params.width,
        target_height = params.height,
        "Transforming texture"
    );

    let scaled = scale_layer(image, params);
    rotate_clockwise(
        &scaled,
        params.rotation_degrees,
        InterpolationFilter::Lanczos3,
        params.fill_color,
    )
}
