//! Luminance calculation using ITU-R BT.601 coefficients.
//!
//! The tonal protection masks weight highlights and shadows by this luma.

use crate::buffer::FloatImage;

/// ITU-R BT.601 coefficient for red channel in luminance calculation.
pub const LUMINANCE_R: f32 = 0.299;

/// ITU-R BT.601 coefficient for green channel in luminance calculation.
pub const LUMINANCE_G: f32 = 0.587;

/// ITU-R BT.601 coefficient for blue channel in luminance calculation.
pub const LUMINANCE_B: f32 = 0.114;

/// Calculate luminance from normalized RGB values (0.0 to 1.0).
///
/// # Arguments
/// * `r` - Red channel value (0.0 to 1.0)
/// * `g` - Green channel value (0.0 to 1.0)
/// * `b` - Blue channel value (0.0 to 1.0)
///
/// # Returns
/// Luminance value (0.0 to 1.0)
#[inline]
pub fn calculate_luminance(r: f32, g: f32, b: f32) -> f32 {
    LUMINANCE_R * r + LUMINANCE_G * g + LUMINANCE_B * b
}

/// Luminance of every pixel as a single-channel image.
///
/// A single-channel input is its own luminance. Alpha is ignored.
pub fn luminance_map(image: &FloatImage) -> FloatImage {
    if image.channels == 1 {
        return image.clone();
    }
    let data = image
        .data
        .chunks_exact(image.channels)
        .map(|p| calculate_luminance(p[0], p[1], p[2]))
        .collect();
    FloatImage {
        width: image.width,
        height: image.height,
        channels: 1,
        data,
    }
}
