//! Image resizing for texture scaling and preview generation.
//!
//! Resampling goes through the `image` crate's separable filters on `f32`
//! buffers. All functions return new images without modifying the input.

use image::imageops;
use image::{ImageBuffer, Luma, Pixel, Rgb, Rgba};
use serde::{Deserialize, Serialize};

use crate::buffer::FloatImage;
use crate::error::ImageError;

/// Longest edge of the panel preview images.
pub const PREVIEW_MAX_EDGE: u32 = 512;

/// Filter type for image resizing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    #[default]
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> imageops::FilterType {
        match self {
            FilterType::Nearest => imageops::FilterType::Nearest,
            FilterType::Bilinear => imageops::FilterType::Triangle,
            FilterType::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Resample `image` to exactly `width`x`height`.
///
/// # Errors
///
/// Returns [`ImageError::EmptyDimensions`] if the source or the target has
/// a zero dimension.
pub fn resize(
    image: &FloatImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<FloatImage, ImageError> {
    if width == 0 || height == 0 || image.is_empty() {
        return Err(ImageError::EmptyDimensions);
    }

    if image.dimensions() == (width, height) {
        return Ok(image.clone());
    }

    let data = match image.channels {
        1 => resize_buffer::<Luma<f32>>(image, width, height, filter)?,
        3 => resize_buffer::<Rgb<f32>>(image, width, height, filter)?,
        4 => resize_buffer::<Rgba<f32>>(image, width, height, filter)?,
        n => return Err(ImageError::UnsupportedChannels(n)),
    };

    FloatImage::new(width, height, image.channels, data)
}

fn resize_buffer<P>(
    image: &FloatImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<Vec<f32>, ImageError>
where
    P: Pixel<Subpixel = f32> + 'static,
{
    let buffer: ImageBuffer<P, Vec<f32>> =
        ImageBuffer::from_raw(image.width, image.height, image.data.clone()).ok_or_else(|| {
            ImageError::Resample("sample buffer does not match dimensions".to_string())
        })?;
    Ok(imageops::resize(&buffer, width, height, filter.to_image_filter()).into_raw())
}

/// Shrink `image` so its longest edge is `max_edge`, keeping the aspect
/// ratio. Images already inside the bound come back unchanged.
///
/// # Errors
///
/// Returns [`ImageError::EmptyDimensions`] if `max_edge` is zero or the
/// source is empty.
pub fn resize_to_fit(
    image: &FloatImage,
    max_edge: u32,
    filter: FilterType,
) -> Result<FloatImage, ImageError> {
    if max_edge == 0 {
        return Err(ImageError::EmptyDimensions);
    }

    if image.width.max(image.height) <= max_edge {
        return Ok(image.clone());
    }

    let (width, height) = fit_dimensions(image.width, image.height, max_edge);
    resize(image, width, height, filter)
}

/// Generate a panel preview no larger than `max_edge` on its longest side.
///
/// Never upscales.
///
/// # Errors
///
/// Returns [`ImageError::EmptyDimensions`] if `max_edge` is zero or the
/// source is empty.
pub fn generate_preview(image: &FloatImage, max_edge: u32) -> Result<FloatImage, ImageError> {
    resize_to_fit(image, max_edge, FilterType::Lanczos3)
}

/// Dimensions after uniform scaling: `floor(dim * scale)`, at least 1.
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = (width as f64 * scale).floor().max(1.0) as u32;
    let h = (height as f64 * scale).floor().max(1.0) as u32;
    (w, h)
}

/// The longest edge becomes `max_edge`; the other is scaled and rounded.
fn fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let longest = width.max(height);
    let scale = f64::from(max_edge) / f64::from(longest);
    let fit = |edge: u32| {
        if edge == longest {
            max_edge
        } else {
            ((f64::from(edge) * scale).round() as u32).clamp(1, max_edge)
        }
    };

    (fit(width), fit(height))
}
