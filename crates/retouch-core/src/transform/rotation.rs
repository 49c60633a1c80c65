//! Image rotation about the centre with canvas expansion.
//!
//! # Algorithm
//!
//! Each output pixel is mapped back into the source and interpolated
//! there. With image y pointing down, a counter-clockwise rotation by θ
//! has the inverse transform:
//! ```text
//! src_x = dx * cos(θ) - dy * sin(θ) + src_cx
//! src_y = dx * sin(θ) + dy * cos(θ) + src_cy
//! ```
//! where `(dx, dy)` is the destination pixel centre relative to the
//! destination canvas centre.

use super::fill::FillColor;
use super::sample::InterpolationFilter;
use crate::buffer::FloatImage;
use crate::parallel::for_each_row;

/// Size of the canvas that holds an image rotated by `angle_degrees`.
///
/// Quarter turns are exact (odd turns swap width and height). Any other
/// angle takes the rounded axis-aligned bounds of the rotated rectangle,
/// never smaller than 1x1. The sign of the angle does not matter.
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    let turns = angle_degrees / 90.0;
    let quarter = turns.round();
    if (turns - quarter).abs() * 90.0 < 0.001 {
        return if quarter.rem_euclid(2.0) == 0.0 {
            (width, height)
        } else {
            (height, width)
        };
    }

    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    let (sin, cos) = (sin.abs(), cos.abs());
    let (w, h) = (f64::from(width), f64::from(height));
    let extent = |a: f64, b: f64| ((a + b).round() as u32).max(1);

    (extent(w * cos, h * sin), extent(w * sin, h * cos))
}

/// Rotate an image counter-clockwise about its centre.
///
/// The output canvas is expanded to fit the entire rotated image (no
/// clipping). Exposed corners take `fill`; a transparent fill adds an alpha
/// channel to the result.
///
/// `filter` is Bilinear for overlays and Lanczos3 for results.
pub fn apply_rotation(
    image: &FloatImage,
    angle_degrees: f64,
    filter: InterpolationFilter,
    fill: FillColor,
) -> FloatImage {
    if angle_degrees.abs() < 0.001 || !angle_degrees.is_finite() || image.is_empty() {
        return image.clone();
    }

    let source = fill.prepare(image);
    let channels = source.channels;
    let fill_pixel = fill.pixel(channels);

    let (dst_w, dst_h) = compute_rotated_bounds(source.width, source.height, angle_degrees);
    tracing::debug!(
        angle = angle_degrees,
        src_width = source.width,
        src_height = source.height,
        dst_width = dst_w,
        dst_height = dst_h,
        "Rotating image"
    );

    let (sin, cos) = angle_degrees.to_radians().sin_cos();

    let src_cx = source.width as f64 / 2.0;
    let src_cy = source.height as f64 / 2.0;
    let (dst_cx, dst_cy) = (f64::from(dst_w) / 2.0, f64::from(dst_h) / 2.0);

    let mut output = FloatImage::zeros(dst_w, dst_h, channels);
    let row_len = output.row_len();

    for_each_row(&mut output.data, row_len, |dst_y, row| {
        let dy = dst_y as f64 + 0.5 - dst_cy;
        for (dst_x, pixel) in row.chunks_exact_mut(channels).enumerate() {
            let dx = dst_x as f64 + 0.5 - dst_cx;

            // Inverse rotation, then back from pixel centres to sample space
            let src_x = dx * cos - dy * sin + src_cx - 0.5;
            let src_y = dx * sin + dy * cos + src_cy - 0.5;

            filter.sample(&source, src_x, src_y, &fill_pixel, pixel);
        }
    });

    output
}

/// Rotate an image clockwise about its centre (positive = clockwise).
///
/// This is the convention of the texture and interactive-crop rotation
/// controls.
pub fn rotate_clockwise(
    image: &FloatImage,
    angle_degrees: f64,
    filter: InterpolationFilter,
    fill: FillColor,
) -> FloatImage {
    apply_rotation(image, -angle_degrees, filter, fill)
}
