//! Displacement warping: push a texture around by a grayscale field.
//!
//! A displacement image is reduced to one channel, remapped from `[0, 1]`
//! to `[-1, 1]` (mid-gray means "stay put"), optionally smoothed, and then
//! used to offset where every destination pixel samples the texture.
//!
//! # Sampling
//!
//! Destination pixel `(x, y)` reads the texture at
//! `(x + d * strength * h_scale, y + d * strength * v_scale)` with bilinear
//! interpolation. Coordinates past the edge clamp to the nearest border
//! pixel, so a zero field reproduces the texture exactly.

use crate::buffer::FloatImage;
use crate::parallel::for_each_row;

/// Upper bound on the blur radius accepted from the panel.
pub const MAX_BLUR_RADIUS: u32 = 20;

// =============================================================================
// Displacement field
// =============================================================================

/// Single-channel field of offsets in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementField {
    /// Always one channel.
    pub values: FloatImage,
}

impl DisplacementField {
    /// Build a field of `width x height` from a displacement image.
    ///
    /// The image is converted to grayscale (mean of colour channels),
    /// resized bilinearly when its size differs, remapped to `[-1, 1]` and
    /// blurred with a Gaussian of `blur_radius` (0 = no blur).
    pub fn from_image(image: &FloatImage, width: u32, height: u32, blur_radius: u32) -> Self {
        let gray = image.to_grayscale();
        let sized = if gray.dimensions() != (width, height) {
            tracing::debug!(
                from_width = gray.width,
                from_height = gray.height,
                to_width = width,
                to_height = height,
                "Resizing displacement map to texture"
            );
            resize_bilinear(&gray, width, height)
        } else {
            gray
        };

        let remapped = sized.map(|v| (v - 0.5) * 2.0);
        let radius = blur_radius.min(MAX_BLUR_RADIUS);
        let values = if radius > 0 {
            gaussian_blur(&remapped, radius)
        } else {
            remapped
        };
        Self { values }
    }

    /// A field that moves nothing.
    pub fn zero(width: u32, height: u32) -> Self {
        Self {
            values: FloatImage::zeros(width, height, 1),
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values.get(x, y, 0)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.values.dimensions()
    }
}

// =============================================================================
// Resampling
// =============================================================================

/// Bilinear resize with half-pixel centres.
///
/// Source positions are `(dst + 0.5) * in / out - 0.5`, clamped at the
/// edges, which matches normalized-grid interpolation without corner
/// alignment.
pub fn resize_bilinear(image: &FloatImage, width: u32, height: u32) -> FloatImage {
    if image.is_empty() || width == 0 || height == 0 {
        return FloatImage::zeros(width, height, image.channels);
    }
    if image.dimensions() == (width, height) {
        return image.clone();
    }

    let channels = image.channels;
    let scale_x = image.width as f64 / width as f64;
    let scale_y = image.height as f64 / height as f64;
    let max_x = (image.width - 1) as usize;
    let max_y = (image.height - 1) as usize;

    // Source index pair and weight along one axis.
    let axis = |dst: usize, scale: f64, max: usize| {
        let src = ((dst as f64 + 0.5) * scale - 0.5).max(0.0);
        let i0 = (src.floor() as usize).min(max);
        let i1 = (i0 + 1).min(max);
        (i0, i1, (src - i0 as f64) as f32)
    };

    let mut output = FloatImage::zeros(width, height, channels);
    let row_len = output.row_len();

    for_each_row(&mut output.data, row_len, |y, row| {
        let (y0, y1, fy) = axis(y, scale_y, max_y);
        for (x, pixel) in row.chunks_exact_mut(channels).enumerate() {
            let (x0, x1, fx) = axis(x, scale_x, max_x);
            let p00 = image.pixel(x0 as u32, y0 as u32);
            let p10 = image.pixel(x1 as u32, y0 as u32);
            let p01 = image.pixel(x0 as u32, y1 as u32);
            let p11 = image.pixel(x1 as u32, y1 as u32);
            for (c, v) in pixel.iter_mut().enumerate() {
                let top = p00[c] + (p10[c] - p00[c]) * fx;
                let bottom = p01[c] + (p11[c] - p01[c]) * fx;
                *v = top + (bottom - top) * fy;
            }
        }
    });

    output
}

/// Sample `image` at `(x, y)` bilinearly, clamping to the border.
#[inline]
fn sample_clamped(image: &FloatImage, x: f32, y: f32, out: &mut [f32]) {
    let max_x = (image.width - 1) as f32;
    let max_y = (image.height - 1) as f32;
    // NaN clamps to NaN; treat it as the origin.
    let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, max_x) };
    let y = if y.is_nan() { 0.0 } else { y.clamp(0.0, max_y) };

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(image.width - 1);
    let y1 = (y0 + 1).min(image.height - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let tl = image.pixel(x0, y0);
    let tr = image.pixel(x1, y0);
    let bl = image.pixel(x0, y1);
    let br = image.pixel(x1, y1);

    for (c, v) in out.iter_mut().enumerate() {
        let top = tl[c] + (tr[c] - tl[c]) * fx;
        let bottom = bl[c] + (br[c] - bl[c]) * fx;
        *v = top + (bottom - top) * fy;
    }
}

// =============================================================================
// Blur
// =============================================================================

/// Normalized 1-D Gaussian of `2 * radius + 1` taps, sigma = radius / 3.
pub fn gaussian_kernel(radius: u32) -> Vec<f32> {
    if radius == 0 {
        return vec![1.0];
    }
    let sigma = radius as f32 / 3.0;
    let s2 = 2.0 * sigma * sigma;
    let r = radius as i64;

    let mut kernel: Vec<f32> = (-r..=r)
        .map(|i| {
            let x = i as f32;
            (-x * x / s2).exp()
        })
        .collect();
    let inv = 1.0 / kernel.iter().sum::<f32>();
    for v in &mut kernel {
        *v *= inv;
    }
    kernel
}

/// Separable Gaussian blur of a single-channel image. Samples past the
/// edges count as zero.
pub fn gaussian_blur(image: &FloatImage, radius: u32) -> FloatImage {
    debug_assert_eq!(image.channels, 1, "blur expects a single-channel field");
    if radius == 0 || image.is_empty() {
        return image.clone();
    }

    let kernel = gaussian_kernel(radius);
    let r = radius as i64;
    let w = image.width as usize;
    let h = image.height as usize;

    // Horizontal pass
    let mut horizontal = vec![0.0f32; w * h];
    for_each_row(&mut horizontal, w, |y, row| {
        let src = &image.data[y * w..(y + 1) * w];
        for (x, out) in row.iter_mut().enumerate() {
            *out = kernel
                .iter()
                .enumerate()
                .filter_map(|(k, &kv)| {
                    let sx = x as i64 + k as i64 - r;
                    (0..w as i64).contains(&sx).then(|| src[sx as usize] * kv)
                })
                .sum();
        }
    });

    // Vertical pass
    let mut vertical = vec![0.0f32; w * h];
    for_each_row(&mut vertical, w, |y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            *out = kernel
                .iter()
                .enumerate()
                .filter_map(|(k, &kv)| {
                    let sy = y as i64 + k as i64 - r;
                    (0..h as i64)
                        .contains(&sy)
                        .then(|| horizontal[sy as usize * w + x] * kv)
                })
                .sum();
        }
    });

    FloatImage {
        width: image.width,
        height: image.height,
        channels: 1,
        data: vertical,
    }
}

// =============================================================================
// Warp
// =============================================================================

/// Warp `texture` by `field`.
///
/// The field is resized to the texture when their sizes differ. The result
/// has the texture's size and channels.
///
/// # Arguments
///
/// * `texture` - Image to push around
/// * `field` - Offsets in `[-1, 1]`
/// * `horizontal_scale` - Multiplier on the x offset (negative flips it)
/// * `vertical_scale` - Multiplier on the y offset
/// * `strength` - Offset in pixels for a field value of 1
pub fn warp(
    texture: &FloatImage,
    field: &DisplacementField,
    horizontal_scale: f32,
    vertical_scale: f32,
    strength: f32,
) -> FloatImage {
    if texture.is_empty() {
        return texture.clone();
    }

    let resized;
    let field = if field.dimensions() != texture.dimensions() {
        resized = DisplacementField {
            values: resize_bilinear(&field.values, texture.width, texture.height),
        };
        &resized
    } else {
        field
    };

    tracing::debug!(
        width = texture.width,
        height = texture.height,
        channels = texture.channels,
        strength,
        horizontal_scale,
        vertical_scale,
        "Warping texture"
    );

    let kx = strength * horizontal_scale;
    let ky = strength * vertical_scale;
    let channels = texture.channels;
    let mut output = FloatImage::zeros(texture.width, texture.height, channels);
    let row_len = output.row_len();

    for_each_row(&mut output.data, row_len, |y, row| {
        for (x, pixel) in row.chunks_exact_mut(channels).enumerate() {
            let d = field.get(x as u32, y as u32);
            let sx = x as f32 + d * kx;
            let sy = y as f32 + d * ky;
            sample_clamped(texture, sx, sy, pixel);
        }
    });

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn ramp(width: u32, height: u32) -> FloatImage {
        FloatImage::from_fn(width, height, 3, |x, y, px| {
            px[0] = x as f32 / width as f32;
            px[1] = y as f32 / height as f32;
            px[2] = 0.5;
        })
    }

    #[test]
    fn test_mid_gray_field_is_zero() {
        let map = FloatImage::filled(4, 4, &[0.5, 0.5, 0.5]);
        let field = DisplacementField::from_image(&map, 4, 4, 0);
        assert!(field.values.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_field_remaps_to_signed_range() {
        let map = FloatImage::new(2, 1, 1, vec![0.0, 1.0]).unwrap();
        let field = DisplacementField::from_image(&map, 2, 1, 0);
        assert_eq!(field.get(0, 0), -1.0);
        assert_eq!(field.get(1, 0), 1.0);
    }

    #[test]
    fn test_field_uses_channel_mean() {
        let map = FloatImage::filled(2, 2, &[1.0, 0.5, 0.0, 0.25]);
        let field = DisplacementField::from_image(&map, 2, 2, 0);
        assert_abs_diff_eq!(field.get(1, 1), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_field_is_identity() {
        let tex = ramp(8, 6);
        let out = warp(&tex, &DisplacementField::zero(8, 6), 1.0, 1.0, 10.0);
        assert_eq!(out, tex);
    }

    #[test]
    fn test_uniform_red_scenario() {
        let red = FloatImage::filled(4, 4, &[1.0, 0.0, 0.0]);
        let map = FloatImage::filled(4, 4, &[0.5, 0.5, 0.5]);
        let field = DisplacementField::from_image(&map, 4, 4, 0);
        assert_eq!(warp(&red, &field, 1.0, 1.0, 10.0), red);
    }

    #[test]
    fn test_positive_field_samples_to_the_right() {
        let tex = FloatImage::from_fn(5, 1, 1, |x, _, px| px[0] = x as f32);
        let field = DisplacementField {
            values: FloatImage::filled(5, 1, &[1.0]),
        };
        let out = warp(&tex, &field, 1.0, 0.0, 2.0);
        assert_eq!(out.data, vec![2.0, 3.0, 4.0, 4.0, 4.0]);
    }

    #[test]
    fn test_fractional_offset_interpolates() {
        let tex = FloatImage::from_fn(4, 1, 1, |x, _, px| px[0] = x as f32);
        let field = DisplacementField {
            values: FloatImage::filled(4, 1, &[-0.25]),
        };
        let out = warp(&tex, &field, 1.0, 1.0, 2.0);
        // Pixel 0 clamps at the border; the rest shift by half a pixel.
        assert_abs_diff_eq!(out.data[0], 0.0);
        assert_abs_diff_eq!(out.data[2], 1.5, epsilon = 1e-6);
    }

    #[test]
    fn test_negative_scale_flips_direction() {
        let tex = FloatImage::from_fn(5, 1, 1, |x, _, px| px[0] = x as f32);
        let field = DisplacementField {
            values: FloatImage::filled(5, 1, &[1.0]),
        };
        let out = warp(&tex, &field, -1.0, 0.0, 1.0);
        assert_eq!(out.data, vec![0.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_warp_resizes_mismatched_field() {
        let tex = ramp(8, 8);
        let out = warp(&tex, &DisplacementField::zero(3, 5), 1.0, 1.0, 5.0);
        assert_eq!(out, tex);
    }

    #[test]
    fn test_gaussian_kernel_normalized() {
        for radius in [1, 3, 10] {
            let kernel = gaussian_kernel(radius);
            assert_eq!(kernel.len(), (2 * radius + 1) as usize);
            assert_abs_diff_eq!(kernel.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
            assert_abs_diff_eq!(kernel[0], kernel[kernel.len() - 1]);
        }
        assert_eq!(gaussian_kernel(0), vec![1.0]);
    }

    #[test]
    fn test_blur_keeps_interior_of_flat_field() {
        let flat = FloatImage::filled(20, 20, &[0.5]);
        let blurred = gaussian_blur(&flat, 3);
        assert_abs_diff_eq!(blurred.get(10, 10, 0), 0.5, epsilon = 1e-5);
        // Zero padding darkens the border.
        assert!(blurred.get(0, 0, 0) < 0.5);
    }

    #[test]
    fn test_blur_matches_2d_convolution() {
        let img = FloatImage::from_fn(7, 5, 1, |x, y, px| px[0] = ((x * 3 + y * 5) % 7) as f32 / 7.0);
        let radius = 2;
        let kernel = gaussian_kernel(radius);
        let blurred = gaussian_blur(&img, radius);

        let r = radius as i64;
        for y in 0..5i64 {
            for x in 0..7i64 {
                let mut expected = 0.0f32;
                for ky in -r..=r {
                    for kx in -r..=r {
                        let (sx, sy) = (x + kx, y + ky);
                        if (0..7).contains(&sx) && (0..5).contains(&sy) {
                            expected += img.get(sx as u32, sy as u32, 0)
                                * kernel[(kx + r) as usize]
                                * kernel[(ky + r) as usize];
                        }
                    }
                }
                assert_abs_diff_eq!(blurred.get(x as u32, y as u32, 0), expected, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_resize_bilinear_half_pixel_centres() {
        let img = FloatImage::new(2, 1, 1, vec![0.0, 1.0]).unwrap();
        let up = resize_bilinear(&img, 4, 1);
        // Source positions -0.25 (clamped to 0), 0.25, 0.75, 1.25 (clamped)
        assert_eq!(up.data, vec![0.0, 0.25, 0.75, 1.0]);

        let down = resize_bilinear(&FloatImage::new(4, 1, 1, vec![0.0, 1.0, 2.0, 3.0]).unwrap(), 2, 1);
        assert_eq!(down.data, vec![0.5, 2.5]);
    }

    proptest! {
        #[test]
        fn prop_warp_stays_within_texture_range(
            strength in 0.0f32..100.0,
            h in -2.0f32..2.0,
            v in -2.0f32..2.0,
            d in 0.0f32..=1.0,
        ) {
            let tex = ramp(6, 6);
            let map = FloatImage::filled(6, 6, &[d]);
            let field = DisplacementField::from_image(&map, 6, 6, 0);
            let out = warp(&tex, &field, h, v, strength);
            prop_assert_eq!(out.dimensions(), (6, 6));
            prop_assert!(out.data.iter().all(|&x| (0.0..=1.0).contains(&x)));
        }
    }
}
