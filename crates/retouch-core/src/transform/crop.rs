//! Image cropping operations.
//!
//! Two coordinate systems are supported:
//!
//! - Normalized crops ([`apply_crop`]): `left`, `top`, `width`, `height`
//!   in 0.0 to 1.0, independent of the pixel dimensions. The panels use
//!   these for thumbnails.
//! - Pixel windows ([`CropWindow`], [`crop_region`]): integer rectangles
//!   that may extend past the image. Uncovered area is opaque black, never
//!   wrapped.

use crate::buffer::FloatImage;

use super::fill::FillColor;

/// Opacity of the shade drawn over the area outside a crop window.
const PREVIEW_SHADE: f32 = 120.0 / 255.0;

/// Colour of the crop window outline in previews.
const PREVIEW_BORDER: [f32; 3] = [1.0, 0.0, 0.0];

/// Corner handles: a yellow square with a 2 px black rim.
const HANDLE_SIZE: i64 = 12;
const HANDLE_FILL: [f32; 3] = [1.0, 1.0, 0.0];
const HANDLE_RIM: [f32; 3] = [0.0, 0.0, 0.0];

/// Centre cross: green arms 20 px long and 3 px thick.
const CROSS_ARM: i64 = 20;
const CROSS_COLOR: [f32; 3] = [0.0, 1.0, 0.0];

/// Crop by fractions of the image size.
///
/// Fractions are clamped to [0, 1] and rounded to whole pixels. The result
/// is at least 1x1 and never reaches past the image; `(0, 0, 1, 1)` returns
/// a copy.
pub fn apply_crop(image: &FloatImage, left: f64, top: f64, width: f64, height: f64) -> FloatImage {
    if image.is_empty() || (left <= 0.0 && top <= 0.0 && width >= 1.0 && height >= 1.0) {
        return image.clone();
    }

    let (x, w) = fraction_span(left, width, image.width);
    let (y, h) = fraction_span(top, height, image.height);
    crop_region(image, CropWindow::new(i64::from(x), i64::from(y), w, h))
}

/// Pixel start and length of a fractional span along an edge of `len` pixels.
fn fraction_span(start: f64, extent: f64, len: u32) -> (u32, u32) {
    let to_px = |f: f64| (f.clamp(0.0, 1.0) * f64::from(len)).round() as u32;
    let first = to_px(start).min(len.saturating_sub(1));
    let end = first.saturating_add(to_px(extent)).min(len);
    (first, end.saturating_sub(first).max(1))
}

/// A pixel rectangle on an image, possibly extending past its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    /// Left edge; negative values start left of the image.
    pub x: i64,
    /// Top edge; negative values start above the image.
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl CropWindow {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A `width x height` window centred on an `image_width x image_height`
    /// image, then moved by the offset.
    ///
    /// The centring offset is floored, so odd remainders favour the
    /// top-left.
    pub fn centered(
        image_width: u32,
        image_height: u32,
        width: u32,
        height: u32,
        offset_x: i64,
        offset_y: i64,
    ) -> Self {
        let x = (i64::from(image_width) - i64::from(width))
            .div_euclid(2)
            .saturating_add(offset_x);
        let y = (i64::from(image_height) - i64::from(height))
            .div_euclid(2)
            .saturating_add(offset_y);
        Self::new(x, y, width, height)
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> i64 {
        self.x.saturating_add(i64::from(self.width))
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> i64 {
        self.y.saturating_add(i64::from(self.height))
    }
}

/// Cut `window` out of `image`.
///
/// The result is always `window.width x window.height`; parts of the
/// window outside the image are opaque black.
pub fn crop_region(image: &FloatImage, window: CropWindow) -> FloatImage {
    let channels = image.channels;
    let mut output = FloatImage::filled(
        window.width,
        window.height,
        &FillColor::Black.pixel(channels),
    );

    // Visible part of the window, in image coordinates
    let from_x = window.x.max(0);
    let from_y = window.y.max(0);
    let to_x = window.right().min(image.width as i64);
    let to_y = window.bottom().min(image.height as i64);
    if to_x <= from_x || to_y <= from_y {
        return output;
    }

    let span = (to_x - from_x) as usize * channels;
    let dst_x = (from_x - window.x) as usize;
    for src_y in from_y..to_y {
        let dst_y = (src_y - window.y) as usize;
        let src_start = (src_y as usize * image.width as usize + from_x as usize) * channels;
        let dst_start = (dst_y * window.width as usize + dst_x) * channels;
        output.data[dst_start..dst_start + span]
            .copy_from_slice(&image.data[src_start..src_start + span]);
    }

    output
}

/// Panel preview of a crop: the area outside `window` is shaded and the
/// window is outlined in red.
///
/// The outline is `max(3, min(width, height) / 200)` pixels wide and
/// drawn outward from the window edge. Each corner carries a drag handle
/// and a green cross marks the window centre. Markings outside the window
/// are shaded along with the image.
pub fn crop_preview(image: &FloatImage, window: CropWindow) -> FloatImage {
    let mut preview = image.to_rgb();
    if preview.is_empty() {
        return preview;
    }

    let border = i64::from((image.width.min(image.height) / 200).max(3));
    let (left, top, right, bottom) = (window.x, window.y, window.right(), window.bottom());

    for i in 0..border {
        let ring = (
            left.saturating_sub(i),
            top.saturating_sub(i),
            right.saturating_add(i),
            bottom.saturating_add(i),
        );
        outline_rect(&mut preview, ring, 1, PREVIEW_BORDER);
    }

    for (cx, cy) in [(left, top), (right, top), (left, bottom), (right, bottom)] {
        let x0 = cx.saturating_sub(HANDLE_SIZE / 2);
        let y0 = cy.saturating_sub(HANDLE_SIZE / 2);
        let handle = (x0, y0, x0.saturating_add(HANDLE_SIZE), y0.saturating_add(HANDLE_SIZE));
        fill_rect(&mut preview, handle, HANDLE_FILL);
        outline_rect(&mut preview, handle, 2, HANDLE_RIM);
    }

    let cx = left.saturating_add(i64::from(window.width / 2));
    let cy = top.saturating_add(i64::from(window.height / 2));
    let span = |c: i64, reach: i64| (c.saturating_sub(reach), c.saturating_add(reach));
    let ((h0, h1), (v0, v1)) = (span(cx, CROSS_ARM), span(cy, 1));
    fill_rect(&mut preview, (h0, v0, h1, v1), CROSS_COLOR);
    let ((h0, h1), (v0, v1)) = (span(cx, 1), span(cy, CROSS_ARM));
    fill_rect(&mut preview, (h0, v0, h1, v1), CROSS_COLOR);

    for y in 0..preview.height {
        let yi = i64::from(y);
        for x in 0..preview.width {
            let xi = i64::from(x);
            if !(left..=right).contains(&xi) || !(top..=bottom).contains(&yi) {
                for v in preview.pixel_mut(x, y) {
                    *v *= 1.0 - PREVIEW_SHADE;
                }
            }
        }
    }

    preview
}

/// Inclusive pixel rectangle `(x0, y0, x1, y1)`; may extend off the image.
type Rect = (i64, i64, i64, i64);

/// Fill the on-image part of `rect` on an RGB image.
fn fill_rect(image: &mut FloatImage, (x0, y0, x1, y1): Rect, color: [f32; 3]) {
    let (max_x, max_y) = (i64::from(image.width) - 1, i64::from(image.height) - 1);
    if x1 < 0 || y1 < 0 || x0 > max_x || y0 > max_y || x1 < x0 || y1 < y0 {
        return;
    }
    for y in y0.max(0)..=y1.min(max_y) {
        for x in x0.max(0)..=x1.min(max_x) {
            image.pixel_mut(x as u32, y as u32).copy_from_slice(&color);
        }
    }
}

/// Draw the `width`-pixel inner rim of `rect`.
fn outline_rect(image: &mut FloatImage, (x0, y0, x1, y1): Rect, width: i64, color: [f32; 3]) {
    let inset = width - 1;
    fill_rect(image, (x0, y0, x1, y0.saturating_add(inset)), color);
    fill_rect(image, (x0, y1.saturating_sub(inset), x1, y1), color);
    fill_rect(image, (x0, y0, x0.saturating_add(inset), y1), color);
    fill_rect(image, (x1.saturating_sub(inset), y0, x1, y1), color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Create a test image with unique pixel values based on position.
    fn test_image(width: u32, height: u32) -> FloatImage {
        FloatImage::from_fn(width, height, 3, |x, y, px| {
            px.fill((y * width + x) as f32 / (width * height) as f32);
        })
    }

    #[test]
    fn test_full_crop() {
        let img = test_image(100, 100);
        assert_eq!(apply_crop(&img, 0.0, 0.0, 1.0, 1.0), img);
    }

    #[test]
    fn test_half_crop() {
        let img = test_image(100, 100);
        let result = apply_crop(&img, 0.0, 0.0, 0.5, 0.5);
        assert_eq!(result.dimensions(), (50, 50));
    }

    #[test]
    fn test_center_crop() {
        let img = test_image(100, 100);
        let result = apply_crop(&img, 0.25, 0.25, 0.5, 0.5);
        assert_eq!(result.dimensions(), (50, 50));
        assert_eq!(result.pixel(0, 0), img.pixel(25, 25));
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        let img = test_image(100, 100);
        let result = apply_crop(&img, 0.8, 0.8, 0.5, 0.5);
        assert_eq!(result.dimensions(), (20, 20));
    }

    #[test]
    fn test_crop_minimum_dimension() {
        let img = test_image(100, 100);
        let result = apply_crop(&img, 0.5, 0.5, 0.0, 0.0);
        assert_eq!(result.dimensions(), (1, 1));
    }

    #[test]
    fn test_crop_region_inside() {
        let img = test_image(10, 10);
        let result = crop_region(&img, CropWindow::new(2, 3, 4, 4));
        assert_eq!(result.dimensions(), (4, 4));
        assert_eq!(result.pixel(0, 0), img.pixel(2, 3));
        assert_eq!(result.pixel(3, 3), img.pixel(5, 6));
    }

    #[test]
    fn test_crop_region_outside_is_black() {
        let img = FloatImage::filled(4, 4, &[1.0, 1.0, 1.0]);
        let result = crop_region(&img, CropWindow::new(-2, -2, 4, 4));
        assert_eq!(result.pixel(0, 0), &[0.0, 0.0, 0.0]);
        assert_eq!(result.pixel(1, 1), &[0.0, 0.0, 0.0]);
        assert_eq!(result.pixel(2, 2), &[1.0, 1.0, 1.0]);
        assert_eq!(result.pixel(3, 3), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_crop_region_fully_outside() {
        let img = FloatImage::filled(4, 4, &[1.0, 1.0, 1.0, 1.0]);
        let result = crop_region(&img, CropWindow::new(10, 10, 3, 2));
        assert_eq!(result.dimensions(), (3, 2));
        assert!(result.data.chunks(4).all(|p| p == [0.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_centered_window_floors() {
        assert_eq!(CropWindow::centered(100, 80, 50, 40, 0, 0), CropWindow::new(25, 20, 50, 40));
        assert_eq!(CropWindow::centered(101, 80, 50, 40, 3, -4), CropWindow::new(28, 16, 50, 40));
        // Larger window than image: (10 - 15) // 2 = -3
        assert_eq!(CropWindow::centered(10, 10, 15, 15, 0, 0).x, -3);
    }

    #[test]
    fn test_crop_preview_shades_outside() {
        let img = FloatImage::filled(60, 60, &[1.0, 1.0, 1.0]);
        let preview = crop_preview(&img, CropWindow::new(4, 4, 30, 30));
        assert_eq!(preview.dimensions(), (60, 60));
        // Far outside: shaded
        assert!(preview.pixel(50, 50)[0] < 1.0);
        // Inside, away from the markings: untouched
        assert_eq!(preview.pixel(10, 25), &[1.0, 1.0, 1.0]);
        // On the window edge: red outline
        assert_eq!(preview.pixel(4, 25), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_crop_preview_handles_and_centre_cross() {
        let img = FloatImage::filled(60, 60, &[1.0, 1.0, 1.0]);
        let preview = crop_preview(&img, CropWindow::new(4, 4, 30, 30));
        // Top-left handle spans -2..=10: yellow body, black rim
        assert_eq!(preview.pixel(4, 4), &[1.0, 1.0, 0.0]);
        assert_eq!(preview.pixel(9, 4), &[0.0, 0.0, 0.0]);
        // Bottom-right handle is centred on the far corner
        assert_eq!(preview.pixel(34, 34), &[1.0, 1.0, 0.0]);
        // Centre cross at (19, 19)
        assert_eq!(preview.pixel(19, 19), &[0.0, 1.0, 0.0]);
        assert_eq!(preview.pixel(19, 0), &[0.0, 1.0, 0.0].map(|v| v * (1.0 - PREVIEW_SHADE)));
        assert_eq!(preview.pixel(30, 20), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_extreme_window_offsets_do_not_overflow() {
        let window = CropWindow::centered(10, 10, 4, 4, i64::MAX, i64::MIN);
        assert_eq!(window.right(), i64::MAX);
        let img = FloatImage::filled(10, 10, &[1.0, 1.0, 1.0]);
        let cropped = crop_region(&img, window);
        assert!(cropped.data.iter().all(|&v| v == 0.0));
        let preview = crop_preview(&img, window);
        assert!(preview.pixel(5, 5)[0] < 1.0);
    }

    proptest! {
        #[test]
        fn prop_output_dimensions_bounded(
            (width, height) in (4u32..=100, 4u32..=100),
            (left, top, crop_w, crop_h) in (0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0),
        ) {
            let img = test_image(width, height);
            let result = apply_crop(&img, left, top, crop_w, crop_h);

            prop_assert!(result.width >= 1 && result.height >= 1);
            prop_assert!(result.width <= width && result.height <= height);
            prop_assert_eq!(result.data.len(), (result.width * result.height * 3) as usize);
        }

        #[test]
        fn prop_crop_region_has_window_size(
            x in -50i64..50, y in -50i64..50,
            w in 1u32..40, h in 1u32..40,
        ) {
            let img = test_image(20, 20);
            let result = crop_region(&img, CropWindow::new(x, y, w, h));
            prop_assert_eq!(result.dimensions(), (w, h));
        }
    }
}
