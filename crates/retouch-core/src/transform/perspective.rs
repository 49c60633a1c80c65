//! Perspective crop: rectify a quadrilateral of the source into a rectangle.
//!
//! The four source corners are matched to the corners of the output
//! rectangle by a projective transform (homography). Every output pixel is
//! mapped back through that transform and sampled bilinearly; positions
//! outside the source read the fill colour.

use serde::{Deserialize, Serialize};

use super::fill::FillColor;
use super::overlay::paint_segment;
use super::sample::InterpolationFilter;
use crate::buffer::FloatImage;
use crate::parallel::for_each_row;

/// Bounds of the adaptive output size.
const MIN_ADAPTIVE_SIZE: u32 = 64;
const MAX_ADAPTIVE_SIZE: u32 = 2048;

/// Pivots smaller than this make the system singular.
const PIVOT_EPSILON: f64 = 1e-12;

/// A point in source pixel coordinates.
pub type Point = (f64, f64);

/// Parameters of the perspective crop tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerspectiveParams {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
    /// Derive the output size from the quadrilateral's edge lengths.
    pub auto_size: bool,
    pub output_width: u32,
    pub output_height: u32,
    pub fill_color: FillColor,
}

impl Default for PerspectiveParams {
    fn default() -> Self {
        Self {
            top_left: (100.0, 100.0),
            top_right: (300.0, 100.0),
            bottom_right: (300.0, 300.0),
            bottom_left: (100.0, 300.0),
            auto_size: false,
            output_width: 512,
            output_height: 512,
            fill_color: FillColor::Black,
        }
    }
}

impl PerspectiveParams {
    /// Corners in TL, TR, BR, BL order.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Output dimensions, adaptive or explicit. Never zero.
    pub fn output_size(&self) -> (u32, u32) {
        if self.auto_size {
            adaptive_size(&self.corners())
        } else {
            (self.output_width.max(1), self.output_height.max(1))
        }
    }
}

/// Output size from the average lengths of opposite edges.
///
/// Each side is truncated, clamped to `[64, 2048]` and floored to a
/// multiple of 8.
pub fn adaptive_size(corners: &[Point; 4]) -> (u32, u32) {
    let [tl, tr, br, bl] = *corners;
    let dist = |a: Point, b: Point| (a.0 - b.0).hypot(a.1 - b.1);

    let avg_width = ((dist(tl, tr) + dist(bl, br)) / 2.0) as u32;
    let avg_height = ((dist(tl, bl) + dist(tr, br)) / 2.0) as u32;

    let fit = |v: u32| v.clamp(MIN_ADAPTIVE_SIZE, MAX_ADAPTIVE_SIZE) / 8 * 8;
    (fit(avg_width), fit(avg_height))
}

// =============================================================================
// Homography
// =============================================================================

/// Row-major 3x3 projective transform with `m[8] == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    pub m: [f64; 9],
}

impl Homography {
    pub fn identity() -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        }
    }

    /// The transform taking each `from[i]` onto `to[i]`.
    ///
    /// Returns `None` when the correspondences are degenerate (three
    /// collinear points, repeated corners, non-finite input).
    pub fn from_points(from: &[Point; 4], to: &[Point; 4]) -> Option<Self> {
        // h0 u + h1 v + h2 - h6 u x - h7 v x = x
        // h3 u + h4 v + h5 - h6 u y - h7 v y = y
        let mut a = [[0.0f64; 9]; 8];
        for (i, (&(u, v), &(x, y))) in from.iter().zip(to.iter()).enumerate() {
            a[2 * i] = [u, v, 1.0, 0.0, 0.0, 0.0, -u * x, -v * x, x];
            a[2 * i + 1] = [0.0, 0.0, 0.0, u, v, 1.0, -u * y, -v * y, y];
        }

        let h = solve_augmented(&mut a)?;
        let m = [h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0];
        m.iter().all(|v| v.is_finite()).then_some(Self { m })
    }

    /// Map a point. `None` if it lands on the line at infinity.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> Option<Point> {
        let m = &self.m;
        let w = m[6] * x + m[7] * y + m[8];
        if w.abs() < PIVOT_EPSILON {
            return None;
        }
        Some((
            (m[0] * x + m[1] * y + m[2]) / w,
            (m[3] * x + m[4] * y + m[5]) / w,
        ))
    }
}

/// Solve the 8x8 system in augmented form by Gaussian elimination with
/// partial pivoting.
fn solve_augmented(a: &mut [[f64; 9]; 8]) -> Option<[f64; 8]> {
    const N: usize = 8;

    for col in 0..N {
        let pivot_row = (col..N).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        let pivot = a[pivot_row][col].abs();
        if pivot.is_nan() || pivot < PIVOT_EPSILON {
            return None;
        }
        a.swap(col, pivot_row);

        for row in col + 1..N {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..=N {
                a[row][k] -= factor * a[col][k];
            }
        }
    }

    let mut x = [0.0f64; N];
    for row in (0..N).rev() {
        let tail: f64 = (row + 1..N).map(|k| a[row][k] * x[k]).sum();
        x[row] = (a[row][N] - tail) / a[row][row];
    }
    Some(x)
}

// =============================================================================
// Crop
// =============================================================================

/// Rectify the quadrilateral described by `params` into a rectangle.
///
/// A degenerate quadrilateral falls back to the identity mapping, which
/// copies the top-left of the source into the output.
pub fn perspective_crop(image: &FloatImage, params: &PerspectiveParams) -> FloatImage {
    let (width, height) = params.output_size();
    let target = [
        (0.0, 0.0),
        (width as f64, 0.0),
        (width as f64, height as f64),
        (0.0, height as f64),
    ];

    // Output pixels are mapped back to the source, so solve target -> corners.
    let homography = Homography::from_points(&target, &params.corners()).unwrap_or_else(|| {
        tracing::warn!(corners = ?params.corners(), "degenerate perspective quad, using identity");
        Homography::identity()
    });

    tracing::debug!(
        width = image.width,
        height = image.height,
        out_width = width,
        out_height = height,
        fill = %params.fill_color,
        "Perspective crop"
    );

    let source = params.fill_color.prepare(image);
    let channels = source.channels;
    let fill = params.fill_color.pixel(channels);

    let mut output = FloatImage::zeros(width, height, channels);
    let row_len = output.row_len();

    for_each_row(&mut output.data, row_len, |y, row| {
        for (x, pixel) in row.chunks_exact_mut(channels).enumerate() {
            match homography.apply(x as f64, y as f64) {
                Some((sx, sy)) => {
                    InterpolationFilter::Bilinear.sample(&source, sx, sy, &fill, pixel)
                }
                None => pixel.copy_from_slice(&fill),
            }
        }
    });

    output
}

/// Panel preview: the source with the quadrilateral outlined in cyan and
/// each corner marked (TL red, TR green, BR blue, BL yellow).
pub fn perspective_preview(image: &FloatImage, params: &PerspectiveParams) -> FloatImage {
    const OUTLINE: [f32; 3] = [0.0, 1.0, 1.0];
    const MARKERS: [[f32; 3]; 4] = [
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 1.0, 0.0],
    ];
    const HALF_WIDTH: f64 = 1.5;
    const MARKER_RADIUS: f64 = 8.0;

    let corners = params.corners().map(|(x, y)| (x.trunc(), y.trunc()));
    let mut preview = image.to_rgb();

    for i in 0..4 {
        let (a, b) = (corners[i], corners[(i + 1) % 4]);
        paint_segment(&mut preview, a, b, HALF_WIDTH, OUTLINE);
    }
    for (corner, color) in corners.iter().zip(MARKERS) {
        paint_segment(&mut preview, *corner, *corner, MARKER_RADIUS, color);
    }

    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn gradient(width: u32, height: u32) -> FloatImage {
        FloatImage::from_fn(width, height, 3, |x, y, px| {
            px[0] = x as f32 / width as f32;
            px[1] = y as f32 / height as f32;
            px[2] = 0.5;
        })
    }

    fn rect_params(x0: f64, y0: f64, x1: f64, y1: f64, w: u32, h: u32) -> PerspectiveParams {
        PerspectiveParams {
            top_left: (x0, y0),
            top_right: (x1, y0),
            bottom_right: (x1, y1),
            bottom_left: (x0, y1),
            output_width: w,
            output_height: h,
            ..Default::default()
        }
    }

    #[test]
    fn test_homography_maps_corners() {
        let from = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let to = [(2.0, 1.0), (12.0, 3.0), (11.0, 14.0), (1.0, 9.0)];
        let h = Homography::from_points(&from, &to).unwrap();
        for (f, t) in from.iter().zip(&to) {
            let (x, y) = h.apply(f.0, f.1).unwrap();
            assert_abs_diff_eq!(x, t.0, epsilon = 1e-9);
            assert_abs_diff_eq!(y, t.1, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_degenerate_homography() {
        let from = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let to = [(5.0, 5.0); 4];
        assert!(Homography::from_points(&from, &to).is_none());
    }

    #[test]
    fn test_full_rect_is_identity() {
        let img = gradient(16, 12);
        let result = perspective_crop(&img, &rect_params(0.0, 0.0, 16.0, 12.0, 16, 12));
        assert_eq!(result.dimensions(), (16, 12));
        for (a, b) in result.data.iter().zip(&img.data) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_sub_rect_crop() {
        let img = gradient(40, 40);
        let result = perspective_crop(&img, &rect_params(10.0, 10.0, 30.0, 30.0, 20, 20));
        assert_eq!(result.dimensions(), (20, 20));
        for c in 0..3 {
            assert_abs_diff_eq!(result.get(0, 0, c), img.get(10, 10, c), epsilon = 1e-4);
            assert_abs_diff_eq!(result.get(5, 7, c), img.get(15, 17, c), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_outside_source_uses_fill() {
        let img = FloatImage::filled(10, 10, &[0.5, 0.5, 0.5]);
        let mut params = rect_params(-100.0, -100.0, -50.0, -50.0, 8, 8);
        params.fill_color = FillColor::White;
        let result = perspective_crop(&img, &params);
        for v in &result.data {
            assert_abs_diff_eq!(*v, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_transparent_fill_adds_alpha() {
        let img = FloatImage::filled(10, 10, &[0.5, 0.5, 0.5]);
        let mut params = rect_params(0.0, 0.0, 20.0, 20.0, 20, 20);
        params.fill_color = FillColor::Transparent;
        let result = perspective_crop(&img, &params);
        assert_eq!(result.channels, 4);
        for (got, want) in result.pixel(0, 0).iter().zip([0.5, 0.5, 0.5, 1.0]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-5);
        }
        assert_eq!(result.pixel(19, 19), &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_degenerate_quad_falls_back_to_identity() {
        let img = gradient(16, 16);
        let mut params = rect_params(5.0, 5.0, 5.0, 5.0, 8, 8);
        params.top_right = (5.0, 5.0);
        let result = perspective_crop(&img, &params);
        assert_eq!(result.dimensions(), (8, 8));
        assert_eq!(result.pixel(3, 4), img.pixel(3, 4));
    }

    #[test]
    fn test_adaptive_size() {
        let corners = [(0.0, 0.0), (203.0, 0.0), (203.0, 101.0), (0.0, 101.0)];
        assert_eq!(adaptive_size(&corners), (200, 96));

        let tiny = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert_eq!(adaptive_size(&tiny), (64, 64));

        let huge = [(0.0, 0.0), (5000.0, 0.0), (5000.0, 5000.0), (0.0, 5000.0)];
        assert_eq!(adaptive_size(&huge), (2048, 2048));
    }

    #[test]
    fn test_default_params() {
        let params = PerspectiveParams::default();
        assert_eq!(params.output_size(), (512, 512));
        let adaptive = PerspectiveParams {
            auto_size: true,
            ..params
        };
        assert_eq!(adaptive.output_size(), (200, 200));
    }

    #[test]
    fn test_params_from_partial_json() {
        let params: PerspectiveParams =
            serde_json::from_str(r#"{"top_left":[1.0,2.0],"fill_color":"white"}"#).unwrap();
        assert_eq!(params.top_left, (1.0, 2.0));
        assert_eq!(params.fill_color, FillColor::White);
        assert_eq!(params.bottom_right, (300.0, 300.0));
    }

    #[test]
    fn test_preview_marks_corners() {
        let img = FloatImage::filled(40, 40, &[0.5, 0.5, 0.5]);
        let params = rect_params(10.0, 10.0, 30.0, 30.0, 20, 20);
        let preview = perspective_preview(&img, &params);
        assert_eq!(preview.pixel(10, 10), &[1.0, 0.0, 0.0]);
        assert_eq!(preview.pixel(30, 30), &[0.0, 0.0, 1.0]);
        assert_eq!(preview.pixel(20, 10), &[0.0, 1.0, 1.0]);
        assert_eq!(preview.pixel(20, 20), &[0.5, 0.5, 0.5]);
    }
}
