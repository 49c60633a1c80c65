//! Straighten a tilted image from an angle or a drawn reference line.

use serde::{Deserialize, Serialize};

use super::crop::{crop_region, CropWindow};
use super::fill::FillColor;
use super::overlay::paint_segment;
use super::rotation::apply_rotation;
use super::sample::InterpolationFilter;
use crate::buffer::FloatImage;

/// The panel's "no line drawn" reference line.
pub const UNSET_REFERENCE_LINE: (f64, f64, f64, f64) = (0.0, 0.0, 100.0, 0.0);

/// Lines shorter than this on both axes do not define an angle.
const MIN_LINE_EXTENT: f64 = 0.1;

/// Parameters of the straighten tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StraightenParams {
    /// Degrees, positive = counter-clockwise. Used when no line is drawn.
    pub rotation_angle: f64,
    /// `(x1, y1, x2, y2)` in image pixels, along a feature that should be
    /// horizontal.
    pub reference_line: (f64, f64, f64, f64),
    /// Trim the expanded canvas back to a centred rectangle.
    pub auto_crop: bool,
    pub fill_color: FillColor,
}

impl Default for StraightenParams {
    fn default() -> Self {
        Self {
            rotation_angle: 0.0,
            reference_line: UNSET_REFERENCE_LINE,
            auto_crop: true,
            fill_color: FillColor::Black,
        }
    }
}

impl StraightenParams {
    fn has_reference_line(&self) -> bool {
        self.reference_line != UNSET_REFERENCE_LINE
    }

    /// The angle to rotate by: the reference line's slope when one is
    /// drawn, otherwise `rotation_angle`.
    pub fn effective_angle(&self) -> f64 {
        if self.has_reference_line() {
            let (x1, y1, x2, y2) = self.reference_line;
            let (dx, dy) = (x2 - x1, y2 - y1);
            if dx.abs() > MIN_LINE_EXTENT || dy.abs() > MIN_LINE_EXTENT {
                return dy.atan2(dx).to_degrees();
            }
        }
        self.rotation_angle
    }
}

/// Rotate `image` so the reference feature becomes level.
///
/// Returns the straightened image and the angle used (degrees,
/// counter-clockwise). The fill colour only matters when the image is
/// actually rotated.
pub fn straighten(image: &FloatImage, params: &StraightenParams) -> (FloatImage, f64) {
    let angle = params.effective_angle();

    tracing::debug!(
        width = image.width,
        height = image.height,
        angle,
        auto_crop = params.auto_crop,
        "Straightening image"
    );

    let rotated = if angle != 0.0 {
        apply_rotation(
            image,
            angle,
            InterpolationFilter::Lanczos3,
            params.fill_color,
        )
    } else {
        image.clone()
    };

    let result = if params.auto_crop {
        auto_crop(&rotated, angle)
    } else {
        rotated
    };
    (result, angle)
}

/// Trim a rotated canvas to a centred rectangle.
///
/// The short side is kept and the long side is cut down to match it.
/// Bounds are truncated to whole pixels.
pub fn auto_crop(image: &FloatImage, angle_degrees: f64) -> FloatImage {
    if angle_degrees == 0.0 || image.is_empty() {
        return image.clone();
    }

    // Half turns leave nothing to trim.
    if angle_degrees.to_radians().sin().abs() < 1e-10 {
        return image.clone();
    }

    let width = image.width as f64;
    let height = image.height as f64;
    let side = width.min(height);
    let (new_width, new_height) = (side, side);

    let left = (width - new_width) / 2.0;
    let top = (height - new_height) / 2.0;
    let (x0, y0) = (left as i64, top as i64);
    let (x1, y1) = ((left + new_width) as i64, (top + new_height) as i64);

    crop_region(
        image,
        CropWindow::new(x0, y0, (x1 - x0).max(1) as u32, (y1 - y0).max(1) as u32),
    )
}

/// Panel preview: the source with the reference line drawn in cyan and
/// its end points in red.
///
/// The line is clamped to the image; nothing is drawn for the unset line.
pub fn straighten_preview(image: &FloatImage, params: &StraightenParams) -> FloatImage {
    let mut preview = image.to_rgb();
    if !params.has_reference_line() {
        return preview;
    }

    let (x1, y1, x2, y2) = params.reference_line;
    let w = image.width as f64;
    let h = image.height as f64;
    let a = (x1.clamp(0.0, w), y1.clamp(0.0, h));
    let b = (x2.clamp(0.0, w), y2.clamp(0.0, h));

    paint_segment(&mut preview, a, b, 1.5, [0.0, 1.0, 1.0]);
    paint_segment(&mut preview, a, a, 8.0, [1.0, 0.0, 0.0]);
    paint_segment(&mut preview, b, b, 8.0, [1.0, 0.0, 0.0]);
    preview
}
