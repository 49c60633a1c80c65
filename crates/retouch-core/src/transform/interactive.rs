//! Panel-driven crops: a free crop window over a rotated and scaled image,
//! and a fixed-aspect crop window over the untouched image.
//!
//! Both tools centre their window on the (transformed) image and move it
//! by a pixel offset. The window may run off the image; uncovered area is
//! black.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::crop::{crop_preview, crop_region, CropWindow};
use super::fill::FillColor;
use super::resize::{resize, scaled_dimensions, FilterType};
use super::rotation::rotate_clockwise;
use super::sample::InterpolationFilter;
use crate::buffer::FloatImage;
use crate::error::ParamError;

/// Smallest and largest scale the crop panels accept.
const MIN_SCALE: f64 = 0.1;
const MAX_SCALE: f64 = 5.0;

/// Scale factor safe to resample with: non-finite falls back to 1.0.
fn sanitize_scale(scale: f64) -> f64 {
    if scale.is_finite() {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        1.0
    }
}

/// Result of a panel crop.
#[derive(Debug, Clone, PartialEq)]
pub struct CropOutput {
    /// The cropped pixels, exactly the window size.
    pub cropped: FloatImage,
    /// The transformed image with the window outlined and the rest shaded.
    pub preview: FloatImage,
    /// Where the window sat on the transformed image.
    pub window: CropWindow,
}

impl CropOutput {
    fn new(transformed: &FloatImage, window: CropWindow) -> Self {
        Self {
            cropped: crop_region(transformed, window),
            preview: crop_preview(transformed, window),
            window,
        }
    }
}

// =============================================================================
// Interactive crop
// =============================================================================

/// Parameters of the free crop tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropParams {
    pub crop_width: u32,
    pub crop_height: u32,
    pub offset_x: i64,
    pub offset_y: i64,
    /// Uniform scale applied after rotation.
    pub scale: f64,
    /// Degrees, positive = clockwise.
    pub rotation: f64,
}

impl Default for CropParams {
    fn default() -> Self {
        Self {
            crop_width: 512,
            crop_height: 512,
            offset_x: 0,
            offset_y: 0,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

/// Rotate, scale, then cut a centred window out of `image`.
///
/// Rotation expands the canvas and fills the corners with black. Scaling
/// uses Lanczos3 and floors the new dimensions.
pub fn interactive_crop(image: &FloatImage, params: &CropParams) -> CropOutput {
    let crop_width = params.crop_width.max(1);
    let crop_height = params.crop_height.max(1);
    let scale = sanitize_scale(params.scale);

    tracing::debug!(
        width = image.width,
        height = image.height,
        crop_width,
        crop_height,
        scale,
        rotation = params.rotation,
        "Interactive crop"
    );

    let mut transformed = if params.rotation != 0.0 {
        rotate_clockwise(
            image,
            params.rotation,
            InterpolationFilter::Lanczos3,
            FillColor::Black,
        )
    } else {
        image.clone()
    };

    if scale != 1.0 && !transformed.is_empty() {
        let (w, h) = scaled_dimensions(transformed.width, transformed.height, scale);
        match resize(&transformed, w, h, FilterType::Lanczos3) {
            Ok(scaled) => transformed = scaled,
            Err(err) => tracing::warn!(%err, "keeping unscaled image for crop"),
        }
    }

    let window = CropWindow::centered(
        transformed.width,
        transformed.height,
        crop_width,
        crop_height,
        params.offset_x,
        params.offset_y,
    );
    CropOutput::new(&transformed, window)
}

// =============================================================================
// Ratio crop
// =============================================================================

/// Aspect ratio presets of the ratio crop tool.
///
/// An unknown preset deserializes as [`AspectRatio::Square`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    ThreeFour,
    #[serde(rename = "4:3")]
    FourThree,
    #[serde(rename = "16:9")]
    SixteenNine,
    #[serde(rename = "9:16")]
    NineSixteen,
    #[serde(rename = "21:9")]
    TwentyOneNine,
    #[serde(rename = "9:21")]
    NineTwentyOne,
    /// Free-form: the window is square and sized by `crop_size` alone.
    #[serde(rename = "custom")]
    Custom,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 8] = [
        AspectRatio::Square,
        AspectRatio::ThreeFour,
        AspectRatio::FourThree,
        AspectRatio::SixteenNine,
        AspectRatio::NineSixteen,
        AspectRatio::TwentyOneNine,
        AspectRatio::NineTwentyOne,
        AspectRatio::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::ThreeFour => "3:4",
            AspectRatio::FourThree => "4:3",
            AspectRatio::SixteenNine => "16:9",
            AspectRatio::NineSixteen => "9:16",
            AspectRatio::TwentyOneNine => "21:9",
            AspectRatio::NineTwentyOne => "9:21",
            AspectRatio::Custom => "custom",
        }
    }

    /// Parse a preset, treating unknown names as square.
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|err: ParamError| {
            tracing::warn!(%err, "falling back to 1:1 aspect ratio");
            AspectRatio::Square
        })
    }

    /// Width over height, or `None` for [`AspectRatio::Custom`].
    pub fn ratio(self) -> Option<f64> {
        let (w, h) = match self {
            AspectRatio::Square => (1.0, 1.0),
            AspectRatio::ThreeFour => (3.0, 4.0),
            AspectRatio::FourThree => (4.0, 3.0),
            AspectRatio::SixteenNine => (16.0, 9.0),
            AspectRatio::NineSixteen => (9.0, 16.0),
            AspectRatio::TwentyOneNine => (21.0, 9.0),
            AspectRatio::NineTwentyOne => (9.0, 21.0),
            AspectRatio::Custom => return None,
        };
        Some(w / h)
    }

    /// Window size for a `size` box scaled by `scale`.
    ///
    /// Landscape ratios keep the width at `size * scale`; portrait ratios
    /// keep the height. Fractions are truncated.
    pub fn window_size(self, size: u32, scale: f64) -> (u32, u32) {
        let side = size as f64 * scale;
        let (w, h) = match self.ratio() {
            None => (side, side),
            Some(ratio) if ratio >= 1.0 => (side, side / ratio),
            Some(ratio) => (side * ratio, side),
        };
        ((w as u32).max(1), (h as u32).max(1))
    }
}

impl FromStr for AspectRatio {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        AspectRatio::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParamError::UnknownAspectRatio(s.to_string()))
    }
}

impl From<String> for AspectRatio {
    fn from(name: String) -> Self {
        AspectRatio::from_name_or_default(&name)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameters of the ratio crop tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatioCropParams {
    pub aspect_ratio: AspectRatio,
    pub crop_size: u32,
    pub crop_x: i64,
    pub crop_y: i64,
    pub crop_scale: f64,
}

impl Default for RatioCropParams {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::Square,
            crop_size: 512,
            crop_x: 0,
            crop_y: 0,
            crop_scale: 1.0,
        }
    }
}

/// Cut a window of the chosen aspect ratio out of `image`.
///
/// The image itself is never resampled; `crop_scale` only resizes the
/// window.
pub fn ratio_crop(image: &FloatImage, params: &RatioCropParams) -> CropOutput {
    let scale = sanitize_scale(params.crop_scale);
    let (width, height) = params.aspect_ratio.window_size(params.crop_size, scale);

    tracing::debug!(
        ratio = %params.aspect_ratio,
        crop_width = width,
        crop_height = height,
        "Ratio crop"
    );

    let window = CropWindow::centered(
        image.width,
        image.height,
        width,
        height,
        params.crop_x,
        params.crop_y,
    );
    CropOutput::new(image, window)
}
