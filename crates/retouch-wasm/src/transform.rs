//! WASM bindings for the geometric tools.
//!
//! Rotation, crops, perspective correction, straightening and preview
//! generation for the crop and perspective panels.

use crate::types::{filter_from_u8, params_from_js, JsImage};
use retouch_core::transform::{
    apply_crop as core_crop, apply_rotation as core_rotate, generate_preview, interactive_crop,
    perspective_crop as core_perspective, perspective_preview as core_perspective_preview,
    ratio_crop as core_ratio_crop, resize_to_fit, straighten as core_straighten,
    straighten_preview as core_straighten_preview, CropOutput, CropParams, FillColor,
    InterpolationFilter, PerspectiveParams, RatioCropParams, StraightenParams,
};
use wasm_bindgen::prelude::*;

/// Result of a crop tool: the cropped image and the panel preview.
#[wasm_bindgen]
pub struct JsCropResult {
    cropped: JsImage,
    preview: JsImage,
}

#[wasm_bindgen]
impl JsCropResult {
    /// The cropped image.
    pub fn cropped(&self) -> JsImage {
        self.cropped.clone()
    }

    /// The source with the crop window outlined.
    pub fn preview(&self) -> JsImage {
        self.preview.clone()
    }
}

impl JsCropResult {
    fn from_output(output: &CropOutput) -> Self {
        Self {
            cropped: JsImage::from_float(&output.cropped),
            preview: JsImage::from_float(&output.preview),
        }
    }
}

/// Result of the straighten tool.
#[wasm_bindgen]
pub struct JsStraightenResult {
    image: JsImage,
    angle: f64,
}

#[wasm_bindgen]
impl JsStraightenResult {
    pub fn image(&self) -> JsImage {
        self.image.clone()
    }

    /// Angle actually applied, in degrees (counter-clockwise positive).
    #[wasm_bindgen(getter)]
    pub fn angle(&self) -> f64 {
        self.angle
    }
}

/// Rotate counter-clockwise onto an expanded canvas.
///
/// `fill` is `black`, `white` or `transparent`; unknown names fall back to
/// black. Bilinear unless `use_lanczos` is set.
///
/// ```typescript
/// const tilted = apply_rotation(layer, 15.0, false, "transparent");
/// ```
#[wasm_bindgen]
pub fn apply_rotation(
    image: &JsImage,
    angle_degrees: f64,
    use_lanczos: bool,
    fill: &str,
) -> JsImage {
    let filter = match use_lanczos {
        true => InterpolationFilter::Lanczos3,
        false => InterpolationFilter::Bilinear,
    };
    JsImage::from_float(&core_rotate(
        &image.to_float(),
        angle_degrees,
        filter,
        FillColor::from_name_or_default(fill),
    ))
}

/// Crop by fractions of the image size, as the thumbnail strip does.
#[wasm_bindgen]
pub fn apply_crop(image: &JsImage, left: f64, top: f64, width: f64, height: f64) -> JsImage {
    JsImage::from_float(&core_crop(&image.to_float(), left, top, width, height))
}

/// Rotate, scale and cut a fixed-size window out of an image.
///
/// `params`: `{crop_width, crop_height, offset_x, offset_y, scale, rotation}`.
///
/// # Errors
///
/// Returns error if `params` cannot be deserialized
#[wasm_bindgen]
pub fn crop(image: &JsImage, params: JsValue) -> Result<JsCropResult, JsValue> {
    let params: CropParams = params_from_js(params, "crop parameters")?;
    Ok(JsCropResult::from_output(&interactive_crop(
        &image.to_float_rgb(),
        &params,
    )))
}

/// Cut an aspect-ratio preset window out of an image.
///
/// `params`: `{aspect_ratio: "16:9", crop_size, crop_x, crop_y, crop_scale}`.
///
/// # Errors
///
/// Returns error if `params` cannot be deserialized
#[wasm_bindgen]
pub fn ratio_crop(image: &JsImage, params: JsValue) -> Result<JsCropResult, JsValue> {
    let params: RatioCropParams = params_from_js(params, "ratio crop parameters")?;
    Ok(JsCropResult::from_output(&core_ratio_crop(
        &image.to_float_rgb(),
        &params,
    )))
}

/// Map a quadrilateral onto a rectangle.
///
/// `params`: `{top_left: [x, y], top_right, bottom_right, bottom_left,
/// auto_size, output_width, output_height, fill_color}`.
///
/// # Errors
///
/// Returns error if `params` cannot be deserialized
#[wasm_bindgen]
pub fn perspective_crop(image: &JsImage, params: JsValue) -> Result<JsImage, JsValue> {
    let params: PerspectiveParams = params_from_js(params, "perspective parameters")?;
    Ok(JsImage::from_float(&core_perspective(
        &image.to_float(),
        &params,
    )))
}

/// Source image with the quadrilateral and its corners drawn on it.
///
/// # Errors
///
/// Returns error if `params` cannot be deserialized
#[wasm_bindgen]
pub fn perspective_preview(image: &JsImage, params: JsValue) -> Result<JsImage, JsValue> {
    let params: PerspectiveParams = params_from_js(params, "perspective parameters")?;
    Ok(JsImage::from_float(&core_perspective_preview(
        &image.to_float_rgb(),
        &params,
    )))
}

/// Level an image by angle or by a reference line.
///
/// `params`: `{rotation_angle, reference_line: [x1, y1, x2, y2], auto_crop,
/// fill_color}`.
///
/// # Errors
///
/// Returns error if `params` cannot be deserialized
#[wasm_bindgen]
pub fn straighten(image: &JsImage, params: JsValue) -> Result<JsStraightenResult, JsValue> {
    let params: StraightenParams = params_from_js(params, "straighten parameters")?;
    Ok(straighten_with(image, &params))
}

fn straighten_with(image: &JsImage, params: &StraightenParams) -> JsStraightenResult {
    let (result, angle) = core_straighten(&image.to_float(), params);
    JsStraightenResult {
        image: JsImage::from_float(&result),
        angle,
    }
}

/// Source image with the reference line and its end points drawn on it.
///
/// # Errors
///
/// Returns error if `params` cannot be deserialized
#[wasm_bindgen]
pub fn straighten_preview(image: &JsImage, params: JsValue) -> Result<JsImage, JsValue> {
    let params: StraightenParams = params_from_js(params, "straighten parameters")?;
    Ok(JsImage::from_float(&core_straighten_preview(
        &image.to_float_rgb(),
        &params,
    )))
}

/// Downscale an image so its longest edge fits `max_edge` (never upscales).
///
/// # Arguments
///
/// * `image` - Source image
/// * `max_edge` - Longest edge in pixels; 0 uses the panel default (512)
/// * `filter` - 0 = nearest, 1 = bilinear, 2 = Lanczos3
///
/// # Errors
///
/// Returns error if the source image is empty
#[wasm_bindgen]
pub fn preview(image: &JsImage, max_edge: u32, filter: u8) -> Result<JsImage, JsValue> {
    let source = image.to_float();
    let result = if max_edge == 0 {
        generate_preview(&source, retouch_core::transform::PREVIEW_MAX_EDGE)
    } else {
        resize_to_fit(&source, max_edge, filter_from_u8(filter))
    };
    result
        .map(|img| JsImage::from_float(&img))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
