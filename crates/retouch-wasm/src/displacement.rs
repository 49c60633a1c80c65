//! Displacement and compositing WASM bindings.
//!
//! Parameter objects are plain JS objects deserialized with
//! `serde_wasm_bindgen`; missing fields take the core defaults and
//! `undefined` selects the defaults wholesale.

use crate::types::{params_from_js, JsImage};
use retouch_core::pipeline::{self, DisplacementParams};
use retouch_core::{composite, BlendMode, BlendSpec, CompositeOptions};
use wasm_bindgen::prelude::*;

/// Run the displacement tool.
///
/// # Arguments
///
/// * `texture` - Layer to wrap onto the surface
/// * `displacement` - Map whose brightness pushes the texture around
/// * `background` - Surface to composite onto; omit for the bare warp
/// * `params` - `{strength, horizontal_scale, vertical_scale, blur_radius,
///   transform: {scale, rotation_degrees, offset_x, offset_y, width, height}}`
/// * `options` - `{blend: {mode, opacity}, highlights: {...}, shadows: {...}}`
///
/// # Errors
///
/// Returns error if `params` or `options` cannot be deserialized
///
/// # Example (TypeScript)
///
/// ```typescript
/// const result = apply_displacement(texture, map, background,
///   { strength: 25, transform: { scale: 0.5 } },
///   { blend: { mode: "multiply", opacity: 0.9 } });
/// ```
#[wasm_bindgen]
pub fn apply_displacement(
    texture: &JsImage,
    displacement: &JsImage,
    background: Option<JsImage>,
    params: JsValue,
    options: JsValue,
) -> Result<JsImage, JsValue> {
    let params: DisplacementParams = params_from_js(params, "displacement parameters")?;
    let options: CompositeOptions = params_from_js(options, "composite options")?;
    Ok(displace(
        texture,
        displacement,
        background.as_ref(),
        &params,
        &options,
    ))
}

fn displace(
    texture: &JsImage,
    displacement: &JsImage,
    background: Option<&JsImage>,
    params: &DisplacementParams,
    options: &CompositeOptions,
) -> JsImage {
    let background = background.map(JsImage::to_float_rgb);
    let result = pipeline::apply_displacement(
        &texture.to_float_rgb(),
        &displacement.to_float_rgb(),
        background.as_ref(),
        params,
        options,
    );
    JsImage::from_float(&result)
}

/// Overlay the displacement map on a result at 30% for the panel preview.
#[wasm_bindgen]
pub fn displacement_preview(result: &JsImage, displacement: &JsImage) -> JsImage {
    JsImage::from_float(&pipeline::displacement_preview(
        &result.to_float_rgb(),
        &displacement.to_float_rgb(),
    ))
}

/// Blend two images with a single blend mode, no tonal protection.
///
/// Unknown mode names fall back to `normal`. The foreground is resized to
/// the background when their sizes differ.
#[wasm_bindgen]
pub fn blend_images(
    background: &JsImage,
    foreground: &JsImage,
    mode: &str,
    opacity: f32,
) -> JsImage {
    let spec = BlendSpec::new(BlendMode::from_name_or_default(mode), opacity);
    JsImage::from_float(&composite(
        Some(&background.to_float()),
        &foreground.to_float(),
        &CompositeOptions::unprotected(spec),
    ))
}

/// Names of every supported blend mode, in panel order.
#[wasm_bindgen]
pub fn blend_mode_names() -> Vec<String> {
    BlendMode::ALL.iter().map(|m| m.name().to_string()).collect()
}
