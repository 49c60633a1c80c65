//! The image type shared by every binding.
//!
//! Images cross the boundary as 8-bit RGBA, the layout of a canvas
//! `ImageData`, and are converted to [`FloatImage`] for the core tools.

use retouch_core::transform::FilterType;
use retouch_core::FloatImage;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

/// 8-bit RGBA pixels owned by WASM memory.
///
/// `pixels()` copies the buffer out as a `Uint8Array`, ready for
/// `new ImageData(new Uint8ClampedArray(bytes), width, height)`.
#[wasm_bindgen]
#[derive(Clone)]
pub struct JsImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsImage {
    /// Wrap row-major RGBA bytes, as found in `ImageData.data`.
    ///
    /// Fails unless `pixels` holds exactly `width * height * 4` bytes.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<JsImage, JsValue> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(JsValue::from_str(&format!(
                "Invalid pixel buffer: expected {} bytes, got {}",
                expected,
                pixels.len()
            )));
        }
        Ok(JsImage {
            width,
            height,
            pixels,
        })
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `width * height * 4`.
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Copy of the RGBA bytes.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Release the buffer now instead of waiting for the JS finalizer.
    pub fn free(self) {}
}

impl JsImage {
    /// Convert to a float image for the core tools.
    pub(crate) fn to_float(&self) -> FloatImage {
        // Length is validated by the constructor.
        FloatImage::from_rgba8(self.width, self.height, &self.pixels)
            .unwrap_or_else(|_| FloatImage::zeros(self.width, self.height, 4))
    }

    /// Wrap a core result, adding opaque alpha when it has none.
    pub(crate) fn from_float(image: &FloatImage) -> Self {
        Self {
            width: image.width,
            height: image.height,
            pixels: image.to_rgba8(),
        }
    }

    /// Same as [`JsImage::to_float`] without the alpha channel.
    pub(crate) fn to_float_rgb(&self) -> FloatImage {
        self.to_float().to_rgb()
    }
}

/// Deserialize a JS parameter object; `undefined` and `null` mean defaults.
pub(crate) fn params_from_js<T>(value: JsValue, what: &str) -> Result<T, JsValue>
where
    T: DeserializeOwned + Default,
{
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", what, e)))
}

/// Panel filter codes: 0 Nearest, 2 Lanczos3, anything else Bilinear.
pub(crate) fn filter_from_u8(code: u8) -> FilterType {
    match code {
        0 => FilterType::Nearest,
        2 => FilterType::Lanczos3,
        _ => FilterType::Bilinear,
    }
}

#[cfg(test)]
pub(crate) fn test_image(width: u32, height: u32) -> JsImage {
    let pixels: Vec<u8> = (0..(width * height * 4) as usize)
        .map(|i| if i % 4 == 3 { 255 } else { (i % 256) as u8 })
        .collect();
    JsImage {
        width,
        height,
        pixels,
    }
}
