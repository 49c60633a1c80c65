//! Curves and levels WASM bindings.
//!
//! Both panels store their state as strings (a point list or a JSON object
//! keyed by channel), so the payloads pass straight through to the core
//! parsers. Malformed payloads produce identity LUTs, never errors.

use crate::types::JsImage;
use retouch_core::{curve, levels, Channel, ChannelLuts};
use wasm_bindgen::prelude::*;

/// JavaScript-accessible per-channel LUTs.
///
/// Build once from a panel payload and reuse for every preview frame.
///
/// # Example (TypeScript)
/// ```typescript
/// const luts = JsChannelLuts.from_curves("0,0;64,40;192,220;255,255", "RGB");
/// const result = apply_luts(image, luts);
///
/// // Draw the red curve in the panel
/// const red = luts.red();
///
/// luts.free();
/// result.free();
/// ```
#[wasm_bindgen]
pub struct JsChannelLuts {
    inner: ChannelLuts,
}

#[wasm_bindgen]
impl JsChannelLuts {
    /// Build LUTs from a curves payload.
    ///
    /// # Arguments
    /// * `payload` - `"x0,y0;x1,y1;..."` or `{"RGB": "...", "R": "...", ...}`
    /// * `channel` - Target of a flat point list: `RGB`, `R`, `G` or `B`
    pub fn from_curves(payload: &str, channel: &str) -> JsChannelLuts {
        let channel = Channel::from_name_or_default(channel);
        JsChannelLuts {
            inner: curve::build_luts(payload, channel),
        }
    }

    /// Build LUTs from a levels payload
    /// (`{"RGB": {in_black, in_mid, in_white, out_black, out_white}, ...}`).
    pub fn from_levels(payload: &str) -> JsChannelLuts {
        JsChannelLuts {
            inner: levels::build_luts(payload),
        }
    }

    /// Create identity (no-op) LUTs.
    pub fn identity() -> JsChannelLuts {
        JsChannelLuts {
            inner: ChannelLuts::identity(),
        }
    }

    /// Check if these LUTs produce no change.
    pub fn is_identity(&self) -> bool {
        self.inner.is_identity()
    }

    /// Red LUT (256 bytes) where `lut[i]` is the output for input `i`.
    pub fn red(&self) -> Vec<u8> {
        self.inner.r.table.to_vec()
    }

    /// Green LUT (256 bytes).
    pub fn green(&self) -> Vec<u8> {
        self.inner.g.table.to_vec()
    }

    /// Blue LUT (256 bytes).
    pub fn blue(&self) -> Vec<u8> {
        self.inner.b.table.to_vec()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {
        // Dropping self releases the memory
    }
}

/// Apply pre-built LUTs to an image. Alpha is left untouched.
#[wasm_bindgen]
pub fn apply_luts(image: &JsImage, luts: &JsChannelLuts) -> JsImage {
    JsImage::from_float(&luts.inner.apply(&image.to_float()))
}

/// Apply a curves payload to an image.
#[wasm_bindgen]
pub fn apply_curves(image: &JsImage, payload: &str, channel: &str) -> JsImage {
    let channel = Channel::from_name_or_default(channel);
    JsImage::from_float(&curve::apply_curves(&image.to_float(), payload, channel))
}

/// Apply a levels payload to an image.
#[wasm_bindgen]
pub fn apply_levels(image: &JsImage, payload: &str) -> JsImage {
    JsImage::from_float(&levels::apply_levels(&image.to_float(), payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_image;

    #[test]
    fn test_identity_luts() {
        let luts = JsChannelLuts::identity();
        assert!(luts.is_identity());
        assert_eq!(luts.red().len(), 256);
        for (i, &v) in luts.green().iter().enumerate() {
            assert_eq!(v, i as u8);
        }
    }

    #[test]
    fn test_single_channel_curve() {
        let luts = JsChannelLuts::from_curves("0,255;255,0", "R");
        assert_eq!(luts.red()[0], 255);
        assert_eq!(luts.red()[255], 0);
        assert_eq!(luts.green()[0], 0);
        assert_eq!(luts.blue()[255], 255);
    }

    #[test]
    fn test_unknown_channel_targets_all() {
        let luts = JsChannelLuts::from_curves("0,255;255,0", "alpha");
        assert_eq!(luts.red(), luts.green());
        assert_eq!(luts.green(), luts.blue());
        assert_eq!(luts.blue()[0], 255);
    }

    #[test]
    fn test_malformed_payloads_are_identity() {
        assert!(JsChannelLuts::from_curves("0,0;oops", "RGB").is_identity());
        assert!(JsChannelLuts::from_levels("{\"RGB\":").is_identity());
    }

    #[test]
    fn test_apply_identity_keeps_pixels() {
        let image = test_image(3, 2);
        let result = apply_luts(&image, &JsChannelLuts::identity());
        assert_eq!(result.pixels(), image.pixels());

        let result = apply_curves(&image, "0,0;255,255", "RGB");
        assert_eq!(result.pixels(), image.pixels());
    }

    #[test]
    fn test_apply_levels_out_range() {
        let image = JsImage::new(1, 1, vec![0, 128, 255, 200]).unwrap();
        let result = apply_levels(&image, r#"{"RGB":{"out_black":100,"out_white":100}}"#);
        let px = result.pixels();
        assert_eq!(&px[..3], &[100, 100, 100]);
        assert_eq!(px[3], 200);
    }
}
