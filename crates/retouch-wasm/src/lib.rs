//! Retouch WASM - WebAssembly bindings for the retouch editing tools
//!
//! This crate exposes retouch-core to the browser-side editing panels so
//! live previews run the same LUT, warp, blend and crop code as the host.
//!
//! # Module Structure
//!
//! - `types` - RGBA image wrapper and parameter conversion
//! - `curve` - Curves and levels LUTs
//! - `displacement` - Displacement tool and blend-mode compositing
//! - `transform` - Rotation, crops, perspective, straighten and previews
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsImage, apply_curves } from '@retouch/wasm';
//!
//! await init();
//!
//! const data = ctx.getImageData(0, 0, w, h);
//! const image = new JsImage(w, h, new Uint8Array(data.data.buffer));
//! const curved = apply_curves(image, "0,0;64,40;192,220;255,255", "RGB");
//! ```

use wasm_bindgen::prelude::*;

mod curve;
mod displacement;
mod transform;
mod types;

// Re-export public types
pub use curve::{apply_curves, apply_levels, apply_luts, JsChannelLuts};
pub use displacement::{apply_displacement, blend_images, blend_mode_names, displacement_preview};
pub use transform::{
    apply_crop, apply_rotation, crop, perspective_crop, perspective_preview, preview, ratio_crop,
    straighten, straighten_preview, JsCropResult, JsStraightenResult,
};
pub use types::JsImage;

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
