//! Geometric operations: texture transforms, rotation, crops and
//! perspective correction.
//!
//! Every function takes an image by reference and returns a new one.
//!
//! # Texture Transform Order
//!
//! A texture layer is transformed in this order:
//! 1. Scale (explicit size or uniform factor, Lanczos3)
//! 2. Rotation about the centre, canvas expanded, corners filled
//! 3. Translation when pasted onto the target canvas
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner, y points down
//! - [`apply_rotation`] and the straighten tool take counter-clockwise
//!   positive angles; texture and crop-panel rotations are clockwise
//!   positive ([`rotate_clockwise`])
//! - Normalized crop coordinates are 0.0 to 1.0; crop windows are pixels

mod compose;
mod crop;
mod fill;
mod interactive;
mod overlay;
mod paste;
mod perspective;
mod resize;
mod rotation;
mod sample;
mod straighten;

pub use compose::{apply_transform, scale_layer, TransformParams};
pub use crop::{apply_crop, crop_preview, crop_region, CropWindow};
pub use fill::FillColor;
pub use interactive::{
    interactive_crop, ratio_crop, AspectRatio, CropOutput, CropParams, RatioCropParams,
};
pub use paste::place_on_canvas;
pub(crate) use paste::with_channels;
pub use perspective::{
    adaptive_size, perspective_crop, perspective_preview, Homography, PerspectiveParams, Point,
};
pub use resize::{
    generate_preview, resize, resize_to_fit, scaled_dimensions, FilterType, PREVIEW_MAX_EDGE,
};
pub use rotation::{apply_rotation, compute_rotated_bounds, rotate_clockwise};
pub use sample::InterpolationFilter;
pub use straighten::{
    auto_crop, straighten, straighten_preview, StraightenParams, UNSET_REFERENCE_LINE,
};
