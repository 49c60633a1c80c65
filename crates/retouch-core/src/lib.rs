//! Retouch Core - Image editing library
//!
//! This crate provides the editing tools behind the retouch panels: tone
//! curves, levels, blend-mode compositing with tonal protection,
//! displacement warping, and geometric tools (crops, rotation,
//! perspective correction and straightening).
//!
//! All tools work on [`FloatImage`], a normalized `f32` buffer. Parameter
//! payloads arrive as strings or JSON; every parser has a
//! `*_or_default` companion that logs and substitutes defaults.

pub mod blend;
pub mod buffer;
pub mod composite;
pub mod curve;
pub mod error;
pub mod levels;
pub mod lut;
pub mod luminance;
pub mod mask;
mod parallel;
pub mod pipeline;
pub mod transform;
pub mod warp;

pub use blend::{blend_images, BlendMode, BlendSpec};
pub use buffer::FloatImage;
pub use composite::{composite, CompositeOptions};
pub use curve::{apply_curves, ControlPoint, ControlPointSet, CurvesPayload};
pub use error::{ImageError, ParamError};
pub use levels::{apply_levels, LevelsConfig, LevelsParams};
pub use lut::{Channel, ChannelLuts, Lut};
pub use mask::{ProtectionConfig, ProtectionMasks};
pub use pipeline::{
    apply_displacement, apply_displacement_batch, displacement_preview, DisplacementParams,
};
pub use transform::{
    apply_crop, apply_rotation, apply_transform, interactive_crop, perspective_crop, ratio_crop,
    straighten, FillColor, InterpolationFilter, TransformParams,
};
pub use warp::{warp, DisplacementField};
