//! Error types for parameter parsing and image construction.
//!
//! Parse errors never escape the editing tools: every parser has a
//! `*_or_default` companion that logs the error and substitutes the
//! documented default configuration.

use thiserror::Error;

/// Errors raised while parsing string-encoded tool parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    /// A control point entry could not be parsed as `x,y`.
    #[error("Invalid control point: {0:?}")]
    InvalidPoint(String),

    /// The control point list contained no points.
    #[error("Control point list is empty")]
    EmptyPointList,

    /// A JSON payload could not be parsed.
    #[error("Invalid JSON payload: {0}")]
    Json(String),

    /// A channel selector other than RGB, R, G or B.
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// A blend mode name outside the supported set.
    #[error("Unknown blend mode: {0}")]
    UnknownBlendMode(String),

    /// A fill color name other than black, white or transparent.
    #[error("Unknown fill color: {0}")]
    UnknownFillColor(String),

    /// An aspect ratio preset that is not recognized.
    #[error("Unknown aspect ratio: {0}")]
    UnknownAspectRatio(String),
}

impl From<serde_json::Error> for ParamError {
    fn from(err: serde_json::Error) -> Self {
        ParamError::Json(err.to_string())
    }
}

/// Errors raised when constructing or resampling a [`crate::FloatImage`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImageError {
    /// The sample buffer length does not match `width * height * channels`.
    #[error("Sample buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Only 1 (mask), 3 (RGB) and 4 (RGBA) channels are supported.
    #[error("Unsupported channel count: {0}")]
    UnsupportedChannels(usize),

    /// Width or height is zero.
    #[error("Image dimensions must be non-zero")]
    EmptyDimensions,

    /// The resampling backend rejected the buffer.
    #[error("Resample failed: {0}")]
    Resample(String),
}
