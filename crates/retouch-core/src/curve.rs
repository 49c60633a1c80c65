//! Tone curve interpolation and LUT generation using natural cubic splines.
//!
//! Control points live on the 0-255 integer grid. The spline has zero
//! second derivative at both ends, which reproduces the smooth handles of
//! a Photoshop-style curves dialog.
//!
//! # Payloads
//!
//! The curves panel stores its state as a string, either:
//! - a flat point list `"x0,y0;x1,y1;..."` for the selected channel, or
//! - a JSON object `{"RGB": "...", "R": "...", "G": "...", "B": "..."}`
//!   holding one point list per channel.
//!
//! With the JSON form each channel is mapped through its own curve first
//! and then through the composite RGB curve: `final_r = rgb[r[v]]`.

use serde::Deserialize;

use crate::buffer::FloatImage;
use crate::error::ParamError;
use crate::lut::{Channel, ChannelLuts, Lut};

/// Point list stored by a freshly created curves panel.
pub const DEFAULT_POINTS: &str = "0,0;64,64;128,128;192,192;255,255";

// ============================================================================
// Control points
// ============================================================================

/// A curve control point on the 0-255 grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlPoint {
    /// Input value.
    pub x: u8,
    /// Output value.
    pub y: u8,
}

impl ControlPoint {
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Create a point from arbitrary numbers, truncating toward zero and
    /// clamping to `[0, 255]`.
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self {
            x: to_grid(x),
            y: to_grid(y),
        }
    }
}

#[inline]
fn to_grid(v: f64) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.trunc().clamp(0.0, 255.0) as u8
}

/// Ordered set of control points for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPointSet {
    pub points: Vec<ControlPoint>,
}

impl Default for ControlPointSet {
    fn default() -> Self {
        Self::identity()
    }
}

impl ControlPointSet {
    pub fn new(points: Vec<ControlPoint>) -> Self {
        Self { points }
    }

    /// The two-point straight line `(0,0)`-`(255,255)`.
    pub fn identity() -> Self {
        Self {
            points: vec![ControlPoint::new(0, 0), ControlPoint::new(255, 255)],
        }
    }

    /// Parse a `"x0,y0;x1,y1;..."` point list.
    ///
    /// Blank entries are skipped. Coordinates may be written as floats and
    /// are truncated to integers, then clamped to `[0, 255]`.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry is not a pair of numbers, or if the
    /// list contains no points at all.
    pub fn parse(s: &str) -> Result<Self, ParamError> {
        let mut points = Vec::new();
        for part in s.split(';') {
            let entry = part.trim();
            if entry.is_empty() {
                continue;
            }
            let (x, y) = entry
                .split_once(',')
                .ok_or_else(|| ParamError::InvalidPoint(entry.to_string()))?;
            let x: f64 = x
                .trim()
                .parse()
                .map_err(|_| ParamError::InvalidPoint(entry.to_string()))?;
            let y: f64 = y
                .trim()
                .parse()
                .map_err(|_| ParamError::InvalidPoint(entry.to_string()))?;
            points.push(ControlPoint::from_f64(x, y));
        }
        if points.is_empty() {
            return Err(ParamError::EmptyPointList);
        }
        Ok(Self { points })
    }

    /// Parse a point list, falling back to the identity line.
    pub fn parse_or_default(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|err| {
            tracing::warn!(%err, "malformed curve points, using identity curve");
            Self::identity()
        })
    }

    /// Sort by x and make sure the set spans the full input range.
    ///
    /// `(0,0)` is prepended if the smallest x is not 0, and `(255,255)` is
    /// appended if the largest x is not 255.
    pub fn normalized(&self) -> Self {
        let mut points = self.points.clone();
        points.sort_by_key(|p| p.x);
        match points.first() {
            Some(first) if first.x == 0 => {}
            _ => points.insert(0, ControlPoint::new(0, 0)),
        }
        match points.last() {
            Some(last) if last.x == 255 => {}
            _ => points.push(ControlPoint::new(255, 255)),
        }
        Self { points }
    }

    /// Fit a natural cubic spline and tabulate it at every input level.
    pub fn to_lut(&self) -> Lut {
        let normalized = self.normalized();
        let spline = NaturalSpline::fit(&normalized.points);
        Lut::from_fn(|v| spline.evaluate(v as f64))
    }
}

// ============================================================================
// Natural cubic spline
// ============================================================================

/// Natural cubic spline through sorted knots.
#[derive(Debug, Clone)]
pub struct NaturalSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at the knots.
    y2: Vec<f64>,
}

impl NaturalSpline {
    /// Fit the spline by solving the tridiagonal system for the second
    /// derivatives.
    ///
    /// Knots must be sorted by x. Duplicate x values are tolerated: zero
    /// intervals contribute a zero slope and a zero pivot contributes a
    /// zero second derivative.
    pub fn fit(points: &[ControlPoint]) -> Self {
        let xs: Vec<f64> = points.iter().map(|p| p.x as f64).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.y as f64).collect();
        let n = xs.len();

        let mut y2 = vec![0.0; n];
        let mut u = vec![0.0; n];

        // Forward sweep of the tridiagonal decomposition
        for i in 1..n.saturating_sub(1) {
            let span = xs[i + 1] - xs[i - 1];
            let sig = if span == 0.0 {
                0.0
            } else {
                (xs[i] - xs[i - 1]) / span
            };
            let p = sig * y2[i - 1] + 2.0;
            if p == 0.0 {
                y2[i] = 0.0;
                u[i] = 0.0;
                continue;
            }
            y2[i] = (sig - 1.0) / p;
            u[i] = if span == 0.0 {
                0.0
            } else {
                let right = slope(xs[i], ys[i], xs[i + 1], ys[i + 1]);
                let left = slope(xs[i - 1], ys[i - 1], xs[i], ys[i]);
                (6.0 * (right - left) / span - sig * u[i - 1]) / p
            };
        }

        // Back substitution; natural boundary at the last knot
        if n > 0 {
            y2[n - 1] = 0.0;
        }
        for k in (0..n.saturating_sub(1)).rev() {
            y2[k] = y2[k] * y2[k + 1] + u[k];
        }

        Self { xs, ys, y2 }
    }

    /// Evaluate the spline at `x`.
    ///
    /// Inputs outside the knot range return the nearest end value. An
    /// interval of zero width returns its left knot's value.
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if n == 0 {
            return x;
        }
        if n == 1 || x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }

        // First knot at or beyond x; x is strictly inside the range here
        let khi = self.xs.partition_point(|&k| k < x);
        let klo = khi - 1;

        let h = self.xs[khi] - self.xs[klo];
        if h == 0.0 {
            return self.ys[klo];
        }

        let a = (self.xs[khi] - x) / h;
        let b = (x - self.xs[klo]) / h;
        let y = a * self.ys[klo]
            + b * self.ys[khi]
            + ((a * a * a - a) * self.y2[klo] + (b * b * b - b) * self.y2[khi]) * (h * h) / 6.0;

        if y.is_finite() {
            y
        } else {
            self.ys[klo]
        }
    }
}

#[inline]
fn slope(x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
    let h = x1 - x0;
    if h == 0.0 {
        0.0
    } else {
        (y1 - y0) / h
    }
}

// ============================================================================
// Curves tool payloads
// ============================================================================

/// Per-channel point lists as stored by the curves panel.
///
/// Missing or empty entries leave that channel unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CurvesJson {
    #[serde(rename = "RGB")]
    pub rgb: String,
    #[serde(rename = "R")]
    pub r: String,
    #[serde(rename = "G")]
    pub g: String,
    #[serde(rename = "B")]
    pub b: String,
}

impl CurvesJson {
    /// Build the composed per-channel LUTs (channel curve, then RGB curve).
    pub fn to_luts(&self) -> ChannelLuts {
        let per_channel = ChannelLuts {
            r: channel_lut(&self.r),
            g: channel_lut(&self.g),
            b: channel_lut(&self.b),
        };
        per_channel.then_composite(&channel_lut(&self.rgb))
    }
}

fn channel_lut(points: &str) -> Lut {
    if points.trim().is_empty() {
        return Lut::identity();
    }
    ControlPointSet::parse_or_default(points).to_lut()
}

/// A parsed curves payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurvesPayload {
    /// One point list applied to the selected channel.
    Points(ControlPointSet),
    /// One point list per channel plus the composite.
    PerChannel(CurvesJson),
}

impl CurvesPayload {
    /// Parse a flat point list or a JSON object keyed by channel name.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed point lists or JSON.
    pub fn parse(payload: &str) -> Result<Self, ParamError> {
        if payload.trim_start().starts_with('{') {
            let json: CurvesJson = serde_json::from_str(payload)?;
            Ok(CurvesPayload::PerChannel(json))
        } else {
            ControlPointSet::parse(payload).map(CurvesPayload::Points)
        }
    }

    /// Build the LUTs for this payload; `channel` selects the target of a
    /// flat point list and is ignored for per-channel payloads.
    pub fn to_luts(&self, channel: Channel) -> ChannelLuts {
        match self {
            CurvesPayload::Points(points) => ChannelLuts::single(channel, points.to_lut()),
            CurvesPayload::PerChannel(json) => json.to_luts(),
        }
    }
}

/// Build per-channel LUTs from a curves payload.
///
/// Malformed payloads fail closed to the identity mapping.
pub fn build_luts(payload: &str, channel: Channel) -> ChannelLuts {
    match CurvesPayload::parse(payload) {
        Ok(parsed) => parsed.to_luts(channel),
        Err(err) => {
            tracing::warn!(%err, %channel, "malformed curves payload, using identity");
            ChannelLuts::identity()
        }
    }
}

/// Apply a curves payload to an image.
pub fn apply_curves(image: &FloatImage, payload: &str, channel: Channel) -> FloatImage {
    tracing::debug!(
        width = image.width,
        height = image.height,
        %channel,
        "Applying curves"
    );
    build_luts(payload, channel).apply(image)
}

// ============================================================================
// Tests
// ============================================================================
