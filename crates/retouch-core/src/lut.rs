//! 256-entry lookup tables shared by the curves and levels tools.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::buffer::FloatImage;
use crate::error::ParamError;
use crate::parallel::for_each_row;

// ============================================================================
// LUT Type
// ============================================================================

/// Pre-computed 256-entry lookup table: `table[input] = output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lut {
    pub table: [u8; 256],
}

impl Lut {
    /// Create identity LUT (no change).
    pub fn identity() -> Self {
        let mut table = [0u8; 256];
        for (i, value) in table.iter_mut().enumerate() {
            *value = i as u8;
        }
        Self { table }
    }

    /// Build a LUT by evaluating `f` at every integer input.
    ///
    /// Outputs are clamped to `[0, 255]` and rounded; NaN maps to 0.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(u8) -> f64,
    {
        let mut table = [0u8; 256];
        for (i, value) in table.iter_mut().enumerate() {
            let y = f(i as u8);
            *value = if y.is_nan() {
                0
            } else {
                y.clamp(0.0, 255.0).round() as u8
            };
        }
        Self { table }
    }

    /// Check if this LUT is identity.
    pub fn is_identity(&self) -> bool {
        self.table.iter().enumerate().all(|(i, &v)| v == i as u8)
    }

    /// Look up a single value.
    #[inline]
    pub fn get(&self, v: u8) -> u8 {
        self.table[v as usize]
    }

    /// Compose with `next`, mapping through `self` first: `next[self[v]]`.
    pub fn then(&self, next: &Lut) -> Lut {
        let mut table = [0u8; 256];
        for (i, value) in table.iter_mut().enumerate() {
            *value = next.get(self.table[i]);
        }
        Lut { table }
    }
}

impl Default for Lut {
    fn default() -> Self {
        Self::identity()
    }
}

// ============================================================================
// Channel selection
// ============================================================================

/// Channel a curve or levels adjustment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Channel {
    /// All three colour channels (the composite curve).
    #[default]
    #[serde(rename = "RGB")]
    Rgb,
    #[serde(rename = "R")]
    R,
    #[serde(rename = "G")]
    G,
    #[serde(rename = "B")]
    B,
}

impl Channel {
    /// Key used in JSON payloads and the channel selector.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Rgb => "RGB",
            Channel::R => "R",
            Channel::G => "G",
            Channel::B => "B",
        }
    }

    /// Parse a selector, falling back to [`Channel::Rgb`].
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|err: ParamError| {
            tracing::warn!(%err, "falling back to RGB channel");
            Channel::Rgb
        })
    }
}

impl FromStr for Channel {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "RGB" | "rgb" => Ok(Channel::Rgb),
            "R" | "r" => Ok(Channel::R),
            "G" | "g" => Ok(Channel::G),
            "B" | "b" => Ok(Channel::B),
            other => Err(ParamError::UnknownChannel(other.to_string())),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Per-channel LUTs
// ============================================================================

/// One LUT per colour channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelLuts {
    pub r: Lut,
    pub g: Lut,
    pub b: Lut,
}

impl ChannelLuts {
    /// Identity on all channels.
    pub fn identity() -> Self {
        Self::default()
    }

    /// The same LUT on all three channels.
    pub fn uniform(lut: Lut) -> Self {
        Self {
            r: lut,
            g: lut,
            b: lut,
        }
    }

    /// `lut` on the selected channel, identity elsewhere.
    ///
    /// [`Channel::Rgb`] selects all three channels.
    pub fn single(channel: Channel, lut: Lut) -> Self {
        let identity = Lut::identity();
        match channel {
            Channel::Rgb => Self::uniform(lut),
            Channel::R => Self {
                r: lut,
                g: identity,
                b: identity,
            },
            Channel::G => Self {
                r: identity,
                g: lut,
                b: identity,
            },
            Channel::B => Self {
                r: identity,
                g: identity,
                b: lut,
            },
        }
    }

    /// Map each channel through its own LUT, then through `composite`.
    pub fn then_composite(&self, composite: &Lut) -> Self {
        Self {
            r: self.r.then(composite),
            g: self.g.then(composite),
            b: self.b.then(composite),
        }
    }

    /// Map through `composite` first, then through each channel's own LUT.
    pub fn after_composite(&self, composite: &Lut) -> Self {
        Self {
            r: composite.then(&self.r),
            g: composite.then(&self.g),
            b: composite.then(&self.b),
        }
    }

    /// Check if all three LUTs are identity.
    pub fn is_identity(&self) -> bool {
        self.r.is_identity() && self.g.is_identity() && self.b.is_identity()
    }

    /// Apply the LUTs to an image, producing a new image.
    ///
    /// Colour samples are quantized to 8 bits the way the host converts
    /// float buffers (`clamp(v) * 255`, truncated), mapped, and normalized
    /// back. Alpha is left untouched; masks are expanded to RGB first.
    pub fn apply(&self, image: &FloatImage) -> FloatImage {
        // Early exit for identity
        if self.is_identity() {
            return image.clone();
        }

        let mut output = if image.channels == 1 {
            image.to_rgb()
        } else {
            image.clone()
        };
        let channels = output.channels;
        let row_len = output.row_len();
        let luts = [&self.r, &self.g, &self.b];

        for_each_row(&mut output.data, row_len, |_, row| {
            for pixel in row.chunks_exact_mut(channels) {
                for (sample, lut) in pixel.iter_mut().zip(luts) {
                    *sample = lut.get(quantize(*sample)) as f32 / 255.0;
                }
            }
        });

        output
    }
}

/// Convert a normalized sample to 8 bits, truncating like the host does.
#[inline]
pub fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0) as u8
}

// ============================================================================
// Tests
// ============================================================================
