//! Fill colour for canvas area exposed by rotation, perspective correction
//! and out-of-bounds crops.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::buffer::FloatImage;
use crate::error::ParamError;

/// Colour written where no source pixel maps.
///
/// Unknown names deserialize as opaque black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum FillColor {
    /// Opaque black.
    #[default]
    Black,
    /// Opaque white.
    White,
    /// Fully transparent. The source gains an opaque alpha channel first.
    Transparent,
}

impl FillColor {
    pub fn name(self) -> &'static str {
        match self {
            FillColor::Black => "black",
            FillColor::White => "white",
            FillColor::Transparent => "transparent",
        }
    }

    /// Parse a fill colour, treating unknown names as opaque black.
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|err: ParamError| {
            tracing::warn!(%err, "falling back to black fill");
            FillColor::Black
        })
    }

    /// Source image ready for filling: transparent fill needs an alpha
    /// channel to write into.
    pub fn prepare(self, image: &FloatImage) -> FloatImage {
        match self {
            FillColor::Transparent => image.with_alpha(1.0),
            _ => image.clone(),
        }
    }

    /// Fill samples for an image with `channels` channels.
    pub fn pixel(self, channels: usize) -> Vec<f32> {
        let (value, alpha) = match self {
            FillColor::Black => (0.0, 1.0),
            FillColor::White => (1.0, 1.0),
            FillColor::Transparent => (0.0, 0.0),
        };
        match channels {
            4 => vec![value, value, value, alpha],
            n => vec![value; n],
        }
    }
}

impl FromStr for FillColor {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "black" => Ok(FillColor::Black),
            "white" => Ok(FillColor::White),
            "transparent" => Ok(FillColor::Transparent),
            _ => Err(ParamError::UnknownFillColor(s.to_string())),
        }
    }
}

impl From<String> for FillColor {
    fn from(name: String) -> Self {
        FillColor::from_name_or_default(&name)
    }
}

impl fmt::Display for FillColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fill_color() {
        assert_eq!("White".parse::<FillColor>().unwrap(), FillColor::White);
        assert!("magenta".parse::<FillColor>().is_err());
        assert_eq!(FillColor::from_name_or_default("magenta"), FillColor::Black);
    }

    #[test]
    fn test_deserialize_unknown_name_is_black() {
        let fill: FillColor = serde_json::from_str(r#""purple""#).unwrap();
        assert_eq!(fill, FillColor::Black);
        let fill: FillColor = serde_json::from_str(r#""transparent""#).unwrap();
        assert_eq!(fill, FillColor::Transparent);
        assert_eq!(serde_json::to_string(&FillColor::White).unwrap(), r#""white""#);
    }

    #[test]
    fn test_fill_pixels() {
        assert_eq!(FillColor::Black.pixel(3), vec![0.0, 0.0, 0.0]);
        assert_eq!(FillColor::Black.pixel(4), vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(FillColor::White.pixel(1), vec![1.0]);
        assert_eq!(FillColor::Transparent.pixel(4), vec![0.0; 4]);
    }

    #[test]
    fn test_transparent_prepare_adds_alpha() {
        let img = FloatImage::filled(2, 2, &[0.5, 0.5, 0.5]);
        let prepared = FillColor::Transparent.prepare(&img);
        assert_eq!(prepared.channels, 4);
        assert_eq!(prepared.pixel(0, 0), &[0.5, 0.5, 0.5, 1.0]);
        assert_eq!(FillColor::White.prepare(&img), img);
    }
}
