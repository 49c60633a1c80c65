//! Normalized floating-point image buffer.
//!
//! Every editing tool consumes and produces [`FloatImage`]: interleaved,
//! row-major `f32` samples nominally in `[0, 1]`. A single-channel
//! `FloatImage` doubles as a mask or displacement field.

use crate::error::ImageError;
use image::{Rgb32FImage, Rgba32FImage};

/// Interleaved float image with 1 (mask), 3 (RGB) or 4 (RGBA) channels.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Samples per pixel (1, 3 or 4).
    pub channels: usize,
    /// Samples in row-major order.
    /// Length is always `width * height * channels`.
    pub data: Vec<f32>,
}

impl FloatImage {
    /// Create an image from an existing sample buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel count is not 1, 3 or 4, or if the
    /// buffer length does not match the dimensions.
    pub fn new(width: u32, height: u32, channels: usize, data: Vec<f32>) -> Result<Self, ImageError> {
        if !matches!(channels, 1 | 3 | 4) {
            return Err(ImageError::UnsupportedChannels(channels));
        }
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(ImageError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Create an image where every pixel equals `value`.
    ///
    /// The channel count is taken from `value.len()`.
    pub fn filled(width: u32, height: u32, value: &[f32]) -> Self {
        let channels = value.len();
        debug_assert!(matches!(channels, 1 | 3 | 4), "unsupported channel count");
        let pixel_count = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixel_count * channels);
        for _ in 0..pixel_count {
            data.extend_from_slice(value);
        }
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// Create a zero-filled image.
    pub fn zeros(width: u32, height: u32, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![0.0; width as usize * height as usize * channels],
        }
    }

    /// Build an image by evaluating `f(x, y, pixel)` for every pixel.
    pub fn from_fn<F>(width: u32, height: u32, channels: usize, mut f: F) -> Self
    where
        F: FnMut(u32, u32, &mut [f32]),
    {
        let mut image = Self::zeros(width, height, channels);
        if channels == 0 || width == 0 {
            return image;
        }
        let row_len = width as usize * channels;
        for (y, row) in image.data.chunks_exact_mut(row_len).enumerate() {
            for (x, pixel) in row.chunks_exact_mut(channels).enumerate() {
                f(x as u32, y as u32, pixel);
            }
        }
        image
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of samples in one row.
    #[inline]
    pub fn row_len(&self) -> usize {
        self.width as usize * self.channels
    }

    /// Check if this is an empty image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Whether the last channel is alpha.
    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    /// Number of colour channels, excluding alpha.
    pub fn color_channels(&self) -> usize {
        self.channels.min(3)
    }

    /// Dimensions as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels
    }

    /// Borrow the samples of pixel `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[f32] {
        let idx = self.offset(x, y);
        &self.data[idx..idx + self.channels]
    }

    /// Mutably borrow the samples of pixel `(x, y)`.
    #[inline]
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [f32] {
        let idx = self.offset(x, y);
        let channels = self.channels;
        &mut self.data[idx..idx + channels]
    }

    /// Read a single sample.
    #[inline]
    pub fn get(&self, x: u32, y: u32, c: usize) -> f32 {
        self.data[self.offset(x, y) + c]
    }

    /// Apply `f` to every sample, producing a new image.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f32) -> f32,
    {
        Self {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Copy with every sample clamped to `[0, 1]`.
    pub fn clamped(&self) -> Self {
        self.map(|v| v.clamp(0.0, 1.0))
    }

    /// Single-channel image holding the equal-weighted mean of the colour
    /// channels. Alpha is ignored.
    pub fn to_grayscale(&self) -> Self {
        if self.channels == 1 {
            return self.clone();
        }
        let colors = self.color_channels();
        let data = self
            .data
            .chunks_exact(self.channels)
            .map(|px| px[..colors].iter().sum::<f32>() / colors as f32)
            .collect();
        Self {
            width: self.width,
            height: self.height,
            channels: 1,
            data,
        }
    }

    /// Three-channel copy: alpha is dropped, a mask is replicated.
    pub fn to_rgb(&self) -> Self {
        match self.channels {
            3 => self.clone(),
            1 => Self {
                width: self.width,
                height: self.height,
                channels: 3,
                data: self.data.iter().flat_map(|&v| [v, v, v]).collect(),
            },
            _ => Self {
                width: self.width,
                height: self.height,
                channels: 3,
                data: self
                    .data
                    .chunks_exact(self.channels)
                    .flat_map(|px| [px[0], px[1], px[2]])
                    .collect(),
            },
        }
    }

    /// Four-channel copy. Images without alpha receive a constant `alpha`.
    pub fn with_alpha(&self, alpha: f32) -> Self {
        if self.channels == 4 {
            return self.clone();
        }
        let rgb = self.to_rgb();
        Self {
            width: self.width,
            height: self.height,
            channels: 4,
            data: rgb
                .data
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], alpha])
                .collect(),
        }
    }

    /// Create an RGBA image from 8-bit interleaved samples (canvas `ImageData`).
    ///
    /// # Errors
    ///
    /// Returns an error if `pixels.len() != width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, pixels: &[u8]) -> Result<Self, ImageError> {
        let data = pixels.iter().map(|&v| v as f32 / 255.0).collect();
        Self::new(width, height, 4, data)
    }

    /// Create an RGB image from 8-bit interleaved samples.
    ///
    /// # Errors
    ///
    /// Returns an error if `pixels.len() != width * height * 3`.
    pub fn from_rgb8(width: u32, height: u32, pixels: &[u8]) -> Result<Self, ImageError> {
        let data = pixels.iter().map(|&v| v as f32 / 255.0).collect();
        Self::new(width, height, 3, data)
    }

    /// Convert to 8-bit RGBA for display. Missing alpha is opaque.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.with_alpha(1.0)
            .data
            .iter()
            .map(|&v| to_u8_rounded(v))
            .collect()
    }

    /// Convert to 8-bit RGB, dropping alpha.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.to_rgb().data.iter().map(|&v| to_u8_rounded(v)).collect()
    }

    /// Create a FloatImage from an `image::Rgb32FImage`.
    pub fn from_rgb32f(img: Rgb32FImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            channels: 3,
            data: img.into_raw(),
        }
    }

    /// Create a FloatImage from an `image::Rgba32FImage`.
    pub fn from_rgba32f(img: Rgba32FImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            channels: 4,
            data: img.into_raw(),
        }
    }

    /// Convert to an `image::Rgb32FImage` (alpha dropped, masks replicated).
    pub fn to_rgb32f(&self) -> Option<Rgb32FImage> {
        Rgb32FImage::from_raw(self.width, self.height, self.to_rgb().data)
    }

    /// Convert to an `image::Rgba32FImage` (missing alpha is opaque).
    pub fn to_rgba32f(&self) -> Option<Rgba32FImage> {
        Rgba32FImage::from_raw(self.width, self.height, self.with_alpha(1.0).data)
    }
}

#[inline]
fn to_u8_rounded(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
