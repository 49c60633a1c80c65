//! Tone-aware compositing of a layer onto a background.
//!
//! Three blends of the same layer are mixed per pixel: the default blend
//! for mid-tones, and the highlight and shadow zones' own blend modes
//! weighted by their protection masks. The masks come from the
//! background's luminance and are recomputed on every call.

use serde::{Deserialize, Serialize};

use crate::blend::{BlendMode, BlendSpec};
use crate::buffer::FloatImage;
use crate::error::ParamError;
use crate::mask::{ProtectionConfig, ProtectionMasks};
use crate::parallel::for_each_row;
use crate::transform::{resize, with_channels, FilterType};

/// Blend settings for one compositing call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeOptions {
    /// Mid-tone blend; its opacity applies to every zone.
    pub blend: BlendSpec,
    pub highlights: ProtectionConfig,
    pub shadows: ProtectionConfig,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            blend: BlendSpec::default(),
            highlights: ProtectionConfig::highlights(),
            shadows: ProtectionConfig::shadows(),
        }
    }
}

impl CompositeOptions {
    /// A single blend everywhere, with both protections off.
    pub fn unprotected(blend: BlendSpec) -> Self {
        let defaults = Self::default();
        Self {
            blend,
            highlights: defaults.highlights.disabled(),
            shadows: defaults.shadows.disabled(),
        }
    }

    /// Parse options from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::Json`] for malformed JSON or a malformed zone.
    pub fn parse(payload: &str) -> Result<Self, ParamError> {
        Ok(serde_json::from_str(payload)?)
    }

    /// Parse options, falling back to the defaults on any error.
    pub fn parse_or_default(payload: &str) -> Self {
        Self::parse(payload).unwrap_or_else(|err| {
            tracing::warn!(%err, "falling back to default composite options");
            Self::default()
        })
    }

    /// Blend for the highlight zone: its own mode when protected, the
    /// mid-tone blend otherwise.
    fn highlight_spec(&self) -> BlendSpec {
        self.zone_spec(&self.highlights)
    }

    fn shadow_spec(&self) -> BlendSpec {
        self.zone_spec(&self.shadows)
    }

    fn zone_spec(&self, zone: &ProtectionConfig) -> BlendSpec {
        let mode: BlendMode = if zone.enabled {
            zone.blend_mode
        } else {
            self.blend.mode
        };
        BlendSpec::new(mode, self.blend.effective_opacity())
    }
}

/// Composite `foreground` onto `background`.
///
/// Without a background the foreground is returned unchanged. A foreground
/// of a different size is resized (bilinear) to the background, and its
/// channels are converted to match. The result is clamped to `[0, 1]` and
/// keeps the background's alpha.
pub fn composite(
    background: Option<&FloatImage>,
    foreground: &FloatImage,
    options: &CompositeOptions,
) -> FloatImage {
    let Some(background) = background else {
        return foreground.clone();
    };
    if background.is_empty() {
        return background.clone();
    }

    let mut layer = with_channels(foreground, background.channels);
    if layer.dimensions() != background.dimensions() {
        tracing::warn!(
            layer_width = layer.width,
            layer_height = layer.height,
            width = background.width,
            height = background.height,
            "resizing layer to background"
        );
        layer = match resize(&layer, background.width, background.height, FilterType::Bilinear) {
            Ok(resized) => resized,
            Err(err) => {
                tracing::warn!(%err, "empty layer, compositing onto black");
                FloatImage::zeros(background.width, background.height, background.channels)
            }
        };
    }

    tracing::debug!(
        width = background.width,
        height = background.height,
        channels = background.channels,
        mode = %options.blend.mode,
        opacity = options.blend.effective_opacity(),
        protect_highlights = options.highlights.enabled,
        protect_shadows = options.shadows.enabled,
        "Compositing layer"
    );

    let masks = ProtectionMasks::compute(background, &options.highlights, &options.shadows);
    let mid_spec = options.blend;
    let highlight_spec = options.highlight_spec();
    let shadow_spec = options.shadow_spec();

    let mut output = background.clone();
    let channels = output.channels;
    let colors = output.color_channels();
    let width = output.width as usize;
    let row_len = output.row_len();
    let fg = &layer.data;

    for_each_row(&mut output.data, row_len, |y, row| {
        let fg_row = &fg[y * row_len..(y + 1) * row_len];
        for (x, (px, fg_px)) in row
            .chunks_exact_mut(channels)
            .zip(fg_row.chunks_exact(channels))
            .enumerate()
        {
            let i = y * width + x;
            let hw = masks.highlight.data[i];
            let sw = masks.shadow.data[i];
            let mw = masks.mid_weight(i);

            for (b, &f) in px[..colors].iter_mut().zip(&fg_px[..colors]) {
                let mid = mid_spec.apply(*b, f);
                let high = highlight_spec.apply(*b, f);
                let shadow = shadow_spec.apply(*b, f);
                *b = (mid * mw + high * hw + shadow * sw).clamp(0.0, 1.0);
            }
        }
    });

    output
}
