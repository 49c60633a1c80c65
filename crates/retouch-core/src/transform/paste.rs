//! Placing a layer onto a canvas of a different size.

use crate::buffer::FloatImage;

/// Match `image` to `channels` channels (1, 3 or 4).
pub(crate) fn with_channels(image: &FloatImage, channels: usize) -> FloatImage {
    match channels {
        c if c == image.channels => image.clone(),
        1 => image.to_grayscale(),
        3 => image.to_rgb(),
        _ => image.with_alpha(1.0),
    }
}

/// Paste `layer` onto a zero canvas of `canvas_width x canvas_height`.
///
/// The layer is centred (integer halves of both sizes) and then moved by
/// the offset. Parts falling off the canvas are clipped. The canvas takes
/// `channels` channels; the layer is converted to match.
pub fn place_on_canvas(
    layer: &FloatImage,
    canvas_width: u32,
    canvas_height: u32,
    channels: usize,
    offset_x: i64,
    offset_y: i64,
) -> FloatImage {
    let layer = with_channels(layer, channels);
    let mut canvas = FloatImage::zeros(canvas_width, canvas_height, layer.channels);

    // Saturating: any offset this large already lands off the canvas.
    let start_x =
        (i64::from(canvas_width / 2) - i64::from(layer.width / 2)).saturating_add(offset_x);
    let start_y =
        (i64::from(canvas_height / 2) - i64::from(layer.height / 2)).saturating_add(offset_y);

    let from_x = start_x.max(0);
    let from_y = start_y.max(0);
    let to_x = start_x
        .saturating_add(i64::from(layer.width))
        .min(i64::from(canvas_width));
    let to_y = start_y
        .saturating_add(i64::from(layer.height))
        .min(i64::from(canvas_height));
    if to_x <= from_x || to_y <= from_y {
        return canvas;
    }

    let ch = layer.channels;
    let span = (to_x - from_x) as usize * ch;
    let src_x = (from_x - start_x) as usize;
    for y in from_y..to_y {
        let src_y = (y - start_y) as usize;
        let src = (src_y * layer.width as usize + src_x) * ch;
        let dst = (y as usize * canvas_width as usize + from_x as usize) * ch;
        canvas.data[dst..dst + span].copy_from_slice(&layer.data[src..src + span]);
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_paste() {
        let layer = FloatImage::filled(2, 2, &[1.0, 1.0, 1.0]);
        let canvas = place_on_canvas(&layer, 4, 4, 3, 0, 0);
        assert_eq!(canvas.dimensions(), (4, 4));
        assert_eq!(canvas.pixel(0, 0), &[0.0, 0.0, 0.0]);
        assert_eq!(canvas.pixel(1, 1), &[1.0, 1.0, 1.0]);
        assert_eq!(canvas.pixel(2, 2), &[1.0, 1.0, 1.0]);
        assert_eq!(canvas.pixel(3, 3), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_offset_paste_is_clipped() {
        let layer = FloatImage::filled(4, 4, &[1.0, 1.0, 1.0]);
        let canvas = place_on_canvas(&layer, 4, 4, 3, 3, -3);
        assert_eq!(canvas.pixel(3, 0), &[1.0, 1.0, 1.0]);
        assert_eq!(canvas.pixel(2, 0), &[0.0, 0.0, 0.0]);
        assert_eq!(canvas.pixel(3, 1), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_paste_off_canvas_is_empty() {
        let layer = FloatImage::filled(4, 4, &[1.0, 1.0, 1.0]);
        let canvas = place_on_canvas(&layer, 4, 4, 3, 100, 0);
        assert!(canvas.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_extreme_offsets_leave_canvas_empty() {
        let layer = FloatImage::filled(3, 3, &[1.0, 1.0, 1.0]);
        for (dx, dy) in [(i64::MAX, 0), (i64::MIN, 0), (0, i64::MAX), (i64::MIN, i64::MIN)] {
            let canvas = place_on_canvas(&layer, 4, 4, 3, dx, dy);
            assert_eq!(canvas.dimensions(), (4, 4));
            assert!(canvas.data.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_larger_layer_is_cropped_to_canvas() {
        let layer = FloatImage::from_fn(6, 6, 1, |x, y, px| px[0] = (y * 6 + x) as f32);
        let canvas = place_on_canvas(&layer, 2, 2, 1, 0, 0);
        // start = 1 - 3 = -2
        assert_eq!(canvas.pixel(0, 0), layer.pixel(2, 2));
        assert_eq!(canvas.pixel(1, 1), layer.pixel(3, 3));
    }

    #[test]
    fn test_channel_conversion() {
        let layer = FloatImage::filled(2, 2, &[0.2, 0.4, 0.6]);
        let canvas = place_on_canvas(&layer, 2, 2, 4, 0, 0);
        assert_eq!(canvas.channels, 4);
        assert_eq!(canvas.pixel(0, 0), &[0.2, 0.4, 0.6, 1.0]);
    }
}
