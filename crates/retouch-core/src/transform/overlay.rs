//! Markings drawn onto panel previews.

use crate::buffer::FloatImage;

/// Paint every pixel within `radius` of the segment `a..b` on an RGB image.
///
/// A zero-length segment paints a disc.
pub(crate) fn paint_segment(
    image: &mut FloatImage,
    a: (f64, f64),
    b: (f64, f64),
    radius: f64,
    color: [f32; 3],
) {
    if image.is_empty() || image.channels != 3 || ![a.0, a.1, b.0, b.1].iter().all(|v| v.is_finite())
    {
        return;
    }

    let max_x = (image.width - 1) as f64;
    let max_y = (image.height - 1) as f64;
    let x0 = (a.0.min(b.0) - radius).clamp(0.0, max_x) as u32;
    let x1 = (a.0.max(b.0) + radius).clamp(0.0, max_x) as u32;
    let y0 = (a.1.min(b.1) - radius).clamp(0.0, max_y) as u32;
    let y1 = (a.1.max(b.1) + radius).clamp(0.0, max_y) as u32;

    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;

    for y in y0..=y1 {
        for x in x0..=x1 {
            let (px, py) = (x as f64, y as f64);
            let t = if len_sq > 0.0 {
                (((px - a.0) * dx + (py - a.1) * dy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
            if (px - cx).hypot(py - cy) <= radius {
                image.pixel_mut(x, y).copy_from_slice(&color);
            }
        }
    }
}
