// ============================================================================
// SHAPE OPERATIONS — draw a vector shape overlay or clip the image to one
// ============================================================================

use image::RgbaImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Half-width of a stroked line, in pixels.  Wide enough that a diagonal
/// stroke stays connected.
const LINE_HALF_WIDTH: f32 = 0.75;

/// Outline thickness for stroked rectangle/ellipse edges, in pixels.
const OUTLINE_WIDTH: f32 = 1.0;

/// Shape primitives.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Rectangle { x: i32, y: i32, width: u32, height: u32 },
    Ellipse { cx: f32, cy: f32, rx: f32, ry: f32 },
    Line { x0: f32, y0: f32, x1: f32, y1: f32 },
}

/// How a drawn shape is painted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeStyle {
    Outline,
    Filled,
    Both,
}

impl Shape {
    /// Interior coverage test at pixel centre (px + 0.5, py + 0.5).
    /// A line "contains" its stroke band so that clipping to a line keeps
    /// the stroked pixels.
    fn contains(&self, px: u32, py: u32) -> bool {
        let fx = px as f32 + 0.5;
        let fy = py as f32 + 0.5;
        match *self {
            Shape::Rectangle { x, y, width, height } => {
                fx >= x as f32
                    && fy >= y as f32
                    && fx < x as f32 + width as f32
                    && fy < y as f32 + height as f32
            }
            Shape::Ellipse { cx, cy, rx, ry } => {
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let nx = (fx - cx) / rx;
                let ny = (fy - cy) / ry;
                nx * nx + ny * ny <= 1.0
            }
            Shape::Line { x0, y0, x1, y1 } => {
                segment_distance(fx, fy, x0, y0, x1, y1) <= LINE_HALF_WIDTH
            }
        }
    }

    /// True when the pixel sits on the stroked edge of the shape.
    fn on_outline(&self, px: u32, py: u32) -> bool {
        match *self {
            Shape::Rectangle { x, y, width, height } => {
                if !self.contains(px, py) {
                    return false;
                }
                let fx = px as f32 + 0.5;
                let fy = py as f32 + 0.5;
                fx < x as f32 + OUTLINE_WIDTH
                    || fy < y as f32 + OUTLINE_WIDTH
                    || fx >= x as f32 + width as f32 - OUTLINE_WIDTH
                    || fy >= y as f32 + height as f32 - OUTLINE_WIDTH
            }
            Shape::Ellipse { cx, cy, rx, ry } => {
                if !self.contains(px, py) {
                    return false;
                }
                let inner = Shape::Ellipse {
                    cx,
                    cy,
                    rx: (rx - OUTLINE_WIDTH).max(0.0),
                    ry: (ry - OUTLINE_WIDTH).max(0.0),
                };
                !inner.contains(px, py)
            }
            // A line has no interior; its stroke is its outline.
            Shape::Line { .. } => self.contains(px, py),
        }
    }
}

/// Distance from point (px, py) to the segment (x0, y0)–(x1, y1).
fn segment_distance(px: f32, py: f32, x0: f32, y0: f32, x1: f32, y1: f32) -> f32 {
    let dx = x1 - x0;
    let dy = y1 - y0;
    let len2 = dx * dx + dy * dy;
    let t = if len2 > 0.0 {
        (((px - x0) * dx + (py - y0) * dy) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let nx = x0 + t * dx;
    let ny = y0 + t * dy;
    ((px - nx) * (px - nx) + (py - ny) * (py - ny)).sqrt()
}

/// Source-over blend of an RGBA colour onto a destination pixel.
#[inline]
fn blend_over(dst: [u8; 4], src: [u8; 4]) -> [u8; 4] {
    let sa = src[3] as f32 / 255.0;
    if sa >= 1.0 {
        return src;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let s = src[c] as f32 / 255.0;
        let d = dst[c] as f32 / 255.0;
        let v = (s * sa + d * da * (1.0 - sa)) / out_a;
        out[c] = (v * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    out
}

/// Composite a filled and/or stroked shape onto the image (source-over).
pub fn draw_shape(input: RgbaImage, shape: Shape, color: [u8; 4], style: ShapeStyle) -> RgbaImage {
    let w = input.width() as usize;
    let h = input.height() as usize;
    if w == 0 || h == 0 {
        return input;
    }

    let mut output = input;
    let stride = w * 4;
    let raw: &mut [u8] = output.as_mut();
    raw.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            let covered = match style {
                ShapeStyle::Outline => shape.on_outline(x as u32, y as u32),
                ShapeStyle::Filled | ShapeStyle::Both => shape.contains(x as u32, y as u32),
            };
            if covered {
                let pi = x * 4;
                let dst = [row[pi], row[pi + 1], row[pi + 2], row[pi + 3]];
                row[pi..pi + 4].copy_from_slice(&blend_over(dst, color));
            }
        }
    });
    output
}

/// Clip the image to a shape: pixels outside become fully transparent,
/// pixels inside are preserved verbatim.
pub fn clip_to_shape(input: RgbaImage, shape: Shape) -> RgbaImage {
    let w = input.width() as usize;
    let h = input.height() as usize;
    if w == 0 || h == 0 {
        return input;
    }

    let mut output = input;
    let stride = w * 4;
    let raw: &mut [u8] = output.as_mut();
    raw.par_chunks_mut(stride).enumerate().for_each(|(y, row)| {
        for x in 0..w {
            if !shape.contains(x as u32, y as u32) {
                let pi = x * 4;
                row[pi..pi + 4].copy_from_slice(&[0, 0, 0, 0]);
            }
        }
    });
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: [u8; 4] = [255, 0, 0, 255];

    fn white(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    #[test]
    fn filled_rectangle_paints_exactly_its_region() {
        let out = draw_shape(
            white(6, 6),
            Shape::Rectangle { x: 1, y: 2, width: 3, height: 2 },
            RED,
            ShapeStyle::Filled,
        );
        assert_eq!(*out.get_pixel(1, 2), Rgba(RED));
        assert_eq!(*out.get_pixel(3, 3), Rgba(RED));
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(4, 2), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(1, 4), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn outlined_rectangle_leaves_interior_untouched() {
        let out = draw_shape(
            white(8, 8),
            Shape::Rectangle { x: 1, y: 1, width: 6, height: 6 },
            RED,
            ShapeStyle::Outline,
        );
        assert_eq!(*out.get_pixel(1, 1), Rgba(RED));
        assert_eq!(*out.get_pixel(6, 6), Rgba(RED));
        assert_eq!(*out.get_pixel(3, 3), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn translucent_fill_blends_source_over() {
        let out = draw_shape(
            white(2, 2),
            Shape::Rectangle { x: 0, y: 0, width: 2, height: 2 },
            [0, 0, 0, 128],
            ShapeStyle::Filled,
        );
        let p = out.get_pixel(0, 0);
        // ~50% black over white ≈ mid grey, alpha stays 255.
        assert!((p[0] as i32 - 127).abs() <= 2);
        assert_eq!(p[3], 255);
    }

    #[test]
    fn ellipse_contains_centre_but_not_corners() {
        let shape = Shape::Ellipse { cx: 3.0, cy: 3.0, rx: 2.5, ry: 2.5 };
        let out = draw_shape(white(6, 6), shape, RED, ShapeStyle::Filled);
        assert_eq!(*out.get_pixel(3, 3), Rgba(RED));
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(5, 5), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn line_paints_a_connected_stroke() {
        let out = draw_shape(
            white(5, 5),
            Shape::Line { x0: 0.0, y0: 0.0, x1: 5.0, y1: 5.0 },
            RED,
            ShapeStyle::Outline,
        );
        // Every diagonal pixel centre lies on the segment.
        for i in 0..5 {
            assert_eq!(*out.get_pixel(i, i), Rgba(RED), "diagonal pixel {}", i);
        }
        assert_eq!(*out.get_pixel(4, 0), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn clip_to_rectangle_clears_outside_only() {
        let out = clip_to_shape(
            white(4, 4),
            Shape::Rectangle { x: 1, y: 1, width: 2, height: 2 },
        );
        assert_eq!(*out.get_pixel(1, 1), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(2, 2), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*out.get_pixel(3, 3), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn clip_preserves_inside_pixels_verbatim() {
        let mut img = white(3, 3);
        img.put_pixel(1, 1, Rgba([9, 8, 7, 41]));
        let out = clip_to_shape(img, Shape::Rectangle { x: 1, y: 1, width: 1, height: 1 });
        assert_eq!(*out.get_pixel(1, 1), Rgba([9, 8, 7, 41]));
        assert_eq!(*out.get_pixel(0, 1), Rgba([0, 0, 0, 0]));
    }
}
