// ============================================================================
// COLOUR OPERATIONS — pointwise adjustments of channel values
// ============================================================================

use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// HELPER: per-pixel transform
// ============================================================================

/// Apply a per-pixel transform to every pixel, row-parallel.
/// `transform` receives (r, g, b, a) as f32 and returns the same; results
/// are rounded and clamped to [0, 255].
fn map_pixels<F>(input: &RgbaImage, transform: F) -> RgbaImage
where
    F: Fn(f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let w = input.width() as usize;
    let h = input.height() as usize;
    if w == 0 || h == 0 {
        return input.clone();
    }

    let src_raw = input.as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; w * h * 4];

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let row_in = &src_raw[y * stride..(y + 1) * stride];
            for x in 0..w {
                let pi = x * 4;
                let r = row_in[pi] as f32;
                let g = row_in[pi + 1] as f32;
                let b = row_in[pi + 2] as f32;
                let a = row_in[pi + 3] as f32;
                let (nr, ng, nb, na) = transform(r, g, b, a);
                row_out[pi] = nr.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 1] = ng.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 2] = nb.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 3] = na.round().clamp(0.0, 255.0) as u8;
            }
        });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw)
        .expect("transform output buffer has matching dimensions")
}

// ============================================================================
// BRIGHTNESS / CONTRAST
// ============================================================================

/// Brightness/contrast adjustment, both in [-100, 100].
///
/// `out = (1 + c/100)·(in − 127.5) + 127.5·(1 + b/100)`, rounded and
/// clamped.  Alpha is untouched.
pub fn brightness_contrast(input: RgbaImage, brightness: i32, contrast: i32) -> RgbaImage {
    let b = brightness.clamp(-100, 100) as f32;
    let c = contrast.clamp(-100, 100) as f32;
    let gain = 1.0 + c / 100.0;
    let offset = 127.5 * (1.0 + b / 100.0);
    map_pixels(&input, move |r, g, bl, a| {
        (
            gain * (r - 127.5) + offset,
            gain * (g - 127.5) + offset,
            gain * (bl - 127.5) + offset,
            a,
        )
    })
}

// ============================================================================
// SATURATION (HSB round trip)
// ============================================================================

/// Scale saturation by `level` (1.0 = unchanged, 0.0 = greyscale).
///
/// Converts each pixel RGB→HSB, multiplies S (clamped to [0, 1]) and
/// converts back; hue and brightness are preserved.  Alpha is untouched.
pub fn saturation(input: RgbaImage, level: f32) -> RgbaImage {
    let w = input.width();
    let h = input.height();
    if w == 0 || h == 0 {
        return input;
    }
    let mut output = RgbaImage::new(w, h);
    for (src, dst) in input.pixels().zip(output.pixels_mut()) {
        let (hue, s, bri) = rgb_to_hsb(src[0], src[1], src[2]);
        let ns = (s * level).clamp(0.0, 1.0);
        let (r, g, b) = hsb_to_rgb(hue, ns, bri);
        *dst = Rgba([r, g, b, src[3]]);
    }
    output
}

/// RGB → HSB, all components of the result in [0, 1].
fn rgb_to_hsb(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let cmax = r.max(g).max(b) as f32;
    let cmin = r.min(g).min(b) as f32;
    let brightness = cmax / 255.0;
    let saturation = if cmax > 0.0 { (cmax - cmin) / cmax } else { 0.0 };
    if saturation == 0.0 {
        return (0.0, 0.0, brightness);
    }

    let d = cmax - cmin;
    let redc = (cmax - r as f32) / d;
    let greenc = (cmax - g as f32) / d;
    let bluec = (cmax - b as f32) / d;
    let raw = if r as f32 == cmax {
        bluec - greenc
    } else if g as f32 == cmax {
        2.0 + redc - bluec
    } else {
        4.0 + greenc - redc
    };
    let mut hue = raw / 6.0;
    if hue < 0.0 {
        hue += 1.0;
    }
    (hue, saturation, brightness)
}

/// HSB → RGB, hue wrapped into [0, 1).
fn hsb_to_rgb(hue: f32, s: f32, v: f32) -> (u8, u8, u8) {
    if s == 0.0 {
        let grey = (v * 255.0 + 0.5) as u8;
        return (grey, grey, grey);
    }
    let h = (hue - hue.floor()) * 6.0;
    let f = h - h.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match h as u32 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    (
        (r * 255.0 + 0.5) as u8,
        (g * 255.0 + 0.5) as u8,
        (b * 255.0 + 0.5) as u8,
    )
}

// ============================================================================
// CHANNEL CYCLING
// ============================================================================

/// The six permutations of the (R, G, B) channels.  The variant name spells
/// which source channel lands in each output slot, so `Rbg` writes
/// (out.r, out.g, out.b) = (in.r, in.b, in.g).  Alpha is always preserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelOrder {
    /// Identity ordering.
    Rgb,
    Rbg,
    Brg,
    Gbr,
    Grb,
    Bgr,
}

impl ChannelOrder {
    pub fn all() -> &'static [ChannelOrder] {
        use ChannelOrder::*;
        &[Rgb, Rbg, Brg, Gbr, Grb, Bgr]
    }

    #[inline]
    fn permute(self, r: u8, g: u8, b: u8) -> (u8, u8, u8) {
        use ChannelOrder::*;
        match self {
            Rgb => (r, g, b),
            Rbg => (r, b, g),
            Brg => (b, r, g),
            Gbr => (g, b, r),
            Grb => (g, r, b),
            Bgr => (b, g, r),
        }
    }
}

/// Reorder the colour channels of every pixel.
pub fn channel_cycle(input: RgbaImage, order: ChannelOrder) -> RgbaImage {
    if order == ChannelOrder::Rgb {
        return input;
    }
    let mut output = input;
    for p in output.pixels_mut() {
        let (r, g, b) = order.permute(p[0], p[1], p[2]);
        *p = Rgba([r, g, b, p[3]]);
    }
    output
}

// ============================================================================
// INVERSION & TRANSPARENCY
// ============================================================================

/// Invert R, G and B (`255 − c`), preserving alpha.  Mutates the moved
/// buffer in place — the one operation that does, since the inversion of a
/// pixel depends on nothing but that pixel.
pub fn invert(mut image: RgbaImage) -> RgbaImage {
    for p in image.pixels_mut() {
        p[0] = 255 - p[0];
        p[1] = 255 - p[1];
        p[2] = 255 - p[2];
    }
    image
}

/// Set the alpha of every non-transparent pixel from an opacity `level` in
/// [0, 100] (`alpha = round(level × 2.55)`).  Pixels that are already fully
/// transparent are preserved verbatim so a cleared background stays cleared.
pub fn transparency(input: RgbaImage, level: u32) -> RgbaImage {
    let alpha = (level.min(100) as f32 * 2.55).round() as u8;
    let mut output = input;
    for p in output.pixels_mut() {
        if p[3] != 0 {
            p[3] = alpha;
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(r: u8, g: u8, b: u8, a: u8) -> Rgba<u8> {
        Rgba([r, g, b, a])
    }

    #[test]
    fn brightness_contrast_zero_is_identity() {
        let mut img = RgbaImage::from_pixel(2, 2, px(12, 110, 240, 200));
        img.put_pixel(0, 1, px(0, 255, 127, 255));
        let out = brightness_contrast(img.clone(), 0, 0);
        assert_eq!(out, img);
    }

    #[test]
    fn full_negative_brightness_is_black() {
        let img = RgbaImage::from_pixel(2, 2, px(180, 90, 45, 255));
        let out = brightness_contrast(img, -100, 0);
        for p in out.pixels() {
            // (in − 127.5) + 0 stays below 127.5... but mid-range inputs
            // survive; check the formula directly for one channel instead.
            assert_eq!(p[3], 255);
        }
        // 180: 1.0 * (180 − 127.5) + 0 = 52.5 → 53
        assert_eq!(out.get_pixel(0, 0)[0], 53);
    }

    #[test]
    fn contrast_pivots_around_midpoint() {
        let img = RgbaImage::from_pixel(1, 1, px(127, 128, 127, 255));
        let out = brightness_contrast(img, 0, 100);
        // 2·(127 − 127.5) + 127.5 = 126.5 → 127 (banker's-free rounding up)
        let p = out.get_pixel(0, 0);
        assert!((p[0] as i32 - 127).abs() <= 1);
        assert!((p[1] as i32 - 128).abs() <= 1);
    }

    #[test]
    fn saturation_zero_desaturates_to_brightness_grey() {
        let img = RgbaImage::from_pixel(1, 1, px(200, 40, 40, 255));
        let out = saturation(img, 0.0);
        let p = out.get_pixel(0, 0);
        // HSB brightness of (200,40,40) is 200/255; grey = 200.
        assert_eq!((p[0], p[1], p[2]), (200, 200, 200));
        assert_eq!(p[3], 255);
    }

    #[test]
    fn saturation_one_is_identity() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, px(200, 40, 40, 255));
        img.put_pixel(1, 0, px(0, 255, 3, 17));
        img.put_pixel(0, 1, px(66, 66, 66, 0));
        img.put_pixel(1, 1, px(255, 254, 0, 80));
        let out = saturation(img.clone(), 1.0);
        assert_eq!(out, img);
    }

    #[test]
    fn saturation_preserves_hue_and_brightness() {
        let (h0, _, b0) = rgb_to_hsb(180, 60, 90);
        let img = RgbaImage::from_pixel(1, 1, px(180, 60, 90, 255));
        let out = saturation(img, 0.5);
        let p = out.get_pixel(0, 0);
        let (h1, _, b1) = rgb_to_hsb(p[0], p[1], p[2]);
        assert!((h0 - h1).abs() < 0.02);
        assert!((b0 - b1).abs() < 0.01);
    }

    #[test]
    fn channel_cycle_covers_all_six_permutations() {
        let img = RgbaImage::from_pixel(1, 1, px(1, 2, 3, 9));
        let expected = [
            (ChannelOrder::Rgb, (1, 2, 3)),
            (ChannelOrder::Rbg, (1, 3, 2)),
            (ChannelOrder::Brg, (3, 1, 2)),
            (ChannelOrder::Gbr, (2, 3, 1)),
            (ChannelOrder::Grb, (2, 1, 3)),
            (ChannelOrder::Bgr, (3, 2, 1)),
        ];
        for (order, (r, g, b)) in expected {
            let out = channel_cycle(img.clone(), order);
            let p = out.get_pixel(0, 0);
            assert_eq!((p[0], p[1], p[2], p[3]), (r, g, b, 9), "{:?}", order);
        }
    }

    #[test]
    fn invert_is_self_inverse() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, px(0, 127, 255, 31));
        img.put_pixel(1, 0, px(7, 200, 90, 255));
        let twice = invert(invert(img.clone()));
        assert_eq!(twice, img);
    }

    #[test]
    fn invert_preserves_alpha() {
        let img = RgbaImage::from_pixel(1, 1, px(10, 20, 30, 77));
        let out = invert(img);
        assert_eq!(*out.get_pixel(0, 0), px(245, 235, 225, 77));
    }

    #[test]
    fn transparency_maps_level_and_keeps_cleared_pixels() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, px(255, 0, 0, 255));
        img.put_pixel(1, 0, px(0, 0, 0, 0));
        let out = transparency(img, 50);
        let red = out.get_pixel(0, 0);
        assert!((red[3] as i32 - 127).abs() <= 1);
        assert_eq!((red[0], red[1], red[2]), (255, 0, 0));
        assert_eq!(*out.get_pixel(1, 0), px(0, 0, 0, 0));
    }
}
