//! Convolution engine — the single numeric core behind every kernel filter.
//!
//! Sampling is edge-replicated: taps that fall outside the image read the
//! nearest border pixel, so there is no out-of-bounds access and no dark
//! fringing at the edges.  Accumulation is done per channel in f32, with an
//! optional +128 bias used by zero-sum kernels (Sobel, Laplacian, emboss) to
//! re-centre signed responses into the visible range.

use image::RgbaImage;
use rayon::prelude::*;

use crate::kernel::Kernel;

/// Bias added to each accumulated channel when the caller requests it.
const BIAS: f32 = 128.0;

/// Convolve `input` with `kernel`, returning a fresh buffer of identical
/// dimensions.  The output never aliases the input.
///
/// Alpha handling follows the source data: if every input pixel is fully
/// opaque, the alpha channel is not accumulated and the output alpha is
/// forced to 255.  Otherwise alpha participates in the weighted sum (and in
/// the bias, when `apply_bias` is set) exactly like the colour channels.
///
/// Channel results are clamped to [0, 255] and truncated to integers.
pub fn convolve(input: &RgbaImage, kernel: &Kernel, apply_bias: bool) -> RgbaImage {
    let w = input.width() as usize;
    let h = input.height() as usize;
    if w == 0 || h == 0 {
        return input.clone();
    }

    let has_alpha = has_meaningful_alpha(input);
    let rx = kernel.radius_x();
    let ry = kernel.radius_y();
    let src_raw = input.as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; w * h * 4];

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            for x in 0..w {
                let mut sum_r = 0.0f32;
                let mut sum_g = 0.0f32;
                let mut sum_b = 0.0f32;
                let mut sum_a = 0.0f32;

                for ky in -ry..=ry {
                    let sy = (y as i32 + ky).clamp(0, h as i32 - 1) as usize;
                    for kx in -rx..=rx {
                        let sx = (x as i32 + kx).clamp(0, w as i32 - 1) as usize;
                        let si = sy * stride + sx * 4;
                        let kv = kernel.at(kx, ky);
                        sum_r += kv * src_raw[si] as f32;
                        sum_g += kv * src_raw[si + 1] as f32;
                        sum_b += kv * src_raw[si + 2] as f32;
                        if has_alpha {
                            sum_a += kv * src_raw[si + 3] as f32;
                        }
                    }
                }

                if apply_bias {
                    sum_r += BIAS;
                    sum_g += BIAS;
                    sum_b += BIAS;
                    if has_alpha {
                        sum_a += BIAS;
                    }
                }

                let pi = x * 4;
                row_out[pi] = sum_r.clamp(0.0, 255.0) as u8;
                row_out[pi + 1] = sum_g.clamp(0.0, 255.0) as u8;
                row_out[pi + 2] = sum_b.clamp(0.0, 255.0) as u8;
                row_out[pi + 3] = if has_alpha {
                    sum_a.clamp(0.0, 255.0) as u8
                } else {
                    255
                };
            }
        });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw)
        .expect("convolution output buffer has matching dimensions")
}

/// True when any pixel is not fully opaque.
fn has_meaningful_alpha(input: &RgbaImage) -> bool {
    input.as_raw().chunks_exact(4).any(|p| p[3] < 255)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn identity_kernel() -> Kernel {
        let mut weights = vec![0.0f32; 9];
        weights[4] = 1.0;
        Kernel::square(3, weights)
    }

    #[test]
    fn identity_kernel_is_identity() {
        let mut img = RgbaImage::new(4, 3);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Rgba([(x * 40) as u8, (y * 70) as u8, 200, 255]);
        }
        let out = convolve(&img, &identity_kernel(), false);
        assert_eq!(out, img);
    }

    #[test]
    fn uniform_white_stays_white_under_ones_kernel() {
        // Edge clamping duplicates the same value even at the corners of a
        // 2x2 image, and the clamp caps the 9x sum back at 255.
        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let ones = Kernel::square(3, vec![1.0; 9]);
        let out = convolve(&img, &ones, false);
        for p in out.pixels() {
            assert_eq!(*p, Rgba([255, 255, 255, 255]));
        }
    }

    #[test]
    fn zero_kernel_with_bias_yields_mid_grey() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([10, 20, 30, 255]));
        let zero = Kernel::square(3, vec![0.0; 9]);
        let out = convolve(&img, &zero, true);
        for p in out.pixels() {
            // Opaque source: alpha skipped and forced back to 255.
            assert_eq!(*p, Rgba([128, 128, 128, 255]));
        }
    }

    #[test]
    fn opaque_source_forces_opaque_output() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([100, 100, 100, 255]));
        // A kernel summing to 0.5 would halve alpha if it participated.
        let half = Kernel::square(1, vec![0.5]);
        let out = convolve(&img, &half, false);
        for p in out.pixels() {
            assert_eq!(p[0], 50);
            assert_eq!(p[3], 255);
        }
    }

    #[test]
    fn translucent_source_convolves_alpha() {
        let img = RgbaImage::from_pixel(3, 3, Rgba([100, 100, 100, 200]));
        let half = Kernel::square(1, vec![0.5]);
        let out = convolve(&img, &half, false);
        for p in out.pixels() {
            assert_eq!(p[3], 100);
        }
    }

    #[test]
    fn one_by_one_image_survives_large_kernel() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([42, 84, 126, 255]));
        let out = convolve(&img, &Kernel::gaussian(3), false);
        // Every clamped tap reads the single pixel and gaussian weights sum
        // to 1, so the pixel is preserved up to truncation.
        let p = out.get_pixel(0, 0);
        assert!((p[0] as i32 - 42).abs() <= 1);
        assert!((p[1] as i32 - 84).abs() <= 1);
        assert!((p[2] as i32 - 126).abs() <= 1);
    }

    #[test]
    fn empty_image_is_returned_unchanged() {
        let img = RgbaImage::new(0, 0);
        let out = convolve(&img, &identity_kernel(), false);
        assert_eq!(out.dimensions(), (0, 0));
    }
}
