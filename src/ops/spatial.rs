// ============================================================================
// SPATIAL FILTERS — median, block averaging, random scattering
// ============================================================================
//
// These read only the immutable input buffer and write a distinct output row
// per rayon task, so rows parallelize with no cross-row dependency.

use image::RgbaImage;
use rayon::prelude::*;

/// Median filter: each output channel takes the median of its (2r+1)²
/// edge-clamped neighbourhood.  Radius 0 is the identity.
pub fn median(input: RgbaImage, radius: u32) -> RgbaImage {
    let w = input.width() as usize;
    let h = input.height() as usize;
    if radius == 0 || w == 0 || h == 0 {
        return input;
    }

    let r = radius as i32;
    let src_raw = input.as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; w * h * 4];

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let mut channels: [Vec<u8>; 4] = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];
            for x in 0..w {
                for c in &mut channels {
                    c.clear();
                }
                for dy in -r..=r {
                    let sy = (y as i32 + dy).clamp(0, h as i32 - 1) as usize;
                    for dx in -r..=r {
                        let sx = (x as i32 + dx).clamp(0, w as i32 - 1) as usize;
                        let si = sy * stride + sx * 4;
                        for c in 0..4 {
                            channels[c].push(src_raw[si + c]);
                        }
                    }
                }
                let pi = x * 4;
                for c in 0..4 {
                    channels[c].sort_unstable();
                    row_out[pi + c] = channels[c][channels[c].len() / 2];
                }
            }
        });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw)
        .expect("median output buffer has matching dimensions")
}

/// Block averaging: partition the image into `bw`×`bh` blocks (clipped at
/// the right/bottom edges), average all four channels over each block and
/// write the flat mean back to every pixel of the block.
pub fn block_average(input: RgbaImage, bw: u32, bh: u32) -> RgbaImage {
    let w = input.width();
    let h = input.height();
    if bw == 0 || bh == 0 {
        crate::log_warn!("block average: zero block size {}x{} ignored", bw, bh);
        return input;
    }
    if w == 0 || h == 0 {
        return input;
    }

    let mut output = RgbaImage::new(w, h);
    for by in (0..h).step_by(bh as usize) {
        for bx in (0..w).step_by(bw as usize) {
            let end_x = (bx + bw).min(w);
            let end_y = (by + bh).min(h);
            let mut sum = [0u64; 4];
            let mut count = 0u64;
            for y in by..end_y {
                for x in bx..end_x {
                    let p = input.get_pixel(x, y);
                    for c in 0..4 {
                        sum[c] += p[c] as u64;
                    }
                    count += 1;
                }
            }
            let mean = if count == 0 {
                // Only reachable on zero-size input; transparent black.
                [0u8; 4]
            } else {
                [
                    (sum[0] / count) as u8,
                    (sum[1] / count) as u8,
                    (sum[2] / count) as u8,
                    (sum[3] / count) as u8,
                ]
            };
            for y in by..end_y {
                for x in bx..end_x {
                    output.put_pixel(x, y, image::Rgba(mean));
                }
            }
        }
    }
    output
}

/// Random scattering: every output pixel copies an input pixel drawn
/// uniformly from the clamped `[-r, r]²` window around it.
///
/// The draw is a stateless per-pixel hash of (x, y, seed), so a given seed
/// reproduces the same scatter — the freshness of the randomness comes from
/// the caller drawing a fresh seed per operation.
pub fn scatter(input: RgbaImage, radius: u32, seed: u64) -> RgbaImage {
    let w = input.width() as usize;
    let h = input.height() as usize;
    if radius == 0 || w == 0 || h == 0 {
        return input;
    }

    let r = radius as i32;
    let window = 2 * radius + 1;
    let src_raw = input.as_raw();
    let stride = w * 4;
    let mut dst_raw = vec![0u8; w * h * 4];
    let seed_lo = seed as u32;
    let seed_hi = (seed >> 32) as u32;

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            for x in 0..w {
                let dx = (hash_range(x as u32, y as u32, seed_lo, window) as i32) - r;
                let dy = (hash_range(x as u32, y as u32, seed_hi ^ 0x5bd1_e995, window) as i32) - r;
                let sx = (x as i32 + dx).clamp(0, w as i32 - 1) as usize;
                let sy = (y as i32 + dy).clamp(0, h as i32 - 1) as usize;
                let si = sy * stride + sx * 4;
                let pi = x * 4;
                row_out[pi..pi + 4].copy_from_slice(&src_raw[si..si + 4]);
            }
        });

    RgbaImage::from_raw(w as u32, h as u32, dst_raw)
        .expect("scatter output buffer has matching dimensions")
}

/// Simple avalanche hash for deterministic per-pixel noise.
#[inline]
fn hash_u32(mut x: u32) -> u32 {
    x = x.wrapping_mul(0x9E3779B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;
    x
}

/// Hash (x, y, seed) to a value in `[0, n)`.
#[inline]
fn hash_range(x: u32, y: u32, seed: u32, n: u32) -> u32 {
    let h = hash_u32(
        x.wrapping_mul(374761393)
            .wrapping_add(y.wrapping_mul(668265263))
            .wrapping_add(seed),
    );
    h % n
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn median_removes_single_outlier() {
        let mut img = RgbaImage::from_pixel(3, 3, Rgba([10, 10, 10, 255]));
        img.put_pixel(1, 1, Rgba([250, 250, 250, 255]));
        let out = median(img, 1);
        assert_eq!(*out.get_pixel(1, 1), Rgba([10, 10, 10, 255]));
    }

    #[test]
    fn median_radius_zero_is_identity() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([5, 5, 5, 255]));
        img.put_pixel(0, 0, Rgba([200, 1, 30, 40]));
        assert_eq!(median(img.clone(), 0), img);
    }

    #[test]
    fn median_is_identity_on_uniform_image() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([33, 66, 99, 132]));
        assert_eq!(median(img.clone(), 2), img);
    }

    #[test]
    fn block_average_flattens_each_block() {
        // Left block all 100, right block all 20; 2x2 blocks on a 4x2 image.
        let mut img = RgbaImage::new(4, 2);
        for y in 0..2 {
            for x in 0..2 {
                img.put_pixel(x, y, Rgba([100, 100, 100, 255]));
                img.put_pixel(x + 2, y, Rgba([20, 20, 20, 255]));
            }
        }
        let out = block_average(img, 2, 2);
        assert_eq!(*out.get_pixel(0, 0), Rgba([100, 100, 100, 255]));
        assert_eq!(*out.get_pixel(1, 1), Rgba([100, 100, 100, 255]));
        assert_eq!(*out.get_pixel(2, 0), Rgba([20, 20, 20, 255]));
        assert_eq!(*out.get_pixel(3, 1), Rgba([20, 20, 20, 255]));
    }

    #[test]
    fn block_average_clips_partial_edge_blocks() {
        // 3 wide with 2-wide blocks: the last column is its own block.
        let mut img = RgbaImage::new(3, 1);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([100, 100, 100, 255]));
        img.put_pixel(2, 0, Rgba([40, 40, 40, 255]));
        let out = block_average(img, 2, 1);
        assert_eq!(*out.get_pixel(0, 0), Rgba([50, 50, 50, 255]));
        assert_eq!(*out.get_pixel(1, 0), Rgba([50, 50, 50, 255]));
        assert_eq!(*out.get_pixel(2, 0), Rgba([40, 40, 40, 255]));
    }

    #[test]
    fn block_average_includes_alpha() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 200]));
        let out = block_average(img, 2, 1);
        assert_eq!(out.get_pixel(0, 0)[3], 100);
    }

    #[test]
    fn scatter_draws_from_radius_window() {
        // Give every pixel a unique colour so the source is identifiable.
        let mut img = RgbaImage::new(8, 8);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Rgba([x as u8, y as u8, 0, 255]);
        }
        let out = scatter(img, 2, 0xDEADBEEF);
        for (x, y, p) in out.enumerate_pixels() {
            let sx = p[0] as i64;
            let sy = p[1] as i64;
            assert!((sx - x as i64).abs() <= 2, "x offset out of window");
            assert!((sy - y as i64).abs() <= 2, "y offset out of window");
        }
    }

    #[test]
    fn scatter_is_reproducible_for_a_fixed_seed() {
        let mut img = RgbaImage::new(6, 6);
        for (x, y, p) in img.enumerate_pixels_mut() {
            *p = Rgba([x as u8 * 10, y as u8 * 10, 7, 255]);
        }
        let a = scatter(img.clone(), 3, 42);
        let b = scatter(img, 3, 42);
        assert_eq!(a, b);
    }
}
