// ============================================================================
// KERNEL FILTERS — thin adapters over the convolution engine
// ============================================================================
//
// Each filter builds its (fixed or parametric) kernel and delegates to
// crate::convolve.  Radius-0 parametric filters are identities and return the
// input untouched.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::convolve::convolve;
use crate::kernel::Kernel;

/// Fixed sharpen kernel: centre-weighted difference against the 4-neighbours.
const SHARPEN: [f32; 9] = [
    0.0, -0.5, 0.0, //
    -0.5, 3.0, -0.5, //
    0.0, -0.5, 0.0,
];

/// Half-strength Sobel, horizontal gradient.
const SOBEL_H: [f32; 9] = [
    -0.5, 0.0, 0.5, //
    -1.0, 0.0, 1.0, //
    -0.5, 0.0, 0.5,
];

/// Half-strength Sobel, vertical gradient.
const SOBEL_V: [f32; 9] = [
    -0.5, -1.0, -0.5, //
    0.0, 0.0, 0.0, //
    0.5, 1.0, 0.5,
];

/// 4-connected Laplacian.
const LAPLACIAN: [f32; 9] = [
    0.0, -1.0, 0.0, //
    -1.0, 4.0, -1.0, //
    0.0, -1.0, 0.0,
];

/// Gradient axis for the Sobel filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SobelAxis {
    Horizontal,
    Vertical,
}

/// Compass direction of an emboss kernel.  Each kernel is a signed
/// difference pair along its axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbossDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl EmbossDirection {
    /// All eight directions, clockwise from north.
    pub fn all() -> &'static [EmbossDirection] {
        use EmbossDirection::*;
        &[North, NorthEast, East, SouthEast, South, SouthWest, West, NorthWest]
    }

    fn taps(self) -> [f32; 9] {
        use EmbossDirection::*;
        match self {
            North => [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0],
            NorthEast => [0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0],
            East => [0.0, 0.0, 0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0],
            SouthEast => [-1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            South => [0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            SouthWest => [0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            West => [0.0, 0.0, 0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0],
            NorthWest => [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -1.0],
        }
    }
}

/// Sharpen with the fixed 3×3 kernel.  No bias.
pub fn sharpen(input: RgbaImage) -> RgbaImage {
    convolve(&input, &Kernel::square(3, SHARPEN.to_vec()), false)
}

/// Sobel edge detection along the chosen axis.
pub fn sobel(input: RgbaImage, axis: SobelAxis, bias: bool) -> RgbaImage {
    let taps = match axis {
        SobelAxis::Horizontal => SOBEL_H,
        SobelAxis::Vertical => SOBEL_V,
    };
    convolve(&input, &Kernel::square(3, taps.to_vec()), bias)
}

/// Laplacian edge detection.
pub fn laplacian(input: RgbaImage, bias: bool) -> RgbaImage {
    convolve(&input, &Kernel::square(3, LAPLACIAN.to_vec()), bias)
}

/// Directional emboss.
pub fn emboss(input: RgbaImage, direction: EmbossDirection, bias: bool) -> RgbaImage {
    convolve(&input, &Kernel::square(3, direction.taps().to_vec()), bias)
}

/// Gaussian blur of the given radius.  Radius 0 is the identity.
pub fn gaussian_blur(input: RgbaImage, radius: u32) -> RgbaImage {
    if radius == 0 {
        return input;
    }
    convolve(&input, &Kernel::gaussian(radius), false)
}

/// Mean (box) blur of the given radius.  Radius 0 is the identity.
pub fn mean_blur(input: RgbaImage, radius: u32) -> RgbaImage {
    if radius == 0 {
        return input;
    }
    convolve(&input, &Kernel::mean(radius), false)
}
