// ============================================================================
// GEOMETRIC TRANSFORMS — rotate, flip, crop, resize
// ============================================================================
//
// Rotations and flips are exact index permutations (no resampling).  Crop
// and resize validate their parameters and degrade to logged no-ops on
// boundary violations, per the history contract: a rejected operation must
// leave the buffer byte-identical.

use image::{RgbaImage, imageops};
use serde::{Deserialize, Serialize};

use crate::log_warn;

/// Quarter-turn rotation amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    None,
    Clockwise90,
    Half,
    Clockwise270,
}

impl Rotation {
    /// Parse a degree count; only the four quarter turns are valid.
    pub fn from_degrees(degrees: u32) -> Option<Rotation> {
        match degrees % 360 {
            0 => Some(Rotation::None),
            90 => Some(Rotation::Clockwise90),
            180 => Some(Rotation::Half),
            270 => Some(Rotation::Clockwise270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Half => 180,
            Rotation::Clockwise270 => 270,
        }
    }
}

/// Mirror axis for flips.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

/// Rotate by an exact quarter turn.  90/270 swap width and height; 0 returns
/// the buffer unchanged without allocating.
pub fn rotate(input: RgbaImage, rotation: Rotation) -> RgbaImage {
    match rotation {
        Rotation::None => input,
        Rotation::Clockwise90 => imageops::rotate90(&input),
        Rotation::Half => imageops::rotate180(&input),
        Rotation::Clockwise270 => imageops::rotate270(&input),
    }
}

/// Mirror along the chosen axis.
pub fn flip(input: RgbaImage, axis: FlipAxis) -> RgbaImage {
    match axis {
        FlipAxis::Horizontal => imageops::flip_horizontal(&input),
        FlipAxis::Vertical => imageops::flip_vertical(&input),
    }
}

/// Crop to the rectangle (x, y, w, h).
///
/// The rectangle must satisfy `x ≥ 0`, `y ≥ 0`, `x + w ≤ W`, `y + h ≤ H`;
/// anything else is a boundary violation and the input is returned
/// unchanged with a diagnostic.
pub fn crop(input: RgbaImage, x: i32, y: i32, width: u32, height: u32) -> RgbaImage {
    let img_w = input.width() as i64;
    let img_h = input.height() as i64;
    let in_bounds = x >= 0
        && y >= 0
        && x as i64 + width as i64 <= img_w
        && y as i64 + height as i64 <= img_h;
    if !in_bounds {
        log_warn!(
            "crop rejected: region {}x{}+{}+{} exceeds {}x{} image",
            width, height, x, y, img_w, img_h
        );
        return input;
    }
    imageops::crop_imm(&input, x as u32, y as u32, width, height).to_image()
}

/// Scale both dimensions by `percent / 100` with smooth resampling.
///
/// Shrinking uses a triangle (area-style) filter, enlarging a Catmull-Rom
/// interpolation.  Percent 0 is invalid and a logged no-op; results are
/// never smaller than 1×1.
pub fn resize(input: RgbaImage, percent: u32) -> RgbaImage {
    if percent == 0 {
        log_warn!("resize rejected: zero percent");
        return input;
    }
    if percent == 100 || input.width() == 0 || input.height() == 0 {
        return input;
    }
    let scale = percent as f64 / 100.0;
    let new_w = ((input.width() as f64 * scale) as u32).max(1);
    let new_h = ((input.height() as f64 * scale) as u32).max(1);
    let filter = if percent < 100 {
        imageops::FilterType::Triangle
    } else {
        imageops::FilterType::CatmullRom
    };
    imageops::resize(&input, new_w, new_h, filter)
}
