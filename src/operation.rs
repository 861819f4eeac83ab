//! The closed set of image operations.
//!
//! Every edit is a value of [`Operation`]: an immutable, serializable record
//! of one transform and its parameters.  Applying the same value to the same
//! buffer always yields the same buffer — including `Scatter`, whose
//! randomness is frozen into a per-construction seed — which is what makes
//! replay-based undo and saved operation logs exact.
//!
//! `apply` takes the buffer by value: operations that allocate a new buffer
//! simply drop the old one, and `Invert` mutates the moved buffer in place.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ops::color::{self, ChannelOrder};
use crate::ops::filters::{self, EmbossDirection, SobelAxis};
use crate::ops::shapes::{self, Shape, ShapeStyle};
use crate::ops::spatial;
use crate::ops::transform::{self, FlipAxis, Rotation};

/// One reversible edit, with its parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    Sharpen,
    Sobel { axis: SobelAxis, bias: bool },
    Laplacian { bias: bool },
    Emboss { direction: EmbossDirection, bias: bool },
    GaussianBlur { radius: u32 },
    MeanBlur { radius: u32 },
    Median { radius: u32 },
    BlockAverage { block_width: u32, block_height: u32 },
    Scatter { radius: u32, seed: u64 },
    BrightnessContrast { brightness: i32, contrast: i32 },
    Saturation { level: f32 },
    ChannelCycle { order: ChannelOrder },
    Invert,
    Transparency { level: u32 },
    Rotate { rotation: Rotation },
    Flip { axis: FlipAxis },
    Crop { x: i32, y: i32, width: u32, height: u32 },
    Resize { percent: u32 },
    DrawShape { shape: Shape, color: [u8; 4], style: ShapeStyle },
    ClipToShape { shape: Shape },
}

impl Operation {
    /// Build a `Scatter` with a fresh seed, so each call-site gets new
    /// randomness while the resulting value stays replayable.
    pub fn scatter(radius: u32) -> Operation {
        Operation::Scatter { radius, seed: fresh_seed() }
    }

    /// Apply this operation to a buffer.
    ///
    /// Total over the whole variant set; invalid parameters (out-of-bounds
    /// crop, zero-percent resize) degrade to logged no-ops inside the
    /// individual transforms, so the result is always a valid buffer.
    pub fn apply(&self, image: RgbaImage) -> RgbaImage {
        match *self {
            Operation::Sharpen => filters::sharpen(image),
            Operation::Sobel { axis, bias } => filters::sobel(image, axis, bias),
            Operation::Laplacian { bias } => filters::laplacian(image, bias),
            Operation::Emboss { direction, bias } => filters::emboss(image, direction, bias),
            Operation::GaussianBlur { radius } => filters::gaussian_blur(image, radius),
            Operation::MeanBlur { radius } => filters::mean_blur(image, radius),
            Operation::Median { radius } => spatial::median(image, radius),
            Operation::BlockAverage { block_width, block_height } => {
                spatial::block_average(image, block_width, block_height)
            }
            Operation::Scatter { radius, seed } => spatial::scatter(image, radius, seed),
            Operation::BrightnessContrast { brightness, contrast } => {
                color::brightness_contrast(image, brightness, contrast)
            }
            Operation::Saturation { level } => color::saturation(image, level),
            Operation::ChannelCycle { order } => color::channel_cycle(image, order),
            Operation::Invert => color::invert(image),
            Operation::Transparency { level } => color::transparency(image, level),
            Operation::Rotate { rotation } => transform::rotate(image, rotation),
            Operation::Flip { axis } => transform::flip(image, axis),
            Operation::Crop { x, y, width, height } => {
                transform::crop(image, x, y, width, height)
            }
            Operation::Resize { percent } => transform::resize(image, percent),
            Operation::DrawShape { shape, color, style } => {
                shapes::draw_shape(image, shape, color, style)
            }
            Operation::ClipToShape { shape } => shapes::clip_to_shape(image, shape),
        }
    }

    /// Short human-readable label for logs and history listings.
    pub fn describe(&self) -> String {
        match *self {
            Operation::Sharpen => "Sharpen".into(),
            Operation::Sobel { axis, .. } => format!("Sobel ({:?})", axis),
            Operation::Laplacian { .. } => "Laplacian".into(),
            Operation::Emboss { direction, .. } => format!("Emboss ({:?})", direction),
            Operation::GaussianBlur { radius } => format!("Gaussian Blur (r={})", radius),
            Operation::MeanBlur { radius } => format!("Mean Blur (r={})", radius),
            Operation::Median { radius } => format!("Median (r={})", radius),
            Operation::BlockAverage { block_width, block_height } => {
                format!("Block Average ({}x{})", block_width, block_height)
            }
            Operation::Scatter { radius, .. } => format!("Scatter (r={})", radius),
            Operation::BrightnessContrast { brightness, contrast } => {
                format!("Brightness/Contrast ({:+}, {:+})", brightness, contrast)
            }
            Operation::Saturation { level } => format!("Saturation ({:.2})", level),
            Operation::ChannelCycle { order } => format!("Channel Cycle ({:?})", order),
            Operation::Invert => "Invert".into(),
            Operation::Transparency { level } => format!("Transparency ({}%)", level),
            Operation::Rotate { rotation } => format!("Rotate {}°", rotation.degrees()),
            Operation::Flip { axis } => format!("Flip ({:?})", axis),
            Operation::Crop { x, y, width, height } => {
                format!("Crop ({}x{}+{}+{})", width, height, x, y)
            }
            Operation::Resize { percent } => format!("Resize ({}%)", percent),
            Operation::DrawShape { shape, .. } => format!("Draw {}", shape_name(shape)),
            Operation::ClipToShape { shape } => format!("Clip to {}", shape_name(shape)),
        }
    }
}

fn shape_name(shape: Shape) -> &'static str {
    match shape {
        Shape::Rectangle { .. } => "Rectangle",
        Shape::Ellipse { .. } => "Ellipse",
        Shape::Line { .. } => "Line",
    }
}

/// Seed source for `Operation::scatter`: wall-clock nanoseconds stirred with
/// a process-wide counter, so two ops constructed back-to-back still differ.
fn fresh_seed() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    nanos ^ n.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
