//! End-to-end editing sessions: apply/undo/redo across the whole operation
//! set, persistence of the operation log, and macro replay onto other images.

use image::{Rgba, RgbaImage};
use pentimento::io;
use pentimento::ops::color::ChannelOrder;
use pentimento::ops::filters::{EmbossDirection, SobelAxis};
use pentimento::ops::shapes::{Shape, ShapeStyle};
use pentimento::ops::transform::{FlipAxis, Rotation};
use pentimento::{EditableImage, Operation};

/// A deterministic non-uniform test image.
fn photo(w: u32, h: u32) -> RgbaImage {
    let mut img = RgbaImage::new(w, h);
    for (x, y, p) in img.enumerate_pixels_mut() {
        *p = Rgba([
            ((x * 31 + 7) % 256) as u8,
            ((y * 53 + 11) % 256) as u8,
            ((x * y + 3) % 256) as u8,
            255,
        ]);
    }
    img
}

/// One operation of every family, exercising the full dispatch.
fn every_family() -> Vec<Operation> {
    vec![
        Operation::Sharpen,
        Operation::Sobel { axis: SobelAxis::Horizontal, bias: true },
        Operation::Laplacian { bias: true },
        Operation::Emboss { direction: EmbossDirection::NorthEast, bias: true },
        Operation::GaussianBlur { radius: 2 },
        Operation::MeanBlur { radius: 1 },
        Operation::Median { radius: 1 },
        Operation::BlockAverage { block_width: 3, block_height: 2 },
        Operation::Scatter { radius: 2, seed: 99 },
        Operation::BrightnessContrast { brightness: 15, contrast: -10 },
        Operation::Saturation { level: 0.7 },
        Operation::ChannelCycle { order: ChannelOrder::Grb },
        Operation::Invert,
        Operation::Transparency { level: 80 },
        Operation::Rotate { rotation: Rotation::Clockwise90 },
        Operation::Flip { axis: FlipAxis::Horizontal },
        Operation::Crop { x: 1, y: 1, width: 8, height: 8 },
        Operation::Resize { percent: 150 },
        Operation::DrawShape {
            shape: Shape::Ellipse { cx: 4.0, cy: 4.0, rx: 3.0, ry: 2.0 },
            color: [200, 30, 30, 255],
            style: ShapeStyle::Both,
        },
        Operation::ClipToShape {
            shape: Shape::Rectangle { x: 0, y: 0, width: 10, height: 10 },
        },
    ]
}

#[test]
fn every_apply_is_undone_pixel_exactly() {
    for op in every_family() {
        let mut image = EditableImage::new(photo(12, 10));
        let before = image.current().clone();
        image.apply(op.clone());
        assert!(image.undo(), "undo after {}", op.describe());
        assert_eq!(
            *image.current(),
            before,
            "undo of {} is not pixel-exact",
            op.describe()
        );
    }
}

#[test]
fn full_unwind_restores_the_original() {
    let mut image = EditableImage::new(photo(12, 10));
    let ops = every_family();
    let n = ops.len();
    for op in ops {
        image.apply(op);
    }
    for _ in 0..n {
        assert!(image.undo());
    }
    assert_eq!(image.current(), image.original());
}

#[test]
fn redo_chain_survives_interleaved_undo() {
    let mut image = EditableImage::new(photo(10, 10));
    for op in [
        Operation::Invert,
        Operation::GaussianBlur { radius: 1 },
        Operation::Rotate { rotation: Rotation::Half },
    ] {
        image.apply(op);
    }
    let end_state = image.current().clone();

    for _ in 0..3 {
        assert!(image.undo());
    }
    for _ in 0..3 {
        assert!(image.redo());
    }
    assert_eq!(*image.current(), end_state);
}

#[test]
fn rejected_crop_is_a_recorded_noop() {
    let mut image = EditableImage::new(photo(4, 4));
    let before = image.current().clone();
    image.apply(Operation::Crop { x: -1, y: 0, width: 2, height: 2 });
    // Buffer unchanged, but the op entered the (deterministic) history.
    assert_eq!(*image.current(), before);
    assert_eq!(image.applied_ops().len(), 1);
    image.undo();
    assert_eq!(*image.current(), before);
}

#[test]
fn session_round_trips_through_an_ops_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("session.ops");

    // First session: edit and save the log.
    let mut first = EditableImage::new(photo(16, 12));
    first.apply(Operation::GaussianBlur { radius: 2 });
    first.apply(Operation::BrightnessContrast { brightness: 10, contrast: 25 });
    first.apply(Operation::Flip { axis: FlipAxis::Vertical });
    io::save_ops(first.applied_ops(), &log_path).expect("save ops");
    first.mark_saved();

    // Second session: same source pixels, restored log.
    let restored = io::load_ops(&log_path).expect("load ops");
    let second = EditableImage::with_ops(photo(16, 12), restored);
    assert_eq!(second.current(), first.current());
    assert_eq!(second.applied_ops(), first.applied_ops());
}

#[test]
fn corrupt_ops_file_is_rejected_atomically() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("session.ops");

    let mut image = EditableImage::new(photo(8, 8));
    image.apply(Operation::Invert);
    image.apply(Operation::Median { radius: 1 });
    io::save_ops(image.applied_ops(), &log_path).expect("save ops");

    // Flip a byte inside the record body.
    let mut raw = std::fs::read(&log_path).expect("read");
    let last = raw.len() - 1;
    raw[last] ^= 0xFF;
    raw.truncate(raw.len() - 2);
    std::fs::write(&log_path, &raw).expect("rewrite");

    // The whole load fails; nothing can be half-replayed.
    assert!(io::load_ops(&log_path).is_err());
}

#[test]
fn recorded_macro_replays_onto_a_differently_sized_image() {
    let mut source = EditableImage::new(photo(20, 14));
    source.start_recording();
    source.apply(Operation::Saturation { level: 1.4 });
    source.apply(Operation::Sharpen);
    source.apply(Operation::Rotate { rotation: Rotation::Half });
    let recorded = source.stop_recording().expect("recording was active");

    let dir = tempfile::tempdir().expect("tempdir");
    let macro_path = dir.path().join("look.ops");
    io::save_ops(&recorded, &macro_path).expect("save macro");

    // Replay on a smaller image: same pipeline, its own history.
    let loaded = io::load_ops(&macro_path).expect("load macro");
    let mut target = EditableImage::new(photo(6, 9));
    target.replay(&loaded);
    assert_eq!(target.applied_ops().len(), 3);

    let mut expected = EditableImage::new(photo(6, 9));
    expected.apply(Operation::Saturation { level: 1.4 });
    expected.apply(Operation::Sharpen);
    expected.apply(Operation::Rotate { rotation: Rotation::Half });
    assert_eq!(target.current(), expected.current());
}

#[test]
fn macro_with_out_of_range_crop_degrades_to_noop_on_small_target() {
    // Recorded against a large image, replayed on one where the crop no
    // longer fits: the crop reports a boundary violation and passes the
    // buffer through.
    let ops = vec![
        Operation::Crop { x: 10, y: 10, width: 50, height: 50 },
        Operation::Invert,
    ];
    let mut small = EditableImage::new(photo(8, 8));
    small.replay(&ops);
    assert_eq!(small.current().dimensions(), (8, 8));

    let mut expected = EditableImage::new(photo(8, 8));
    expected.apply(Operation::Invert);
    assert_eq!(small.current(), expected.current());
}

#[test]
fn rotation_group_closure_on_non_square_images() {
    let mut image = EditableImage::new(photo(9, 5));
    image.apply(Operation::Rotate { rotation: Rotation::Clockwise90 });
    assert_eq!(image.current().dimensions(), (5, 9));
    image.apply(Operation::Rotate { rotation: Rotation::Clockwise270 });
    assert_eq!(image.current().dimensions(), (9, 5));
    assert_eq!(image.current(), image.original());
}
