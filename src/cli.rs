// ============================================================================
// pentimento CLI — headless batch editing via command-line arguments
// ============================================================================
//
// Usage examples:
//   pentimento --input photo.png --op gaussian:3 --op rotate:90 --output out.png
//   pentimento -i photo.jpg -o out.png                 (format inferred from output ext)
//   pentimento -i "*.jpg" --op invert --output-dir processed/ --format png
//   pentimento -i photo.png --replay session.ops --op sharpen --save-ops combo.ops -o out.png
//   pentimento -i photo.png --undo 2 -o out.png        (unwind the sidecar history)
//
// All processing runs synchronously per file; parallelism lives inside the
// filters themselves.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::editable::EditableImage;
use crate::io::{
    self, SaveFormat, encode_and_write, load_image, load_image_with_sidecar, ops_sidecar_path,
};
use crate::operation::Operation;
use crate::ops::color::ChannelOrder;
use crate::ops::filters::{EmbossDirection, SobelAxis};
use crate::ops::shapes::{Shape, ShapeStyle};
use crate::ops::transform::{FlipAxis, Rotation};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// pentimento headless image editor.
///
/// Apply non-destructive operation pipelines to image files and convert
/// between formats — no GUI required.
#[derive(Parser, Debug)]
#[command(
    name = "pentimento",
    about = "pentimento headless batch image editor",
    long_about = "Apply operation pipelines to image files without opening a GUI.\n\
                  Supports PNG, JPEG, WEBP, BMP, TGA, ICO, TIFF and GIF (static).\n\n\
                  Opening an image also loads its `<image>.ops` sidecar history when\n\
                  present (disable with --no-sidecar); --write-sidecar stores the\n\
                  applied history next to the output for later sessions.\n\n\
                  Operation specs (repeat --op to build a pipeline):\n  \
                  sharpen | laplacian[:bias] | sobel:h|v[,bias] | emboss:n|ne|e|se|s|sw|w|nw[,bias]\n  \
                  gaussian:R | mean:R | median:R | scatter:R | block:WxH\n  \
                  bc:B,C | saturation:L | cycle:rgb|rbg|brg|gbr|grb|bgr | invert | transparency:P\n  \
                  rotate:0|90|180|270 | flip:h|v | crop:X,Y,W,H | resize:P\n  \
                  draw-rect:X,Y,W,H,#RRGGBB[AA][,outline|filled|both]\n  \
                  draw-ellipse:CX,CY,RX,RY,#RRGGBB[AA][,style] | draw-line:X0,Y0,X1,Y1,#RRGGBB[AA]\n  \
                  clip-rect:X,Y,W,H | clip-ellipse:CX,CY,RX,RY\n\n\
                  Example:\n  \
                  pentimento -i photo.png --op gaussian:3 --op bc:10,20 -o result.png"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Operation spec to apply, in order. May be repeated.
    #[arg(long = "op", value_name = "SPEC")]
    pub ops: Vec<String>,

    /// Replay a saved operation log before applying any --op pipeline.
    #[arg(long, value_name = "FILE.ops")]
    pub replay: Option<PathBuf>,

    /// Record the operations applied by this run into a reusable log.
    #[arg(long, value_name = "FILE.ops")]
    pub save_ops: Option<PathBuf>,

    /// Undo this many operations before saving (after replay and --op).
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub undo: usize,

    /// Ignore any `<input>.ops` sidecar history.
    #[arg(long)]
    pub no_sidecar: bool,

    /// Write the full applied history to `<output>.ops` next to the output.
    #[arg(long)]
    pub write_sidecar: bool,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and the target format's extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, webp, bmp, tga, ico, tiff, gif.
    /// When omitted, the format is inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1–100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Print per-file history and timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    // Resolve glob patterns / literal paths → concrete PathBufs
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    // Multiple inputs require --output-dir, not --output
    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    // Parse the pipeline up front so a typo fails before any file is touched
    let pipeline: Vec<Operation> = match args.ops.iter().map(|s| parse_op_spec(s)).collect() {
        Ok(ops) => ops,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // A replay log is loaded once and validated whole; a corrupt file must
    // not half-apply to anything.
    let replay_ops: Option<Vec<Operation>> = match &args.replay {
        Some(path) => match io::load_ops(path) {
            Ok(ops) => Some(ops),
            Err(e) => {
                eprintln!("error: could not load ops file '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let save_format = parse_format(args.format.as_deref(), args.output.as_deref());

    // Create output directory if specified
    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "error: could not create output directory '{}': {}",
                dir.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;
    // The run's recording is written once, from the first successful file.
    let mut ops_saved = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let output_path = match build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            save_format,
        ) {
            Some(p) => p,
            None => {
                eprintln!(
                    "  error: cannot determine output path for '{}'.",
                    input_path.display()
                );
                any_failure = true;
                continue;
            }
        };

        let record_to = if ops_saved { None } else { args.save_ops.as_deref() };
        match run_one(input_path, &output_path, replay_ops.as_deref(), &pipeline, record_to, &args)
        {
            Ok(()) => {
                ops_saved |= record_to.is_some();
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    input: &Path,
    output: &Path,
    replay_ops: Option<&[Operation]>,
    pipeline: &[Operation],
    record_to: Option<&Path>,
    args: &CliArgs,
) -> Result<(), String> {
    // -- Step 1: Load (with or without sidecar history) -------------------
    let mut image = if args.no_sidecar {
        EditableImage::new(load_image(input).map_err(|e| format!("load failed: {}", e))?)
    } else {
        let (buffer, sidecar_ops) =
            load_image_with_sidecar(input).map_err(|e| format!("load failed: {}", e))?;
        if args.verbose && !sidecar_ops.is_empty() {
            println!("  [history] restored {} op(s) from sidecar", sidecar_ops.len());
        }
        EditableImage::with_ops(buffer, sidecar_ops)
    };

    // -- Step 2: Replay a saved log (optional) ----------------------------
    if let Some(ops) = replay_ops {
        image.replay(ops);
        if args.verbose {
            println!("  [replay] applied {} op(s)", ops.len());
        }
    }

    // -- Step 3: Apply the --op pipeline, recording if requested ----------
    if record_to.is_some() {
        image.start_recording();
    }
    for op in pipeline {
        image.apply(op.clone());
        if args.verbose {
            println!("  [apply] {}", op.describe());
        }
    }
    if let Some(path) = record_to {
        match image.stop_recording() {
            Some(recorded) if recorded.is_empty() => {
                eprintln!("  warning: nothing to save — no operations were recorded.");
            }
            Some(recorded) => {
                io::save_ops(&recorded, path)
                    .map_err(|e| format!("could not save ops file: {}", e))?;
                if args.verbose {
                    println!("  [macro] saved {} op(s) to {}", recorded.len(), path.display());
                }
            }
            None => {}
        }
    }

    // -- Step 4: Unwind history if asked ----------------------------------
    for _ in 0..args.undo {
        if !image.undo() {
            eprintln!("  warning: nothing to undo.");
            break;
        }
    }

    if args.verbose {
        for op in image.applied_ops() {
            println!("  [history] {}", op.describe());
        }
    }

    // -- Step 5: Save ------------------------------------------------------
    let format = parse_format(args.format.as_deref(), Some(output));
    encode_and_write(image.current(), output, format, args.quality)
        .map_err(|e| format!("save failed: {}", e))?;

    if args.write_sidecar {
        let sidecar = ops_sidecar_path(output);
        io::save_ops(image.applied_ops(), &sidecar)
            .map_err(|e| format!("could not save sidecar: {}", e))?;
    }
    image.mark_saved();

    Ok(())
}

// ============================================================================
// Operation spec parsing
// ============================================================================

/// Parse one `--op` spec (`name[:arg[,arg...]]`) into an [`Operation`].
pub fn parse_op_spec(spec: &str) -> Result<Operation, String> {
    let (name, rest) = match spec.split_once(':') {
        Some((n, r)) => (n.trim(), r.trim()),
        None => (spec.trim(), ""),
    };
    let parts: Vec<&str> = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',').map(str::trim).collect()
    };

    let err = |msg: &str| Err(format!("bad op spec '{}': {}", spec, msg));

    match name.to_lowercase().as_str() {
        "sharpen" => Ok(Operation::Sharpen),
        "laplacian" => match parts.as_slice() {
            [] => Ok(Operation::Laplacian { bias: false }),
            ["bias"] => Ok(Operation::Laplacian { bias: true }),
            _ => err("expected laplacian[:bias]"),
        },
        "sobel" => {
            let (axis_str, bias) = match parts.as_slice() {
                [a] => (*a, false),
                [a, "bias"] => (*a, true),
                _ => return err("expected sobel:h|v[,bias]"),
            };
            let axis = match axis_str {
                "h" | "horizontal" => SobelAxis::Horizontal,
                "v" | "vertical" => SobelAxis::Vertical,
                _ => return err("axis must be h or v"),
            };
            Ok(Operation::Sobel { axis, bias })
        }
        "emboss" => {
            let (dir_str, bias) = match parts.as_slice() {
                [d] => (*d, false),
                [d, "bias"] => (*d, true),
                _ => return err("expected emboss:DIR[,bias]"),
            };
            let direction = match dir_str {
                "n" => EmbossDirection::North,
                "ne" => EmbossDirection::NorthEast,
                "e" => EmbossDirection::East,
                "se" => EmbossDirection::SouthEast,
                "s" => EmbossDirection::South,
                "sw" => EmbossDirection::SouthWest,
                "w" => EmbossDirection::West,
                "nw" => EmbossDirection::NorthWest,
                _ => return err("direction must be one of n,ne,e,se,s,sw,w,nw"),
            };
            Ok(Operation::Emboss { direction, bias })
        }
        "gaussian" => Ok(Operation::GaussianBlur { radius: parse_one(&parts, spec)? }),
        "mean" => Ok(Operation::MeanBlur { radius: parse_one(&parts, spec)? }),
        "median" => Ok(Operation::Median { radius: parse_one(&parts, spec)? }),
        "scatter" => Ok(Operation::scatter(parse_one(&parts, spec)?)),
        "block" => {
            let [dims] = parts.as_slice() else {
                return err("expected block:WxH");
            };
            let (w, h) = dims
                .split_once('x')
                .ok_or_else(|| format!("bad op spec '{}': expected block:WxH", spec))?;
            let block_width = parse_num(w, spec)?;
            let block_height = parse_num(h, spec)?;
            Ok(Operation::BlockAverage { block_width, block_height })
        }
        "bc" | "brightness-contrast" => {
            let [b, c] = parts.as_slice() else {
                return err("expected bc:BRIGHTNESS,CONTRAST");
            };
            Ok(Operation::BrightnessContrast {
                brightness: parse_num(b, spec)?,
                contrast: parse_num(c, spec)?,
            })
        }
        "saturation" => {
            let [l] = parts.as_slice() else {
                return err("expected saturation:LEVEL");
            };
            Ok(Operation::Saturation { level: parse_num(l, spec)? })
        }
        "cycle" => {
            let [order] = parts.as_slice() else {
                return err("expected cycle:ORDER");
            };
            let order = match *order {
                "rgb" => ChannelOrder::Rgb,
                "rbg" => ChannelOrder::Rbg,
                "brg" => ChannelOrder::Brg,
                "gbr" => ChannelOrder::Gbr,
                "grb" => ChannelOrder::Grb,
                "bgr" => ChannelOrder::Bgr,
                _ => return err("order must be a permutation of r, g and b"),
            };
            Ok(Operation::ChannelCycle { order })
        }
        "invert" => Ok(Operation::Invert),
        "transparency" => Ok(Operation::Transparency { level: parse_one(&parts, spec)? }),
        "rotate" => {
            let degrees: u32 = parse_one(&parts, spec)?;
            match Rotation::from_degrees(degrees) {
                Some(rotation) => Ok(Operation::Rotate { rotation }),
                None => err("rotation must be 0, 90, 180 or 270 degrees"),
            }
        }
        "flip" => match parts.as_slice() {
            ["h" | "horizontal"] => Ok(Operation::Flip { axis: FlipAxis::Horizontal }),
            ["v" | "vertical"] => Ok(Operation::Flip { axis: FlipAxis::Vertical }),
            _ => err("expected flip:h|v"),
        },
        "crop" => {
            let [x, y, w, h] = parts.as_slice() else {
                return err("expected crop:X,Y,W,H");
            };
            Ok(Operation::Crop {
                x: parse_num(x, spec)?,
                y: parse_num(y, spec)?,
                width: parse_num(w, spec)?,
                height: parse_num(h, spec)?,
            })
        }
        "resize" => Ok(Operation::Resize { percent: parse_one(&parts, spec)? }),
        "draw-rect" => {
            let (coords, color, style) = split_draw_args(&parts, 4, spec)?;
            Ok(Operation::DrawShape {
                shape: Shape::Rectangle {
                    x: parse_num(coords[0], spec)?,
                    y: parse_num(coords[1], spec)?,
                    width: parse_num(coords[2], spec)?,
                    height: parse_num(coords[3], spec)?,
                },
                color,
                style,
            })
        }
        "draw-ellipse" => {
            let (coords, color, style) = split_draw_args(&parts, 4, spec)?;
            Ok(Operation::DrawShape {
                shape: Shape::Ellipse {
                    cx: parse_num(coords[0], spec)?,
                    cy: parse_num(coords[1], spec)?,
                    rx: parse_num(coords[2], spec)?,
                    ry: parse_num(coords[3], spec)?,
                },
                color,
                style,
            })
        }
        "draw-line" => {
            let (coords, color, _) = split_draw_args(&parts, 4, spec)?;
            Ok(Operation::DrawShape {
                shape: Shape::Line {
                    x0: parse_num(coords[0], spec)?,
                    y0: parse_num(coords[1], spec)?,
                    x1: parse_num(coords[2], spec)?,
                    y1: parse_num(coords[3], spec)?,
                },
                color,
                style: ShapeStyle::Outline,
            })
        }
        "clip-rect" => {
            let [x, y, w, h] = parts.as_slice() else {
                return err("expected clip-rect:X,Y,W,H");
            };
            Ok(Operation::ClipToShape {
                shape: Shape::Rectangle {
                    x: parse_num(x, spec)?,
                    y: parse_num(y, spec)?,
                    width: parse_num(w, spec)?,
                    height: parse_num(h, spec)?,
                },
            })
        }
        "clip-ellipse" => {
            let [cx, cy, rx, ry] = parts.as_slice() else {
                return err("expected clip-ellipse:CX,CY,RX,RY");
            };
            Ok(Operation::ClipToShape {
                shape: Shape::Ellipse {
                    cx: parse_num(cx, spec)?,
                    cy: parse_num(cy, spec)?,
                    rx: parse_num(rx, spec)?,
                    ry: parse_num(ry, spec)?,
                },
            })
        }
        other => Err(format!("unknown operation '{}'", other)),
    }
}

/// Parse a spec that takes exactly one numeric argument.
fn parse_one<T: std::str::FromStr>(parts: &[&str], spec: &str) -> Result<T, String> {
    let [value] = parts else {
        return Err(format!("bad op spec '{}': expected exactly one argument", spec));
    };
    parse_num(value, spec)
}

fn parse_num<T: std::str::FromStr>(value: &str, spec: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("bad op spec '{}': '{}' is not a valid number", spec, value))
}

/// Split draw-op arguments into coordinates, colour and optional style.
fn split_draw_args<'a>(
    parts: &[&'a str],
    coord_count: usize,
    spec: &str,
) -> Result<(Vec<&'a str>, [u8; 4], ShapeStyle), String> {
    if parts.len() < coord_count + 1 {
        return Err(format!(
            "bad op spec '{}': expected {} coordinates and a colour",
            spec, coord_count
        ));
    }
    let coords = parts[..coord_count].to_vec();
    let color = parse_color(parts[coord_count], spec)?;
    let style = match parts.get(coord_count + 1) {
        None => ShapeStyle::Filled,
        Some(&"outline") => ShapeStyle::Outline,
        Some(&"filled") => ShapeStyle::Filled,
        Some(&"both") => ShapeStyle::Both,
        Some(other) => {
            return Err(format!("bad op spec '{}': unknown style '{}'", spec, other));
        }
    };
    Ok((coords, color, style))
}

/// Parse `#RRGGBB` or `#RRGGBBAA` into RGBA bytes (alpha defaults to 255).
fn parse_color(value: &str, spec: &str) -> Result<[u8; 4], String> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    let bad = || format!("bad op spec '{}': '{}' is not a #RRGGBB[AA] colour", spec, value);
    if hex.len() != 6 && hex.len() != 8 {
        return Err(bad());
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
    let a = if hex.len() == 8 { byte(6)? } else { 255 };
    Ok([byte(0)?, byte(2)?, byte(4)?, a])
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            // Literal path — use directly
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        // Treat as glob pattern
        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the [`SaveFormat`] from the `--format` string or infer it from the
/// output file extension. Defaults to PNG when neither is known.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> SaveFormat {
    if let Some(f) = format_arg
        && let Some(format) = SaveFormat::from_name(f)
    {
        return format;
    }
    match output {
        Some(out) => SaveFormat::from_path(out),
        None => SaveFormat::Png,
    }
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, same stem, new extension
///    (appends `_out` to stem if it would collide with the input path)
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    // Explicit output path
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    // Write next to the input file
    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));

    // Avoid silent overwrite of the input
    if candidate == input {
        Some(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}
