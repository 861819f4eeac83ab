//! File boundary: image decode/encode and operation-log persistence.
//!
//! The core never touches the filesystem on its own — everything routes
//! through here.  Operation logs (`.ops` sidecars and saved macros) are a
//! magic header plus a bincode-encoded `Vec<Operation>`; a file that fails
//! any part of decoding is rejected whole, so a corrupt log can never be
//! partially replayed.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageError, ImageFormat, RgbaImage};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::log_info;
use crate::operation::Operation;

/// Magic header for operation-log files, version 1.
const OPS_MAGIC: &[u8; 4] = b"PNT1";

/// Extension appended to an image path for its sidecar log
/// (`photo.png` → `photo.png.ops`).
const OPS_SIDECAR_EXT: &str = "ops";

// ============================================================================
// Errors
// ============================================================================

/// Error type for operation-log files.
#[derive(Debug)]
pub enum OpsError {
    Io(std::io::Error),
    Serialize(String),
    InvalidFormat(String),
}

impl std::fmt::Display for OpsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpsError::Io(e) => write!(f, "I/O error: {}", e),
            OpsError::Serialize(e) => write!(f, "Serialization error: {}", e),
            OpsError::InvalidFormat(e) => write!(f, "Invalid format: {}", e),
        }
    }
}

impl std::error::Error for OpsError {}

impl From<std::io::Error> for OpsError {
    fn from(e: std::io::Error) -> Self {
        OpsError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for OpsError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        OpsError::Serialize(e.to_string())
    }
}

// ============================================================================
// Operation-log files
// ============================================================================

/// Sidecar log path for an image file: the image path with `.ops` appended.
pub fn ops_sidecar_path(image_path: &Path) -> PathBuf {
    let mut name = image_path.as_os_str().to_owned();
    name.push(".");
    name.push(OPS_SIDECAR_EXT);
    PathBuf::from(name)
}

/// Write an operation log: magic header, then the bincoded op list.
pub fn save_ops(ops: &[Operation], path: &Path) -> Result<(), OpsError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(OPS_MAGIC)?;
    bincode::serialize_into(&mut writer, ops)?;
    writer.flush()?;
    log_info!("saved {} op(s) to {}", ops.len(), path.display());
    Ok(())
}

/// Read an operation log written by [`save_ops`].
///
/// The whole file is validated before anything is returned: wrong magic,
/// short files and undecodable records all fail here, never mid-replay.
pub fn load_ops(path: &Path) -> Result<Vec<Operation>, OpsError> {
    let raw = fs::read(path)?;
    if raw.len() < OPS_MAGIC.len() {
        return Err(OpsError::InvalidFormat("file too small".into()));
    }
    let (magic, body) = raw.split_at(OPS_MAGIC.len());
    if magic != OPS_MAGIC.as_slice() {
        return Err(OpsError::InvalidFormat(format!(
            "unrecognized header {:?} (expected {:?})",
            &magic, OPS_MAGIC
        )));
    }
    let ops: Vec<Operation> = bincode::deserialize(body)?;
    log_info!("loaded {} op(s) from {}", ops.len(), path.display());
    Ok(ops)
}

// ============================================================================
// Image decode
// ============================================================================

/// Decode an image file to RGBA.
pub fn load_image(path: &Path) -> Result<RgbaImage, String> {
    let img = image::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(img.to_rgba8())
}

/// Decode an image and, if a sidecar `.ops` log sits next to it, load that
/// too.  A missing or unreadable sidecar starts a fresh history — opening a
/// plain image must never fail because of a stale log.
pub fn load_image_with_sidecar(path: &Path) -> Result<(RgbaImage, Vec<Operation>), String> {
    let img = load_image(path)?;
    let sidecar = ops_sidecar_path(path);
    let ops = if sidecar.exists() {
        match load_ops(&sidecar) {
            Ok(ops) => ops,
            Err(e) => {
                crate::log_warn!("ignoring sidecar {}: {}", sidecar.display(), e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };
    Ok((img, ops))
}

// ============================================================================
// Image encode
// ============================================================================

/// Supported output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg,
    Webp,
    Bmp,
    Tga,
    Ico,
    Tiff,
    Gif,
}

impl SaveFormat {
    /// Canonical file extension.
    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Webp => "webp",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Tga => "tga",
            SaveFormat::Ico => "ico",
            SaveFormat::Tiff => "tiff",
            SaveFormat::Gif => "gif",
        }
    }

    /// Parse a user-supplied format name; `None` for unknown names.
    pub fn from_name(name: &str) -> Option<SaveFormat> {
        match name.to_lowercase().as_str() {
            "png" => Some(SaveFormat::Png),
            "jpeg" | "jpg" => Some(SaveFormat::Jpeg),
            "webp" => Some(SaveFormat::Webp),
            "bmp" => Some(SaveFormat::Bmp),
            "tga" => Some(SaveFormat::Tga),
            "ico" => Some(SaveFormat::Ico),
            "tiff" | "tif" => Some(SaveFormat::Tiff),
            "gif" => Some(SaveFormat::Gif),
            _ => None,
        }
    }

    /// Infer from a file extension, defaulting to PNG.
    pub fn from_path(path: &Path) -> SaveFormat {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(SaveFormat::from_name)
            .unwrap_or(SaveFormat::Png)
    }

    fn image_format(self) -> ImageFormat {
        match self {
            SaveFormat::Png => ImageFormat::Png,
            SaveFormat::Jpeg => ImageFormat::Jpeg,
            SaveFormat::Webp => ImageFormat::WebP,
            SaveFormat::Bmp => ImageFormat::Bmp,
            SaveFormat::Tga => ImageFormat::Tga,
            SaveFormat::Ico => ImageFormat::Ico,
            SaveFormat::Tiff => ImageFormat::Tiff,
            SaveFormat::Gif => ImageFormat::Gif,
        }
    }
}

/// Encode a buffer to disk in the requested format.
///
/// JPEG is alpha-less, so the buffer is flattened to RGB and encoded with
/// the requested quality; every other format goes through the `image`
/// crate's encoder for that format.
pub fn encode_and_write(
    img: &RgbaImage,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), ImageError> {
    match format {
        SaveFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100))
                .encode_image(&rgb)?;
            writer.flush()?;
            Ok(())
        }
        _ => DynamicImage::ImageRgba8(img.clone()).save_with_format(path, format.image_format()),
    }
}

/// Export a buffer, inferring the format from the path's extension.
pub fn export_image(img: &RgbaImage, path: &Path, quality: u8) -> Result<(), ImageError> {
    encode_and_write(img, path, SaveFormat::from_path(path), quality)
}
