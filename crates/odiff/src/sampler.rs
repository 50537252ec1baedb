use std::path::Path;

use image::{DynamicImage, ImageError, ImageReader, RgbImage, RgbaImage};
use tracing::debug;

use crate::error::DiffError;

/// Decode the file at `path` and normalize it to RGBA8.
pub fn load_image(path: &Path) -> Result<RgbaImage, DiffError> {
    let reader = ImageReader::open(path)
        .map_err(|e| DiffError::ImageNotLoaded(format!("{}: {e}", path.display())))?
        .with_guessed_format()
        .map_err(|e| DiffError::ImageNotLoaded(format!("{}: {e}", path.display())))?;

    let decoded = reader.decode().map_err(|e| match e {
        ImageError::Unsupported(u) => {
            DiffError::UnsupportedFormat(format!("{}: {u}", path.display()))
        }
        other => DiffError::ImageNotLoaded(format!("{}: {other}", path.display())),
    })?;

    debug!(
        path = %path.display(),
        width = decoded.width(),
        height = decoded.height(),
        color = ?decoded.color(),
        "decoded image"
    );
    normalize(decoded)
}

/// Accept RGB or RGBA data (any bit depth) and convert to RGBA8.
pub fn normalize(img: DynamicImage) -> Result<RgbaImage, DiffError> {
    if img.width() == 0 || img.height() == 0 {
        return Err(DiffError::ImageNotLoaded(format!(
            "image is empty ({}x{})",
            img.width(),
            img.height()
        )));
    }
    match img.color().channel_count() {
        3 | 4 => Ok(match img {
            DynamicImage::ImageRgba8(rgba) => rgba,
            other => other.to_rgba8(),
        }),
        n => Err(DiffError::UnsupportedFormat(format!(
            "expected 3 or 4 color channels, got {n} ({:?})",
            img.color()
        ))),
    }
}

/// Build an RGBA8 image from an interleaved 8-bit buffer handed over by a host adapter.
pub fn from_raw(
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
) -> Result<RgbaImage, DiffError> {
    if width == 0 || height == 0 || data.is_empty() {
        return Err(DiffError::ImageNotLoaded(format!(
            "empty pixel buffer ({width}x{height}, {} bytes)",
            data.len()
        )));
    }
    if channels != 3 && channels != 4 {
        return Err(DiffError::UnsupportedFormat(format!(
            "expected 3 or 4 color channels, got {channels}"
        )));
    }

    let expected = width as usize * height as usize * channels as usize;
    if data.len() != expected {
        return Err(DiffError::ImageNotLoaded(format!(
            "pixel buffer holds {} bytes, expected {expected} for {width}x{height}x{channels}",
            data.len()
        )));
    }

    let img = if channels == 4 {
        RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8)
    } else {
        RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
    };
    img.ok_or_else(|| DiffError::FailedToDiff("pixel buffer rejected by image container".into()))
        .and_then(normalize)
}

/// `true` when the two images cannot be compared pixel by pixel.
pub fn layout_differs(base: &RgbaImage, comparison: &RgbaImage) -> bool {
    base.dimensions() != comparison.dimensions()
}
