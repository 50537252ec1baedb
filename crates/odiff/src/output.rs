use std::io::{BufWriter, Write};
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbaImage};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::DiffError;

/// Encoder for `path`, chosen by extension.
pub fn output_format(path: &Path) -> Result<ImageFormat, DiffError> {
    let format = ImageFormat::from_path(path)
        .map_err(|e| DiffError::UnsupportedFormat(format!("{}: {e}", path.display())))?;
    match format {
        ImageFormat::Png
        | ImageFormat::Jpeg
        | ImageFormat::Tiff
        | ImageFormat::WebP
        | ImageFormat::Bmp => Ok(format),
        other => Err(DiffError::UnsupportedFormat(format!(
            "{}: cannot write {other:?} diff images",
            path.display()
        ))),
    }
}

/// Encode `img` into a temporary file next to `path`, then rename it into place.
/// A failed write never leaves a partial file behind.
pub fn write_diff_image(img: &RgbaImage, path: &Path) -> Result<(), DiffError> {
    let format = output_format(path)?;
    let failed = |what: &str, e: &dyn std::fmt::Display| {
        DiffError::FailedToDiff(format!("{what} {}: {e}", path.display()))
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| failed("failed to create directory for", &e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| failed("failed to stage", &e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let encoded = match format {
            // no alpha channel in JPEG
            ImageFormat::Jpeg => DynamicImage::ImageRgba8(img.clone())
                .to_rgb8()
                .write_to(&mut writer, format),
            _ => img.write_to(&mut writer, format),
        };
        encoded.map_err(|e| failed("failed to encode", &e))?;
        writer.flush().map_err(|e| failed("failed to write", &e))?;
    }
    tmp.persist(path)
        .map_err(|e| failed("failed to finalize", &e.error))?;

    debug!(path = %path.display(), ?format, "wrote diff image");
    Ok(())
}
