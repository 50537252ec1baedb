use image::{Rgba, RgbaImage};

use super::region::RegionFilter;
use crate::error::DiffError;
use crate::options::DiffOptions;

/// Final tallies of a pixel scan.
#[derive(Debug)]
pub struct Aggregate {
    pub diff_count: u64,
    pub diff_percentage: f64,
    pub diff_lines: Option<Vec<u32>>,
    pub image: Option<RgbaImage>,
}

/// Accumulates per-row verdicts into counts, row indices and the diff image.
///
/// Rows must be recorded in ascending order; the facade guarantees this by
/// reducing the (possibly parallel) scan sequentially.
pub struct DiffAggregator {
    total_pixels: u64,
    diff_count: u64,
    lines: Option<Vec<u32>>,
    canvas: Option<RgbaImage>,
    marker: [u8; 3],
    /// `None` in mask mode: the marker is drawn as-is.
    overlay_factor: Option<f32>,
}

impl DiffAggregator {
    pub fn new(
        base: &RgbaImage,
        options: &DiffOptions,
        filter: &RegionFilter,
        with_canvas: bool,
    ) -> Result<Self, DiffError> {
        let canvas = if with_canvas {
            Some(allocate_canvas(base, options.output_diff_mask, filter)?)
        } else {
            None
        };

        Ok(Self {
            total_pixels: base.width() as u64 * base.height() as u64,
            diff_count: 0,
            lines: options.diff_lines.then(Vec::new),
            canvas,
            marker: options.diff_rgb(),
            overlay_factor: (!options.output_diff_mask)
                .then_some(options.diff_overlay_factor.clamp(0.0, 1.0)),
        })
    }

    /// Record the differing columns `xs` of row `y`.
    pub fn record_row(&mut self, y: u32, xs: &[u32]) {
        if xs.is_empty() {
            return;
        }
        self.diff_count += xs.len() as u64;

        if let Some(lines) = &mut self.lines
            && lines.last() != Some(&y)
        {
            lines.push(y);
        }

        if let Some(canvas) = &mut self.canvas {
            for &x in xs {
                let px = canvas.get_pixel_mut(x, y);
                *px = match self.overlay_factor {
                    Some(factor) => overlay(*px, self.marker, factor),
                    None => Rgba([self.marker[0], self.marker[1], self.marker[2], 255]),
                };
            }
        }
    }

    pub fn finish(self) -> Aggregate {
        let diff_percentage = if self.total_pixels > 0 {
            self.diff_count as f64 / self.total_pixels as f64 * 100.0
        } else {
            0.0
        };
        Aggregate {
            diff_count: self.diff_count,
            diff_percentage,
            diff_lines: self.lines,
            image: self.canvas,
        }
    }
}

/// Copy of `base` (overlay mode) or a transparent canvas (mask mode).
///
/// Ignored regions always show the base image. Allocation failure is reported
/// as `OutOfMemory` instead of aborting the process.
fn allocate_canvas(
    base: &RgbaImage,
    mask: bool,
    filter: &RegionFilter,
) -> Result<RgbaImage, DiffError> {
    let (width, height) = base.dimensions();
    let bytes = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
        .ok_or(DiffError::OutOfMemory { bytes: usize::MAX })?;

    let mut buf = reserve_canvas(bytes)?;
    if mask {
        buf.resize(bytes, 0);
    } else {
        buf.extend_from_slice(base.as_raw());
    }

    let mut canvas = RgbaImage::from_raw(width, height, buf)
        .ok_or_else(|| DiffError::FailedToDiff("diff canvas has the wrong size".into()))?;

    if mask {
        for region in filter.regions() {
            for y in region.y..region.y + region.height {
                for x in region.x..region.x + region.width {
                    canvas.put_pixel(x, y, *base.get_pixel(x, y));
                }
            }
        }
    }
    Ok(canvas)
}

fn reserve_canvas(bytes: usize) -> Result<Vec<u8>, DiffError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes)
        .map_err(|_| DiffError::OutOfMemory { bytes })?;
    Ok(buf)
}

/// Linear interpolation of each RGB channel towards `marker`; alpha is kept.
fn overlay(px: Rgba<u8>, marker: [u8; 3], factor: f32) -> Rgba<u8> {
    let mix = |c: u8, m: u8| (c as f32 + (m as f32 - c as f32) * factor).round() as u8;
    Rgba([
        mix(px[0], marker[0]),
        mix(px[1], marker[1]),
        mix(px[2], marker[2]),
        px[3],
    ])
}
