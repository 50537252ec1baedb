pub mod aggregate;
pub mod antialias;
pub mod pixel;
pub mod region;

use std::path::{Path, PathBuf};

use image::RgbaImage;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use self::aggregate::DiffAggregator;
use self::region::RegionFilter;
use crate::error::DiffError;
use crate::options::DiffOptions;
use crate::{output, sampler};

/// Rows scanned per parallel batch; bounds the verdicts held before reduction.
pub const ROW_BATCH: u32 = 64;

/// Discriminant of a [`DiffResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Layout,
    Pixel,
}

impl ResultType {
    /// Integer discriminant used by the C binding layer.
    pub fn code(self) -> i32 {
        match self {
            Self::Layout => 0,
            Self::Pixel => 1,
        }
    }
}

/// Outcome of a comparison that ran to completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result_type", rename_all = "lowercase")]
pub enum DiffResult {
    /// The images have different dimensions; no pixels were compared.
    Layout {
        base: (u32, u32),
        comparison: (u32, u32),
    },
    Pixel(PixelDiff),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixelDiff {
    pub diff_count: u64,
    /// `diff_count / (width * height) * 100`.
    pub diff_percentage: f64,
    /// Ascending, de-duplicated indices of rows with differences; only when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_lines: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_output: Option<PathBuf>,
}

impl PixelDiff {
    pub fn diff_line_count(&self) -> usize {
        self.diff_lines.as_ref().map_or(0, Vec::len)
    }
}

impl DiffResult {
    pub fn result_type(&self) -> ResultType {
        match self {
            Self::Layout { .. } => ResultType::Layout,
            Self::Pixel(_) => ResultType::Pixel,
        }
    }

    pub fn pixel(&self) -> Option<&PixelDiff> {
        match self {
            Self::Pixel(p) => Some(p),
            Self::Layout { .. } => None,
        }
    }

    /// Caller policy: pixel results fail when anything differs, layout results
    /// only when `fail_on_layout_change` is set.
    pub fn is_failure(&self, options: &DiffOptions) -> bool {
        match self {
            Self::Layout { .. } => options.fail_on_layout_change,
            Self::Pixel(p) => p.diff_count > 0,
        }
    }
}

/// In-memory comparison outcome plus the rendered diff image, if one was requested.
#[derive(Debug)]
pub struct Comparison {
    pub result: DiffResult,
    pub diff_image: Option<RgbaImage>,
}

/// Load two images from disk, compare them and optionally write the diff image.
///
/// The output path is validated before any decoding so that an unwritable
/// format fails fast. Layout results never produce an output file.
pub fn compare(
    base_path: &Path,
    comparison_path: &Path,
    diff_output: Option<&Path>,
    options: &DiffOptions,
) -> Result<DiffResult, DiffError> {
    if let Some(out) = diff_output {
        output::output_format(out)?;
    }

    let base = sampler::load_image(base_path)?;
    let comparison = sampler::load_image(comparison_path)?;

    let Comparison {
        mut result,
        diff_image,
    } = compare_images(&base, &comparison, options, diff_output.is_some())?;

    if let (DiffResult::Pixel(pixel), Some(img), Some(out)) = (&mut result, diff_image, diff_output)
    {
        output::write_diff_image(&img, out)?;
        pixel.diff_output = Some(out.to_path_buf());
    }
    Ok(result)
}

/// Compare two decoded images.
///
/// Rows are scanned in parallel, [`ROW_BATCH`] at a time; per-row verdicts are
/// reduced in row order so the result does not depend on the number of worker
/// threads.
pub fn compare_images(
    base: &RgbaImage,
    comparison: &RgbaImage,
    options: &DiffOptions,
    with_diff_image: bool,
) -> Result<Comparison, DiffError> {
    if !(0.0..=1.0).contains(&options.threshold) {
        return Err(DiffError::FailedToDiff(format!(
            "threshold must be between 0.0 and 1.0, got {}",
            options.threshold
        )));
    }
    if !(0.0..=1.0).contains(&options.diff_overlay_factor) {
        return Err(DiffError::FailedToDiff(format!(
            "diff overlay factor must be between 0.0 and 1.0, got {}",
            options.diff_overlay_factor
        )));
    }
    for (name, img) in [("base", base), ("comparison", comparison)] {
        if img.width() == 0 || img.height() == 0 {
            return Err(DiffError::ImageNotLoaded(format!("{name} image is empty")));
        }
    }

    if sampler::layout_differs(base, comparison) {
        info!(
            base = ?base.dimensions(),
            comparison = ?comparison.dimensions(),
            "layout differs, skipping pixel comparison"
        );
        return Ok(Comparison {
            result: DiffResult::Layout {
                base: base.dimensions(),
                comparison: comparison.dimensions(),
            },
            diff_image: None,
        });
    }

    let (width, height) = base.dimensions();
    let filter = RegionFilter::new(&options.ignore_regions, width, height);
    let mut aggregator = DiffAggregator::new(base, options, &filter, with_diff_image)?;

    if base.as_raw() == comparison.as_raw() {
        debug!(width, height, "pixel buffers are identical");
    } else {
        let scan = RowScan {
            base,
            comparison,
            filter: &filter,
            max_delta: pixel::max_delta(options.threshold),
            antialiasing: options.antialiasing,
        };
        let mut start = 0;
        while start < height {
            let end = start.saturating_add(ROW_BATCH).min(height);
            let rows: Vec<Vec<u32>> = (start..end)
                .into_par_iter()
                .map(|y| scan.differing_columns(y))
                .collect();
            for (y, xs) in (start..end).zip(&rows) {
                aggregator.record_row(y, xs);
            }
            start = end;
        }
    }

    let tally = aggregator.finish();
    debug!(
        width,
        height,
        diff_count = tally.diff_count,
        diff_percentage = tally.diff_percentage,
        "pixel comparison finished"
    );

    Ok(Comparison {
        result: DiffResult::Pixel(PixelDiff {
            diff_count: tally.diff_count,
            diff_percentage: tally.diff_percentage,
            diff_lines: tally.diff_lines,
            diff_output: None,
        }),
        diff_image: tally.image,
    })
}

struct RowScan<'a> {
    base: &'a RgbaImage,
    comparison: &'a RgbaImage,
    filter: &'a RegionFilter,
    max_delta: f64,
    antialiasing: bool,
}

impl RowScan<'_> {
    /// Columns of row `y` that count as different.
    fn differing_columns(&self, y: u32) -> Vec<u32> {
        let width = self.base.width();
        let stride = width as usize * 4;
        let start = y as usize * stride;
        let row = start..start + stride;
        if self.base.as_raw()[row.clone()] == self.comparison.as_raw()[row] {
            return Vec::new();
        }

        let check_regions = !self.filter.row_is_clear(y);
        (0..width)
            .filter(|&x| {
                if check_regions && self.filter.is_ignored(x, y) {
                    return false;
                }
                let a = self.base.get_pixel(x, y);
                let b = self.comparison.get_pixel(x, y);
                if !pixel::is_different(a, b, self.max_delta) {
                    return false;
                }
                !(self.antialiasing
                    && antialias::is_antialiased(self.base, self.comparison, x, y))
            })
            .collect()
    }
}
