use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DiffError;

/// Marker color used when no `diff_pixel` is configured (`#FF0000`).
pub const DEFAULT_DIFF_PIXEL: u32 = 0xFF0000;

/// Configuration for a single comparison call.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffOptions {
    /// Reclassify isolated edge-smoothing differences as noise.
    pub antialiasing: bool,
    /// Draw differences onto a blank canvas instead of over the base image.
    pub output_diff_mask: bool,
    /// Blend strength (0.0-1.0) of `diff_pixel` in overlay mode.
    pub diff_overlay_factor: f32,
    /// Collect the indices of rows that contain differences.
    pub diff_lines: bool,
    /// Packed `0xRRGGBB` marker color.
    pub diff_pixel: u32,
    /// Normalized perceptual distance cutoff (0.0-1.0).
    pub threshold: f64,
    /// Caller policy: treat a layout result as a failure.
    pub fail_on_layout_change: bool,
    pub ignore_regions: Vec<IgnoreRegion>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            antialiasing: false,
            output_diff_mask: false,
            diff_overlay_factor: 1.0,
            diff_lines: false,
            diff_pixel: DEFAULT_DIFF_PIXEL,
            threshold: 0.1,
            fail_on_layout_change: false,
            ignore_regions: Vec::new(),
        }
    }
}

impl DiffOptions {
    /// `diff_pixel` unpacked into `[r, g, b]`.
    pub fn diff_rgb(&self) -> [u8; 3] {
        unpack_rgb(self.diff_pixel)
    }
}

pub fn unpack_rgb(packed: u32) -> [u8; 3] {
    [
        ((packed >> 16) & 0xFF) as u8,
        ((packed >> 8) & 0xFF) as u8,
        (packed & 0xFF) as u8,
    ]
}

/// Parse `#RRGGBB` / `RRGGBB` into a packed `0xRRGGBB` value.
/// An empty string yields the default marker color.
pub fn parse_hex_color(s: &str) -> Result<u32, DiffError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_DIFF_PIXEL);
    }
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DiffError::InvalidHexColor(s.to_owned()));
    }
    u32::from_str_radix(hex, 16).map_err(|_| DiffError::InvalidHexColor(s.to_owned()))
}

/// Axis-aligned rectangle in base-image coordinates, excluded from comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl IgnoreRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from inclusive corner coordinates.
    pub fn from_corners(x1: u32, y1: u32, x2: u32, y2: u32) -> Result<Self, String> {
        if x2 < x1 || y2 < y1 {
            return Err(format!(
                "region corners must be ordered top-left to bottom-right, got {x1}:{y1}-{x2}:{y2}"
            ));
        }
        Ok(Self::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1))
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        // u64 so that x + width cannot overflow near u32::MAX
        let (x, y) = (x as u64, y as u64);
        x >= self.x as u64
            && x < self.x as u64 + self.width as u64
            && y >= self.y as u64
            && y < self.y as u64 + self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl FromStr for IgnoreRegion {
    type Err = String;

    /// Parses `x1:y1-x2:y2` (inclusive corners).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || format!("ignore region must look like x1:y1-x2:y2, got {s:?}");
        let (start, end) = s.trim().split_once('-').ok_or_else(malformed)?;
        let point = |p: &str| -> Result<(u32, u32), String> {
            let (x, y) = p.split_once(':').ok_or_else(malformed)?;
            let x = x.trim().parse::<u32>().map_err(|e| format!("{s:?}: {e}"))?;
            let y = y.trim().parse::<u32>().map_err(|e| format!("{s:?}: {e}"))?;
            Ok((x, y))
        };
        let (x1, y1) = point(start)?;
        let (x2, y2) = point(end)?;
        Self::from_corners(x1, y1, x2, y2)
    }
}
