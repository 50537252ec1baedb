use std::path::PathBuf;

use clap::Parser;
use odiff::IgnoreRegion;

use crate::config;

fn parse_threshold(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    config::validate_threshold(v)
}

fn parse_overlay_factor(s: &str) -> Result<f32, String> {
    let v: f32 = s.parse().map_err(|e| format!("{e}"))?;
    config::validate_overlay_factor(v)
}

#[derive(Parser)]
#[command(
    name = "odiff",
    about = "Pixel-by-pixel image comparison for visual regression testing"
)]
pub struct Cli {
    /// Base (reference) image
    pub base: PathBuf,

    /// Image to compare against the base
    pub comparison: PathBuf,

    /// Where to write the diff image; format follows the extension
    pub diff_output: Option<PathBuf>,

    /// Color difference threshold (0.0–1.0). Smaller is more precise.
    #[arg(long, short = 't', value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Ignore differences caused by antialiasing
    #[arg(long)]
    pub antialiasing: bool,

    /// Write only the changed pixels on a transparent canvas
    #[arg(long)]
    pub diff_mask: bool,

    /// Blend strength (0.0–1.0) of the diff color over the base image
    #[arg(long, value_parser = parse_overlay_factor)]
    pub diff_overlay: Option<f32>,

    /// Report the indices of rows that contain differences
    #[arg(long)]
    pub output_diff_lines: bool,

    /// Color of differing pixels, e.g. "#cd2cc9"
    #[arg(long)]
    pub diff_color: Option<String>,

    /// Exit with code 21 when the images have different dimensions
    #[arg(long)]
    pub fail_on_layout: bool,

    /// Regions to skip, as x1:y1-x2:y2 (inclusive). Comma-separated or repeated.
    #[arg(long, value_delimiter = ',')]
    pub ignore: Vec<IgnoreRegion>,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Config file (default: ./odiff.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positionals_and_flags() {
        let cli = Cli::try_parse_from([
            "odiff",
            "a.png",
            "b.png",
            "diff.png",
            "--threshold",
            "0.2",
            "--antialiasing",
            "--ignore",
            "0:0-9:9,20:20-29:29",
            "--ignore",
            "40:40-41:41",
        ])
        .unwrap();
        assert_eq!(cli.base, PathBuf::from("a.png"));
        assert_eq!(cli.diff_output, Some(PathBuf::from("diff.png")));
        assert_eq!(cli.threshold, Some(0.2));
        assert!(cli.antialiasing);
        assert_eq!(cli.ignore.len(), 3);
        assert_eq!(cli.ignore[2], IgnoreRegion::new(40, 40, 2, 2));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        assert!(Cli::try_parse_from(["odiff", "a.png", "b.png", "-t", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["odiff", "a.png", "b.png", "--diff-overlay", "-1"]).is_err());
    }

    #[test]
    fn diff_output_is_optional() {
        let cli = Cli::try_parse_from(["odiff", "a.png", "b.png"]).unwrap();
        assert!(cli.diff_output.is_none());
        assert!(cli.ignore.is_empty());
    }
}
