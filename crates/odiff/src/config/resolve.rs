use anyhow::{Context, Result};
use odiff::{DiffOptions, IgnoreRegion, parse_hex_color};

use super::{Config, validate_threshold};

/// Values extracted from the CLI that participate in the merge.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub threshold: Option<f64>,
    pub antialiasing: bool,
    pub diff_mask: bool,
    pub diff_overlay: Option<f32>,
    pub diff_lines: bool,
    pub diff_color: Option<String>,
    pub fail_on_layout: bool,
    pub ignore: Vec<IgnoreRegion>,
}

/// Environment layer (`ODIFF_THRESHOLD`, `ODIFF_DIFF_COLOR`).
#[derive(Debug, Default)]
pub struct EnvLayer {
    pub threshold: Option<f64>,
    pub diff_color: Option<String>,
}

impl EnvLayer {
    pub fn from_env() -> Result<Self> {
        let threshold = std::env::var("ODIFF_THRESHOLD")
            .ok()
            .map(|v| v.parse::<f64>())
            .transpose()
            .context("ODIFF_THRESHOLD must be a valid float")?;
        let diff_color = std::env::var("ODIFF_DIFF_COLOR").ok();
        Ok(Self {
            threshold,
            diff_color,
        })
    }
}

/// Merge CLI > env > file > defaults into the engine options.
///
/// Boolean flags can only switch a feature on; a file value of `true` is not
/// overridden by an absent CLI flag.
pub fn resolve(cli: CliOverrides, env: EnvLayer, file: Config) -> Result<DiffOptions> {
    let file = file.diff;
    let defaults = DiffOptions::default();

    let threshold = cli
        .threshold
        .or(env.threshold)
        .or(file.threshold)
        .unwrap_or(defaults.threshold);
    validate_threshold(threshold).map_err(|e| anyhow::anyhow!("{e}"))?;

    let diff_pixel = match cli.diff_color.or(env.diff_color).or(file.diff_color) {
        Some(hex) => parse_hex_color(&hex)?,
        None => defaults.diff_pixel,
    };

    // file regions first, CLI regions appended: the set is a union either way
    let mut ignore_regions = file
        .ignore
        .iter()
        .map(|s| s.parse::<IgnoreRegion>().map_err(anyhow::Error::msg))
        .collect::<Result<Vec<_>>>()
        .context("Invalid diff.ignore entry")?;
    ignore_regions.extend(cli.ignore);

    Ok(DiffOptions {
        antialiasing: cli.antialiasing || file.antialiasing.unwrap_or(defaults.antialiasing),
        output_diff_mask: cli.diff_mask || file.output_diff_mask.unwrap_or(defaults.output_diff_mask),
        diff_overlay_factor: cli
            .diff_overlay
            .or(file.diff_overlay_factor)
            .unwrap_or(defaults.diff_overlay_factor),
        diff_lines: cli.diff_lines || file.diff_lines.unwrap_or(defaults.diff_lines),
        diff_pixel,
        threshold,
        fail_on_layout_change: cli.fail_on_layout
            || file
                .fail_on_layout_change
                .unwrap_or(defaults.fail_on_layout_change),
        ignore_regions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiffConfig;
    use odiff::DiffError;

    fn file(diff: DiffConfig) -> Config {
        Config { diff }
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let o = resolve(CliOverrides::default(), EnvLayer::default(), Config::default()).unwrap();
        assert_eq!(o, DiffOptions::default());
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let f = file(DiffConfig {
            threshold: Some(0.3),
            diff_color: Some("#0000ff".into()),
            ..DiffConfig::default()
        });
        let env = EnvLayer {
            threshold: Some(0.2),
            diff_color: None,
        };
        let cli = CliOverrides {
            threshold: Some(0.05),
            ..CliOverrides::default()
        };
        let o = resolve(cli, env, f).unwrap();
        assert_eq!(o.threshold, 0.05);
        assert_eq!(o.diff_pixel, 0x0000FF);

        let f = file(DiffConfig {
            threshold: Some(0.3),
            ..DiffConfig::default()
        });
        let env = EnvLayer {
            threshold: Some(0.2),
            diff_color: Some("00ff00".into()),
        };
        let o = resolve(CliOverrides::default(), env, f).unwrap();
        assert_eq!(o.threshold, 0.2);
        assert_eq!(o.diff_pixel, 0x00FF00);
    }

    #[test]
    fn file_booleans_and_regions_apply() {
        let f = file(DiffConfig {
            antialiasing: Some(true),
            diff_lines: Some(true),
            ignore: vec!["0:0-1:1".into()],
            ..DiffConfig::default()
        });
        let cli = CliOverrides {
            ignore: vec![IgnoreRegion::new(5, 5, 1, 1)],
            ..CliOverrides::default()
        };
        let o = resolve(cli, EnvLayer::default(), f).unwrap();
        assert!(o.antialiasing);
        assert!(o.diff_lines);
        assert!(!o.output_diff_mask);
        assert_eq!(
            o.ignore_regions,
            vec![IgnoreRegion::new(0, 0, 2, 2), IgnoreRegion::new(5, 5, 1, 1)]
        );
    }

    #[test]
    fn invalid_color_surfaces_hex_error() {
        let cli = CliOverrides {
            diff_color: Some("#nothex".into()),
            ..CliOverrides::default()
        };
        let err = resolve(cli, EnvLayer::default(), Config::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DiffError>(),
            Some(DiffError::InvalidHexColor(_))
        ));
    }

    #[test]
    fn invalid_env_threshold_rejected() {
        let env = EnvLayer {
            threshold: Some(3.0),
            diff_color: None,
        };
        assert!(resolve(CliOverrides::default(), env, Config::default()).is_err());
    }

    #[test]
    fn bad_file_region_rejected() {
        let f = file(DiffConfig {
            ignore: vec!["garbage".into()],
            ..DiffConfig::default()
        });
        assert!(resolve(CliOverrides::default(), EnvLayer::default(), f).is_err());
    }
}
