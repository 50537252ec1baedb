pub mod resolve;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use self::resolve::{CliOverrides, EnvLayer, resolve};

pub(crate) const CONFIG_FILE: &str = "odiff.toml";

/// `[diff]` table. Every field is optional; `None` falls through to the next layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antialiasing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_diff_mask: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_overlay_factor: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_lines: Option<bool>,
    /// Hex color, e.g. `"#ff00ff"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on_layout_change: Option<bool>,
    /// Regions as `x1:y1-x2:y2` strings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub diff: DiffConfig,
}

pub fn validate_threshold(v: f64) -> Result<f64, String> {
    if !(0.0..=1.0).contains(&v) {
        return Err(format!("threshold must be between 0.0 and 1.0, got {v}"));
    }
    Ok(v)
}

pub fn validate_overlay_factor(v: f32) -> Result<f32, String> {
    if !(0.0..=1.0).contains(&v) {
        return Err(format!(
            "diff overlay factor must be between 0.0 and 1.0, got {v}"
        ));
    }
    Ok(v)
}

/// Load the config file. An explicit path must exist; the default
/// `./odiff.toml` is optional.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(p) => p,
        None => {
            let default = Path::new(CONFIG_FILE);
            if !default.exists() {
                return Ok(Config::default());
            }
            default
        }
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn parse(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    if let Some(t) = config.diff.threshold {
        validate_threshold(t).map_err(|e| anyhow::anyhow!("diff.{e}"))?;
    }
    if let Some(f) = config.diff.diff_overlay_factor {
        validate_overlay_factor(f).map_err(|e| anyhow::anyhow!("diff.{e}"))?;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let c = parse("").unwrap();
        assert!(c.diff.threshold.is_none());
        assert!(c.diff.ignore.is_empty());
    }

    #[test]
    fn full_diff_table() {
        let c = parse(
            r##"
[diff]
threshold = 0.05
antialiasing = true
output_diff_mask = true
diff_overlay_factor = 0.5
diff_lines = true
diff_color = "#00ff00"
fail_on_layout_change = true
ignore = ["0:0-10:10"]
"##,
        )
        .unwrap();
        assert_eq!(c.diff.threshold, Some(0.05));
        assert_eq!(c.diff.antialiasing, Some(true));
        assert_eq!(c.diff.diff_overlay_factor, Some(0.5));
        assert_eq!(c.diff.diff_color.as_deref(), Some("#00ff00"));
        assert_eq!(c.diff.ignore, vec!["0:0-10:10".to_string()]);
    }

    #[test]
    fn out_of_range_values_rejected() {
        let err = parse("[diff]\nthreshold = 2.0\n").unwrap_err();
        assert!(format!("{err:#}").contains("diff.threshold"));
        assert!(parse("[diff]\ndiff_overlay_factor = 1.5\n").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(dir.path().join("nope.toml").as_path())).is_err());
    }

    #[test]
    fn loads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[diff]\nantialiasing = true\n").unwrap();
        let c = load(Some(path.as_path())).unwrap();
        assert_eq!(c.diff.antialiasing, Some(true));
    }
}
