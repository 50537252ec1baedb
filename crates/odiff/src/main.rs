mod cli;
mod config;
mod report;

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use config::{CliOverrides, EnvLayer};
use odiff::DiffResult;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit code when the images have different dimensions and `--fail-on-layout` is set.
const EXIT_LAYOUT_DIFF: i32 = 21;
/// Exit code when pixels differ.
const EXIT_PIXEL_DIFF: i32 = 22;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("odiff=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let code = run(cli)?;
    std::process::exit(code);
}

fn run(cli: cli::Cli) -> Result<i32> {
    let file = config::load(cli.config.as_deref())?;
    let overrides = CliOverrides {
        threshold: cli.threshold,
        antialiasing: cli.antialiasing,
        diff_mask: cli.diff_mask,
        diff_overlay: cli.diff_overlay,
        diff_lines: cli.output_diff_lines,
        diff_color: cli.diff_color,
        fail_on_layout: cli.fail_on_layout,
        ignore: cli.ignore,
    };
    let options = config::resolve(overrides, EnvLayer::from_env()?, file)?;
    debug!(?options, "resolved options");

    let start = Instant::now();
    let result = odiff::compare(
        &cli.base,
        &cli.comparison,
        cli.diff_output.as_deref(),
        &options,
    )
    .with_context(|| {
        format!(
            "Failed to compare {} with {}",
            cli.base.display(),
            cli.comparison.display()
        )
    })?;
    let failing = result.is_failure(&options);

    if cli.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
        println!("{json}");
    } else {
        report::print_result(
            &cli.base,
            &cli.comparison,
            &result,
            failing,
            start.elapsed(),
        );
    }

    Ok(match result {
        DiffResult::Layout { .. } if failing => EXIT_LAYOUT_DIFF,
        DiffResult::Pixel(_) if failing => EXIT_PIXEL_DIFF,
        _ => 0,
    })
}
