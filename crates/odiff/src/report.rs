use std::path::Path;
use std::time::Duration;

use odiff::DiffResult;

pub fn format_duration(d: Duration) -> String {
    let ms = d.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", d.as_secs_f64())
    }
}

/// One-line human summary of a comparison, with ANSI colors.
pub fn format_line(name: &str, result: &DiffResult, failing: bool, elapsed: Duration) -> String {
    let time_suffix = format!("  \x1b[2m{}\x1b[0m", format_duration(elapsed));
    match result {
        DiffResult::Layout { base, comparison } => {
            let (bw, bh) = base;
            let (cw, ch) = comparison;
            let label = if failing {
                "\x1b[31mFAIL\x1b[0m"
            } else {
                "\x1b[33mWARN\x1b[0m"
            };
            format!(
                "  {label}  {name}  (dimensions changed: {bw}x{bh} -> {cw}x{ch}){time_suffix}"
            )
        }
        DiffResult::Pixel(p) if p.diff_count == 0 => {
            format!("  \x1b[32mPASS\x1b[0m  {name}{time_suffix}")
        }
        DiffResult::Pixel(p) => format!(
            "  \x1b[31mFAIL\x1b[0m  {name}  ({} pixels, {:.2}%){time_suffix}",
            p.diff_count, p.diff_percentage
        ),
    }
}

pub fn print_result(
    base: &Path,
    comparison: &Path,
    result: &DiffResult,
    failing: bool,
    elapsed: Duration,
) {
    let name = format!("{} vs {}", base.display(), comparison.display());
    println!("{}", format_line(&name, result, failing, elapsed));

    if let DiffResult::Pixel(p) = result {
        if let Some(lines) = &p.diff_lines
            && !lines.is_empty()
        {
            let joined: Vec<String> = lines.iter().map(u32::to_string).collect();
            println!("        rows: {}", joined.join(", "));
        }
        if let Some(out) = &p.diff_output {
            println!("        diff: {}", out.display());
        }
    }
}
