//! Formatting utilities for sizes, durations, and asset summaries.

use std::time::Duration;

use console::Term;
use owo_colors::OwoColorize;

use crate::assets::Assets;

/// Format file size in human-readable format.
///
/// ```
/// use posy_bundler::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(1024), "1.00 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Format duration in human-readable format (`50ms`, `1.50s`, `1m 30s`).
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print one task's recorded files under `label` to stderr.
pub fn print_assets(label: &str, assets: &Assets) {
    let width = Term::stderr().size().1 as usize;

    eprintln!("\n{} {}", "✓".green().bold(), label);
    if assets.is_empty() {
        return;
    }
    eprintln!("{}", "─".repeat(width.clamp(20, 80)));

    let entries = assets.entries();
    let name_width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, entry) in &entries {
        eprintln!(
            "  {} {:<name_width$}  {}",
            "▸".blue(),
            name.bright_white().bold(),
            format_size(entry.size()).dimmed(),
        );
    }

    let total: u64 = entries.iter().map(|(_, entry)| entry.size()).sum();
    eprintln!("  {} {}", "Total:".bold(), format_size(total).green());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use crate::assets::AssetEntry;
    use crate::plugin::EmittedFile;

    #[test]
    fn sizes() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1_048_576), "1.00 MB");
        assert_eq!(format_size(2_147_483_648), "2.00 GB");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
    }

    #[test]
    fn printing_assets_does_not_panic() {
        let assets = Assets::new();
        print_assets("Bundled nothing", &assets);
        assets.insert(
            "dist/index.js",
            AssetEntry::new(
                PathBuf::from("/p/dist/index.js"),
                Arc::new(EmittedFile::chunk("module.exports = 1")),
            ),
        );
        print_assets("Bundled src/index.js in cjs format", &assets);
    }
}
