//! Terminal output: the build spinner, asset summaries and error reports.
//!
//! Everything here writes to stderr and degrades to plain text when colors
//! are unavailable (`NO_COLOR`, non-TTY).

mod format;
mod spinner;

pub use format::{format_duration, format_size, print_assets};
pub use spinner::Spinner;

use owo_colors::OwoColorize;

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Check if color output should be enabled.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise colors follow whether
/// stderr is a terminal.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr()
}

/// Print an error followed by its chain of causes.
pub fn print_error_chain(err: &(dyn std::error::Error + 'static)) {
    eprintln!("{} {}", "✗".red().bold(), err.to_string().red());

    let mut source = err.source();
    if source.is_none() {
        return;
    }
    eprintln!();
    eprintln!("{}", "Caused by:".bold().red());
    while let Some(cause) = source {
        eprintln!("  {}", cause.to_string().dimmed());
        source = cause.source();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printing_an_error_chain_does_not_panic() {
        let inner = std::io::Error::other("disk full");
        print_error_chain(&inner);
    }
}
