//! Spinner shared by every task of a bundler.

use std::fmt;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use parking_lot::Mutex;

/// Restartable spinner. Tasks start it with their title, update the message
/// as modules are transformed, and stop it once output is generated.
///
/// # Examples
///
/// ```no_run
/// use posy_bundler::ui::Spinner;
///
/// let spinner = Spinner::new();
/// spinner.start("Bundle src/index.js in cjs format");
/// spinner.set_message("Bundling ./src/index.js");
/// spinner.stop();
/// ```
#[derive(Default)]
pub struct Spinner {
    bar: Mutex<Option<ProgressBar>>,
    hidden: bool,
}

impl Spinner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A spinner that tracks state but never draws.
    pub fn hidden() -> Self {
        Self {
            bar: Mutex::new(None),
            hidden: true,
        }
    }

    pub fn start(&self, message: &str) {
        let mut bar = self.bar.lock();
        if let Some(active) = bar.as_ref() {
            active.set_message(message.to_string());
            return;
        }

        let pb = if self.hidden {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden())
        } else {
            ProgressBar::new_spinner()
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_strings(&["◐", "◓", "◑", "◒", "●"]));
        }
        pb.set_message(message.to_string());
        if !self.hidden {
            pb.enable_steady_tick(Duration::from_millis(100));
        }
        *bar = Some(pb);
    }

    pub fn set_message(&self, message: &str) {
        if let Some(active) = self.bar.lock().as_ref() {
            active.set_message(message.to_string());
        }
    }

    /// Clear the spinner from the terminal. No-op when not running.
    pub fn stop(&self) {
        if let Some(active) = self.bar.lock().take() {
            active.finish_and_clear();
        }
    }

    pub fn is_active(&self) -> bool {
        self.bar.lock().is_some()
    }
}

impl fmt::Debug for Spinner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spinner")
            .field("active", &self.is_active())
            .field("hidden", &self.hidden)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_stop_cycle() {
        let spinner = Spinner::hidden();
        assert!(!spinner.is_active());
        spinner.start("Loading...");
        spinner.set_message("Updated");
        assert!(spinner.is_active());
        spinner.stop();
        assert!(!spinner.is_active());
        spinner.stop();
    }

    #[test]
    fn restart_keeps_one_bar() {
        let spinner = Spinner::hidden();
        spinner.start("a");
        spinner.start("b");
        spinner.stop();
        assert!(!spinner.is_active());
    }
}
