//! Engine warning filtering.

use std::fmt;
use std::sync::Arc;

use posy_config::Format;
use tracing::warn;

use crate::context::RunContext;
use crate::engine::Warning;

/// Per-task warning handler.
///
/// Drops noise codes, reports each unresolved import at most once per run
/// (and only for `umd` tasks, whose dependencies must be bundled), and logs
/// everything else.
#[derive(Clone)]
pub struct WarningFilter {
    format: Format,
    context: Arc<RunContext>,
}

impl WarningFilter {
    pub fn new(format: Format, context: Arc<RunContext>) -> Self {
        Self { format, context }
    }

    /// The message to log for `warning`, or `None` to drop it.
    pub fn filter(&self, warning: &Warning) -> Option<String> {
        let Some(code) = warning.code.as_deref() else {
            return Some(warning.message.clone());
        };
        let code = code.to_lowercase();

        if code == "mixed_exports" || code == "missing_global_name" {
            return None;
        }

        let mut message = warning.message.clone();
        if code == "unresolved_import" {
            if let Some(source) = warning.source.as_deref() {
                if self.format.as_str() != "umd" || !self.context.mark_unresolved(source) {
                    return None;
                }
                message = format!("{source} is treated as external dependency");
            }
        }

        Some(format!("{code}: {message}"))
    }

    pub fn handle(&self, warning: &Warning) {
        if let Some(message) = self.filter(warning) {
            warn!("{message}");
        }
    }
}

impl fmt::Debug for WarningFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarningFilter")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}
