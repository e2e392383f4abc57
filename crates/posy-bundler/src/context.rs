//! State shared by every task of one run.

use indexmap::IndexSet;
use parking_lot::Mutex;

/// Created fresh at the start of each `run` and dropped when it ends.
#[derive(Debug, Default)]
pub struct RunContext {
    unresolved: Mutex<IndexSet<String>>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an unresolved import. Returns `true` the first time a given
    /// specifier is seen during this run.
    pub fn mark_unresolved(&self, source: &str) -> bool {
        self.unresolved.lock().insert(source.to_string())
    }

    pub fn is_unresolved(&self, source: &str) -> bool {
        self.unresolved.lock().contains(source)
    }

    /// Unresolved imports in the order they were first reported.
    pub fn unresolved(&self) -> Vec<String> {
        self.unresolved.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_each_source_once() {
        let ctx = RunContext::new();
        assert!(ctx.mark_unresolved("lodash"));
        assert!(!ctx.mark_unresolved("lodash"));
        assert!(ctx.mark_unresolved("react"));
        assert_eq!(ctx.unresolved(), vec!["lodash", "react"]);
        assert!(ctx.is_unresolved("react"));
    }
}
