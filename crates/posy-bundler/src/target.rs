//! Resolution targets.
//!
//! - `ExportConditions`: package.json `exports` conditions to match
//! - `MainFields`: legacy entry fields to probe, in order
//! - Node.js built-in module detection

/// Export conditions for module resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportConditions {
    /// `["node", "import", "module", "default"]`
    Node,
    /// `["browser", "import", "module", "default"]`
    Browser,
}

impl ExportConditions {
    pub fn for_browser(browser: bool) -> Self {
        if browser { Self::Browser } else { Self::Node }
    }

    pub fn as_slice(&self) -> &'static [&'static str] {
        match self {
            Self::Node => &["node", "import", "module", "default"],
            Self::Browser => &["browser", "import", "module", "default"],
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.as_slice().contains(&name)
    }

    /// package.json fields probed for a module's entry, most specific first.
    pub fn main_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Node => &["module", "jsnext:main", "main"],
            Self::Browser => &["browser", "module", "jsnext:main", "main"],
        }
    }
}

const NODE_BUILTINS: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Whether `specifier` names a Node.js built-in (`fs`, `node:fs`, `fs/promises`).
pub fn is_node_builtin(specifier: &str) -> bool {
    if specifier.starts_with("node:") {
        return true;
    }
    NODE_BUILTINS.contains(&specifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_prefers_browser_field() {
        let conditions = ExportConditions::for_browser(true);
        assert_eq!(conditions.main_fields()[0], "browser");
        assert!(conditions.contains("browser"));
        assert!(!ExportConditions::for_browser(false).contains("browser"));
    }

    #[test]
    fn detects_builtins() {
        assert!(is_node_builtin("fs"));
        assert!(is_node_builtin("node:test"));
        assert!(is_node_builtin("fs/promises"));
        assert!(!is_node_builtin("lodash"));
    }
}
