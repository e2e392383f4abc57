//! Output format names.
//!
//! A [`Format`] is what users write (`cjs`, `umd-min`, ...). The `-min` suffix
//! requests a minified variant and is stripped to obtain the [`EngineFormat`]
//! handed to the bundling engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Suffix marking a minified format variant.
pub const MIN_SUFFIX: &str = "-min";

/// Format used when none is configured.
pub const DEFAULT_FORMAT: &str = "cjs";

/// A user-facing format name, possibly carrying the `-min` suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Format(String);

impl Format {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name ends with the minification suffix.
    pub fn is_minified(&self) -> bool {
        self.0.ends_with(MIN_SUFFIX)
    }

    /// The engine format with any `-min` suffix removed.
    pub fn engine_format(&self) -> EngineFormat {
        EngineFormat::parse(self.0.strip_suffix(MIN_SUFFIX).unwrap_or(&self.0))
    }
}

impl Default for Format {
    fn default() -> Self {
        Self(DEFAULT_FORMAT.to_string())
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Format {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Module format understood by the bundling engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EngineFormat {
    /// CommonJS
    Cjs,
    /// ES modules (`esm` or `es`)
    Esm,
    /// Universal module definition
    Umd,
    /// Immediately-invoked function expression
    Iife,
    Amd,
    System,
    /// Anything else is passed through verbatim
    Other(String),
}

impl EngineFormat {
    pub fn parse(name: &str) -> Self {
        match name {
            "cjs" | "commonjs" => Self::Cjs,
            "esm" | "es" | "module" => Self::Esm,
            "umd" => Self::Umd,
            "iife" => Self::Iife,
            "amd" => Self::Amd,
            "system" => Self::System,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Cjs => "cjs",
            Self::Esm => "esm",
            Self::Umd => "umd",
            Self::Iife => "iife",
            Self::Amd => "amd",
            Self::System => "system",
            Self::Other(name) => name,
        }
    }

    /// Formats meant for direct `<script>` consumption, which always bundle
    /// their `node_modules` dependencies.
    pub fn is_script_bundle(&self) -> bool {
        matches!(self, Self::Umd | Self::Iife)
    }
}

impl fmt::Display for EngineFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
