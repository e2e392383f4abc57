use std::borrow::Cow;
use std::path::PathBuf;

use async_trait::async_trait;
use posy_config::{ExternalMatcher, is_external};
use serde::Deserialize;

use super::parse_options;
use crate::plugin::{Plugin, ResolveError, ResolvedId};
use crate::target::{ExportConditions, is_node_builtin};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeResolveOptions {
    pub root_dir: PathBuf,
    /// Inline dependencies from `node_modules` instead of leaving them external
    pub bundle_node_modules: bool,
    pub externals: Vec<ExternalMatcher>,
    /// Resolve for the browser
    pub browser: bool,
}

/// Decides which imports stay outside the bundle. Everything else is left
/// to the engine's own resolver.
#[derive(Debug, Clone)]
pub struct NodeResolvePlugin {
    options: NodeResolveOptions,
    conditions: ExportConditions,
}

impl NodeResolvePlugin {
    pub fn new(options: NodeResolveOptions) -> Self {
        let conditions = ExportConditions::for_browser(options.browser);
        Self {
            options,
            conditions,
        }
    }

    pub fn from_options(options: serde_json::Value) -> Result<Self, ResolveError> {
        parse_options("node-resolve", options).map(Self::new)
    }

    pub fn options(&self) -> &NodeResolveOptions {
        &self.options
    }

    pub fn conditions(&self) -> ExportConditions {
        self.conditions
    }

    pub fn main_fields(&self) -> &'static [&'static str] {
        self.conditions.main_fields()
    }

    pub fn is_external(&self, specifier: &str) -> bool {
        if is_node_builtin(specifier) {
            return !self.options.browser;
        }
        if is_bare(specifier) && !self.options.bundle_node_modules {
            return true;
        }
        is_external(&self.options.externals, specifier)
    }
}

/// A package import rather than a relative or absolute path.
fn is_bare(specifier: &str) -> bool {
    !(specifier.starts_with('.')
        || specifier.starts_with('/')
        || specifier.starts_with('\0')
        || specifier.contains(":\\")
        || specifier.starts_with("@/"))
}

#[async_trait]
impl Plugin for NodeResolvePlugin {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("node-resolve")
    }

    async fn resolve_id(
        &self,
        specifier: &str,
        _importer: Option<&str>,
    ) -> anyhow::Result<Option<ResolvedId>> {
        if self.is_external(specifier) {
            return Ok(Some(ResolvedId::External));
        }
        Ok(None)
    }
}
