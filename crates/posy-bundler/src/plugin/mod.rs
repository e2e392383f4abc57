//! Plugin contract and pipeline building blocks.
//!
//! A plugin is a named bundle of optional lifecycle hooks the engine calls
//! while building. Plugins are created from an options object by a
//! [`PluginFactory`], which the [`PluginResolver`] locates by name.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use crate::engine::OutputConfig;

pub mod builtin;
mod options;
mod package;
mod record;
mod resolver;

pub use options::{PluginTable, TableInput, plugin_table};
pub use package::PackagePlugin;
pub use record::{BuildObserver, RECORD_PLUGIN_NAME, RecordBundlePlugin};
pub use resolver::{
    BuiltinStrategy, DependencyRegistry, DependencyStrategy, OverrideStrategy, PluginResolver,
    ProjectLocalStrategy, ResolveError, ResolveStrategy, factory_fn,
};

pub type SharedPlugin = Arc<dyn Plugin>;

/// Return type of hooks that produce nothing.
pub type HookResult = anyhow::Result<()>;

/// Content of one emitted output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmittedFile {
    Chunk { code: String },
    Asset { source: Vec<u8> },
}

impl EmittedFile {
    pub fn chunk(code: impl Into<String>) -> Self {
        EmittedFile::Chunk { code: code.into() }
    }

    pub fn asset(source: impl Into<Vec<u8>>) -> Self {
        EmittedFile::Asset {
            source: source.into(),
        }
    }

    /// Content as text; asset bytes are decoded lossily.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            EmittedFile::Chunk { code } => Cow::Borrowed(code),
            EmittedFile::Asset { source } => String::from_utf8_lossy(source),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            EmittedFile::Chunk { code } => code.len(),
            EmittedFile::Asset { source } => source.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Output files keyed by file name relative to the output directory.
pub type OutputBundle = IndexMap<String, Arc<EmittedFile>>;

/// What a `resolve_id` hook decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedId {
    /// Leave the import out of the bundle
    External,
    /// Load the module from this id
    Module(String),
}

/// A package-backed plugin, executed by the engine host rather than in
/// process.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageRef {
    /// Short plugin name as written in config (`json`, `vue`)
    pub plugin: String,
    /// Package providing it (`@rollup/plugin-json`)
    pub package: String,
    /// Resolved location when found on disk
    pub path: Option<PathBuf>,
    pub options: Value,
}

/// Lifecycle hooks, all optional.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> Cow<'static, str>;

    /// Set for plugins the engine host must load from a package.
    fn package(&self) -> Option<&PackageRef> {
        None
    }

    async fn build_start(&self) -> HookResult {
        Ok(())
    }

    async fn resolve_id(
        &self,
        _specifier: &str,
        _importer: Option<&str>,
    ) -> anyhow::Result<Option<ResolvedId>> {
        Ok(None)
    }

    /// Return `Some` to replace the module's code.
    async fn transform(&self, _code: &str, _id: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    async fn generate_bundle(&self, _output: &OutputConfig, _bundle: &OutputBundle) -> HookResult {
        Ok(())
    }

    async fn build_end(&self) -> HookResult {
        Ok(())
    }

    async fn write_bundle(&self, _output: &OutputConfig, _bundle: &OutputBundle) -> HookResult {
        Ok(())
    }
}

impl fmt::Debug for dyn Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin").field("name", &self.name()).finish()
    }
}

/// Creates a plugin from its options object.
pub trait PluginFactory: Send + Sync {
    fn create(&self, options: Value) -> Result<SharedPlugin, ResolveError>;
}

impl<F> PluginFactory for F
where
    F: Fn(Value) -> Result<SharedPlugin, ResolveError> + Send + Sync,
{
    fn create(&self, options: Value) -> Result<SharedPlugin, ResolveError> {
        self(options)
    }
}

pub type SharedFactory = Arc<dyn PluginFactory>;
