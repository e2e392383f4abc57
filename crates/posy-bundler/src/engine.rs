//! Boundary to the bundling engine.
//!
//! The engine performs module resolution, transformation and code generation.
//! This crate only assembles its configuration and drives its lifecycle:
//! `analyze` an input config into a [`BundleHandle`], then `materialize` that
//! handle once per output config, or hand every task to `watch`.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use posy_config::{EngineFormat, EntryInput};
use tokio::sync::mpsc;

use crate::plugin::SharedPlugin;
use crate::warnings::WarningFilter;

/// Error reported by the engine, optionally carrying a machine code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EngineError {
    pub code: Option<String>,
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::new(format!("{err:#}"))
    }
}

/// A non-fatal diagnostic emitted while bundling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Uppercase engine code such as `UNRESOLVED_IMPORT`
    pub code: Option<String>,
    pub message: String,
    /// Offending import specifier, for unresolved imports
    pub source: Option<String>,
}

impl Warning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            source: None,
        }
    }

    /// A bare message without a code.
    pub fn plain(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            source: None,
        }
    }

    pub fn unresolved_import(source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            code: Some("UNRESOLVED_IMPORT".to_string()),
            message: format!("'{source}' could not be resolved"),
            source: Some(source),
        }
    }
}

/// Input half of an engine configuration.
#[derive(Clone)]
pub struct InputConfig {
    pub input: EntryInput,
    /// Plugins in execution order
    pub plugins: Vec<SharedPlugin>,
    /// Module ids kept out of the bundle
    pub external: Vec<String>,
    pub on_warn: WarningFilter,
}

impl InputConfig {
    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().into_owned()).collect()
    }
}

impl fmt::Debug for InputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputConfig")
            .field("input", &self.input)
            .field("plugins", &self.plugin_names())
            .field("external", &self.external)
            .finish_non_exhaustive()
    }
}

/// Output half of an engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub format: EngineFormat,
    /// Absolute output directory
    pub dir: PathBuf,
    /// Filename template, e.g. `[name].esm.js`
    pub entry_file_names: String,
    /// Global name for script bundles
    pub name: Option<String>,
    pub banner: String,
    pub sourcemap: bool,
    pub sourcemap_exclude_sources: bool,
    pub globals: IndexMap<String, String>,
}

/// Complete configuration of one bundling task.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
}

/// How far [`BundleHandle::materialize`] goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializeMode {
    /// Produce output in memory only
    Generate,
    /// Produce output and write it to disk
    Write,
}

/// The engine's analyzed module graph, ready to emit output.
#[async_trait]
pub trait BundleHandle: Send {
    async fn materialize(
        &mut self,
        output: &OutputConfig,
        mode: MaterializeMode,
    ) -> Result<(), EngineError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchOptions {
    /// Rebuild without writing to disk
    pub skip_write: bool,
}

/// One task handed to [`Engine::watch`].
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub watch: WatchOptions,
}

/// Lifecycle event of a watch session.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    Start,
    BundleStart { input: EntryInput },
    BundleEnd { duration: Duration },
    End,
    Error(EngineError),
}

impl WatchEvent {
    pub fn code(&self) -> &'static str {
        match self {
            WatchEvent::Start => "START",
            WatchEvent::BundleStart { .. } => "BUNDLE_START",
            WatchEvent::BundleEnd { .. } => "BUNDLE_END",
            WatchEvent::End => "END",
            WatchEvent::Error(_) => "ERROR",
        }
    }
}

/// Stream of events from a running watch session. Ends when the engine
/// drops its sender.
#[derive(Debug)]
pub struct WatchSession {
    events: mpsc::UnboundedReceiver<WatchEvent>,
}

impl WatchSession {
    /// A session plus the sender the engine emits through.
    pub fn channel() -> (mpsc::UnboundedSender<WatchEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { events: rx })
    }

    pub async fn next_event(&mut self) -> Option<WatchEvent> {
        self.events.recv().await
    }
}

/// The bundling engine.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Resolve and transform the module graph described by `input`.
    async fn analyze(&self, input: InputConfig) -> Result<Box<dyn BundleHandle>, EngineError>;

    /// Start watching every task, rebuilding on change.
    fn watch(&self, configs: Vec<WatchConfig>) -> Result<WatchSession, EngineError>;
}
