#![cfg_attr(docsrs, feature(doc_cfg))]

//! # posy-bundler
//!
//! Convention-driven build orchestration over a pluggable bundling engine.
//!
//! A [`Bundler`] merges the project's config layers, expands the configured
//! inputs and formats into [`Task`]s, assembles a plugin pipeline for each
//! one and drives an [`Engine`] through them, sequentially, concurrently or
//! in watch mode.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use posy_bundler::{Bundler, BundlerOptions, Engine, RunOptions};
//! use posy_config::Config;
//!
//! # async fn demo(engine: Arc<dyn Engine>) -> posy_bundler::Result<()> {
//! let config = Config::default()
//!     .with_input("src/index.ts")
//!     .with_formats(["cjs", "esm", "umd-min"]);
//!
//! let bundler = Bundler::new(config, BundlerOptions::default(), engine)?;
//! bundler.run(RunOptions::write().concurrent(true)).await?;
//!
//! if let Some(assets) = bundler.get_bundle(0) {
//!     for file in assets.keys() {
//!         println!("{file}");
//!     }
//! }
//! # Ok(()) }
//! ```

pub mod assemble;
pub mod assets;
pub mod banner;
pub mod bundler;
pub mod context;
pub mod engine;
pub mod filename;
pub mod logging;
pub mod plugin;
pub mod scheduler;
pub mod source;
pub mod target;
pub mod task;
pub mod ui;
pub mod warnings;

pub use assemble::{AssembleInput, BuildMode, PipelineAssembler};
pub use assets::{AssetEntry, Assets, BundleSet};
pub use banner::render_banner;
pub use bundler::{Bundler, BundlerOptions, ExtendEngineConfigFn};
pub use context::RunContext;
pub use engine::{
    BundleHandle, Engine, EngineConfig, EngineError, InputConfig, MaterializeMode, OutputConfig,
    Warning, WatchConfig, WatchEvent, WatchOptions, WatchSession,
};
pub use filename::{default_file_name, entry_file_name};
pub use plugin::{
    DependencyRegistry, EmittedFile, OutputBundle, PackageRef, Plugin, PluginFactory,
    PluginResolver, ResolveError, ResolvedId, SharedFactory, SharedPlugin, factory_fn,
};
pub use scheduler::{RunOptions, RunOutcome, WatchHandle};
pub use source::{Source, build_sources};
pub use task::{Task, TaskState, normalize_formats, task_title};
pub use warnings::WarningFilter;

pub use logging::LogLevel;
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::init_logging;

/// Which side of the boundary a task failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOrigin {
    /// Reported by the bundling engine
    Engine,
    /// Config building or plugin resolution
    Pipeline,
}

/// A task failure, tagged with the task that failed.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct BundleFailure {
    pub title: String,
    pub message: String,
    /// Machine code, e.g. `require_module_name`
    pub code: Option<String>,
    pub origin: FailureOrigin,
    #[source]
    pub source: Box<Error>,
}

/// Error types for posy-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A task failed to build.
    #[error(transparent)]
    Bundle(BundleFailure),

    /// A configured plugin could not be resolved or created.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Bundling engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] posy_config::ConfigError),

    /// A concurrently running task panicked or was cancelled.
    #[error("Build task panicked: {0}")]
    TaskPanicked(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for posy-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The failure's machine code, when it has one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Bundle(failure) => failure.code.as_deref(),
            Error::Engine(engine) => engine.code.as_deref(),
            _ => None,
        }
    }

    /// The failing task's title, for task failures.
    pub fn task_title(&self) -> Option<&str> {
        match self {
            Error::Bundle(failure) => Some(&failure.title),
            _ => None,
        }
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Bundle(_) => "BUNDLE_FAILED",
            Error::Resolve(_) => "PLUGIN_RESOLVE_ERROR",
            Error::Engine(_) => "ENGINE_ERROR",
            Error::Config(_) => "INVALID_CONFIG",
            Error::TaskPanicked(_) => "TASK_PANICKED",
            Error::Io(_) => "IO_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Bundle(failure) if failure.code.as_deref() == Some("require_module_name") => {
                Some(Box::new(
                    "Set `output.moduleName` to the global variable name of the bundle.",
                ))
            }
            Error::Bundle(failure) => Some(Box::new(format!("While running: {}", failure.title))),
            Error::Resolve(ResolveError::NotFound { name, .. }) => Some(Box::new(format!(
                "Install `rollup-plugin-{name}` in the project, or disable it with `plugins.{name} = false`."
            ))),
            Error::Resolve(ResolveError::InvalidOptions { name, .. }) => Some(Box::new(format!(
                "Check the `plugins.{name}` section of your configuration."
            ))),
            Error::Config(err) => Some(Box::new(format!(
                "Check your configuration file for syntax errors.\nError: {err}"
            ))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn bundle_failure_exposes_code_and_title() {
        let err = Error::Bundle(BundleFailure {
            title: "Bundle src/index.js in umd format".into(),
            message: "missing name".into(),
            code: Some("require_module_name".into()),
            origin: FailureOrigin::Engine,
            source: Box::new(Error::Engine(EngineError::new("missing name"))),
        });
        assert_eq!(err.code(), Some("require_module_name"));
        assert_eq!(err.task_title(), Some("Bundle src/index.js in umd format"));
        assert_eq!(err.to_string(), "missing name");
        assert!(Diagnostic::help(&err).is_some());
    }

    #[test]
    fn resolve_errors_suggest_installing() {
        let err = Error::from(ResolveError::NotFound {
            name: "visualizer".into(),
            searched: vec![],
        });
        let help = Diagnostic::help(&err).map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("rollup-plugin-visualizer"));
    }
}
