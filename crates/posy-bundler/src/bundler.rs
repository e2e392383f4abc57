//! The orchestrator.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use path_clean::PathClean;
use posy_config::{Config, ConfigLoader, ConfigSource, NormalizedConfig, normalize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::Result;
use crate::assemble::{BuildMode, PipelineAssembler};
use crate::assets::{Assets, BundleSet};
use crate::engine::{Engine, EngineConfig};
use crate::logging::LogLevel;
use crate::plugin::builtin::SourceTransformer;
use crate::plugin::{
    BuiltinStrategy, DependencyRegistry, DependencyStrategy, OverrideStrategy, PluginResolver,
    ProjectLocalStrategy, SharedFactory,
};
use crate::task::{Task, build_tasks};
use crate::ui::{self, Spinner};

/// Last-chance rewrite of a task's engine config.
pub type ExtendEngineConfigFn = Arc<dyn Fn(EngineConfig) -> EngineConfig + Send + Sync>;

/// Construction options that are not part of the build config itself.
///
/// # Example
///
/// ```
/// use posy_bundler::{BundlerOptions, BuildMode};
/// use posy_config::ConfigSource;
///
/// let options = BundlerOptions::default()
///     .root_dir("/project")
///     .config_file(ConfigSource::Disabled)
///     .build_mode(BuildMode::Development);
/// ```
#[derive(Clone, Default)]
pub struct BundlerOptions {
    /// Project root; defaults to the working directory
    pub root_dir: Option<PathBuf>,
    pub config_file: ConfigSource,
    /// Installs the stderr subscriber at this level when set
    pub log_level: Option<LogLevel>,
    pub build_mode: BuildMode,
    /// Plugin packages available to the engine host
    pub registry: Option<DependencyRegistry>,
    /// Factories consulted before any other plugin source
    pub resolve_plugins: IndexMap<String, SharedFactory>,
    /// Compiler behind the built-in babel plugin
    pub transformer: Option<Arc<dyn SourceTransformer>>,
    pub extend_engine_config: Option<ExtendEngineConfigFn>,
}

impl BundlerOptions {
    pub fn root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(root_dir.into());
        self
    }

    pub fn config_file(mut self, source: ConfigSource) -> Self {
        self.config_file = source;
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn build_mode(mut self, mode: BuildMode) -> Self {
        self.build_mode = mode;
        self
    }

    pub fn registry(mut self, registry: DependencyRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn resolve_plugin(mut self, name: impl Into<String>, factory: SharedFactory) -> Self {
        self.resolve_plugins.insert(name.into(), factory);
        self
    }

    pub fn transformer(mut self, transformer: Arc<dyn SourceTransformer>) -> Self {
        self.transformer = Some(transformer);
        self
    }

    pub fn extend_engine_config<F>(mut self, extend: F) -> Self
    where
        F: Fn(EngineConfig) -> EngineConfig + Send + Sync + 'static,
    {
        self.extend_engine_config = Some(Arc::new(extend));
        self
    }
}

impl fmt::Debug for BundlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundlerOptions")
            .field("root_dir", &self.root_dir)
            .field("config_file", &self.config_file)
            .field("log_level", &self.log_level)
            .field("build_mode", &self.build_mode)
            .field("resolve_plugins", &self.resolve_plugins.keys().collect::<Vec<_>>())
            .field("transformer", &self.transformer.is_some())
            .field("extend_engine_config", &self.extend_engine_config.is_some())
            .finish()
    }
}

/// State shared by a bundler and all of its tasks.
pub(crate) struct Shared {
    pub(crate) root_dir: PathBuf,
    pub(crate) config: NormalizedConfig,
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) package: Value,
    pub(crate) bundles: BundleSet,
    pub(crate) engine: Arc<dyn Engine>,
    pub(crate) assembler: PipelineAssembler,
    pub(crate) spinner: Arc<Spinner>,
    pub(crate) extend_engine_config: Option<ExtendEngineConfigFn>,
}

/// Plans and runs the bundling tasks of one project.
///
/// Cheap to clone; clones share config, engine and recorded bundles.
#[derive(Clone)]
pub struct Bundler {
    pub(crate) shared: Arc<Shared>,
}

impl Bundler {
    /// Load the project's config layers and prepare a bundler.
    ///
    /// `config` is the programmatic layer; it wins over the project file.
    pub fn new(config: Config, options: BundlerOptions, engine: Arc<dyn Engine>) -> Result<Self> {
        #[cfg(feature = "logging")]
        if let Some(level) = options.log_level {
            crate::logging::init_logging(level);
        }

        let root_dir = match options.root_dir {
            Some(root) if root.is_absolute() => root.clean(),
            Some(root) => std::env::current_dir()?.join(root).clean(),
            None => std::env::current_dir()?,
        };
        let loader = ConfigLoader::new(&root_dir);

        let package = loader.load_package()?;
        let package = package.data.unwrap_or_else(|| Value::Object(Default::default()));
        for field in ["module", "main"] {
            if let Some(entry) = package.get(field).and_then(Value::as_str) {
                if entry.ends_with(".mjs") {
                    warn!(
                        "package.json `{field}` points at an .mjs file; bundles are emitted with a .js extension"
                    );
                }
            }
        }

        let (config_path, file_config) = loader.load_project_config(&options.config_file)?;
        if let Some(path) = &config_path {
            debug!(path = %path.display(), "Using config file");
        }
        let config = normalize(&root_dir, config, file_config)?;

        let spinner = Arc::new(Spinner::new());
        let registry = options.registry.unwrap_or_else(DependencyRegistry::with_defaults);
        let resolver = PluginResolver::new(vec![
            Box::new(OverrideStrategy::new(options.resolve_plugins)),
            Box::new(BuiltinStrategy::new(
                root_dir.clone(),
                spinner.clone(),
                options.transformer,
            )),
            Box::new(DependencyStrategy::new(Arc::new(registry))),
            Box::new(ProjectLocalStrategy::new(root_dir.clone())),
        ]);
        let assembler =
            PipelineAssembler::new(root_dir.clone(), package.clone(), resolver, options.build_mode);

        Ok(Self {
            shared: Arc::new(Shared {
                root_dir,
                config,
                config_path,
                package,
                bundles: BundleSet::default(),
                engine,
                assembler,
                spinner,
                extend_engine_config: options.extend_engine_config,
            }),
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.shared.root_dir
    }

    pub fn config(&self) -> &NormalizedConfig {
        &self.shared.config
    }

    /// Path of the project config file, when one was loaded.
    pub fn config_path(&self) -> Option<&Path> {
        self.shared.config_path.as_deref()
    }

    /// Parsed `package.json`, or an empty object.
    pub fn package(&self) -> &Value {
        &self.shared.package
    }

    pub fn assembler(&self) -> &PipelineAssembler {
        &self.shared.assembler
    }

    pub fn spinner(&self) -> &Arc<Spinner> {
        &self.shared.spinner
    }

    /// `parts` joined onto the project root.
    pub fn resolve_root_dir<I, P>(&self, parts: I) -> PathBuf
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        parts
            .into_iter()
            .fold(self.shared.root_dir.clone(), |dir, part| dir.join(part))
            .clean()
    }

    /// Every (source, format) task, source-major.
    pub fn tasks(&self) -> Vec<Task> {
        build_tasks(&self.shared)
    }

    /// Assets recorded by the `index`-th task config ever built.
    pub fn get_bundle(&self, index: usize) -> Option<Assets> {
        self.shared.bundles.get(index)
    }

    pub fn bundles(&self) -> &BundleSet {
        &self.shared.bundles
    }

    /// Print an error and its causes to stderr.
    pub fn report_error(&self, err: &crate::Error) {
        self.shared.spinner.stop();
        ui::print_error_chain(err);
    }
}

impl fmt::Debug for Bundler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundler")
            .field("root_dir", &self.shared.root_dir)
            .field("config_path", &self.shared.config_path)
            .field("bundles", &self.shared.bundles.len())
            .finish_non_exhaustive()
    }
}
