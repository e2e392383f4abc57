//! Plugin lookup by name.
//!
//! Strategies are consulted in order and the first one that knows the name
//! wins:
//!
//! 1. caller-supplied overrides
//! 2. in-process built-ins (`babel`, `node-resolve`, `progress`)
//! 3. packages declared in the [`DependencyRegistry`], probed as
//!    `@rollup/plugin-<name>` then `rollup-plugin-<name>`
//! 4. `rollup-plugin-<name>` in the project's own `node_modules`
//!
//! The last strategy always claims the name. A missing package surfaces as
//! [`ResolveError::NotFound`] when the factory is invoked.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::trace;

use super::builtin::{self, SourceTransformer};
use super::package::PackagePlugin;
use super::{PackageRef, SharedFactory, SharedPlugin};
use crate::ui::Spinner;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Cannot find plugin '{name}' (looked for: {})", .searched.join(", "))]
    NotFound { name: String, searched: Vec<String> },

    #[error("Invalid options for plugin '{name}': {message}")]
    InvalidOptions { name: String, message: String },
}

impl ResolveError {
    pub fn invalid_options(name: impl Into<String>, message: impl ToString) -> Self {
        ResolveError::InvalidOptions {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

/// One way of turning a plugin name into a factory.
pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, plugin: &str) -> Option<SharedFactory>;
}

/// Ordered chain of [`ResolveStrategy`]s.
pub struct PluginResolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl PluginResolver {
    pub fn new(strategies: Vec<Box<dyn ResolveStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn resolve(&self, plugin: &str) -> Result<SharedFactory, ResolveError> {
        for strategy in &self.strategies {
            if let Some(factory) = strategy.resolve(plugin) {
                trace!(plugin, strategy = strategy.name(), "resolved plugin");
                return Ok(factory);
            }
        }
        Err(ResolveError::NotFound {
            name: plugin.to_string(),
            searched: self.strategies.iter().map(|s| s.name().to_string()).collect(),
        })
    }

    /// Resolve and instantiate in one step.
    pub fn create(&self, plugin: &str, options: Value) -> Result<SharedPlugin, ResolveError> {
        self.resolve(plugin)?.create(options)
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

/// Factories supplied by the caller, keyed by plugin name.
pub struct OverrideStrategy {
    factories: IndexMap<String, SharedFactory>,
}

impl OverrideStrategy {
    pub fn new(factories: IndexMap<String, SharedFactory>) -> Self {
        Self { factories }
    }
}

impl ResolveStrategy for OverrideStrategy {
    fn name(&self) -> &'static str {
        "override"
    }

    fn resolve(&self, plugin: &str) -> Option<SharedFactory> {
        self.factories.get(plugin).cloned()
    }
}

/// Plugins implemented in this crate.
pub struct BuiltinStrategy {
    root_dir: PathBuf,
    spinner: Arc<Spinner>,
    transformer: Option<Arc<dyn SourceTransformer>>,
}

impl BuiltinStrategy {
    pub fn new(
        root_dir: PathBuf,
        spinner: Arc<Spinner>,
        transformer: Option<Arc<dyn SourceTransformer>>,
    ) -> Self {
        Self {
            root_dir,
            spinner,
            transformer,
        }
    }
}

impl ResolveStrategy for BuiltinStrategy {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn resolve(&self, plugin: &str) -> Option<SharedFactory> {
        match plugin {
            "babel" => {
                let root = self.root_dir.clone();
                let transformer = self.transformer.clone();
                Some(factory_fn(move |options| {
                    let plugin = builtin::BabelPlugin::from_options(
                        &root,
                        options,
                        transformer.clone(),
                    )?;
                    Ok(Arc::new(plugin))
                }))
            }
            "node-resolve" => Some(factory_fn(|options| {
                let plugin = builtin::NodeResolvePlugin::from_options(options)?;
                Ok(Arc::new(plugin))
            })),
            "progress" => {
                let spinner = self.spinner.clone();
                let root = self.root_dir.clone();
                Some(factory_fn(move |options| {
                    let plugin =
                        builtin::ProgressPlugin::from_options(options, spinner.clone(), &root)?;
                    Ok(Arc::new(plugin))
                }))
            }
            _ => None,
        }
    }
}

/// Plugin packages the host environment ships with.
///
/// A package may carry a native factory; otherwise the plugin is delegated
/// to the engine host as a [`PackagePlugin`].
#[derive(Default, Clone)]
pub struct DependencyRegistry {
    packages: IndexMap<String, Option<SharedFactory>>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry listing the plugin packages conventional builds rely on.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for package in [
            "@rollup/plugin-alias",
            "@rollup/plugin-buble",
            "@rollup/plugin-commonjs",
            "@rollup/plugin-json",
            "@rollup/plugin-replace",
            "@rollup/plugin-strip",
            "@rollup/plugin-url",
            "@svgr/rollup",
            "rollup-plugin-hashbang",
            "rollup-plugin-postcss",
            "rollup-plugin-terser",
            "rollup-plugin-typescript2",
            "rollup-plugin-vue",
        ] {
            registry.declare(package);
        }
        registry
    }

    /// Declare a package whose plugin runs in the engine host.
    pub fn declare(&mut self, package: impl Into<String>) -> &mut Self {
        self.packages.entry(package.into()).or_insert(None);
        self
    }

    /// Register a package backed by an in-process factory.
    pub fn register(&mut self, package: impl Into<String>, factory: SharedFactory) -> &mut Self {
        self.packages.insert(package.into(), Some(factory));
        self
    }

    pub fn contains(&self, package: &str) -> bool {
        self.packages.contains_key(package)
    }

    fn get(&self, package: &str) -> Option<&Option<SharedFactory>> {
        self.packages.get(package)
    }
}

/// Candidate package names for a short plugin name.
pub(crate) fn package_candidates(plugin: &str) -> Vec<String> {
    if plugin == "svgr" {
        return vec!["@svgr/rollup".to_string()];
    }
    vec![
        format!("@rollup/plugin-{plugin}"),
        format!("rollup-plugin-{plugin}"),
    ]
}

pub struct DependencyStrategy {
    registry: Arc<DependencyRegistry>,
}

impl DependencyStrategy {
    pub fn new(registry: Arc<DependencyRegistry>) -> Self {
        Self { registry }
    }
}

impl ResolveStrategy for DependencyStrategy {
    fn name(&self) -> &'static str {
        "dependency"
    }

    fn resolve(&self, plugin: &str) -> Option<SharedFactory> {
        package_candidates(plugin).into_iter().find_map(|package| {
            let entry = self.registry.get(&package)?;
            Some(match entry {
                Some(factory) => factory.clone(),
                None => delegated(plugin.to_string(), package, None),
            })
        })
    }
}

/// `rollup-plugin-<name>` from the project's `node_modules`, searched
/// upward from the root when the factory runs.
pub struct ProjectLocalStrategy {
    root_dir: PathBuf,
}

impl ProjectLocalStrategy {
    pub fn new(root_dir: PathBuf) -> Self {
        Self { root_dir }
    }
}

impl ResolveStrategy for ProjectLocalStrategy {
    fn name(&self) -> &'static str {
        "project"
    }

    fn resolve(&self, plugin: &str) -> Option<SharedFactory> {
        let plugin = plugin.to_string();
        let package = format!("rollup-plugin-{plugin}");
        let root = self.root_dir.clone();
        Some(factory_fn(move |options| {
            let Some(path) = find_package(&root, &package) else {
                return Err(ResolveError::NotFound {
                    name: plugin.clone(),
                    searched: vec![format!("{}/node_modules/{package}", root.display())],
                });
            };
            Ok(Arc::new(PackagePlugin::new(PackageRef {
                plugin: plugin.clone(),
                package: package.clone(),
                path: Some(path),
                options,
            })))
        }))
    }
}

/// Wrap a closure as a [`SharedFactory`].
pub fn factory_fn<F>(create: F) -> SharedFactory
where
    F: Fn(Value) -> Result<SharedPlugin, ResolveError> + Send + Sync + 'static,
{
    Arc::new(create)
}

fn delegated(plugin: String, package: String, path: Option<PathBuf>) -> SharedFactory {
    factory_fn(move |options| {
        Ok(Arc::new(PackagePlugin::new(PackageRef {
            plugin: plugin.clone(),
            package: package.clone(),
            path: path.clone(),
            options,
        })))
    })
}

/// `node_modules/<package>` in `root` or the nearest ancestor that has it.
pub(crate) fn find_package(root: &Path, package: &str) -> Option<PathBuf> {
    root.ancestors()
        .map(|dir| dir.join("node_modules").join(package))
        .find(|candidate| candidate.is_dir())
}
