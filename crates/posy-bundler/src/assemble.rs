//! Per-task engine configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use path_clean::PathClean;
use posy_config::{Format, NormalizedConfig};
use serde_json::Value;
use tracing::debug;

use crate::Result;
use crate::assets::Assets;
use crate::banner::render_banner;
use crate::context::RunContext;
use crate::engine::{EngineConfig, InputConfig, OutputConfig};
use crate::filename::entry_file_name;
use crate::plugin::{
    BuildObserver, PluginResolver, PluginTable, RecordBundlePlugin, SharedPlugin, TableInput,
    plugin_table,
};
use crate::source::Source;
use crate::warnings::WarningFilter;

/// Production builds tell framework plugins to drop dev-only code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildMode {
    Development,
    #[default]
    Production,
}

impl BuildMode {
    pub fn is_production(&self) -> bool {
        matches!(self, BuildMode::Production)
    }
}

/// One task as seen by the assembler.
#[derive(Debug)]
pub struct AssembleInput<'a> {
    pub config: &'a NormalizedConfig,
    pub source: &'a Source,
    pub format: &'a Format,
    pub title: &'a str,
    pub context: &'a Arc<RunContext>,
    /// Registry the task's record plugin fills
    pub assets: Assets,
}

/// Builds the engine config of a task: plugin table, resolved plugins,
/// output naming and warning handling.
pub struct PipelineAssembler {
    root_dir: PathBuf,
    cwd: PathBuf,
    package: Value,
    resolver: PluginResolver,
    build_mode: BuildMode,
}

impl PipelineAssembler {
    pub fn new(
        root_dir: PathBuf,
        package: Value,
        resolver: PluginResolver,
        build_mode: BuildMode,
    ) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| root_dir.clone());
        Self {
            root_dir,
            cwd,
            package,
            resolver,
            build_mode,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn resolver(&self) -> &PluginResolver {
        &self.resolver
    }

    /// Plugin options for a task, before resolution.
    fn plugin_table(
        &self,
        input: &AssembleInput<'_>,
        settings: &TaskSettings,
        banner: &str,
    ) -> PluginTable {
        plugin_table(&TableInput {
            config: input.config,
            root_dir: &self.root_dir,
            title: input.title,
            has_vue: input.source.has_vue,
            has_ts: input.source.has_ts,
            minify: settings.minify,
            bundle_node_modules: settings.bundle_node_modules,
            banner,
            production: self.build_mode.is_production(),
        })
    }

    pub fn assemble(&self, input: AssembleInput<'_>) -> Result<EngineConfig> {
        let config = input.config;
        let settings = TaskSettings::new(config, input.format);
        let engine_format = input.format.engine_format();
        let banner = render_banner(config.banner.as_ref(), &self.package);
        let table = self.plugin_table(&input, &settings, &banner);

        let mut plugins: Vec<SharedPlugin> = Vec::with_capacity(table.len() + 1);
        for (name, slot) in &table {
            let Some(options) = slot.to_value() else {
                continue;
            };
            debug!(format = %input.format, "Using plugin: {name}");
            plugins.push(self.resolver.create(name, options)?);
        }

        let observer = Arc::new(BuildObserver::new(
            input.title,
            input.assets.clone(),
            self.cwd.clone(),
        ));
        plugins.push(Arc::new(RecordBundlePlugin::new(observer)));

        let external = config
            .globals
            .keys()
            .filter(|name| !name.starts_with('.') && !name.starts_with('/'))
            .cloned()
            .collect();

        let output = OutputConfig {
            entry_file_names: entry_file_name(
                config,
                &engine_format,
                settings.minify,
                settings.min_placeholder,
            ),
            format: engine_format,
            dir: self.root_dir.join(&config.output.dir).clean(),
            name: config.output.module_name.clone(),
            banner,
            sourcemap: config.output.source_map.unwrap_or(settings.minify),
            sourcemap_exclude_sources: config.output.source_map_exclude_sources.unwrap_or(false),
            globals: config.globals.clone(),
        };

        Ok(EngineConfig {
            input: InputConfig {
                input: input.source.input.clone(),
                plugins,
                external,
                on_warn: WarningFilter::new(input.format.clone(), input.context.clone()),
            },
            output,
        })
    }
}

/// Format-derived switches of a task.
struct TaskSettings {
    minify: bool,
    min_placeholder: &'static str,
    bundle_node_modules: bool,
}

impl TaskSettings {
    fn new(config: &NormalizedConfig, format: &Format) -> Self {
        let engine_format = format.engine_format();
        Self {
            minify: config.output.minify.unwrap_or_else(|| format.is_minified()),
            min_placeholder: if format.is_minified() { ".min" } else { "" },
            bundle_node_modules: engine_format.is_script_bundle()
                || config.bundle_node_modules.unwrap_or(false),
        }
    }
}
