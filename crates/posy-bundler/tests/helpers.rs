//! Shared test utilities for posy-bundler tests
//!
//! [`MockEngine`] stands in for the bundling engine: it drives plugin hooks
//! in engine order, emits one chunk per entry and records what it was asked
//! to do.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use posy_bundler::{
    BundleHandle, Bundler, BundlerOptions, EmittedFile, Engine, EngineError, InputConfig,
    MaterializeMode, OutputBundle, OutputConfig, PackageRef, SharedPlugin, Warning, WatchConfig,
    WatchEvent, WatchSession,
};
use posy_config::{Config, ConfigSource, EngineFormat, EntryInput};
use tempfile::TempDir;

/// What the engine saw for one analyzed task.
#[derive(Debug, Clone)]
pub struct Analyzed {
    pub plugins: Vec<String>,
    /// Package-backed plugins with the options they were created with
    pub packages: Vec<PackageRef>,
    pub external: Vec<String>,
    pub input: EntryInput,
}

#[derive(Default)]
struct Recorded {
    analyzed: Mutex<Vec<Analyzed>>,
    outputs: Mutex<Vec<(OutputConfig, MaterializeMode)>>,
    reported: Mutex<Vec<String>>,
    watched: Mutex<Vec<WatchConfig>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MockEngine {
    recorded: Arc<Recorded>,
    warnings: Vec<Warning>,
    fail_format: Option<(EngineFormat, EngineError)>,
    delay: Option<Duration>,
    watch_events: Vec<WatchEvent>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit these warnings while analyzing every task.
    pub fn with_warnings(mut self, warnings: Vec<Warning>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Fail materializing outputs of `format`.
    pub fn failing(mut self, format: EngineFormat, error: EngineError) -> Self {
        self.fail_format = Some((format, error));
        self
    }

    /// Sleep inside `analyze`, so concurrent tasks overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_watch_events(mut self, events: Vec<WatchEvent>) -> Self {
        self.watch_events = events;
        self
    }

    pub fn analyzed(&self) -> Vec<Analyzed> {
        self.recorded.analyzed.lock().clone()
    }

    pub fn outputs(&self) -> Vec<OutputConfig> {
        self.recorded
            .outputs
            .lock()
            .iter()
            .map(|(output, _)| output.clone())
            .collect()
    }

    pub fn modes(&self) -> Vec<MaterializeMode> {
        self.recorded.outputs.lock().iter().map(|(_, mode)| *mode).collect()
    }

    /// Warning messages that survived filtering.
    pub fn reported(&self) -> Vec<String> {
        self.recorded.reported.lock().clone()
    }

    pub fn watched(&self) -> Vec<WatchConfig> {
        self.recorded.watched.lock().clone()
    }

    /// Most tasks that were inside `analyze` at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.recorded.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Engine for MockEngine {
    async fn analyze(&self, input: InputConfig) -> Result<Box<dyn BundleHandle>, EngineError> {
        let running = self.recorded.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.recorded.peak.fetch_max(running, Ordering::SeqCst);

        for plugin in &input.plugins {
            plugin.build_start().await?;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        for warning in &self.warnings {
            if let Some(message) = input.on_warn.filter(warning) {
                self.recorded.reported.lock().push(message);
            }
        }
        for plugin in &input.plugins {
            plugin.build_end().await?;
        }

        self.recorded.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.recorded.analyzed.lock().push(Analyzed {
            plugins: input.plugin_names(),
            packages: input
                .plugins
                .iter()
                .filter_map(|plugin| plugin.package().cloned())
                .collect(),
            external: input.external.clone(),
            input: input.input.clone(),
        });
        Ok(Box::new(MockBundle {
            engine: self.clone(),
            plugins: input.plugins,
            input: input.input,
        }))
    }

    fn watch(&self, configs: Vec<WatchConfig>) -> Result<WatchSession, EngineError> {
        self.recorded.watched.lock().extend(configs);
        let (tx, session) = WatchSession::channel();
        for event in &self.watch_events {
            let _ = tx.send(event.clone());
        }
        Ok(session)
    }
}

struct MockBundle {
    engine: MockEngine,
    plugins: Vec<SharedPlugin>,
    input: EntryInput,
}

#[async_trait]
impl BundleHandle for MockBundle {
    async fn materialize(
        &mut self,
        output: &OutputConfig,
        mode: MaterializeMode,
    ) -> Result<(), EngineError> {
        self.engine
            .recorded
            .outputs
            .lock()
            .push((output.clone(), mode));
        if let Some((format, error)) = &self.engine.fail_format {
            if *format == output.format {
                return Err(error.clone());
            }
        }

        let mut bundle = OutputBundle::new();
        for name in entry_names(&self.input) {
            let file_name = output.entry_file_names.replace("[name]", &name);
            let code = format!("{}\nmodule.exports = '{name}';\n", output.banner);
            bundle.insert(file_name.clone(), Arc::new(EmittedFile::chunk(code)));
            bundle.insert(
                format!("{file_name}.map"),
                Arc::new(EmittedFile::asset("{}")),
            );
        }

        for plugin in &self.plugins {
            plugin.generate_bundle(output, &bundle).await?;
        }
        if mode == MaterializeMode::Write {
            std::fs::create_dir_all(&output.dir).map_err(|e| EngineError::new(e.to_string()))?;
            for (file_name, file) in &bundle {
                std::fs::write(output.dir.join(file_name), file.text().as_bytes())
                    .map_err(|e| EngineError::new(e.to_string()))?;
            }
            for plugin in &self.plugins {
                plugin.write_bundle(output, &bundle).await?;
            }
        }
        Ok(())
    }
}

fn entry_names(input: &EntryInput) -> Vec<String> {
    match input {
        EntryInput::Files(files) => files
            .iter()
            .map(|file| {
                Path::new(file)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.clone())
            })
            .collect(),
        EntryInput::Named(entries) => entries.keys().cloned().collect(),
    }
}

/// A temporary project with `src/index.js` and a small `package.json`.
pub fn create_project() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    let src = dir.path().join("src");
    std::fs::create_dir(&src).expect("create src");
    std::fs::write(src.join("index.js"), "export default 42;\n").expect("write entry");
    std::fs::write(
        dir.path().join("package.json"),
        r#"{ "name": "demo", "version": "1.2.3", "license": "MIT", "author": "Jane" }"#,
    )
    .expect("write package.json");
    dir
}

/// Add a file under the project root, creating parent directories.
pub fn write_file(project: &TempDir, relative: &str, contents: &str) {
    let path = project.path().join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, contents).expect("write file");
}

/// Options rooted at `project` with project config files ignored.
pub fn test_options(project: &TempDir) -> BundlerOptions {
    BundlerOptions::default()
        .root_dir(project.path())
        .config_file(ConfigSource::Disabled)
}

impl Analyzed {
    /// Options of the package-backed plugin from `package`.
    pub fn package_options(&self, package: &str) -> Option<&serde_json::Value> {
        self.packages
            .iter()
            .find(|p| p.package == package)
            .map(|p| &p.options)
    }
}

pub fn test_bundler(project: &TempDir, config: Config, engine: &MockEngine) -> Bundler {
    Bundler::new(config, test_options(project), Arc::new(engine.clone())).expect("bundler")
}
