//! Asset recording.
//!
//! Every task's plugin list ends with [`RecordBundlePlugin`], which forwards
//! build lifecycle events to a [`BuildObserver`]. The observer records the
//! emitted entry and stylesheet files into the task's [`Assets`] and prints
//! a summary once they are written.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::{EmittedFile, HookResult, OutputBundle, Plugin};
use crate::assets::{AssetEntry, Assets};
use crate::engine::OutputConfig;
use crate::ui;

pub const RECORD_PLUGIN_NAME: &str = "record-bundle";

/// Tracks one task's build and owns what it records.
#[derive(Debug)]
pub struct BuildObserver {
    title: String,
    assets: Assets,
    cwd: PathBuf,
    started: Mutex<Option<Instant>>,
    elapsed: Mutex<Option<Duration>>,
}

impl BuildObserver {
    /// `cwd` is the directory recorded paths are made relative to.
    pub fn new(title: impl Into<String>, assets: Assets, cwd: PathBuf) -> Self {
        Self {
            title: title.into(),
            assets,
            cwd,
            started: Mutex::new(None),
            elapsed: Mutex::new(None),
        }
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn on_start(&self) {
        *self.started.lock() = Some(Instant::now());
    }

    /// Record `file_name` if it is an entry chunk or a stylesheet.
    pub fn on_asset_emitted(
        &self,
        output: &OutputConfig,
        file_name: &str,
        file: &Arc<EmittedFile>,
    ) {
        let extension = entry_extension(&output.entry_file_names);
        if !(file_name.ends_with(&extension) || file_name.ends_with(".css")) {
            return;
        }

        let absolute = output.dir.join(file_name);
        let relative = self.relative(&absolute);
        debug!(file = %relative, "recorded asset");
        self.assets
            .insert(relative, AssetEntry::new(absolute, file.clone()));
    }

    pub fn on_end(&self) {
        if let Some(started) = *self.started.lock() {
            *self.elapsed.lock() = Some(started.elapsed());
        }
    }

    /// Print the summary of what was written.
    pub fn on_written(&self) {
        ui::print_assets(&self.summary_label(), &self.assets);
    }

    pub fn elapsed(&self) -> Option<Duration> {
        *self.elapsed.lock()
    }

    pub fn summary_label(&self) -> String {
        let label = self.title.replace("Bundle", "Bundled");
        match self.elapsed() {
            Some(elapsed) => format!("{label} ({})", ui::format_duration(elapsed)),
            None => label,
        }
    }

    fn relative(&self, absolute: &Path) -> String {
        pathdiff::diff_paths(absolute, &self.cwd)
            .unwrap_or_else(|| absolute.to_path_buf())
            .to_string_lossy()
            .replace('\\', "/")
    }
}

/// Extension of an entry filename template, `.js` when it has none.
fn entry_extension(template: &str) -> String {
    Path::new(template)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_else(|| ".js".to_string())
}

/// Engine-facing adapter of a [`BuildObserver`].
#[derive(Debug, Clone)]
pub struct RecordBundlePlugin {
    observer: Arc<BuildObserver>,
}

impl RecordBundlePlugin {
    pub fn new(observer: Arc<BuildObserver>) -> Self {
        Self { observer }
    }

    pub fn observer(&self) -> &Arc<BuildObserver> {
        &self.observer
    }
}

#[async_trait]
impl Plugin for RecordBundlePlugin {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(RECORD_PLUGIN_NAME)
    }

    async fn build_start(&self) -> HookResult {
        self.observer.on_start();
        Ok(())
    }

    async fn generate_bundle(&self, output: &OutputConfig, bundle: &OutputBundle) -> HookResult {
        for (file_name, file) in bundle {
            self.observer.on_asset_emitted(output, file_name, file);
        }
        Ok(())
    }

    async fn build_end(&self) -> HookResult {
        self.observer.on_end();
        Ok(())
    }

    async fn write_bundle(&self, _output: &OutputConfig, _bundle: &OutputBundle) -> HookResult {
        self.observer.on_written();
        Ok(())
    }
}
