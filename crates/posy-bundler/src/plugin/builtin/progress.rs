use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::parse_options;
use crate::engine::OutputConfig;
use crate::plugin::{HookResult, OutputBundle, Plugin, ResolveError};
use crate::ui::{self, Spinner};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProgressOptions {
    pub title: String,
}

/// Drives the shared spinner while a task builds.
#[derive(Debug)]
pub struct ProgressPlugin {
    title: String,
    spinner: Arc<Spinner>,
    root_dir: PathBuf,
}

impl ProgressPlugin {
    pub fn from_options(
        options: serde_json::Value,
        spinner: Arc<Spinner>,
        root_dir: &Path,
    ) -> Result<Self, ResolveError> {
        let options: ProgressOptions = parse_options("progress", options)?;
        Ok(Self {
            title: options.title,
            spinner,
            root_dir: root_dir.to_path_buf(),
        })
    }

    fn display_id(&self, id: &str) -> String {
        match Path::new(id).strip_prefix(&self.root_dir) {
            Ok(relative) => format!("./{}", relative.to_string_lossy().replace('\\', "/")),
            Err(_) => id.to_string(),
        }
    }
}

#[async_trait]
impl Plugin for ProgressPlugin {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("progress")
    }

    async fn build_start(&self) -> HookResult {
        self.spinner.start(&self.title);
        Ok(())
    }

    async fn transform(&self, _code: &str, id: &str) -> anyhow::Result<Option<String>> {
        if !ui::is_ci() {
            self.spinner
                .set_message(&format!("Bundling {}", self.display_id(id)));
        }
        Ok(None)
    }

    async fn generate_bundle(&self, _output: &OutputConfig, _bundle: &OutputBundle) -> HookResult {
        self.spinner.stop();
        Ok(())
    }
}
