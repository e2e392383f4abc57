//! Task graph: one task per (source, format) pair.

use std::fmt;
use std::sync::Arc;

use posy_config::{ExtendContext, Format, FormatList, NormalizedConfig};

use crate::Result;
use crate::assemble::AssembleInput;
use crate::bundler::Shared;
use crate::context::RunContext;
use crate::engine::{EngineConfig, MaterializeMode};
use crate::source::{Source, build_sources};

/// Lifecycle of a task within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    ConfigBuilding,
    Bundling,
    /// Outputs produced in memory only
    Generating,
    Writing,
    Done,
    Failed,
}

impl TaskState {
    /// State of a task whose bundle is being materialized in `mode`.
    pub fn materializing(mode: MaterializeMode) -> Self {
        match mode {
            MaterializeMode::Generate => TaskState::Generating,
            MaterializeMode::Write => TaskState::Writing,
        }
    }
}

/// One bundling unit.
#[derive(Clone)]
pub struct Task {
    pub title: String,
    pub source: Source,
    pub format: Format,
    shared: Arc<Shared>,
}

impl Task {
    /// Build this task's engine config.
    ///
    /// Registers a fresh asset registry on the bundler each time it is
    /// called, so repeated runs accumulate bundles.
    pub async fn get_config(&self, context: &Arc<RunContext>) -> Result<EngineConfig> {
        let shared = &self.shared;
        let assets = shared.bundles.register();

        let extended: NormalizedConfig;
        let config = match &shared.config.hooks.extend_config {
            Some(extend) => {
                extended = extend(
                    shared.config.clone(),
                    &ExtendContext {
                        input: self.source.input.clone(),
                        format: self.format.clone(),
                    },
                );
                &extended
            }
            None => &shared.config,
        };

        let engine_config = shared.assembler.assemble(AssembleInput {
            config,
            source: &self.source,
            format: &self.format,
            title: &self.title,
            context,
            assets,
        })?;

        Ok(match &shared.extend_engine_config {
            Some(extend) => extend(engine_config),
            None => engine_config,
        })
    }

    /// Title with `Bundle` swapped for `replacement`, e.g. `Failed to bundle`.
    pub fn title_with(&self, replacement: &str) -> String {
        self.title.replacen("Bundle", replacement, 1)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("title", &self.title)
            .field("source", &self.source)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// Requested formats in order, without duplicates. Defaults to `cjs`.
pub fn normalize_formats(formats: Option<&FormatList>) -> Vec<Format> {
    let mut normalized: Vec<Format> = Vec::new();
    for format in formats.map(FormatList::formats).unwrap_or_default() {
        if !normalized.contains(&format) {
            normalized.push(format);
        }
    }
    if normalized.is_empty() {
        normalized.push(Format::default());
    }
    normalized
}

pub fn task_title(source: &Source, format: &Format, target: Option<&str>) -> String {
    let mut title = format!("Bundle {} in {format} format", source.files.join(", "));
    if let Some(target) = target {
        title.push_str(&format!(" for target {target}"));
    }
    title
}

/// Tasks for every source and format, source-major.
pub(crate) fn build_tasks(shared: &Arc<Shared>) -> Vec<Task> {
    let config = &shared.config;
    let formats = normalize_formats(config.output.format.as_ref());
    let target = config.output.target.as_deref();

    build_sources(&shared.root_dir, &config.input)
        .into_iter()
        .flat_map(|source| {
            formats
                .iter()
                .map(|format| Task {
                    title: task_title(&source, format, target),
                    source: source.clone(),
                    format: format.clone(),
                    shared: shared.clone(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
