//! Running tasks: sequentially, concurrently, or under watch.

use std::sync::Arc;

use futures::future::try_join_all;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error};

use crate::bundler::Bundler;
use crate::context::RunContext;
use crate::engine::{MaterializeMode, WatchConfig, WatchEvent, WatchOptions};
use crate::task::{Task, TaskState};
use crate::{BundleFailure, Error, FailureOrigin, Result};

const UMD_NAME_MESSAGE: &str = "You must supply output.name for UMD bundles";
const UMD_NAME_HINT: &str =
    "You must supply output.moduleName option or use --module-name <name> flag for UMD bundles";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Write output to disk instead of generating it in memory
    pub write: bool,
    /// Hand every task to the engine's watcher
    pub watch: bool,
    /// Start all tasks at once
    pub concurrent: bool,
}

impl RunOptions {
    pub fn write() -> Self {
        Self {
            write: true,
            ..Self::default()
        }
    }

    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every task finished
    Completed,
    /// The watcher was started and keeps running in the background
    Watching(WatchHandle),
}

/// Background task draining watch events.
#[derive(Debug)]
pub struct WatchHandle {
    handle: JoinHandle<()>,
}

impl WatchHandle {
    /// Wait until the engine closes the session.
    ///
    /// A drain task that panicked is logged and returned as
    /// [`Error::TaskPanicked`]; a stopped session closes cleanly.
    pub async fn closed(self) -> Result<()> {
        match self.handle.await {
            Ok(()) => Ok(()),
            Err(err) if err.is_cancelled() => Ok(()),
            Err(err) => {
                error!(error = %err, "watch event drain failed");
                Err(Error::TaskPanicked(err.to_string()))
            }
        }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Bundler {
    /// Run every task with a fresh [`RunContext`].
    ///
    /// Sequential runs stop at the first failure. Concurrent runs report the
    /// first failure; tasks already started keep running in the background.
    pub async fn run(&self, options: RunOptions) -> Result<RunOutcome> {
        let context = Arc::new(RunContext::new());
        let tasks = self.tasks();

        if options.watch {
            return self.watch(&tasks, &context).await;
        }

        let result = if options.concurrent {
            self.run_concurrent(tasks, &context, options.write).await
        } else {
            self.run_sequential(&tasks, &context, options.write).await
        };

        if let Err(err) = result {
            self.spinner().stop();
            return Err(err);
        }
        Ok(RunOutcome::Completed)
    }

    async fn run_sequential(
        &self,
        tasks: &[Task],
        context: &Arc<RunContext>,
        write: bool,
    ) -> Result<()> {
        for task in tasks {
            self.build(task, context, write).await?;
        }
        Ok(())
    }

    async fn run_concurrent(
        &self,
        tasks: Vec<Task>,
        context: &Arc<RunContext>,
        write: bool,
    ) -> Result<()> {
        let mut join_set = JoinSet::new();
        for task in tasks {
            let bundler = self.clone();
            let context = context.clone();
            join_set.spawn(async move { bundler.build(&task, &context, write).await });
        }

        while let Some(joined) = join_set.join_next().await {
            let result = joined
                .map_err(|join_err| Error::TaskPanicked(join_err.to_string()))
                .and_then(|result| result);
            if let Err(err) = result {
                // Siblings keep running; dropping the set would abort them.
                join_set.detach_all();
                return Err(err);
            }
        }
        Ok(())
    }

    async fn watch(&self, tasks: &[Task], context: &Arc<RunContext>) -> Result<RunOutcome> {
        let configs = try_join_all(tasks.iter().map(|task| task.get_config(context))).await?;
        let configs = configs
            .into_iter()
            .map(|config| WatchConfig {
                input: config.input,
                output: config.output,
                watch: WatchOptions::default(),
            })
            .collect();

        let mut session = self.shared.engine.watch(configs)?;
        let handle = tokio::spawn(async move {
            while let Some(event) = session.next_event().await {
                match event {
                    WatchEvent::Error(err) => error!("{}", err.message),
                    other => debug!(code = other.code(), "watch event"),
                }
            }
        });
        Ok(RunOutcome::Watching(WatchHandle { handle }))
    }

    /// Build one task: config, analyze, then generate or write.
    pub async fn build(&self, task: &Task, context: &Arc<RunContext>, write: bool) -> Result<()> {
        match self.build_task(task, context, write).await {
            Ok(()) => {
                debug!(task = %task.title, state = ?TaskState::Done);
                Ok(())
            }
            Err(err) => {
                debug!(task = %task.title, state = ?TaskState::Failed);
                error!("{}", task.title_with("Failed to bundle"));
                Err(Error::Bundle(failure(task, err)))
            }
        }
    }

    async fn build_task(&self, task: &Task, context: &Arc<RunContext>, write: bool) -> Result<()> {
        debug!(task = %task.title, state = ?TaskState::ConfigBuilding);
        let config = task.get_config(context).await?;

        debug!(task = %task.title, state = ?TaskState::Bundling);
        let mut bundle = self.shared.engine.analyze(config.input).await?;

        let mode = if write {
            MaterializeMode::Write
        } else {
            MaterializeMode::Generate
        };
        debug!(task = %task.title, state = ?TaskState::materializing(mode));
        bundle.materialize(&config.output, mode).await?;
        Ok(())
    }
}

/// Attach task context to an error, rewriting the engine's UMD naming
/// message into one that names the config option.
fn failure(task: &Task, err: Error) -> BundleFailure {
    let (origin, mut code, mut message) = match &err {
        Error::Engine(engine) => (
            FailureOrigin::Engine,
            engine.code.clone(),
            engine.message.clone(),
        ),
        other => (FailureOrigin::Pipeline, None, other.to_string()),
    };
    if message.contains(UMD_NAME_MESSAGE) {
        code = Some("require_module_name".to_string());
        message = UMD_NAME_HINT.to_string();
    }
    BundleFailure {
        title: task.title.clone(),
        message,
        code,
        origin,
        source: Box::new(err),
    }
}
