use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::trace;

use super::parse_options;
use crate::plugin::{Plugin, ResolveError};

/// Compiles module source with the configured preset.
///
/// The compiler itself lives outside this crate; the babel plugin only
/// decides which modules go through it and with which options.
#[async_trait]
pub trait SourceTransformer: Send + Sync {
    /// Return `None` to leave the code unchanged.
    async fn transform(
        &self,
        code: &str,
        id: &str,
        options: &BabelOptions,
    ) -> anyhow::Result<Option<String>>;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BabelOptions {
    #[serde(deserialize_with = "patterns")]
    pub exclude: Vec<String>,
    #[serde(deserialize_with = "patterns")]
    pub include: Vec<String>,
    pub extensions: Vec<String>,
    pub babelrc: Option<Value>,
    pub config_file: Option<Value>,
    pub preset_options: Value,
}

fn patterns<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Patterns {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Patterns>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Patterns::One(pattern)) => vec![pattern],
        Some(Patterns::Many(patterns)) => patterns,
    })
}

pub struct BabelPlugin {
    root_dir: PathBuf,
    options: BabelOptions,
    include: Option<GlobSet>,
    exclude: GlobSet,
    transformer: Option<Arc<dyn SourceTransformer>>,
}

impl BabelPlugin {
    pub fn from_options(
        root_dir: &Path,
        options: Value,
        transformer: Option<Arc<dyn SourceTransformer>>,
    ) -> Result<Self, ResolveError> {
        let options: BabelOptions = parse_options("babel", options)?;
        let exclude = glob_set(&options.exclude)?;
        let include = if options.include.is_empty() {
            None
        } else {
            Some(glob_set(&options.include)?)
        };
        Ok(Self {
            root_dir: root_dir.to_path_buf(),
            options,
            include,
            exclude,
            transformer,
        })
    }

    pub fn options(&self) -> &BabelOptions {
        &self.options
    }

    /// Whether module `id` goes through the transformer.
    pub fn accepts(&self, id: &str) -> bool {
        if id.starts_with('\0') {
            return false;
        }
        let path = Path::new(id);
        let relative = path.strip_prefix(&self.root_dir).unwrap_or(path);

        if !self.options.extensions.is_empty()
            && !self.options.extensions.iter().any(|ext| id.ends_with(ext.as_str()))
        {
            return false;
        }
        if self.exclude.is_match(relative) {
            return false;
        }
        self.include
            .as_ref()
            .is_none_or(|include| include.is_match(relative))
    }
}

fn glob_set(patterns: &[String]) -> Result<GlobSet, ResolveError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ResolveError::invalid_options("babel", e))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ResolveError::invalid_options("babel", e))
}

impl fmt::Debug for BabelPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BabelPlugin")
            .field("root_dir", &self.root_dir)
            .field("options", &self.options)
            .field("transformer", &self.transformer.is_some())
            .finish()
    }
}

#[async_trait]
impl Plugin for BabelPlugin {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("babel")
    }

    async fn transform(&self, code: &str, id: &str) -> anyhow::Result<Option<String>> {
        let Some(transformer) = &self.transformer else {
            return Ok(None);
        };
        if !self.accepts(id) {
            return Ok(None);
        }
        trace!(id, "babel transform");
        transformer.transform(code, id, &self.options).await
    }
}
