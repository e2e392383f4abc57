//! Configuration data model.
//!
//! [`Config`] is one unmerged layer (project file or programmatic);
//! [`NormalizedConfig`] is the single merged build plan produced by
//! [`crate::normalize`].

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};
use crate::external::ExternalMatcher;
use crate::format::{EngineFormat, Format};
use crate::plugin::PluginSlot;

/// One entry group as written in config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputSpec {
    /// One file, or several joined with commas (`"src/a.js,src/b.js"`).
    Files(String),
    /// Named entries (`{ "main": "src/index.js" }`).
    Named(IndexMap<String, String>),
}

impl From<&str> for InputSpec {
    fn from(value: &str) -> Self {
        InputSpec::Files(value.to_string())
    }
}

/// Engine-facing entry value of a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryInput {
    Files(Vec<String>),
    Named(IndexMap<String, String>),
}

/// `output.format`: a list, or a comma-joined string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormatList {
    List(Vec<Format>),
    Joined(String),
}

impl FormatList {
    /// Split into individual format names, dropping blanks.
    pub fn formats(&self) -> Vec<Format> {
        match self {
            FormatList::List(formats) => formats
                .iter()
                .filter(|f| !f.as_str().trim().is_empty())
                .cloned()
                .collect(),
            FormatList::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(Format::new)
                .collect(),
        }
    }
}

/// Author field of a banner or package manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Author {
    Text(String),
    Person {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
}

/// Fields overriding package metadata when generating a banner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BannerFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<Value>,
}

/// `banner`: `true` generates one from package.json, a string is used verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Banner {
    Toggle(bool),
    Text(String),
    Fields(BannerFields),
}

/// Babel transform options, forwarded as preset options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BabelOptions(pub Map<String, Value>);

impl BabelOptions {
    pub fn babelrc(&self) -> Option<&Value> {
        self.0.get("babelrc")
    }

    pub fn config_file(&self) -> Option<&Value> {
        self.0.get("configFile")
    }

    /// `minimal` swaps Babel for the lighter buble transform.
    pub fn minimal(&self) -> bool {
        self.0.get("minimal").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Arguments for a custom output filename function.
#[derive(Debug, Clone, PartialEq)]
pub struct FileNameContext {
    pub format: EngineFormat,
    pub minify: bool,
}

/// Arguments for the `extend_config` hook.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendContext {
    pub input: EntryInput,
    pub format: Format,
}

pub type ExtendConfigFn =
    Arc<dyn Fn(NormalizedConfig, &ExtendContext) -> NormalizedConfig + Send + Sync>;

/// Receives the filename context and the format's default template.
pub type FileNameFn = Arc<dyn Fn(&FileNameContext, &str) -> String + Send + Sync>;

/// Function-valued settings. Only programmatic configs can carry these.
#[derive(Clone, Default)]
pub struct ConfigHooks {
    /// Derives a per-task config from the base one.
    pub extend_config: Option<ExtendConfigFn>,
    /// Computes the output filename template; wins over `output.fileName`.
    pub file_name: Option<FileNameFn>,
}

impl ConfigHooks {
    /// Keep hooks set on `self`, fill the rest from `fallback`.
    pub fn or(self, fallback: ConfigHooks) -> ConfigHooks {
        ConfigHooks {
            extend_config: self.extend_config.or(fallback.extend_config),
            file_name: self.file_name.or(fallback.file_name),
        }
    }
}

impl fmt::Debug for ConfigHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigHooks")
            .field("extend_config", &self.extend_config.is_some())
            .field("file_name", &self.file_name.is_some())
            .finish()
    }
}

/// `output` section of a config layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FormatList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map_exclude_sources: Option<bool>,
    #[serde(default, rename = "extractCSS", skip_serializing_if = "Option::is_none")]
    pub extract_css: Option<bool>,
}

impl OutputOptions {
    pub fn is_empty(&self) -> bool {
        *self == OutputOptions::default()
    }
}

/// One configuration layer.
///
/// # Example
///
/// ```
/// use posy_config::{Config, PluginSlot};
///
/// let config = Config::default()
///     .with_input("src/main.ts")
///     .with_formats(["cjs", "esm"])
///     .with_plugin("vue", PluginSlot::Disabled);
///
/// assert_eq!(config.plugins.len(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "one_or_many"
    )]
    pub input: Option<Vec<InputSpec>>,

    #[serde(default, skip_serializing_if = "OutputOptions::is_empty")]
    pub output: OutputOptions,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "one_or_many"
    )]
    pub externals: Option<Vec<ExternalMatcher>>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub plugins: IndexMap<String, PluginSlot>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub babel: Option<BabelOptions>,

    /// Constants injected as `process.env.<NAME>`
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub env: IndexMap<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<Banner>,

    /// External module name -> global variable name
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub globals: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_node_modules: Option<bool>,

    #[serde(skip)]
    pub hooks: ConfigHooks,
}

impl Config {
    /// Create from a JSON value (project files, programmatic callers).
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ConfigError::invalid("config", e))
    }

    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::invalid("config", e))
    }

    pub fn with_input(mut self, input: impl Into<InputSpec>) -> Self {
        self.input.get_or_insert_with(Vec::new).push(input.into());
        self
    }

    pub fn with_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output.format = Some(FormatList::List(
            formats.into_iter().map(|f| Format::new(f)).collect(),
        ));
        self
    }

    pub fn with_plugin(mut self, name: impl Into<String>, slot: PluginSlot) -> Self {
        self.plugins.insert(name.into(), slot);
        self
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    pub fn with_external(mut self, external: ExternalMatcher) -> Self {
        self.externals.get_or_insert_with(Vec::new).push(external);
        self
    }

    pub fn with_extend_config<F>(mut self, hook: F) -> Self
    where
        F: Fn(NormalizedConfig, &ExtendContext) -> NormalizedConfig + Send + Sync + 'static,
    {
        self.hooks.extend_config = Some(Arc::new(hook));
        self
    }

    pub fn with_file_name_fn<F>(mut self, hook: F) -> Self
    where
        F: Fn(&FileNameContext, &str) -> String + Send + Sync + 'static,
    {
        self.hooks.file_name = Some(Arc::new(hook));
        self
    }
}

/// Normalized `output` section. `dir` is always absolute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedOutput {
    pub dir: PathBuf,
    pub format: Option<FormatList>,
    pub target: Option<String>,
    pub minify: Option<bool>,
    pub module_name: Option<String>,
    pub file_name: Option<String>,
    pub source_map: Option<bool>,
    pub source_map_exclude_sources: Option<bool>,
    #[serde(rename = "extractCSS")]
    pub extract_css: Option<bool>,
}

/// The fully merged build configuration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedConfig {
    pub input: Vec<InputSpec>,
    pub output: NormalizedOutput,
    pub externals: Vec<ExternalMatcher>,
    pub plugins: IndexMap<String, PluginSlot>,
    pub babel: BabelOptions,
    pub env: IndexMap<String, Value>,
    pub banner: Option<Banner>,
    pub globals: IndexMap<String, String>,
    pub bundle_node_modules: Option<bool>,
    #[serde(skip)]
    pub hooks: ConfigHooks,
}

impl NormalizedConfig {
    /// The explicitly configured slot for a plugin, if any.
    pub fn plugin(&self, name: &str) -> Option<&PluginSlot> {
        self.plugins.get(name)
    }

    /// Whether the user turned a plugin off with `false`.
    pub fn plugin_disabled(&self, name: &str) -> bool {
        self.plugin(name).is_some_and(PluginSlot::is_disabled)
    }

    /// Whether the user turned a plugin on (with `true` or options).
    pub fn plugin_enabled(&self, name: &str) -> bool {
        self.plugin(name).is_some_and(PluginSlot::is_enabled)
    }
}

impl From<NormalizedConfig> for Config {
    fn from(config: NormalizedConfig) -> Self {
        let output = config.output;
        Config {
            input: Some(config.input),
            output: OutputOptions {
                dir: Some(output.dir),
                format: output.format,
                target: output.target,
                minify: output.minify,
                module_name: output.module_name,
                file_name: output.file_name,
                source_map: output.source_map,
                source_map_exclude_sources: output.source_map_exclude_sources,
                extract_css: output.extract_css,
            },
            externals: Some(config.externals),
            plugins: config.plugins,
            babel: Some(config.babel),
            env: config.env,
            banner: config.banner,
            globals: config.globals,
            bundle_node_modules: config.bundle_node_modules,
            hooks: config.hooks,
        }
    }
}

/// Accept either a single value or a list of values.
fn one_or_many<'de, D, T>(deserializer: D) -> std::result::Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(
        Option::<OneOrMany<T>>::deserialize(deserializer)?.map(|value| match value {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn input_accepts_single_string() {
        let config = Config::from_value(json!({ "input": "src/a.js,src/b.js" })).unwrap();
        assert_eq!(
            config.input,
            Some(vec![InputSpec::Files("src/a.js,src/b.js".to_string())])
        );
    }

    #[test]
    fn input_accepts_named_entries() {
        let config = Config::from_value(json!({ "input": { "main": "src/index.js" } })).unwrap();
        let Some(inputs) = config.input else {
            panic!("input should be set");
        };
        assert!(matches!(&inputs[0], InputSpec::Named(map) if map["main"] == "src/index.js"));
    }

    #[test]
    fn input_accepts_mixed_list() {
        let config =
            Config::from_value(json!({ "input": ["src/a.js", { "b": "src/b.js" }] })).unwrap();
        assert_eq!(config.input.map(|i| i.len()), Some(2));
    }

    #[test]
    fn externals_accept_scalar() {
        let config = Config::from_value(json!({ "externals": "react" })).unwrap();
        assert_eq!(config.externals, Some(vec![ExternalMatcher::name("react")]));
    }

    #[test]
    fn format_list_splits_joined_string() {
        let formats = FormatList::Joined("cjs, umd-min,".to_string()).formats();
        assert_eq!(formats, vec![Format::new("cjs"), Format::new("umd-min")]);
    }

    #[test]
    fn output_uses_camel_case_keys() {
        let config = Config::from_value(json!({
            "output": { "moduleName": "Lib", "extractCSS": true, "sourceMap": false }
        }))
        .unwrap();
        assert_eq!(config.output.module_name.as_deref(), Some("Lib"));
        assert_eq!(config.output.extract_css, Some(true));
        assert_eq!(config.output.source_map, Some(false));
    }

    #[test]
    fn banner_variants() {
        let toggle: Banner = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(toggle, Banner::Toggle(true));
        let text: Banner = serde_json::from_value(json!("/* hi */")).unwrap();
        assert_eq!(text, Banner::Text("/* hi */".to_string()));
        let fields: Banner = serde_json::from_value(json!({ "license": "MIT" })).unwrap();
        assert!(matches!(fields, Banner::Fields(f) if f.license.as_deref() == Some("MIT")));
    }

    #[test]
    fn unset_fields_are_not_serialized() {
        let value = Config::default().to_value().unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn babel_minimal_flag() {
        let config = Config::from_value(json!({ "babel": { "minimal": true } })).unwrap();
        assert!(config.babel.unwrap().minimal());
    }
}
