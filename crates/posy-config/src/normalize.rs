//! Three-layer config normalization.
//!
//! Precedence, lowest first: library defaults, the project config file, the
//! programmatic config. Most keys are deep-merged with the higher layer
//! winning; `input` is taken whole from the highest layer that sets a
//! non-empty list and `externals` from both layers are concatenated.

use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde_json::{Map, Value, json};

use crate::error::{ConfigError, Result};
use crate::types::{Config, InputSpec, NormalizedConfig, NormalizedOutput};

/// Entry used when nothing is configured and no candidate exists.
pub const DEFAULT_ENTRY: &str = "src/index.js";

/// Probed in order when no input is configured.
pub const ENTRY_CANDIDATES: [&str; 4] = [
    "src/index.tsx",
    "src/index.ts",
    "src/index.jsx",
    "src/index.js",
];

/// Output directory used when `output.dir` is unset.
pub const DEFAULT_OUTPUT_DIR: &str = "dist";

/// First existing file among `candidates`, relative to `root`.
pub fn find_existing_file(root: &Path, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|candidate| root.join(candidate).is_file())
        .map(|candidate| (*candidate).to_string())
}

/// The default entry for a project rooted at `root`.
pub fn default_entry(root: &Path) -> String {
    find_existing_file(root, &ENTRY_CANDIDATES).unwrap_or_else(|| DEFAULT_ENTRY.to_string())
}

/// Merge the project file layer and the programmatic layer into one plan.
///
/// Normalizing an already-normalized config (via `Config::from`) yields the
/// same result: an absolute `output.dir` is kept as-is.
///
/// # Example
///
/// ```
/// use posy_config::{normalize, Config};
/// use std::path::Path;
///
/// let config = normalize(Path::new("/project"), Config::default(), Config::default()).unwrap();
/// assert_eq!(config.output.dir, Path::new("/project/dist"));
/// ```
pub fn normalize(root: &Path, programmatic: Config, file: Config) -> Result<NormalizedConfig> {
    let hooks = programmatic.hooks.clone().or(file.hooks.clone());

    let file_value = file.to_value()?;
    let programmatic_value = programmatic.to_value()?;

    let mut merged = Value::Object(Map::new());
    merge_values(&mut merged, &file_value);
    merge_values(&mut merged, &programmatic_value);

    let input = [programmatic.input, file.input]
        .into_iter()
        .flatten()
        .find(|input| !input.is_empty())
        .unwrap_or_else(|| vec![InputSpec::Files(default_entry(root))]);

    let mut babel = json!({ "asyncToPromises": true });
    for layer in [&file_value, &programmatic_value] {
        if let Some(value) = layer.get("babel") {
            merge_values(&mut babel, value);
        }
    }

    let externals: Vec<_> = file
        .externals
        .into_iter()
        .flatten()
        .chain(programmatic.externals.into_iter().flatten())
        .collect();

    if let Value::Object(map) = &mut merged {
        map.insert("input".to_string(), to_value("input", &input)?);
        map.insert("babel".to_string(), babel);
        map.insert("externals".to_string(), to_value("externals", &externals)?);
    }

    let merged: Config = Config::from_value(merged)?;
    let output = merged.output;
    let dir = resolve_dir(root, output.dir.as_deref());

    Ok(NormalizedConfig {
        input,
        output: NormalizedOutput {
            dir,
            format: output.format,
            target: output.target,
            minify: output.minify,
            module_name: output.module_name,
            file_name: output.file_name,
            source_map: output.source_map,
            source_map_exclude_sources: output.source_map_exclude_sources,
            extract_css: output.extract_css,
        },
        externals,
        plugins: merged.plugins,
        babel: merged.babel.unwrap_or_default(),
        env: merged.env,
        banner: merged.banner,
        globals: merged.globals,
        bundle_node_modules: merged.bundle_node_modules,
        hooks,
    })
}

fn resolve_dir(root: &Path, dir: Option<&Path>) -> PathBuf {
    let dir = dir.unwrap_or_else(|| Path::new(DEFAULT_OUTPUT_DIR));
    root.join(dir).clean()
}

fn to_value<T: serde::Serialize>(field: &str, value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| ConfigError::invalid(field, e))
}

/// Deep-merge `update` into `target`. Objects merge key by key; arrays and
/// scalars replace.
pub fn merge_values(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_values(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target_slot, _) => {
            *target_slot = update.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_replaces_scalars() {
        let mut target = json!({ "a": 1 });
        merge_values(&mut target, &json!({ "a": 2 }));
        assert_eq!(target, json!({ "a": 2 }));
    }

    #[test]
    fn merge_recurses_into_objects() {
        let mut target = json!({ "a": { "x": 1, "y": 1 } });
        merge_values(&mut target, &json!({ "a": { "y": 2 } }));
        assert_eq!(target, json!({ "a": { "x": 1, "y": 2 } }));
    }

    #[test]
    fn merge_replaces_arrays() {
        let mut target = json!({ "a": [1, 2] });
        merge_values(&mut target, &json!({ "a": [3] }));
        assert_eq!(target, json!({ "a": [3] }));
    }

    #[test]
    fn merge_object_over_false() {
        let mut target = json!({ "vue": false });
        merge_values(&mut target, &json!({ "vue": { "css": true } }));
        assert_eq!(target, json!({ "vue": { "css": true } }));
    }

    #[test]
    fn relative_dir_is_resolved_against_root() {
        assert_eq!(
            resolve_dir(Path::new("/p"), Some(Path::new("./lib/../out"))),
            PathBuf::from("/p/out")
        );
    }

    #[test]
    fn absolute_dir_is_kept() {
        assert_eq!(
            resolve_dir(Path::new("/p"), Some(Path::new("/elsewhere"))),
            PathBuf::from("/elsewhere")
        );
    }
}
