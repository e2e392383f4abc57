//! Entry groups derived from the configured inputs.

use std::path::Path;

use indexmap::IndexMap;
use path_clean::PathClean;
use posy_config::{EntryInput, InputSpec, default_entry};

/// One entry group. Each source is bundled once per output format.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    /// Entry files as written in config, used for titles
    pub files: Vec<String>,
    /// Root-relative entries handed to the engine
    pub input: EntryInput,
    pub has_vue: bool,
    pub has_ts: bool,
}

impl Source {
    pub fn from_spec(root: &Path, spec: &InputSpec) -> Self {
        match spec {
            InputSpec::Files(joined) => {
                let files: Vec<String> = joined
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string)
                    .collect();
                let input = files.iter().map(|f| root_relative(root, f)).collect();
                Self::new(files, EntryInput::Files(input))
            }
            InputSpec::Named(entries) => {
                let files: Vec<String> = entries.values().cloned().collect();
                let input: IndexMap<String, String> = entries
                    .iter()
                    .map(|(name, file)| (name.clone(), root_relative(root, file)))
                    .collect();
                Self::new(files, EntryInput::Named(input))
            }
        }
    }

    fn new(files: Vec<String>, input: EntryInput) -> Self {
        let has_vue = files.iter().any(|f| f.ends_with(".vue"));
        let has_ts = files.iter().any(|f| f.ends_with(".ts") || f.ends_with(".tsx"));
        Self {
            files,
            input,
            has_vue,
            has_ts,
        }
    }
}

/// Sources for every input group; an empty list falls back to the default
/// entry.
pub fn build_sources(root: &Path, inputs: &[InputSpec]) -> Vec<Source> {
    if inputs.is_empty() {
        let entry = default_entry(root);
        return vec![Source::from_spec(root, &InputSpec::from(entry.as_str()))];
    }
    inputs.iter().map(|spec| Source::from_spec(root, spec)).collect()
}

/// `./`-prefixed path of `file` relative to `root`.
fn root_relative(root: &Path, file: &str) -> String {
    let absolute = root.join(file).clean();
    let relative = pathdiff::diff_paths(&absolute, root).unwrap_or(absolute);
    format!("./{}", relative.to_string_lossy().replace('\\', "/"))
}
