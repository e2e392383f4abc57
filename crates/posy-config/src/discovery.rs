//! File-based config discovery.
//!
//! Finds and loads the project config layer from conventional locations.
//! Environment variables prefixed with `POSY_` overlay whatever the file
//! provides (`POSY_OUTPUT__DIR=lib` sets `output.dir`).

use std::fs;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Serialized};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::{ConfigError, Result};
use crate::types::Config;

/// Conventional config file names, in search order.
pub const CONFIG_FILES: [&str; 5] = [
    "posy.config.toml",
    "posy.config.json",
    ".posyrc.toml",
    ".posyrc.json",
    "package.json",
];

/// Key holding the config inside `package.json`.
pub const PACKAGE_KEY: &str = "posy";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "POSY_";

/// Where the project config layer comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Search [`CONFIG_FILES`] in the project root
    #[default]
    Auto,
    /// Load exactly this file
    File(PathBuf),
    /// Skip the project layer entirely
    Disabled,
}

/// Result of a config lookup; both fields are empty when nothing was found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedConfig {
    pub path: Option<PathBuf>,
    pub data: Option<Value>,
}

/// Loads config files relative to a project root.
///
/// # Example
///
/// ```no_run
/// use posy_config::{ConfigLoader, ConfigSource};
///
/// let loader = ConfigLoader::new(".");
/// let (path, config) = loader.load_project_config(&ConfigSource::Auto).unwrap();
/// ```
pub struct ConfigLoader {
    root: PathBuf,
}

impl ConfigLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// First of `files` that exists. `package.json` only counts when it
    /// carries `package_key` (or when no key is requested).
    pub fn find(&self, files: &[&str], package_key: Option<&str>) -> Option<PathBuf> {
        files.iter().map(|file| self.root.join(file)).find(|path| {
            if !path.is_file() {
                return false;
            }
            match (is_package_json(path), package_key) {
                (true, Some(key)) => read_json(path)
                    .ok()
                    .is_some_and(|parsed| parsed.get(key).is_some_and(|v| !v.is_null())),
                _ => true,
            }
        })
    }

    /// Load the first matching file among `files`.
    pub fn load(&self, files: &[&str], package_key: Option<&str>) -> Result<LoadedConfig> {
        let Some(path) = self.find(files, package_key) else {
            trace!(root = %self.root.display(), "no config file found");
            return Ok(LoadedConfig::default());
        };
        debug!(path = %path.display(), "loading config file");
        let data = self.read(&path, package_key)?;
        Ok(LoadedConfig {
            path: Some(path),
            data: Some(data),
        })
    }

    /// Load the project's `package.json`, if any.
    pub fn load_package(&self) -> Result<LoadedConfig> {
        self.load(&["package.json"], None)
    }

    /// Load the project config layer with environment overrides applied.
    pub fn load_project_config(&self, source: &ConfigSource) -> Result<(Option<PathBuf>, Config)> {
        let loaded = match source {
            ConfigSource::Disabled => return Ok((None, Config::default())),
            ConfigSource::Auto => self.load(&CONFIG_FILES, Some(PACKAGE_KEY))?,
            ConfigSource::File(file) => {
                let path = self.root.join(file);
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path));
                }
                let data = self.read(&path, Some(PACKAGE_KEY))?;
                LoadedConfig {
                    path: Some(path),
                    data: Some(data),
                }
            }
        };

        let base = loaded.data.unwrap_or_else(|| Value::Object(Map::new()));
        let value: Value = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::invalid("environment", e))?;

        Ok((loaded.path, Config::from_value(value)?))
    }

    fn read(&self, path: &Path, package_key: Option<&str>) -> Result<Value> {
        if is_package_json(path) {
            let parsed = read_json(path)?;
            return match package_key {
                None => Ok(parsed),
                Some(key) => match parsed.get(key) {
                    Some(value) if !value.is_null() => Ok(value.clone()),
                    _ => Err(ConfigError::InvalidValue {
                        field: key.to_string(),
                        hint: Some(format!("Add a '{key}' field to your package.json")),
                    }),
                },
            };
        }

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                let content = fs::read_to_string(path)?;
                let toml_val: toml::Value = toml::from_str(&content).map_err(|e| {
                    ConfigError::invalid("toml", format!("Invalid TOML syntax: {e}"))
                })?;
                serde_json::to_value(toml_val).map_err(|e| {
                    ConfigError::invalid("toml", format!("TOML to JSON conversion failed: {e}"))
                })
            }
            Some("json") => read_json(path),
            Some(other) => Err(ConfigError::UnsupportedFormat(other.to_string())),
            None => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

fn is_package_json(path: &Path) -> bool {
    path.file_name() == Some(std::ffi::OsStr::new("package.json"))
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        ConfigError::invalid(path.display().to_string(), format!("Invalid JSON: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn find_returns_none_when_no_config() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(dir.path());
        assert!(loader.find(&CONFIG_FILES, Some(PACKAGE_KEY)).is_none());
    }

    #[test]
    fn package_json_without_key_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{ "name": "x" }"#).unwrap();
        let loader = ConfigLoader::new(dir.path());
        assert!(loader.find(&CONFIG_FILES, Some(PACKAGE_KEY)).is_none());
        assert!(loader.find(&["package.json"], None).is_some());
    }

    #[test]
    fn toml_wins_over_package_json() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("posy.config.toml"), "banner = true\n").unwrap();
        fs::write(dir.path().join("package.json"), r#"{ "posy": { "banner": false } }"#).unwrap();

        let loaded = ConfigLoader::new(dir.path())
            .load(&CONFIG_FILES, Some(PACKAGE_KEY))
            .unwrap();
        assert_eq!(loaded.path, Some(dir.path().join("posy.config.toml")));
        assert_eq!(loaded.data, Some(serde_json::json!({ "banner": true })));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("posy.config.yaml"), "banner: true").unwrap();
        let result = ConfigLoader::new(dir.path()).load(&["posy.config.yaml"], None);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "yaml"));
    }

    #[test]
    fn disabled_source_yields_empty_layer() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("posy.config.json"), r#"{ "banner": true }"#).unwrap();
        let (path, config) = ConfigLoader::new(dir.path())
            .load_project_config(&ConfigSource::Disabled)
            .unwrap();
        assert!(path.is_none());
        assert!(config.banner.is_none());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = ConfigLoader::new(dir.path())
            .load_project_config(&ConfigSource::File(PathBuf::from("nope.json")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
