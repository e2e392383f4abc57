//! # posy-config
//!
//! Configuration model for posy: the per-layer [`Config`], the merged
//! [`NormalizedConfig`] build plan, and discovery of the project config file.

pub mod discovery;
pub mod error;
pub mod external;
pub mod format;
pub mod normalize;
pub mod plugin;
pub mod types;

pub use discovery::{
    CONFIG_FILES, ConfigLoader, ConfigSource, ENV_PREFIX, LoadedConfig, PACKAGE_KEY,
};
pub use error::{ConfigError, Result};
pub use external::{ExternalMatcher, is_external};
pub use format::{DEFAULT_FORMAT, EngineFormat, Format, MIN_SUFFIX};
pub use normalize::{
    DEFAULT_ENTRY, DEFAULT_OUTPUT_DIR, ENTRY_CANDIDATES, default_entry, find_existing_file,
    merge_values, normalize,
};
pub use plugin::{PluginOptions, PluginSlot};
pub use types::*;
