//! Plugins implemented in process.

mod babel;
mod node_resolve;
mod progress;

pub use babel::{BabelOptions, BabelPlugin, SourceTransformer};
pub use node_resolve::{NodeResolveOptions, NodeResolvePlugin};
pub use progress::{ProgressOptions, ProgressPlugin};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ResolveError;

/// Deserialize plugin options, treating `null` as an empty object.
pub(crate) fn parse_options<T: DeserializeOwned>(
    plugin: &str,
    options: Value,
) -> Result<T, ResolveError> {
    let options = match options {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(options).map_err(|e| ResolveError::invalid_options(plugin, e))
}
