//! Per-plugin configuration slots.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Options object handed to a plugin factory.
pub type PluginOptions = Map<String, Value>;

/// Configuration for one named plugin.
///
/// In config files a slot is written as `false` (disabled), `true` (enabled
/// with default options) or an options object.
#[derive(Debug, Clone, PartialEq)]
pub enum PluginSlot {
    Disabled,
    Enabled(PluginOptions),
}

impl PluginSlot {
    pub fn enabled() -> Self {
        PluginSlot::Enabled(PluginOptions::new())
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, PluginSlot::Enabled(_))
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, PluginSlot::Disabled)
    }

    pub fn options(&self) -> Option<&PluginOptions> {
        match self {
            PluginSlot::Enabled(options) => Some(options),
            PluginSlot::Disabled => None,
        }
    }

    /// Options as a JSON value; `None` when disabled.
    pub fn to_value(&self) -> Option<Value> {
        self.options().map(|options| Value::Object(options.clone()))
    }
}

impl From<bool> for PluginSlot {
    fn from(enabled: bool) -> Self {
        if enabled {
            PluginSlot::enabled()
        } else {
            PluginSlot::Disabled
        }
    }
}

impl From<Value> for PluginSlot {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(enabled) => enabled.into(),
            Value::Object(options) => PluginSlot::Enabled(options),
            Value::Null => PluginSlot::Disabled,
            other => {
                let mut options = PluginOptions::new();
                options.insert("value".to_string(), other);
                PluginSlot::Enabled(options)
            }
        }
    }
}

impl Serialize for PluginSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PluginSlot::Disabled => serializer.serialize_bool(false),
            PluginSlot::Enabled(options) => options.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for PluginSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(enabled) => Ok(enabled.into()),
            Value::Object(options) => Ok(PluginSlot::Enabled(options)),
            other => Err(D::Error::custom(format!(
                "expected a boolean or an options object, found {other}"
            ))),
        }
    }
}
