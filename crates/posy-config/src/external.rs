//! External dependency matchers.

use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Decides whether an import is left out of the bundle.
///
/// Written in config as either a module name (`"react"`) or a regular
/// expression object (`{ "regex": "^lodash/" }`).
#[derive(Debug, Clone)]
pub enum ExternalMatcher {
    /// Matches the exact id, or any file inside `node_modules/<name>/`.
    Name(String),
    Pattern(Regex),
}

impl ExternalMatcher {
    pub fn name(name: impl Into<String>) -> Self {
        ExternalMatcher::Name(name.into())
    }

    pub fn matches(&self, id: &str) -> bool {
        let id = id.replace('\\', "/");
        match self {
            ExternalMatcher::Name(name) => {
                id == *name || id.contains(&format!("/node_modules/{name}/"))
            }
            ExternalMatcher::Pattern(pattern) => pattern.is_match(&id),
        }
    }

    /// The plain module name, if this matcher is one.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            ExternalMatcher::Name(name) => Some(name),
            ExternalMatcher::Pattern(_) => None,
        }
    }
}

impl PartialEq for ExternalMatcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ExternalMatcher::Name(a), ExternalMatcher::Name(b)) => a == b,
            (ExternalMatcher::Pattern(a), ExternalMatcher::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

/// Whether any matcher claims `id`.
pub fn is_external(externals: &[ExternalMatcher], id: &str) -> bool {
    externals.iter().any(|external| external.matches(id))
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawMatcher {
    Name(String),
    Pattern { regex: String },
}

impl Serialize for ExternalMatcher {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = match self {
            ExternalMatcher::Name(name) => RawMatcher::Name(name.clone()),
            ExternalMatcher::Pattern(pattern) => RawMatcher::Pattern {
                regex: pattern.as_str().to_string(),
            },
        };
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ExternalMatcher {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawMatcher::deserialize(deserializer)? {
            RawMatcher::Name(name) => Ok(ExternalMatcher::Name(name)),
            RawMatcher::Pattern { regex } => Regex::new(&regex)
                .map(ExternalMatcher::Pattern)
                .map_err(D::Error::custom),
        }
    }
}
