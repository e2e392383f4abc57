//! Emitted-file registries.
//!
//! Each task gets its own [`Assets`] map, registered in the bundler's
//! [`BundleSet`] when its config is built. The set only grows: repeated runs
//! append new maps instead of replacing old ones.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::plugin::EmittedFile;

/// One emitted file.
#[derive(Debug)]
pub struct AssetEntry {
    absolute: PathBuf,
    file: Arc<EmittedFile>,
    source: OnceCell<String>,
}

impl AssetEntry {
    pub fn new(absolute: PathBuf, file: Arc<EmittedFile>) -> Self {
        Self {
            absolute,
            file,
            source: OnceCell::new(),
        }
    }

    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    /// Text content, decoded on first access.
    pub fn source(&self) -> &str {
        self.source.get_or_init(|| self.file.text().into_owned())
    }

    pub fn size(&self) -> u64 {
        self.file.len() as u64
    }
}

/// Files emitted by one task, keyed by path relative to the working directory.
#[derive(Debug, Clone, Default)]
pub struct Assets {
    entries: Arc<RwLock<IndexMap<String, Arc<AssetEntry>>>>,
}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, relative: impl Into<String>, entry: AssetEntry) {
        self.entries.write().insert(relative.into(), Arc::new(entry));
    }

    pub fn get(&self, relative: &str) -> Option<Arc<AssetEntry>> {
        self.entries.read().get(relative).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    pub fn entries(&self) -> Vec<(String, Arc<AssetEntry>)> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Append-only list of per-task [`Assets`].
#[derive(Debug, Default)]
pub struct BundleSet {
    bundles: RwLock<Vec<Assets>>,
}

impl BundleSet {
    /// Append a fresh registry and return a handle to it.
    pub fn register(&self) -> Assets {
        let assets = Assets::new();
        self.bundles.write().push(assets.clone());
        assets
    }

    pub fn get(&self, index: usize) -> Option<Assets> {
        self.bundles.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.bundles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.read().is_empty()
    }

    pub fn all(&self) -> Vec<Assets> {
        self.bundles.read().clone()
    }
}
