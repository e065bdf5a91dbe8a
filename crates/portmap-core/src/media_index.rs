use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Photos and videos of one media folder, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    #[serde(rename = "fotos", default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
}

/// Folder name -> media files, as written by the offline index build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaIndex {
    folders: BTreeMap<String, MediaEntry>,
}

impl MediaIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, folder: impl Into<String>, entry: MediaEntry) {
        self.folders.insert(folder.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MediaEntry)> {
        self.folders.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Find the entry for an already trimmed key: verbatim first, then the
    /// all-lowercase spelling. Returns the key that matched.
    pub fn lookup(&self, key: &str) -> Option<(&str, &MediaEntry)> {
        if let Some((k, v)) = self.folders.get_key_value(key) {
            return Some((k.as_str(), v));
        }
        let lower = key.to_lowercase();
        self.folders
            .get_key_value(lower.as_str())
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn from_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Load an index document from disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open media index {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Invalid media index {}", path.display()))
    }

    /// Save the index, writing a temp file first and renaming it into place.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let temp_path = path.with_extension("json.tmp");

        let file = File::create(&temp_path)
            .with_context(|| format!("Failed to create {}", temp_path.display()))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;

        fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to move index into {}", path.display()))?;
        Ok(())
    }
}
