use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::LazyLock;

use anyhow::Context;
use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, warn};
use unicode_normalization::is_nfc;

use crate::media_index::{MediaEntry, MediaIndex};
use crate::ThrottledProgress;

static CHUNK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+|\D+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

/// Classify a file by the MIME type its extension implies.
pub fn media_kind(filename: &str) -> Option<MediaKind> {
    // Camcorder streams are not registered as video
    if filename.to_lowercase().ends_with(".mts") {
        return Some(MediaKind::Video);
    }
    let mime = mime_guess::from_path(filename).first()?;
    if mime.type_() == mime_guess::mime::IMAGE {
        Some(MediaKind::Photo)
    } else if mime.type_() == mime_guess::mime::VIDEO {
        Some(MediaKind::Video)
    } else {
        None
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Chunk {
    /// Digit run compared by magnitude: (significant digits, digits)
    Number(usize, String),
    Text(String),
}

fn natural_key(name: &str) -> Vec<Chunk> {
    CHUNK_RE
        .find_iter(name)
        .map(|m| {
            let s = m.as_str();
            if s.as_bytes()[0].is_ascii_digit() {
                let digits = s.trim_start_matches('0');
                Chunk::Number(digits.len(), digits.to_string())
            } else {
                Chunk::Text(s.to_lowercase())
            }
        })
        .collect()
}

/// "Foto (2).jpg" before "Foto (10).jpg"; ties fall back to plain order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b)).then_with(|| a.cmp(b))
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Result of scanning a media directory.
#[derive(Debug, Default)]
pub struct IndexBuildResult {
    pub index: MediaIndex,
    pub folders: u64,
    pub photos: u64,
    pub videos: u64,
    pub warnings: Vec<String>,
}

/// List the photos and videos directly inside one port folder.
fn scan_folder(path: &Path) -> anyhow::Result<MediaEntry> {
    let mut entry = MediaEntry::default();
    for dir_entry in fs::read_dir(path)? {
        let dir_entry = dir_entry?;
        if !dir_entry.file_type()?.is_file() {
            continue;
        }
        let Some(filename) = dir_entry.file_name().to_str().map(str::to_string) else {
            debug!("Skipping non UTF-8 file name in {}", path.display());
            continue;
        };
        if is_hidden(&filename) {
            continue;
        }
        match media_kind(&filename) {
            Some(MediaKind::Photo) => entry.photos.push(filename),
            Some(MediaKind::Video) => entry.videos.push(filename),
            None => {}
        }
    }
    entry.photos.sort_by(|a, b| natural_cmp(a, b));
    entry.videos.sort_by(|a, b| natural_cmp(a, b));
    Ok(entry)
}

/// Build the media index for a directory holding one folder per port.
///
/// Folder keys are spelled exactly as on disk so generated URLs hit real
/// files. Folders are scanned in parallel.
pub fn build_index(media_dir: &Path, progress: &ThrottledProgress<'_>) -> anyhow::Result<IndexBuildResult> {
    let mut result = IndexBuildResult::default();
    let mut folders = Vec::new();

    let entries = fs::read_dir(media_dir)
        .with_context(|| format!("Failed to read media directory {}", media_dir.display()))?;
    for dir_entry in entries {
        let dir_entry = dir_entry?;
        let path = dir_entry.path();
        let Some(name) = dir_entry.file_name().to_str().map(str::to_string) else {
            result
                .warnings
                .push(format!("Skipped non UTF-8 entry {}", path.display()));
            continue;
        };
        if is_hidden(&name) {
            continue;
        }
        if path.is_dir() {
            folders.push((name, path));
        } else {
            result
                .warnings
                .push(format!("Loose file outside any port folder: {name}"));
        }
    }
    folders.sort_by(|a, b| natural_cmp(&a.0, &b.0));

    let total = folders.len() as u64;
    let counter = AtomicU64::new(0);
    let scanned: Vec<(String, anyhow::Result<MediaEntry>)> = folders
        .par_iter()
        .map(|(name, path)| {
            let entry = scan_folder(path);
            let current = counter.fetch_add(1, AtomicOrdering::Relaxed);
            progress.report(current, total, name);
            (name.clone(), entry)
        })
        .collect();

    for (name, entry) in scanned {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping folder {name}: {err:#}");
                result.warnings.push(format!("Unreadable folder {name}: {err:#}"));
                continue;
            }
        };
        if !is_nfc(&name) {
            result.warnings.push(format!(
                "Folder name {name:?} is not NFC normalized and may not match port names"
            ));
        }
        if entry.photos.is_empty() && entry.videos.is_empty() {
            debug!("Folder {name} has no photos or videos");
        }
        result.folders += 1;
        result.photos += entry.photos.len() as u64;
        result.videos += entry.videos.len() as u64;
        result.index.insert(name, entry);
    }

    Ok(result)
}
