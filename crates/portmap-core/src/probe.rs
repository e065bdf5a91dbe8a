//! Index-less media discovery by probing numbered file names.
//!
//! Kept as a fallback for media directories that have no prebuilt index.
//! Every candidate costs an existence check, so prefer [`crate::resolver`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::resolver::{IndexUnavailable, MediaLookup, ResolvedMedia};
use crate::url::media_url;

/// Extensions tried for each photo position, in order.
pub const IMAGE_EXTS: &[&str] = &["JPG", "jpg", "JPEG", "jpeg", "PNG", "png", "WEBP", "webp"];
/// Extensions tried for each video position, in order.
pub const VIDEO_EXTS: &[&str] = &["MP4", "mp4", "WEBM", "webm"];

pub fn photo_name(position: u32, ext: &str) -> String {
    format!("Foto ({position}).{ext}")
}

pub fn video_name(position: u32, ext: &str) -> String {
    format!("Video ({position}).{ext}")
}

/// Answers whether a media file exists.
pub trait MediaProbe: Send + Sync {
    fn exists(&self, folder: &str, filename: &str) -> bool;
}

/// Probes a local media directory.
#[derive(Debug, Clone)]
pub struct FsProbe {
    pub media_dir: PathBuf,
}

impl FsProbe {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self { media_dir: media_dir.into() }
    }
}

impl MediaProbe for FsProbe {
    fn exists(&self, folder: &str, filename: &str) -> bool {
        self.media_dir.join(folder).join(filename).is_file()
    }
}

fn default_max_photos() -> u32 {
    60
}

fn default_max_videos() -> u32 {
    10
}

fn default_max_misses() -> u32 {
    3
}

fn default_max_prefix() -> u32 {
    30
}

fn default_guess_prefix() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOptions {
    #[serde(default = "default_max_photos")]
    pub max_photos: u32,
    #[serde(default = "default_max_videos")]
    pub max_videos: u32,
    /// Consecutive empty photo positions that end the photo scan
    #[serde(default = "default_max_misses")]
    pub max_misses: u32,
    /// Try "1. <folder>", "2. <folder>", ... when the bare folder has no first photo
    #[serde(default = "default_guess_prefix")]
    pub guess_prefix: bool,
    #[serde(default = "default_max_prefix")]
    pub max_prefix: u32,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            max_photos: default_max_photos(),
            max_videos: default_max_videos(),
            max_misses: default_max_misses(),
            guess_prefix: default_guess_prefix(),
            max_prefix: default_max_prefix(),
        }
    }
}

pub struct ProbeResolver<P> {
    probe: P,
    media_root: String,
    options: ProbeOptions,
}

impl<P: MediaProbe> ProbeResolver<P> {
    pub fn new(probe: P, media_root: impl Into<String>, options: ProbeOptions) -> Self {
        Self {
            probe,
            media_root: media_root.into(),
            options,
        }
    }

    /// First extension under which `name(position, ext)` exists.
    fn find_at(&self, folder: &str, position: u32, exts: &[&str], name: fn(u32, &str) -> String) -> Option<String> {
        exts.iter()
            .map(|ext| name(position, ext))
            .find(|filename| self.probe.exists(folder, filename))
    }

    fn has_first_photo(&self, folder: &str) -> bool {
        self.find_at(folder, 1, IMAGE_EXTS, photo_name).is_some()
    }

    /// The bare folder if it holds `Foto (1)`, else the first numbered
    /// variant that does, else the bare folder.
    pub fn pick_folder(&self, base: &str) -> String {
        if !self.options.guess_prefix || self.has_first_photo(base) {
            return base.to_string();
        }
        (1..=self.options.max_prefix)
            .map(|n| format!("{n}. {base}"))
            .find(|candidate| self.has_first_photo(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    pub fn resolve(&self, folder_or_name: &str) -> ResolvedMedia {
        let base = folder_or_name.trim();
        let folder = self.pick_folder(base);
        debug!("Probing media in {folder:?}");

        let mut photos = Vec::new();
        let mut misses = 0;
        for position in 1..=self.options.max_photos {
            match self.find_at(&folder, position, IMAGE_EXTS, photo_name) {
                Some(filename) => {
                    photos.push(media_url(&self.media_root, &folder, &filename));
                    misses = 0;
                }
                None => {
                    misses += 1;
                    if misses >= self.options.max_misses {
                        break;
                    }
                }
            }
        }

        let videos: Vec<String> = (1..=self.options.max_videos)
            .filter_map(|position| self.find_at(&folder, position, VIDEO_EXTS, video_name))
            .map(|filename| media_url(&self.media_root, &folder, &filename))
            .collect();

        let found = !photos.is_empty() || !videos.is_empty();
        ResolvedMedia {
            photos,
            videos,
            folder_used: folder,
            found,
        }
    }
}

impl<P: MediaProbe> MediaLookup for ProbeResolver<P> {
    fn lookup(&self, folder_or_name: &str) -> Result<ResolvedMedia, IndexUnavailable> {
        Ok(self.resolve(folder_or_name))
    }
}
