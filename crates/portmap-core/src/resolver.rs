use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::media_index::MediaIndex;
use crate::url::media_url;

/// Media found (or not) for one port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMedia {
    pub photos: Vec<String>,
    pub videos: Vec<String>,
    pub folder_used: String,
    /// `false` is a normal "nothing here" state, not an error
    pub found: bool,
}

impl ResolvedMedia {
    pub fn not_found(folder: &str) -> Self {
        Self {
            folder_used: folder.to_string(),
            ..Self::default()
        }
    }
}

/// Error indicating the media index could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexUnavailable(pub String);

impl std::fmt::Display for IndexUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Media index unavailable: {}", self.0)
    }
}

impl std::error::Error for IndexUnavailable {}

/// A strategy turning a port's folder (or name) into media URLs.
pub trait MediaLookup: Send + Sync {
    fn lookup(&self, folder_or_name: &str) -> Result<ResolvedMedia, IndexUnavailable>;
}

/// Source of the media index document.
pub trait IndexLoader: Send + Sync {
    fn load(&self) -> anyhow::Result<MediaIndex>;
}

impl<F> IndexLoader for F
where
    F: Fn() -> anyhow::Result<MediaIndex> + Send + Sync,
{
    fn load(&self) -> anyhow::Result<MediaIndex> {
        self()
    }
}

/// Reads the index document from a file.
#[derive(Debug, Clone)]
pub struct FileIndexLoader {
    pub path: PathBuf,
}

impl FileIndexLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IndexLoader for FileIndexLoader {
    fn load(&self) -> anyhow::Result<MediaIndex> {
        MediaIndex::load(&self.path)
    }
}

/// Resolves media through a prebuilt index.
///
/// The index is loaded on first use. Concurrent first callers wait on that
/// single load and all see its outcome; the outcome, failure included, is
/// kept for the lifetime of the resolver.
pub struct IndexResolver<L> {
    loader: L,
    media_root: String,
    index: OnceLock<Result<Arc<MediaIndex>, IndexUnavailable>>,
}

impl<L: IndexLoader> IndexResolver<L> {
    pub fn new(loader: L, media_root: impl Into<String>) -> Self {
        Self {
            loader,
            media_root: media_root.into(),
            index: OnceLock::new(),
        }
    }

    pub fn index(&self) -> Result<Arc<MediaIndex>, IndexUnavailable> {
        self.index
            .get_or_init(|| match self.loader.load() {
                Ok(index) => {
                    info!("Media index loaded: {} folders", index.len());
                    Ok(Arc::new(index))
                }
                Err(err) => {
                    warn!("Media index failed to load: {err:#}");
                    Err(IndexUnavailable(format!("{err:#}")))
                }
            })
            .clone()
    }

    pub fn resolve(&self, folder_or_name: &str) -> Result<ResolvedMedia, IndexUnavailable> {
        let index = self.index()?;
        let key = folder_or_name.trim();

        let Some((folder, entry)) = index.lookup(key) else {
            debug!("No media folder for {key:?}");
            return Ok(ResolvedMedia::not_found(key));
        };

        Ok(ResolvedMedia {
            photos: entry
                .photos
                .iter()
                .map(|f| media_url(&self.media_root, folder, f))
                .collect(),
            videos: entry
                .videos
                .iter()
                .map(|f| media_url(&self.media_root, folder, f))
                .collect(),
            folder_used: folder.to_string(),
            found: true,
        })
    }
}

impl<L: IndexLoader> MediaLookup for IndexResolver<L> {
    fn lookup(&self, folder_or_name: &str) -> Result<ResolvedMedia, IndexUnavailable> {
        self.resolve(folder_or_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    fn sample_index() -> anyhow::Result<MediaIndex> {
        MediaIndex::from_slice(
            r#"{
                "Porto Central": { "fotos": ["a.jpg", "Foto (2).JPG"], "videos": ["Video (1).mp4"] },
                "são josé": { "fotos": ["1.jpg"] }
            }"#
            .as_bytes(),
        )
    }

    #[test]
    fn test_resolve_found() {
        let resolver = IndexResolver::new(sample_index, "fotos");
        let media = resolver.resolve("Porto Central").unwrap();
        assert!(media.found);
        assert_eq!(media.folder_used, "Porto Central");
        assert_eq!(
            media.photos,
            vec!["fotos/Porto%20Central/a.jpg", "fotos/Porto%20Central/Foto%20(2).JPG"]
        );
        assert_eq!(media.videos, vec!["fotos/Porto%20Central/Video%20(1).mp4"]);
    }

    #[test]
    fn test_resolve_trims_and_lowercases() {
        let resolver = IndexResolver::new(sample_index, "fotos");
        let media = resolver.resolve("  São José \n").unwrap();
        assert!(media.found);
        assert_eq!(media.folder_used, "são josé");
        assert_eq!(media.photos, vec!["fotos/s%C3%A3o%20jos%C3%A9/1.jpg"]);
    }

    #[test]
    fn test_resolve_not_found() {
        let resolver = IndexResolver::new(sample_index, "fotos");
        let media = resolver.resolve(" Unknown Port ").unwrap();
        assert!(!media.found);
        assert!(media.photos.is_empty());
        assert!(media.videos.is_empty());
        assert_eq!(media.folder_used, "Unknown Port");
    }

    #[test]
    fn test_serialized_shape() {
        let resolver = IndexResolver::new(sample_index, "fotos");
        let json = serde_json::to_value(resolver.resolve("Porto Central").unwrap()).unwrap();
        assert_eq!(json["folderUsed"], "Porto Central");
        assert_eq!(json["found"], true);
    }

    #[test]
    fn test_concurrent_first_calls_load_once() {
        let loads = AtomicU64::new(0);
        let loader = || {
            loads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            sample_index()
        };
        let resolver = IndexResolver::new(loader, "fotos");
        let shared = &resolver;

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(move || shared.resolve("Porto Central").unwrap()))
                .collect();
            for h in handles {
                assert!(h.join().unwrap().found);
            }
        });

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        resolver.resolve("Porto Central").unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_load_failure_is_shared() {
        let loads = AtomicU64::new(0);
        let loader = || -> anyhow::Result<MediaIndex> {
            loads.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("HTTP 404")
        };
        let resolver = IndexResolver::new(loader, "fotos");

        let first = resolver.resolve("Porto Central").unwrap_err();
        let second = resolver.resolve("Outro").unwrap_err();
        assert_eq!(first, second);
        assert!(first.to_string().contains("HTTP 404"));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_file_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        sample_index().unwrap().save(&path).unwrap();

        let resolver = IndexResolver::new(FileIndexLoader::new(&path), "/midia");
        let media = resolver.resolve("Porto Central").unwrap();
        assert_eq!(media.photos[0], "/midia/Porto%20Central/a.jpg");

        let missing = IndexResolver::new(FileIndexLoader::new(dir.path().join("nope.json")), "fotos");
        assert!(missing.resolve("Porto Central").is_err());
    }
}
