pub mod cache;
pub mod collection;
pub mod coords;
pub mod index_build;
pub mod media_index;
pub mod normalize;
pub mod port;
pub mod probe;
pub mod resolver;
pub mod url;
pub mod utm;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use cache::MediaCache;
pub use collection::{read_feature_collection, write_feature_collection};
pub use coords::CoordMode;
pub use geojson::FeatureCollection;
pub use media_index::{MediaEntry, MediaIndex};
pub use normalize::{normalize, Normalized};
pub use port::{Port, PortId};
pub use probe::{FsProbe, ProbeOptions, ProbeResolver};
pub use resolver::{FileIndexLoader, IndexResolver, IndexUnavailable, MediaLookup, ResolvedMedia};

fn default_ports() -> PathBuf {
    PathBuf::from("assets/Portos.geojson")
}

fn default_boundary() -> Option<PathBuf> {
    Some(PathBuf::from("assets/Raposa.geojson"))
}

fn default_media_root() -> String {
    "fotos".to_string()
}

/// Where the site's static inputs live and how media is found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteOptions {
    #[serde(default = "default_ports")]
    pub ports: PathBuf,
    #[serde(default = "default_boundary")]
    pub boundary: Option<PathBuf>,
    /// URL path prefix of the media folders as the page sees them
    #[serde(default = "default_media_root")]
    pub media_root: String,
    /// Prebuilt media index document
    #[serde(default)]
    pub media_index: Option<PathBuf>,
    /// Local media directory, probed when no index is configured
    #[serde(default)]
    pub media_dir: Option<PathBuf>,
    #[serde(default)]
    pub probe: ProbeOptions,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            ports: default_ports(),
            boundary: default_boundary(),
            media_root: default_media_root(),
            media_index: None,
            media_dir: None,
            probe: ProbeOptions::default(),
        }
    }
}

impl SiteOptions {
    /// Read options from a JSON file; absent fields take their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open config {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Invalid config {}", path.display()))
    }
}

/// The loaded, normalized site data.
#[derive(Debug, Clone)]
pub struct Site {
    pub ports_geo: FeatureCollection,
    pub mode: CoordMode,
    pub ports: Vec<Port>,
    /// Municipal boundary outline; `None` when it could not be loaded
    pub boundary: Option<FeatureCollection>,
}

/// Load boundary and ports.
///
/// A missing or broken boundary is logged and skipped. Failing to load the
/// ports is the only fatal error.
pub fn load_site(options: &SiteOptions) -> anyhow::Result<Site> {
    let boundary = options.boundary.as_deref().and_then(|path| {
        read_feature_collection(path)
            .map_err(|err| warn!("Boundary not loaded, continuing without it: {err:#}"))
            .ok()
    });

    let raw = read_feature_collection(&options.ports).context("Failed to load ports")?;
    info!("Ports loaded: {} features", raw.features.len());

    let Normalized { geo, mode } = normalize(&raw);
    info!("Coordinate mode: {mode}");

    let mismatched = normalize::mismatched_features(&raw, mode);
    if !mismatched.is_empty() {
        warn!(
            "{} point feature(s) do not look like {mode}: {:?}",
            mismatched.len(),
            mismatched
        );
    }

    let ports_geo = geo.into_owned();
    let ports = port::ports_from(&ports_geo);

    Ok(Site {
        ports_geo,
        mode,
        ports,
        boundary,
    })
}

/// Pick the media strategy: the index when one is configured, probing a
/// local media directory otherwise.
pub fn media_lookup(options: &SiteOptions) -> anyhow::Result<Box<dyn MediaLookup>> {
    if let Some(index) = &options.media_index {
        return Ok(Box::new(IndexResolver::new(
            FileIndexLoader::new(index),
            options.media_root.clone(),
        )));
    }
    if let Some(dir) = &options.media_dir {
        warn!("No media index configured, probing {} instead", dir.display());
        return Ok(Box::new(ProbeResolver::new(
            FsProbe::new(dir),
            options.media_root.clone(),
            options.probe.clone(),
        )));
    }
    anyhow::bail!("Neither a media index nor a media directory is configured")
}

/// Progress sink: `(stage, current, total, message)`.
pub type ProgressCallback<'a> = dyn Fn(&str, u64, u64, &str) + Send + Sync + 'a;

/// Default minimum time between two forwarded progress reports.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// Forwards the progress of one stage to a sink, at most once per interval.
/// The first and the last report of a stage always go through.
pub struct ThrottledProgress<'a> {
    stage: &'a str,
    sink: &'a ProgressCallback<'a>,
    interval: Duration,
    last_emit: Mutex<Option<Instant>>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(stage: &'a str, sink: &'a ProgressCallback<'a>) -> Self {
        Self {
            stage,
            sink,
            interval: PROGRESS_INTERVAL,
            last_emit: Mutex::new(None),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn report(&self, current: u64, total: u64, message: &str) {
        let is_last = current + 1 >= total;
        {
            let mut last = self.last_emit.lock().unwrap_or_else(|e| e.into_inner());
            let too_soon = last.is_some_and(|at| at.elapsed() < self.interval);
            if too_soon && !is_last {
                return;
            }
            *last = Some(Instant::now());
        }
        (self.sink)(self.stage, current, total, message);
    }
}
