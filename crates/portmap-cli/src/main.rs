use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use portmap_core::index_build::build_index;
use portmap_core::{
    load_site, media_lookup, normalize, read_feature_collection, write_feature_collection, MediaCache,
    Normalized, SiteOptions, ThrottledProgress,
};
use rayon::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "portmap", version, about = "Port map data tools: coordinate normalization and media lookup")]
struct Cli {
    /// JSON file with site options; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite the ports GeoJSON with [lon, lat] WGS84 point coordinates
    Normalize {
        /// Ports GeoJSON (default: assets/Portos.geojson)
        #[arg(long)]
        ports: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the media index for a directory holding one folder per port
    Index {
        media_dir: PathBuf,

        /// Where to write the index document
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Resolve the photos and videos of one port folder or name
    Resolve {
        name: String,

        #[command(flatten)]
        media: MediaArgs,
    },

    /// List ports with their media counts
    Ports {
        /// Ports GeoJSON (default: assets/Portos.geojson)
        #[arg(long)]
        ports: Option<PathBuf>,

        /// Municipal boundary GeoJSON (default: assets/Raposa.geojson)
        #[arg(long)]
        boundary: Option<PathBuf>,

        #[command(flatten)]
        media: MediaArgs,
    },
}

#[derive(Args)]
struct MediaArgs {
    /// Prebuilt media index
    #[arg(long)]
    index: Option<PathBuf>,

    /// Local media directory to probe when there is no index
    #[arg(long)]
    media_dir: Option<PathBuf>,

    /// URL prefix of the media folders (default: fotos)
    #[arg(long)]
    media_root: Option<String>,
}

impl MediaArgs {
    fn apply(self, options: &mut SiteOptions) {
        if let Some(index) = self.index {
            options.media_index = Some(index);
        }
        if let Some(dir) = self.media_dir {
            options.media_dir = Some(dir);
        }
        if let Some(root) = self.media_root {
            options.media_root = root;
        }
    }
}

fn run_normalize(options: &SiteOptions, output: Option<PathBuf>) -> anyhow::Result<()> {
    let raw = read_feature_collection(&options.ports)?;
    let Normalized { geo, mode } = normalize(&raw);
    info!("Coordinate mode: {mode}");

    match output {
        Some(path) => {
            let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_feature_collection(&geo, &mut writer)?;
            writer.flush()?;
            eprintln!("Wrote {} ({mode})", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            write_feature_collection(&geo, &mut stdout)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

fn run_index(media_dir: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let t_total = Instant::now();
    let callback = |stage: &str, current: u64, total: u64, message: &str| {
        eprintln!("\r[{}] {}/{} {}", stage, current + 1, total, message);
    };
    let progress = ThrottledProgress::new("index", &callback);

    let result = build_index(&media_dir, &progress)?;
    for warning in &result.warnings {
        warn!("{warning}");
    }
    result.index.save(&output)?;

    eprintln!(
        "Done! {} folders, {} photos, {} videos, {} warnings ({:.2}s)",
        result.folders,
        result.photos,
        result.videos,
        result.warnings.len(),
        t_total.elapsed().as_secs_f64()
    );
    Ok(())
}

fn run_resolve(options: &SiteOptions, name: &str) -> anyhow::Result<()> {
    let lookup = media_lookup(options)?;
    let media = lookup.lookup(name)?;
    println!("{}", serde_json::to_string_pretty(&media)?);
    Ok(())
}

fn run_ports(options: &SiteOptions) -> anyhow::Result<()> {
    let site = load_site(options)?;
    let lookup = match media_lookup(options) {
        Ok(lookup) => Some(lookup),
        Err(err) => {
            info!("Listing ports without media: {err}");
            None
        }
    };

    let cache = MediaCache::new();
    let lines: Vec<String> = site
        .ports
        .par_iter()
        .map(|port| {
            let location = format!("{}\t{}\t{:.6}, {:.6}", port.id.0, port.name, port.lat, port.lon);
            let Some(lookup) = lookup.as_deref() else {
                return location;
            };
            match cache.get_or_lookup(port, lookup) {
                Ok(media) if media.found => format!(
                    "{location}\t{} photos, {} videos ({})",
                    media.photos.len(),
                    media.videos.len(),
                    media.folder_used
                ),
                Ok(media) => format!("{location}\tno media ({})", media.folder_used),
                Err(err) => format!("{location}\t{err}"),
            }
        })
        .collect();

    for line in lines {
        println!("{line}");
    }
    eprintln!("{} ports ({})", site.ports.len(), site.mode);
    Ok(())
}

fn real_main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let mut options = match &cli.config {
        Some(path) => SiteOptions::load(path)?,
        None => SiteOptions::default(),
    };

    match cli.command {
        Command::Normalize { ports, output } => {
            if let Some(ports) = ports {
                options.ports = ports;
            }
            run_normalize(&options, output)
        }
        Command::Index { media_dir, output } => run_index(media_dir, output),
        Command::Resolve { name, media } => {
            media.apply(&mut options);
            run_resolve(&options, &name)
        }
        Command::Ports { ports, boundary, media } => {
            if let Some(ports) = ports {
                options.ports = ports;
            }
            if let Some(boundary) = boundary {
                options.boundary = Some(boundary);
            }
            media.apply(&mut options);
            run_ports(&options)
        }
    }
}

fn main() -> ExitCode {
    match real_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(10)
        }
    }
}
