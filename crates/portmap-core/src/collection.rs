use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use anyhow::{bail, Context};
use geojson::{Feature, FeatureCollection, GeoJson, Value};

/// A point position in whatever axis order and unit the source used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    /// Elevation, if the source carried one
    pub z: Option<f64>,
}

impl Position {
    /// Accept two or three ordinates; longer or shorter positions are unusable.
    pub fn from_coords(coords: &[f64]) -> Option<Self> {
        match *coords {
            [x, y] => Some(Self { x, y, z: None }),
            [x, y, z] => Some(Self { x, y, z: Some(z) }),
            _ => None,
        }
    }
}

pub fn is_point(feature: &Feature) -> bool {
    matches!(
        feature.geometry.as_ref().map(|g| &g.value),
        Some(Value::Point(_))
    )
}

/// Position of a `Point` geometry with two or three ordinates.
pub fn point_position(feature: &Feature) -> Option<Position> {
    match &feature.geometry.as_ref()?.value {
        Value::Point(coords) => Position::from_coords(coords),
        _ => None,
    }
}

/// Overwrite a point geometry with a plain pair.
pub(crate) fn set_point(feature: &mut Feature, x: f64, y: f64) {
    if let Some(geometry) = feature.geometry.as_mut() {
        geometry.value = Value::Point(vec![x, y]);
    }
}

/// First point feature carrying a usable position, in document order.
pub fn first_point(collection: &FeatureCollection) -> Option<(usize, Position)> {
    collection
        .features
        .iter()
        .enumerate()
        .find_map(|(i, f)| point_position(f).map(|p| (i, p)))
}

/// Parse a GeoJSON document that must be a feature collection.
pub fn parse_feature_collection<R: Read>(reader: R) -> anyhow::Result<FeatureCollection> {
    match GeoJson::from_reader(reader)? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(_) => bail!("expected a FeatureCollection, found a single Feature"),
        GeoJson::Geometry(_) => bail!("expected a FeatureCollection, found a bare Geometry"),
    }
}

/// Read a GeoJSON feature collection from disk.
pub fn read_feature_collection(path: &Path) -> anyhow::Result<FeatureCollection> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    parse_feature_collection(BufReader::new(file))
        .with_context(|| format!("Invalid GeoJSON feature collection in {}", path.display()))
}

pub fn write_feature_collection<W: Write>(collection: &FeatureCollection, writer: W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(writer, collection)?;
    Ok(())
}
