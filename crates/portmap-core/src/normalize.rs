use std::borrow::Cow;

use geojson::FeatureCollection;
use tracing::{debug, error, warn};

use crate::collection::{first_point, is_point, point_position, set_point};
use crate::coords::{classify, CoordMode};
use crate::utm::{onto_globe, UtmProjector, UtmZone};

/// Outcome of [`normalize`].
#[derive(Debug)]
pub struct Normalized<'a> {
    /// Borrowed input when nothing was classified, otherwise a corrected copy
    pub geo: Cow<'a, FeatureCollection>,
    pub mode: CoordMode,
}

/// Bring every point feature into `[lon, lat]` WGS84 order.
///
/// The coordinate system is inferred from the first point feature only and
/// that decision is applied to the whole collection. Datasets mixing systems
/// are not detected here; see [`mismatched_features`].
///
/// In `utm23s->wgs84` mode every point ends up inside [-180, 180] x [-90, 90]:
/// a position the projection rejects is wrapped and clamped instead.
pub fn normalize(raw: &FeatureCollection) -> Normalized<'_> {
    let Some((sample_index, sample)) = first_point(raw) else {
        return Normalized {
            geo: Cow::Borrowed(raw),
            mode: CoordMode::NoPointFound,
        };
    };
    debug!(
        "first point (raw) = [{}, {}] at feature {}",
        sample.x, sample.y, sample_index
    );

    let mode = classify(sample.x, sample.y);
    let projector = match mode {
        CoordMode::Utm23s => UtmProjector::new(UtmZone::SIRGAS2000_23S)
            .map_err(|err| error!("{err:#}; projected points will only be clamped"))
            .ok(),
        _ => None,
    };
    let mut geo = raw.clone();

    for (i, feature) in geo.features.iter_mut().enumerate() {
        if !is_point(feature) {
            continue;
        }
        let Some(p) = point_position(feature) else {
            debug!("feature {i}: point without a usable position, left as is");
            continue;
        };
        let (x, y) = match mode {
            CoordMode::SwappedLatLon => (p.y, p.x),
            CoordMode::Utm23s => projector
                .as_ref()
                .and_then(|projector| projector.to_lonlat(p.x, p.y))
                .unwrap_or_else(|| {
                    warn!("feature {i}: [{}, {}] does not project, clamped onto the globe", p.x, p.y);
                    onto_globe(p.x, p.y)
                }),
            _ => (p.x, p.y),
        };
        set_point(feature, x, y);
    }

    Normalized {
        geo: Cow::Owned(geo),
        mode,
    }
}

/// Indexes of point features whose own classification differs from `mode`.
pub fn mismatched_features(raw: &FeatureCollection, mode: CoordMode) -> Vec<usize> {
    if mode == CoordMode::NoPointFound {
        return Vec::new();
    }
    raw.features
        .iter()
        .enumerate()
        .filter_map(|(i, f)| {
            let p = point_position(f)?;
            (classify(p.x, p.y) != mode).then_some(i)
        })
        .collect()
}
