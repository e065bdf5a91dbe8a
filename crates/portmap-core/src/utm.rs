//! UTM easting/northing to WGS84 longitude/latitude through `proj4rs`.

use anyhow::anyhow;
use proj4rs::Proj;

const WGS84_LONGLAT: &str = "+proj=longlat +datum=WGS84 +no_defs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    pub number: u8,
    pub south: bool,
}

impl UtmZone {
    /// Zone used by the municipal ports survey (SIRGAS2000 / UTM zone 23S).
    pub const SIRGAS2000_23S: UtmZone = UtmZone { number: 23, south: true };

    pub fn central_meridian(&self) -> f64 {
        f64::from(self.number) * 6.0 - 183.0
    }

    /// PROJ definition of the zone. SIRGAS2000 is GRS80 with a null shift
    /// to WGS84 (EPSG:31983 for zone 23S).
    pub fn proj_string(&self) -> String {
        let hemisphere = if self.south { " +south" } else { "" };
        format!(
            "+proj=utm +zone={}{hemisphere} +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
            self.number
        )
    }
}

/// Converts positions of one UTM zone to WGS84 degrees.
pub struct UtmProjector {
    utm: Proj,
    wgs84: Proj,
}

impl UtmProjector {
    pub fn new(zone: UtmZone) -> anyhow::Result<Self> {
        let utm = Proj::from_proj_string(&zone.proj_string())
            .map_err(|e| anyhow!("Failed to create UTM zone {} projection: {e:?}", zone.number))?;
        let wgs84 = Proj::from_proj_string(WGS84_LONGLAT)
            .map_err(|e| anyhow!("Failed to create WGS84 projection: {e:?}"))?;
        Ok(Self { utm, wgs84 })
    }

    /// Convert easting/northing in metres to `(longitude, latitude)` degrees.
    ///
    /// Longitude is wrapped into [-180, 180) and latitude clamped to
    /// [-90, 90]. Returns `None` when the transform fails or does not yield
    /// finite values.
    pub fn to_lonlat(&self, easting: f64, northing: f64) -> Option<(f64, f64)> {
        let mut point = (easting, northing, 0.0);
        proj4rs::transform::transform(&self.utm, &self.wgs84, &mut point).ok()?;

        // Geographic output is in radians
        let lon = point.0.to_degrees();
        let lat = point.1.to_degrees();
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        Some((wrap_longitude(lon), lat.clamp(-90.0, 90.0)))
    }
}

/// Euclidean wrap into [-180, 180).
pub fn wrap_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Force a finite pair onto the globe: longitude wrapped, latitude clamped.
/// Non-finite values become 0.
pub fn onto_globe(x: f64, y: f64) -> (f64, f64) {
    let lon = if x.is_finite() { wrap_longitude(x) } else { 0.0 };
    let lat = if y.is_finite() { y.clamp(-90.0, 90.0) } else { 0.0 };
    (lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn projector() -> UtmProjector {
        UtmProjector::new(UtmZone::SIRGAS2000_23S).unwrap()
    }

    #[test]
    fn test_zone_definition() {
        let zone = UtmZone::SIRGAS2000_23S;
        assert_eq!(zone.central_meridian(), -45.0);
        assert_eq!(UtmZone { number: 1, south: false }.central_meridian(), -177.0);
        assert_eq!(
            zone.proj_string(),
            "+proj=utm +zone=23 +south +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs"
        );
        assert!(!UtmZone { number: 23, south: false }.proj_string().contains("+south"));
    }

    #[test]
    fn test_origin_of_zone() {
        let (lon, lat) = projector().to_lonlat(500_000.0, 10_000_000.0).unwrap();
        assert!(close(lon, -45.0, 1e-6), "lon = {lon}");
        assert!(close(lat, 0.0, 1e-6), "lat = {lat}");
    }

    #[test]
    fn test_raposa_area() {
        let (lon, lat) = projector().to_lonlat(600_000.0, 9_732_000.0).unwrap();
        assert!(close(lon, -44.10056, 1e-4), "lon = {lon}");
        assert!(close(lat, -2.42437, 1e-4), "lat = {lat}");
    }

    #[test]
    fn test_garbage_input_never_leaves_globe() {
        let projector = projector();
        for (e, n) in [(5_000.0, 5_000.0), (-2_000.0, -3_000.0), (1e12, 1e12), (1e308, 5_000.0)] {
            if let Some((lon, lat)) = projector.to_lonlat(e, n) {
                assert!((-180.0..=180.0).contains(&lon), "lon = {lon}");
                assert!((-90.0..=90.0).contains(&lat), "lat = {lat}");
            }
        }
    }

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(190.0), -170.0);
        assert_eq!(wrap_longitude(-190.0), 170.0);
        assert_eq!(wrap_longitude(180.0), -180.0);
        assert_eq!(wrap_longitude(-44.0), -44.0);
    }

    #[test]
    fn test_onto_globe() {
        let (lon, lat) = onto_globe(1e308, 5_000.0);
        assert!((-180.0..180.0).contains(&lon));
        assert_eq!(lat, 90.0);
        assert_eq!(onto_globe(f64::NAN, -1e9), (0.0, -90.0));
        let (lon, lat) = onto_globe(-44.1, -2.4);
        assert!(close(lon, -44.1, 1e-9));
        assert_eq!(lat, -2.4);
    }
}
