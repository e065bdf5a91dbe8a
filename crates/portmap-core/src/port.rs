use geojson::{Feature, FeatureCollection};
use serde::Serialize;
use serde_json::Value;

use crate::collection::point_position;

/// Name shown for a port whose `name` property is missing or empty.
pub const DEFAULT_PORT_NAME: &str = "Sem nome";

/// Attribute keys never shown in a port's detail table (compared trimmed
/// and lowercased).
const HIDDEN_KEYS: &[&str] = &["ele", "porto da raposa", "cod", "endereço/bairro"];

/// Index of the port's feature in its loaded collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PortId(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Port {
    pub id: PortId,
    pub name: String,
    /// Folder (or index key) holding this port's photos and videos
    pub media_dir: String,
    pub lon: f64,
    pub lat: f64,
    pub attributes: Vec<(String, String)>,
}

pub fn is_hidden_key(key: &str) -> bool {
    let key = key.trim().to_lowercase();
    HIDDEN_KEYS.contains(&key.as_str())
}

/// Scalar property as display text. `null` renders empty; arrays and
/// objects render as compact JSON.
pub fn property_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn property<'a>(feature: &'a Feature, key: &str) -> Option<&'a Value> {
    feature.properties.as_ref()?.get(key)
}

fn non_empty_text(value: Option<&Value>) -> Option<String> {
    value.map(property_text).filter(|s| !s.is_empty())
}

impl Port {
    /// Build a port from a normalized point feature.
    pub fn from_feature(id: PortId, feature: &Feature) -> Option<Self> {
        let position = point_position(feature)?;
        let name = non_empty_text(property(feature, "name"))
            .unwrap_or_else(|| DEFAULT_PORT_NAME.to_string());
        let media_dir = non_empty_text(property(feature, "midia_dir")).unwrap_or_else(|| name.clone());
        let attributes = feature
            .properties
            .iter()
            .flatten()
            .filter(|(k, _)| !is_hidden_key(k))
            .map(|(k, v)| (k.clone(), property_text(v)))
            .collect();

        Some(Self {
            id,
            name,
            media_dir,
            lon: position.x,
            lat: position.y,
            attributes,
        })
    }
}

/// Every point feature of a normalized collection, as ports.
pub fn ports_from(collection: &FeatureCollection) -> Vec<Port> {
    collection
        .features
        .iter()
        .enumerate()
        .filter_map(|(i, f)| Port::from_feature(PortId(i), f))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::parse_feature_collection;
    use serde_json::json;

    fn collection(value: Value) -> FeatureCollection {
        parse_feature_collection(value.to_string().as_bytes()).unwrap()
    }

    fn feature(properties: Value) -> Feature {
        let mut fc = collection(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": properties,
                "geometry": { "type": "Point", "coordinates": [-44.1, -2.42] }
            }]
        }));
        fc.features.remove(0)
    }

    #[test]
    fn test_name_and_media_dir_fallbacks() {
        let port = Port::from_feature(PortId(0), &feature(json!({ "name": "Porto Central" }))).unwrap();
        assert_eq!(port.name, "Porto Central");
        assert_eq!(port.media_dir, "Porto Central");

        let port = Port::from_feature(
            PortId(1),
            &feature(json!({ "name": "Porto Central", "midia_dir": "3. Porto Central" })),
        )
        .unwrap();
        assert_eq!(port.media_dir, "3. Porto Central");

        let port = Port::from_feature(PortId(2), &feature(json!({ "name": "", "midia_dir": null }))).unwrap();
        assert_eq!(port.name, DEFAULT_PORT_NAME);
        assert_eq!(port.media_dir, DEFAULT_PORT_NAME);

        let port = Port::from_feature(PortId(3), &feature(json!({ "name": 12 }))).unwrap();
        assert_eq!(port.name, "12");
    }

    #[test]
    fn test_hidden_attributes() {
        let port = Port::from_feature(
            PortId(0),
            &feature(json!({
                "name": "Porto do Braga",
                " ELE ": 3,
                "Cod": "P-01",
                "Endereço/Bairro": "Centro",
                "Porto da Raposa": "sim",
                "tipo": "pesqueiro",
                "obs": null
            })),
        )
        .unwrap();
        let keys: Vec<&str> = port.attributes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["name", "tipo", "obs"]);
        assert_eq!(port.attributes[2].1, "");
    }

    #[test]
    fn test_ports_from_skips_non_points() {
        let fc = collection(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {}, "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] } },
                { "type": "Feature", "properties": { "name": "A" }, "geometry": { "type": "Point", "coordinates": [-44.1, -2.4] } }
            ]
        }));
        let ports = ports_from(&fc);
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].id, PortId(1));
        assert_eq!((ports[0].lon, ports[0].lat), (-44.1, -2.4));
    }
}
