use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// Geometry type of a GeoJSON feature emitted by the projector
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryType {
    Point,
    LineString,
}

// A minimal GeoJSON feature. Coordinates are always plain owned arrays.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GeometryData {
    pub r#type: GeometryType,
    pub coordinates: Value,
    pub properties: Value,
}

impl GeometryData {
    pub fn line(coordinates: &[[f64; 2]], properties: Value) -> Self {
        GeometryData {
            r#type: GeometryType::LineString,
            coordinates: json!(coordinates),
            properties,
        }
    }

    pub fn point(position: [f64; 2], properties: Value) -> Self {
        GeometryData {
            r#type: GeometryType::Point,
            coordinates: json!(position),
            properties,
        }
    }

    pub fn to_feature(&self) -> Value {
        json!({
            "type": "Feature",
            "geometry": {
                "type": self.r#type,
                "coordinates": self.coordinates,
            },
            "properties": self.properties,
        })
    }
}

pub fn feature_collection(features: &[GeometryData]) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": features.iter().map(GeometryData::to_feature).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_feature_shape() {
        let line = GeometryData::line(&[[114.0, 30.0], [114.01, 30.0]], json!({"distance": 963.0}));
        let feature = line.to_feature();
        assert_eq!(feature["type"], "Feature");
        assert_eq!(feature["geometry"]["type"], "LineString");
        assert_eq!(feature["geometry"]["coordinates"][1][0], 114.01);
        assert_eq!(feature["properties"]["distance"], 963.0);
    }

    #[test]
    fn empty_collection_is_still_a_collection() {
        let fc = feature_collection(&[]);
        assert_eq!(fc["type"], "FeatureCollection");
        assert_eq!(fc["features"].as_array().map(Vec::len), Some(0));
    }
}
