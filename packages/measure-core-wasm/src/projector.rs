//! Derives renderable geometry from a session snapshot.
//!
//! The projector is a pure view of the store: it never holds state of its
//! own, and every frame it builds owns fresh copies of the coordinates.

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{LineStyle, MeasureConfig};
use crate::geojson_features::{feature_collection, GeometryData};
use crate::layer_ids::{make_layer_id, make_source_id, MeasureSource};
use crate::models::SessionSnapshot;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LineKind {
    Committed,
    Active,
    Preview,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineFeature {
    pub kind: LineKind,
    pub coordinates: Vec<[f64; 2]>,
    // Segment length, absent for the preview edge
    pub distance: Option<f64>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub position: [f64; 2],
    pub label: String,
    pub committed: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderFrame {
    pub revision: u64,
    pub history_lines: Vec<LineFeature>,
    pub current_line: Option<LineFeature>,
    pub preview_line: Option<LineFeature>,
    pub markers: Vec<Marker>,
}

/// A named GeoJSON source update for the map.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SourceUpdate {
    pub id: String,
    pub data: Value,
}

/// Consumer of projected frames, usually backed by the map's sources.
pub trait RenderSink {
    fn render(&mut self, frame: &RenderFrame);
}

pub fn project(snapshot: &SessionSnapshot) -> RenderFrame {
    let history_lines = snapshot
        .history
        .iter()
        .map(|segment| LineFeature {
            kind: LineKind::Committed,
            coordinates: segment.vertices.clone(),
            distance: Some(segment.distance),
        })
        .collect();

    // A single vertex is only a marker
    let current_line = (snapshot.active_vertices.len() >= 2).then(|| LineFeature {
        kind: LineKind::Active,
        coordinates: snapshot.active_vertices.clone(),
        distance: Some(snapshot.running_distance),
    });

    let preview_line = snapshot.preview_edge.map(|edge| LineFeature {
        kind: LineKind::Preview,
        coordinates: edge.to_vec(),
        distance: None,
    });

    let committed_markers = snapshot.history.iter().flat_map(|segment| {
        segment
            .vertices
            .iter()
            .zip(&segment.labels)
            .map(|(position, label)| Marker {
                position: *position,
                label: label.clone(),
                committed: true,
            })
    });
    let active_markers = snapshot
        .active_vertices
        .iter()
        .zip(&snapshot.active_labels)
        .map(|(position, label)| Marker {
            position: *position,
            label: label.clone(),
            committed: false,
        });

    RenderFrame {
        revision: snapshot.revision,
        history_lines,
        current_line,
        preview_line,
        markers: committed_markers.chain(active_markers).collect(),
    }
}

impl LineFeature {
    fn to_geometry(&self) -> GeometryData {
        GeometryData::line(
            &self.coordinates,
            json!({ "kind": self.kind, "distance": self.distance }),
        )
    }
}

impl RenderFrame {
    /// Build one GeoJSON FeatureCollection per measurement source.
    ///
    /// Sources with nothing to show get an empty collection so stale
    /// geometry is cleared from the map.
    pub fn to_sources(&self, map_id: &str) -> Vec<SourceUpdate> {
        MeasureSource::ALL
            .iter()
            .map(|&source| SourceUpdate {
                id: make_source_id(map_id, source),
                data: self.source_data(source),
            })
            .collect()
    }

    pub fn source_data(&self, source: MeasureSource) -> Value {
        let features: Vec<GeometryData> = match source {
            MeasureSource::History => self.history_lines.iter().map(LineFeature::to_geometry).collect(),
            MeasureSource::Current => self.current_line.iter().map(LineFeature::to_geometry).collect(),
            MeasureSource::Preview => self.preview_line.iter().map(LineFeature::to_geometry).collect(),
            MeasureSource::Markers => self
                .markers
                .iter()
                .map(|m| {
                    GeometryData::point(
                        m.position,
                        json!({ "label": m.label, "committed": m.committed }),
                    )
                })
                .collect(),
        };
        feature_collection(&features)
    }
}

fn line_layer(id: String, source: String, style: &LineStyle) -> Value {
    let mut paint = json!({
        "line-color": style.color,
        "line-width": style.width,
    });
    if let Some(dash) = style.dash {
        paint["line-dasharray"] = json!(dash);
    }
    json!({
        "id": id,
        "type": "line",
        "source": source,
        "layout": { "line-join": "round", "line-cap": "round" },
        "paint": paint,
    })
}

/// Mapbox style layers drawing the measurement sources, bottom to top.
pub fn layer_specs(map_id: &str, config: &MeasureConfig) -> Vec<Value> {
    let source = |s| make_source_id(map_id, s);
    let marker = &config.marker;

    vec![
        line_layer(
            make_layer_id(map_id, MeasureSource::History, None),
            source(MeasureSource::History),
            &config.committed_line,
        ),
        line_layer(
            make_layer_id(map_id, MeasureSource::Current, None),
            source(MeasureSource::Current),
            &config.active_line,
        ),
        line_layer(
            make_layer_id(map_id, MeasureSource::Preview, None),
            source(MeasureSource::Preview),
            &config.preview_line,
        ),
        json!({
            "id": make_layer_id(map_id, MeasureSource::Markers, None),
            "type": "circle",
            "source": source(MeasureSource::Markers),
            "paint": {
                "circle-radius": marker.radius,
                "circle-color": marker.color,
                "circle-stroke-color": marker.stroke_color,
                "circle-stroke-width": 1,
            },
        }),
        // Floating distance tag above each vertex
        json!({
            "id": make_layer_id(map_id, MeasureSource::Markers, Some("labels")),
            "type": "symbol",
            "source": source(MeasureSource::Markers),
            "layout": {
                "text-field": ["get", "label"],
                "text-size": marker.label_size,
                "text-offset": marker.label_offset,
                "text-anchor": "bottom",
                "text-allow-overlap": true,
            },
            "paint": {
                "text-color": marker.label_color,
                "text-halo-color": "#ffffff",
                "text-halo-width": 1.5,
            },
        }),
    ]
}
