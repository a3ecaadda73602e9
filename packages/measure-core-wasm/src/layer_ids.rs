// Utility functions to generate consistent source and layer ids per map.

/// The map sources the measurement tool owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasureSource {
    History,
    Current,
    Preview,
    Markers,
}

impl MeasureSource {
    pub const ALL: [MeasureSource; 4] = [
        MeasureSource::History,
        MeasureSource::Current,
        MeasureSource::Preview,
        MeasureSource::Markers,
    ];

    fn name(self) -> &'static str {
        match self {
            MeasureSource::History => "history",
            MeasureSource::Current => "current",
            MeasureSource::Preview => "preview",
            MeasureSource::Markers => "markers",
        }
    }
}

/// Generate a source id: "measure-{kind}-{mapId}".
pub fn make_source_id(map_id: &str, source: MeasureSource) -> String {
    format!("measure-{}-{}", source.name(), map_id)
}

/// Generate a layer id for a source. Sources drawn by several layers pass a
/// role suffix ("labels"), otherwise the layer shares the source's id with a "-layer" suffix.
pub fn make_layer_id(map_id: &str, source: MeasureSource, role: Option<&str>) -> String {
    match role {
        Some(role) if !role.is_empty() => format!("{}-{}", make_source_id(map_id, source), role),
        _ => format!("{}-layer", make_source_id(map_id, source)),
    }
}
