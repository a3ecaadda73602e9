// Configuration for the measurement tool, shared by the Rust API and the JS bindings
use serde::{Deserialize, Serialize};

use crate::error::MeasureError;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LineStyle {
    pub color: String,
    pub width: f64,
    // Mapbox `line-dasharray`, solid when absent
    pub dash: Option<[f64; 2]>,
}

impl LineStyle {
    pub fn solid(color: &str, width: f64) -> Self {
        Self {
            color: color.to_string(),
            width,
            dash: None,
        }
    }

    pub fn dashed(color: &str, width: f64, dash: [f64; 2]) -> Self {
        Self {
            color: color.to_string(),
            width,
            dash: Some(dash),
        }
    }
}

impl Default for LineStyle {
    fn default() -> Self {
        Self::solid("#00ffff", 3.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkerStyle {
    pub color: String,
    pub radius: f64,
    pub stroke_color: String,
    pub label_color: String,
    pub label_size: f64,
    // Label offset in ems, negative y floats the tag above the marker
    pub label_offset: [f64; 2],
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: "#f59e0b".to_string(),
            radius: 4.0,
            stroke_color: "#ffffff".to_string(),
            label_color: "#222222".to_string(),
            label_size: 12.0,
            label_offset: [0.0, -1.2],
        }
    }
}

/// Tool configuration. Every field has a default, so `{}` is a valid config.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct MeasureConfig {
    /// Label given to the first vertex of every segment.
    pub start_label: String,
    /// Ignore a click that lands exactly on the last placed vertex.
    ///
    /// Browsers deliver two clicks ahead of every double-click, so without
    /// this each finished segment would end on a zero-length edge.
    pub collapse_repeated_clicks: bool,
    pub committed_line: LineStyle,
    pub active_line: LineStyle,
    pub preview_line: LineStyle,
    pub marker: MarkerStyle,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            start_label: "start".to_string(),
            collapse_repeated_clicks: true,
            committed_line: LineStyle::solid("#00ffff", 3.0),
            active_line: LineStyle::solid("#00ffff", 3.0),
            preview_line: LineStyle::dashed("#00ffff", 2.0, [2.0, 2.0]),
            marker: MarkerStyle::default(),
        }
    }
}

impl MeasureConfig {
    pub fn from_json(json: &str) -> Result<Self, MeasureError> {
        serde_json::from_str(json).map_err(MeasureError::InvalidConfig)
    }
}
