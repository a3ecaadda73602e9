// Plain, owned read models handed to renderers and to JavaScript
use serde::{Deserialize, Serialize};

use crate::distance::GeoPoint;

/// The two logical states of a measurement session.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DrawState {
    Idle,
    Drawing,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentSnapshot {
    pub vertices: Vec<[f64; 2]>,
    pub labels: Vec<String>,
    pub distance: f64,
}

/// Detached copy of a session. Owns all of its coordinates.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub revision: u64,
    pub state: DrawState,
    pub active_vertices: Vec<[f64; 2]>,
    pub active_labels: Vec<String>,
    pub running_distance: f64,
    pub preview_edge: Option<[[f64; 2]; 2]>,
    pub history: Vec<SegmentSnapshot>,
    pub total_distance: f64,
}

pub fn to_position(p: GeoPoint) -> [f64; 2] {
    [p.x(), p.y()]
}
