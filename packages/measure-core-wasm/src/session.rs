use geo::LineString;
use log::debug;

use crate::distance::{distance_meters, format_distance, GeoPoint};
use crate::models::{to_position, DrawState, SegmentSnapshot, SessionSnapshot};

/// A committed polyline. Always has at least two vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub vertices: LineString<f64>,
    pub labels: Vec<String>,
    // Total length in meters at commit time
    pub distance: f64,
}

impl Segment {
    fn snapshot(&self) -> SegmentSnapshot {
        SegmentSnapshot {
            vertices: self.vertices.points().map(to_position).collect(),
            labels: self.labels.clone(),
            distance: self.distance,
        }
    }
}

pub type Observer = Box<dyn FnMut(&SessionSnapshot)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// The authoritative measurement model.
///
/// Every mutation goes through a command method; observers receive a
/// detached [`SessionSnapshot`] after each change. Observers run while the
/// session is mutably borrowed and must not call back into it.
pub struct MeasurementSession {
    active_vertices: Vec<GeoPoint>,
    active_labels: Vec<String>,
    running_distance: f64,
    preview_edge: Option<(GeoPoint, GeoPoint)>,
    history: Vec<Segment>,

    start_label: String,
    revision: u64,
    observers: Vec<(ObserverId, Observer)>,
    next_observer_id: u64,
}

impl Default for MeasurementSession {
    fn default() -> Self {
        Self::new("start")
    }
}

impl MeasurementSession {
    pub fn new(start_label: &str) -> Self {
        MeasurementSession {
            active_vertices: Vec::new(),
            active_labels: Vec::new(),
            running_distance: 0.0,
            preview_edge: None,
            history: Vec::new(),
            start_label: start_label.to_string(),
            revision: 0,
            observers: Vec::new(),
            next_observer_id: 0,
        }
    }

    pub fn add_point(&mut self, p: GeoPoint) {
        let label = match self.active_vertices.last() {
            Some(&last) => {
                self.running_distance += distance_meters(last, p);
                format_distance(self.running_distance)
            }
            None => {
                self.running_distance = 0.0;
                self.start_label.clone()
            }
        };

        debug!(
            "measure: vertex {} at ({}, {}) labelled {}",
            self.active_vertices.len(),
            p.x(),
            p.y(),
            label
        );

        self.active_vertices.push(p);
        self.active_labels.push(label);
        self.preview_edge = Some((p, p));
        self.changed();
    }

    pub fn set_preview_end(&mut self, p: GeoPoint) {
        // Nothing to preview from while idle
        let Some(&last) = self.active_vertices.last() else {
            return;
        };
        self.preview_edge = Some((last, p));
        self.changed();
    }

    pub fn finish_segment(&mut self) {
        if self.active_vertices.is_empty() {
            return;
        }

        if self.active_vertices.len() >= 2 {
            let segment = Segment {
                vertices: LineString::from(self.active_vertices.clone()),
                labels: self.active_labels.clone(),
                distance: self.running_distance,
            };
            debug!(
                "measure: committed segment {} with {} vertices, {:.1} m",
                self.history.len(),
                segment.vertices.0.len(),
                segment.distance
            );
            self.history.push(segment);
        } else {
            debug!("measure: discarded single-vertex segment");
        }

        self.clear_active();
        self.changed();
    }

    /// Drop the in-progress segment without committing it.
    pub fn discard_active(&mut self) {
        if self.active_vertices.is_empty() && self.preview_edge.is_none() {
            return;
        }
        self.clear_active();
        self.changed();
    }

    /// Clear the active segment and the whole history.
    pub fn reset(&mut self) {
        self.clear_active();
        self.history.clear();
        self.changed();
    }

    pub fn state(&self) -> DrawState {
        if self.active_vertices.is_empty() {
            DrawState::Idle
        } else {
            DrawState::Drawing
        }
    }

    pub fn active_vertices(&self) -> &[GeoPoint] {
        &self.active_vertices
    }

    pub fn active_labels(&self) -> &[String] {
        &self.active_labels
    }

    pub fn running_distance(&self) -> f64 {
        self.running_distance
    }

    pub fn preview_edge(&self) -> Option<(GeoPoint, GeoPoint)> {
        self.preview_edge
    }

    pub fn history(&self) -> &[Segment] {
        &self.history
    }

    pub fn last_vertex(&self) -> Option<GeoPoint> {
        self.active_vertices.last().copied()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // Committed distances plus the segment being drawn
    pub fn total_distance(&self) -> f64 {
        self.history.iter().map(|s| s.distance).sum::<f64>() + self.running_distance
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            revision: self.revision,
            state: self.state(),
            active_vertices: self.active_vertices.iter().copied().map(to_position).collect(),
            active_labels: self.active_labels.clone(),
            running_distance: self.running_distance,
            preview_edge: self
                .preview_edge
                .map(|(a, b)| [to_position(a), to_position(b)]),
            history: self.history.iter().map(Segment::snapshot).collect(),
            total_distance: self.total_distance(),
        }
    }

    pub fn subscribe(&mut self, observer: Observer) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    fn clear_active(&mut self) {
        self.active_vertices.clear();
        self.active_labels.clear();
        self.running_distance = 0.0;
        self.preview_edge = None;
    }

    fn changed(&mut self) {
        self.revision += 1;
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for (_, observer) in self.observers.iter_mut() {
            observer(&snapshot);
        }
    }
}
