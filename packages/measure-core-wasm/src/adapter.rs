//! Bridges a map's pointer events to a [`MeasurementSession`].
//!
//! The tool subscribes to click, mousemove and dblclick while active and
//! disables the map's native double-click zoom, because dblclick is the
//! "finish segment" gesture. Both are released on deactivation and on drop.
//!
//! Only one active tool per map should own the double-click-zoom toggle.
//! This is not enforced; a second activation on the same map id logs a warning.

use std::cell::RefCell;
use std::rc::Rc;

use log::{info, warn};

use crate::config::MeasureConfig;
use crate::distance::GeoPoint;
use crate::models::{DrawState, SessionSnapshot};
use crate::module_state::ModuleState;
use crate::projector::{project, RenderFrame, RenderSink};
use crate::session::{MeasurementSession, ObserverId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Click,
    MouseMove,
    DoubleClick,
}

impl PointerKind {
    // Event name used by Mapbox GL / MapLibre
    pub fn event_name(self) -> &'static str {
        match self {
            PointerKind::Click => "click",
            PointerKind::MouseMove => "mousemove",
            PointerKind::DoubleClick => "dblclick",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub position: GeoPoint,
    default_prevented: bool,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, lng: f64, lat: f64) -> Self {
        PointerEvent {
            kind,
            position: GeoPoint::new(lng, lat),
            default_prevented: false,
        }
    }

    /// Ask the map to skip its native handling of this event.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

pub type PointerCallback = Box<dyn FnMut(&mut PointerEvent)>;

/// The map collaborator as seen by the measurement tool.
///
/// Methods take `&self`; implementations are expected to use interior
/// mutability the way a JS map object does.
pub trait MapHandle {
    type ListenerId;

    fn is_style_loaded(&self) -> bool;
    fn set_double_click_zoom(&self, enabled: bool);
    fn on(&self, kind: PointerKind, callback: PointerCallback) -> Self::ListenerId;
    fn off(&self, kind: PointerKind, listener: Self::ListenerId);
}

struct Binding<L> {
    click: L,
    mouse_move: L,
    double_click: L,
}

enum Activation<L> {
    Inactive,
    AwaitingStyle,
    Active(Binding<L>),
}

pub type SharedSession = Rc<RefCell<MeasurementSession>>;

/// A measurement tool bound to one map.
pub struct MeasureTool<M: MapHandle> {
    map: M,
    map_id: String,
    config: MeasureConfig,
    session: SharedSession,
    activation: Activation<M::ListenerId>,
    render_observer: Option<ObserverId>,
}

impl<M: MapHandle> MeasureTool<M> {
    pub fn new(map: M, map_id: &str, config: MeasureConfig) -> Self {
        let session = MeasurementSession::new(&config.start_label);
        MeasureTool {
            map,
            map_id: map_id.to_string(),
            config,
            session: Rc::new(RefCell::new(session)),
            activation: Activation::Inactive,
            render_observer: None,
        }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_id(&self) -> &str {
        &self.map_id
    }

    pub fn config(&self) -> &MeasureConfig {
        &self.config
    }

    pub fn session(&self) -> SharedSession {
        Rc::clone(&self.session)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.activation, Activation::Active(_))
    }

    pub fn is_awaiting_style(&self) -> bool {
        matches!(self.activation, Activation::AwaitingStyle)
    }

    /// Start listening to the map. Calling it again while active does nothing.
    ///
    /// If the map style has not finished loading the tool waits for
    /// [`MeasureTool::style_loaded`] before subscribing.
    pub fn activate(&mut self) {
        match self.activation {
            Activation::Active(_) | Activation::AwaitingStyle => {}
            Activation::Inactive if self.map.is_style_loaded() => self.bind(),
            Activation::Inactive => {
                info!("measure[{}]: waiting for map style before binding", self.map_id);
                self.activation = Activation::AwaitingStyle;
            }
        }
    }

    /// Completes an activation that was waiting on the map style.
    pub fn style_loaded(&mut self) {
        if matches!(self.activation, Activation::AwaitingStyle) {
            self.bind();
        }
    }

    /// Stop listening, restore double-click zoom and drop any unfinished segment.
    pub fn deactivate(&mut self) {
        match std::mem::replace(&mut self.activation, Activation::Inactive) {
            Activation::Inactive => return,
            Activation::AwaitingStyle => {}
            Activation::Active(binding) => {
                self.map.off(PointerKind::Click, binding.click);
                self.map.off(PointerKind::MouseMove, binding.mouse_move);
                self.map.off(PointerKind::DoubleClick, binding.double_click);
                self.map.set_double_click_zoom(true);
                ModuleState::with_mut(|state| state.release_map(&self.map_id));
            }
        }
        self.session.borrow_mut().discard_active();
        info!("measure[{}]: deactivated", self.map_id);
    }

    pub fn finish_segment(&self) {
        self.session.borrow_mut().finish_segment();
    }

    /// Clear every measurement, committed or not.
    pub fn reset(&self) {
        self.session.borrow_mut().reset();
    }

    pub fn state(&self) -> DrawState {
        self.session.borrow().state()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.borrow().snapshot()
    }

    pub fn frame(&self) -> RenderFrame {
        project(&self.session.borrow().snapshot())
    }

    pub fn total_distance(&self) -> f64 {
        self.session.borrow().total_distance()
    }

    /// Forward every session change, projected, to `sink`. Replaces any previous sink
    /// and renders the current state immediately.
    pub fn set_render_sink<S: RenderSink + 'static>(&mut self, mut sink: S) {
        let mut session = self.session.borrow_mut();
        if let Some(previous) = self.render_observer.take() {
            session.unsubscribe(previous);
        }
        sink.render(&project(&session.snapshot()));
        let id = session.subscribe(Box::new(move |snapshot: &SessionSnapshot| {
            sink.render(&project(snapshot))
        }));
        self.render_observer = Some(id);
    }

    pub fn has_render_sink(&self) -> bool {
        self.render_observer.is_some()
    }

    pub fn clear_render_sink(&mut self) {
        if let Some(id) = self.render_observer.take() {
            self.session.borrow_mut().unsubscribe(id);
        }
    }

    fn bind(&mut self) {
        let contenders = ModuleState::with_mut(|state| state.claim_map(&self.map_id));
        if contenders > 0 {
            warn!(
                "measure[{}]: {} other tool(s) already active on this map; double-click zoom ownership is shared",
                self.map_id, contenders
            );
        }

        self.map.set_double_click_zoom(false);

        let session = Rc::clone(&self.session);
        let collapse = self.config.collapse_repeated_clicks;
        let click = self.map.on(
            PointerKind::Click,
            Box::new(move |event: &mut PointerEvent| {
                let mut session = session.borrow_mut();
                if collapse && session.last_vertex() == Some(event.position) {
                    return;
                }
                session.add_point(event.position);
            }),
        );

        let session = Rc::clone(&self.session);
        let mouse_move = self.map.on(
            PointerKind::MouseMove,
            Box::new(move |event: &mut PointerEvent| {
                session.borrow_mut().set_preview_end(event.position)
            }),
        );

        // The double-click finishes with the vertices already placed; its own
        // coordinate is not added.
        let session = Rc::clone(&self.session);
        let double_click = self.map.on(
            PointerKind::DoubleClick,
            Box::new(move |event: &mut PointerEvent| {
                event.prevent_default();
                session.borrow_mut().finish_segment();
            }),
        );

        self.activation = Activation::Active(Binding {
            click,
            mouse_move,
            double_click,
        });
        info!("measure[{}]: activated", self.map_id);
    }
}

impl<M: MapHandle> Drop for MeasureTool<M> {
    fn drop(&mut self) {
        self.deactivate();
    }
}
