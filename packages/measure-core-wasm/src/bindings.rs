// Browser bindings: a Mapbox GL JS / MapLibre map behind `MapHandle`, and the JS-facing tool
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use js_sys::Function;
use log::{debug, warn};
use serde::Serialize;
use serde_json::json;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::adapter::{MapHandle, MeasureTool, PointerCallback, PointerEvent, PointerKind};
use crate::config::MeasureConfig;
use crate::error::MeasureError;
use crate::layer_ids::MeasureSource;
use crate::projector::{layer_specs, RenderFrame, RenderSink};

#[wasm_bindgen]
extern "C" {
    /// A Mapbox GL JS (or MapLibre GL JS) `Map` instance.
    #[derive(Clone)]
    pub type MapboxMap;

    #[wasm_bindgen(method, js_name = isStyleLoaded)]
    fn is_style_loaded(this: &MapboxMap) -> bool;

    #[wasm_bindgen(method)]
    fn on(this: &MapboxMap, event: &str, listener: &Function);

    #[wasm_bindgen(method)]
    fn off(this: &MapboxMap, event: &str, listener: &Function);

    #[wasm_bindgen(method, getter, js_name = doubleClickZoom)]
    fn double_click_zoom(this: &MapboxMap) -> DoubleClickZoomHandler;

    #[wasm_bindgen(method, js_name = getSource)]
    fn get_source(this: &MapboxMap, id: &str) -> Option<GeoJsonSource>;

    #[wasm_bindgen(method, catch, js_name = addSource)]
    fn add_source(this: &MapboxMap, id: &str, source: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = removeSource)]
    fn remove_source(this: &MapboxMap, id: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = getLayer)]
    fn get_layer(this: &MapboxMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, catch, js_name = addLayer)]
    fn add_layer(this: &MapboxMap, layer: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = removeLayer)]
    fn remove_layer(this: &MapboxMap, id: &str) -> Result<(), JsValue>;

    type DoubleClickZoomHandler;

    #[wasm_bindgen(method)]
    fn enable(this: &DoubleClickZoomHandler);

    #[wasm_bindgen(method)]
    fn disable(this: &DoubleClickZoomHandler);

    type GeoJsonSource;

    #[wasm_bindgen(method, js_name = setData)]
    fn set_data(this: &GeoJsonSource, data: &JsValue);

    type MapMouseEvent;

    #[wasm_bindgen(method, getter, js_name = lngLat)]
    fn lng_lat(this: &MapMouseEvent) -> LngLat;

    #[wasm_bindgen(method, js_name = preventDefault)]
    fn prevent_default(this: &MapMouseEvent);

    type LngLat;

    #[wasm_bindgen(method, getter)]
    fn lng(this: &LngLat) -> f64;

    #[wasm_bindgen(method, getter)]
    fn lat(this: &LngLat) -> f64;
}

type MouseClosure = Closure<dyn FnMut(MapMouseEvent)>;
type StyleClosure = Closure<dyn FnMut()>;

// `isStyleLoaded()` is also false while sources or tiles are loading, long after
// `style.load` has fired, so a pending activation re-checks on these repeating events.
const STYLE_EVENTS: [&str; 2] = ["styledata", "idle"];

// Serializer producing plain objects and arrays, never ES Maps
fn to_plain<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, MeasureError> {
    Ok(value.serialize(&Serializer::json_compatible())?)
}

pub struct JsMap {
    map: MapboxMap,
    listeners: RefCell<HashMap<u32, MouseClosure>>,
    next_id: Cell<u32>,
}

impl JsMap {
    pub fn new(map: MapboxMap) -> Self {
        JsMap {
            map,
            listeners: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
        }
    }

    pub fn raw(&self) -> &MapboxMap {
        &self.map
    }
}

impl MapHandle for JsMap {
    type ListenerId = u32;

    fn is_style_loaded(&self) -> bool {
        self.map.is_style_loaded()
    }

    fn set_double_click_zoom(&self, enabled: bool) {
        let handler = self.map.double_click_zoom();
        if enabled {
            handler.enable();
        } else {
            handler.disable();
        }
    }

    fn on(&self, kind: PointerKind, mut callback: PointerCallback) -> u32 {
        let closure = Closure::wrap(Box::new(move |e: MapMouseEvent| {
            let lng_lat = e.lng_lat();
            let mut event = PointerEvent::new(kind, lng_lat.lng(), lng_lat.lat());
            callback(&mut event);
            if event.default_prevented() {
                e.prevent_default();
            }
        }) as Box<dyn FnMut(MapMouseEvent)>);
        self.map.on(kind.event_name(), closure.as_ref().unchecked_ref());

        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        self.listeners.borrow_mut().insert(id, closure);
        id
    }

    fn off(&self, kind: PointerKind, listener: u32) {
        if let Some(closure) = self.listeners.borrow_mut().remove(&listener) {
            self.map.off(kind.event_name(), closure.as_ref().unchecked_ref());
        }
    }
}

/// Writes frames into the map's GeoJSON sources, adding sources and layers on first use.
pub struct MapboxSink {
    map: MapboxMap,
    map_id: String,
    layers: Vec<serde_json::Value>,
    installed: bool,
}

impl MapboxSink {
    pub fn new(map: MapboxMap, map_id: &str, config: &MeasureConfig) -> Self {
        MapboxSink {
            map,
            map_id: map_id.to_string(),
            layers: layer_specs(map_id, config),
            installed: false,
        }
    }

    fn install(&mut self) -> Result<(), MeasureError> {
        let empty = json!({ "type": "FeatureCollection", "features": [] });
        for source in MeasureSource::ALL {
            let id = crate::layer_ids::make_source_id(&self.map_id, source);
            if self.map.get_source(&id).is_none() {
                self.map
                    .add_source(&id, &to_plain(&json!({ "type": "geojson", "data": empty }))?)?;
            }
        }
        for layer in &self.layers {
            let id = layer["id"].as_str().unwrap_or_default();
            if self.map.get_layer(id).is_undefined() {
                self.map.add_layer(&to_plain(layer)?)?;
            }
        }
        self.installed = true;
        Ok(())
    }

    fn try_render(&mut self, frame: &RenderFrame) -> Result<(), MeasureError> {
        if !self.installed {
            self.install()?;
        }
        match self.write_sources(frame) {
            // `setStyle` drops every source and layer; put ours back once
            Err(MeasureError::MissingSource(id)) => {
                debug!("measure[{}]: source {} is gone, reinstalling", self.map_id, id);
                self.installed = false;
                self.install()?;
                self.write_sources(frame)
            }
            other => other,
        }
    }

    fn write_sources(&self, frame: &RenderFrame) -> Result<(), MeasureError> {
        for update in frame.to_sources(&self.map_id) {
            let source = self
                .map
                .get_source(&update.id)
                .ok_or_else(|| MeasureError::MissingSource(update.id.clone()))?;
            // Fresh plain object every time so the map sees the change
            source.set_data(&to_plain(&update.data)?);
        }
        Ok(())
    }

    fn uninstall(&mut self) {
        if !self.installed {
            return;
        }
        for layer in self.layers.iter().rev() {
            if let Some(id) = layer["id"].as_str() {
                if !self.map.get_layer(id).is_undefined() {
                    let _ = self.map.remove_layer(id);
                }
            }
        }
        for source in MeasureSource::ALL {
            let id = crate::layer_ids::make_source_id(&self.map_id, source);
            if self.map.get_source(&id).is_some() {
                let _ = self.map.remove_source(&id);
            }
        }
        self.installed = false;
    }
}

impl RenderSink for MapboxSink {
    fn render(&mut self, frame: &RenderFrame) {
        if let Err(err) = self.try_render(frame) {
            warn!("measure[{}]: render failed: {}", self.map_id, err);
        }
    }
}

impl Drop for MapboxSink {
    fn drop(&mut self) {
        self.uninstall();
    }
}

fn ensure_sink(tool: &mut MeasureTool<JsMap>) {
    if tool.is_active() && !tool.has_render_sink() {
        let sink = MapboxSink::new(tool.map().raw().clone(), tool.map_id(), tool.config());
        tool.set_render_sink(sink);
    }
}

/// Measurement tool bound to a Mapbox map, exported to JavaScript.
#[wasm_bindgen]
pub struct JsMeasureTool {
    inner: Rc<RefCell<MeasureTool<JsMap>>>,
    style_wait: Rc<RefCell<Option<StyleClosure>>>,
}

#[wasm_bindgen]
impl JsMeasureTool {
    /// `config` may be omitted; any field left out keeps its default.
    #[wasm_bindgen(constructor)]
    pub fn new(map: MapboxMap, map_id: &str, config: JsValue) -> Result<JsMeasureTool, JsValue> {
        let config: MeasureConfig = if config.is_undefined() || config.is_null() {
            MeasureConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(MeasureError::from)?
        };
        let tool = MeasureTool::new(JsMap::new(map), map_id, config);
        Ok(JsMeasureTool {
            inner: Rc::new(RefCell::new(tool)),
            style_wait: Rc::new(RefCell::new(None)),
        })
    }

    pub fn activate(&mut self) {
        let mut tool = self.inner.borrow_mut();
        tool.activate();
        if !tool.is_awaiting_style() {
            ensure_sink(&mut tool);
            return;
        }
        if self.style_wait.borrow().is_some() {
            return;
        }

        let inner = Rc::clone(&self.inner);
        let slot = Rc::clone(&self.style_wait);
        let closure = Closure::wrap(Box::new(move || {
            let mut tool = inner.borrow_mut();
            if !tool.map().is_style_loaded() {
                return;
            }
            // Unsubscribe only; the closure is still running and is dropped on deactivate
            if let Some(pending) = slot.borrow().as_ref() {
                for event in STYLE_EVENTS {
                    tool.map().raw().off(event, pending.as_ref().unchecked_ref());
                }
            }
            tool.style_loaded();
            ensure_sink(&mut tool);
        }) as Box<dyn FnMut()>);
        for event in STYLE_EVENTS {
            tool.map().raw().on(event, closure.as_ref().unchecked_ref());
        }
        *self.style_wait.borrow_mut() = Some(closure);
    }

    pub fn deactivate(&mut self) {
        let mut tool = self.inner.borrow_mut();
        if let Some(closure) = self.style_wait.borrow_mut().take() {
            for event in STYLE_EVENTS {
                tool.map().raw().off(event, closure.as_ref().unchecked_ref());
            }
        }
        tool.deactivate();
    }

    /// Deactivate and remove the measurement sources and layers from the map.
    pub fn dispose(&mut self) {
        self.deactivate();
        self.inner.borrow_mut().clear_render_sink();
    }

    #[wasm_bindgen(js_name = finishSegment)]
    pub fn finish_segment(&self) {
        self.inner.borrow().finish_segment();
    }

    pub fn reset(&self) {
        self.inner.borrow().reset();
    }

    #[wasm_bindgen(js_name = isActive)]
    pub fn is_active(&self) -> bool {
        self.inner.borrow().is_active()
    }

    #[wasm_bindgen(js_name = totalDistance)]
    pub fn total_distance(&self) -> f64 {
        self.inner.borrow().total_distance()
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        Ok(to_plain(&self.inner.borrow().snapshot())?)
    }

    /// Current GeoJSON sources keyed by source id.
    pub fn frame(&self) -> Result<JsValue, JsValue> {
        let tool = self.inner.borrow();
        let sources: serde_json::Map<String, serde_json::Value> = tool
            .frame()
            .to_sources(tool.map_id())
            .into_iter()
            .map(|update| (update.id, update.data))
            .collect();
        Ok(to_plain(&sources)?)
    }

    /// Mapbox layer definitions, for hosts that manage layers themselves.
    #[wasm_bindgen(js_name = layerSpecs)]
    pub fn layer_specs(&self) -> Result<JsValue, JsValue> {
        let tool = self.inner.borrow();
        Ok(to_plain(&layer_specs(tool.map_id(), tool.config()))?)
    }
}

impl Drop for JsMeasureTool {
    fn drop(&mut self) {
        self.dispose();
    }
}
