//! Browser tests for the JS surface. Run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Function, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

use measure_core_wasm::{
    distance_meters_js, format_distance_js, set_log_level, JsMeasureTool, MapboxMap,
};

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen(inline_js = r#"
export function makeFakeMap(styleLoaded) {
  const listeners = {};
  const sources = {};
  const layers = {};
  let dblZoom = true;
  return {
    isStyleLoaded() { return styleLoaded; },
    on(ev, fn) { (listeners[ev] = listeners[ev] || []).push(fn); },
    off(ev, fn) {
      if (listeners[ev]) listeners[ev] = listeners[ev].filter((f) => f !== fn);
    },
    get doubleClickZoom() {
      return { enable() { dblZoom = true; }, disable() { dblZoom = false; } };
    },
    getSource(id) {
      const s = sources[id];
      return s ? { setData(d) { s.data = d; } } : undefined;
    },
    addSource(id, source) { sources[id] = { data: source.data }; },
    removeSource(id) { delete sources[id]; },
    getLayer(id) { return layers[id]; },
    addLayer(layer) { layers[layer.id] = layer; },
    removeLayer(id) { delete layers[id]; },

    fire(ev, lng, lat) {
      let prevented = false;
      const e = { lngLat: { lng, lat }, preventDefault() { prevented = true; } };
      (listeners[ev] || []).slice().forEach((f) => f(e));
      return prevented;
    },
    emit(ev) {
      (listeners[ev] || []).slice().forEach((f) => f({ type: ev }));
    },
    setStyleLoaded(v) { styleLoaded = v; },
    loadStyle() {
      styleLoaded = true;
      this.emit('styledata');
    },
    clearStyle() {
      for (const id of Object.keys(sources)) delete sources[id];
      for (const id of Object.keys(layers)) delete layers[id];
    },
    dblZoomEnabled() { return dblZoom; },
    listenerCount() { return Object.values(listeners).reduce((n, a) => n + a.length, 0); },
    sourceData(id) { return sources[id] ? sources[id].data : undefined; },
    layerCount() { return Object.keys(layers).length; },
  };
}
"#)]
extern "C" {
    #[wasm_bindgen(js_name = makeFakeMap)]
    fn make_fake_map(style_loaded: bool) -> JsValue;
}

fn call(target: &JsValue, method: &str, args: &[JsValue]) -> JsValue {
    let f: Function = Reflect::get(target, &JsValue::from_str(method))
        .unwrap()
        .dyn_into()
        .unwrap();
    let args: Array = args.iter().cloned().collect();
    f.apply(target, &args).unwrap()
}

fn fire(map: &JsValue, event: &str, lng: f64, lat: f64) -> bool {
    call(map, "fire", &[event.into(), lng.into(), lat.into()])
        .as_bool()
        .unwrap_or(false)
}

fn new_tool(map: &JsValue, map_id: &str) -> JsMeasureTool {
    JsMeasureTool::new(map.clone().unchecked_into::<MapboxMap>(), map_id, JsValue::UNDEFINED).unwrap()
}

#[wasm_bindgen_test]
fn exported_distance_helpers() {
    let d = distance_meters_js(114.0, 30.0, 114.01, 30.0);
    assert!((d - 962.97).abs() < 0.5);
    assert_eq!(format_distance_js(d), "963 m");
}

#[wasm_bindgen_test]
fn tool_draws_into_map_sources() {
    let map = make_fake_map(true);
    let mut tool = new_tool(&map, "web");
    tool.activate();

    assert_eq!(call(&map, "listenerCount", &[]).as_f64(), Some(3.0));
    assert_eq!(call(&map, "dblZoomEnabled", &[]).as_bool(), Some(false));
    assert_eq!(call(&map, "layerCount", &[]).as_f64(), Some(5.0));

    fire(&map, "click", 114.0, 30.0);
    fire(&map, "mousemove", 114.005, 30.0);
    fire(&map, "click", 114.01, 30.0);

    let current = call(&map, "sourceData", &["measure-current-web".into()]);
    let features: Array = Reflect::get(&current, &"features".into()).unwrap().into();
    assert_eq!(features.length(), 1);

    let prevented = fire(&map, "dblclick", 114.01, 30.0);
    assert!(prevented);

    let snapshot = tool.snapshot().unwrap();
    let history: Array = Reflect::get(&snapshot, &"history".into()).unwrap().into();
    assert_eq!(history.length(), 1);
    let state = Reflect::get(&snapshot, &"state".into()).unwrap();
    assert_eq!(state.as_string().as_deref(), Some("idle"));

    tool.dispose();
    assert_eq!(call(&map, "listenerCount", &[]).as_f64(), Some(0.0));
    assert_eq!(call(&map, "dblZoomEnabled", &[]).as_bool(), Some(true));
    assert_eq!(call(&map, "layerCount", &[]).as_f64(), Some(0.0));
}

#[wasm_bindgen_test]
fn activation_waits_for_style_load() {
    let map = make_fake_map(false);
    let mut tool = new_tool(&map, "web-pending");
    tool.activate();

    assert!(!tool.is_active());
    // styledata and idle, waiting for the style
    assert_eq!(call(&map, "listenerCount", &[]).as_f64(), Some(2.0));

    call(&map, "loadStyle", &[]);
    assert!(tool.is_active());
    assert_eq!(call(&map, "listenerCount", &[]).as_f64(), Some(3.0));
}

#[wasm_bindgen_test]
fn activation_rechecks_style_on_later_map_events() {
    // style.load already fired; the map is still busy loading tiles
    let map = make_fake_map(false);
    let mut tool = new_tool(&map, "web-busy");
    tool.activate();

    call(&map, "emit", &["styledata".into()]);
    assert!(!tool.is_active());

    call(&map, "setStyleLoaded", &[true.into()]);
    call(&map, "emit", &["idle".into()]);
    assert!(tool.is_active());
    assert_eq!(call(&map, "listenerCount", &[]).as_f64(), Some(3.0));
    assert_eq!(call(&map, "dblZoomEnabled", &[]).as_bool(), Some(false));

    // Further style events leave the binding alone
    call(&map, "emit", &["styledata".into()]);
    assert_eq!(call(&map, "listenerCount", &[]).as_f64(), Some(3.0));

    fire(&map, "click", 114.0, 30.0);
    let markers = call(&map, "sourceData", &["measure-markers-web-busy".into()]);
    let features: Array = Reflect::get(&markers, &"features".into()).unwrap().into();
    assert_eq!(features.length(), 1);
}

#[wasm_bindgen_test]
fn deactivating_while_waiting_for_style_releases_everything() {
    let map = make_fake_map(false);
    let mut tool = new_tool(&map, "web-cancel");
    tool.activate();
    tool.deactivate();
    assert_eq!(call(&map, "listenerCount", &[]).as_f64(), Some(0.0));

    call(&map, "loadStyle", &[]);
    call(&map, "emit", &["idle".into()]);
    assert!(!tool.is_active());
    assert_eq!(call(&map, "listenerCount", &[]).as_f64(), Some(0.0));
    assert_eq!(call(&map, "dblZoomEnabled", &[]).as_bool(), Some(true));
    assert_eq!(call(&map, "layerCount", &[]).as_f64(), Some(0.0));
}

#[wasm_bindgen_test]
fn sources_come_back_after_style_change() {
    let map = make_fake_map(true);
    let mut tool = new_tool(&map, "web-restyle");
    tool.activate();
    fire(&map, "click", 114.0, 30.0);

    // setStyle wipes every source and layer
    call(&map, "clearStyle", &[]);
    assert_eq!(call(&map, "layerCount", &[]).as_f64(), Some(0.0));

    fire(&map, "click", 114.01, 30.0);
    assert_eq!(call(&map, "layerCount", &[]).as_f64(), Some(5.0));
    let current = call(&map, "sourceData", &["measure-current-web-restyle".into()]);
    let features: Array = Reflect::get(&current, &"features".into()).unwrap().into();
    assert_eq!(features.length(), 1);
}

#[wasm_bindgen_test]
fn log_level_accepts_known_names_only() {
    assert!(set_log_level("debug").is_ok());
    assert_eq!(log::max_level(), log::LevelFilter::Debug);
    assert!(set_log_level("loud").is_err());
    assert!(set_log_level("info").is_ok());
}

#[wasm_bindgen_test]
fn frame_is_keyed_by_source_id() {
    let map = make_fake_map(true);
    let mut tool = new_tool(&map, "web-frame");
    tool.activate();
    fire(&map, "click", 1.0, 1.0);

    let frame = tool.frame().unwrap();
    let markers = Reflect::get(&frame, &"measure-markers-web-frame".into()).unwrap();
    let features: Array = Reflect::get(&markers, &"features".into()).unwrap().into();
    assert_eq!(features.length(), 1);
}

#[wasm_bindgen_test]
fn config_object_is_applied() {
    let map = make_fake_map(true);
    let config = js_sys::JSON::parse(r#"{"startLabel":"起点"}"#).unwrap();
    let mut tool =
        JsMeasureTool::new(map.clone().unchecked_into::<MapboxMap>(), "web-config", config).unwrap();
    tool.activate();
    fire(&map, "click", 1.0, 1.0);

    let snapshot = tool.snapshot().unwrap();
    let labels: Array = Reflect::get(&snapshot, &"activeLabels".into()).unwrap().into();
    assert_eq!(labels.get(0).as_string().as_deref(), Some("起点"));
}
