use wasm_bindgen::prelude::*;

// Haversine distance and label formatting
pub mod distance;
// Tool configuration
pub mod config;
pub mod error;
// Read models shared by renderers and JS
pub mod models;
// The measurement state store
pub mod session;
// Pointer event adapter and tool lifecycle
pub mod adapter;
// Geometry derivation for the map
pub mod projector;
pub mod geojson_features;
pub mod layer_ids;
// Registry of maps with an active tool
mod module_state;
// Mapbox bindings
pub mod bindings;

pub use adapter::{MapHandle, MeasureTool, PointerCallback, PointerEvent, PointerKind};
pub use bindings::{JsMeasureTool, MapboxMap};
pub use config::{LineStyle, MarkerStyle, MeasureConfig};
pub use distance::{distance_meters, format_distance, polyline_length, GeoPoint};
pub use error::MeasureError;
pub use models::{DrawState, SegmentSnapshot, SessionSnapshot};
pub use projector::{layer_specs, project, RenderFrame, RenderSink};
pub use session::{MeasurementSession, Segment};

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        // Keep a logger the host page may already have installed
        let _ = console_log::init_with_level(log::Level::Info);
        log::info!("measurement module initialized");
    });
}

/// Raise or lower the console log level ("error", "warn", "info", "debug", "trace").
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter: log::LevelFilter = level
        .parse()
        .map_err(|_| JsValue::from_str(&format!("unknown log level: {}", level)))?;
    log::set_max_level(filter);
    Ok(())
}

#[wasm_bindgen(js_name = distanceMeters)]
pub fn distance_meters_js(lng1: f64, lat1: f64, lng2: f64, lat2: f64) -> f64 {
    distance_meters(GeoPoint::new(lng1, lat1), GeoPoint::new(lng2, lat2))
}

#[wasm_bindgen(js_name = formatDistance)]
pub fn format_distance_js(meters: f64) -> String {
    format_distance(meters)
}
