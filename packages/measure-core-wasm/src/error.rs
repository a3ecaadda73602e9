use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum MeasureError {
    #[error("invalid measurement config: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error("invalid JS value: {0}")]
    InvalidJsValue(String),

    #[error("map source {0} is missing")]
    MissingSource(String),

    #[error("map call failed: {0}")]
    Js(String),
}

impl From<JsValue> for MeasureError {
    fn from(value: JsValue) -> Self {
        MeasureError::Js(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

impl From<serde_wasm_bindgen::Error> for MeasureError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        MeasureError::InvalidJsValue(err.to_string())
    }
}

impl From<MeasureError> for JsValue {
    fn from(err: MeasureError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
