//! Web worker entry point for photosheet rendering.
//!
//! This crate compiles to a standalone WASM module that runs inside a
//! `Worker`. It receives image bytes and a JSON `RenderRequest` via
//! `postMessage`, calls `photosheet_pipeline::process`, and posts the
//! rendered pixels back.
//!
//! Pixels are sent as a raw RGBA `Uint8Array` so the main thread can
//! wrap them in an `ImageData` without JSON-encoding megabytes of data.
//! Passport sheet regeneration runs here so slider drags never block
//! the main thread; the echoed `generation` lets the caller drop
//! superseded results.

use photosheet_pipeline::{PipelineError, RenderRequest, RgbaImage};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Parse the request JSON sent by the main thread.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the JSON is malformed.
pub fn parse_request(request_json: &str) -> Result<RenderRequest, PipelineError> {
    serde_json::from_str(request_json)
        .map_err(|e| PipelineError::InvalidConfig(format!("failed to parse request: {e}")))
}

/// Decode and render one request.
///
/// # Errors
///
/// Request parse errors plus everything `photosheet_pipeline::process`
/// can return.
pub fn run_request(image_bytes: &[u8], request_json: &str) -> Result<RgbaImage, PipelineError> {
    let request = parse_request(request_json)?;
    photosheet_pipeline::process(image_bytes, &request)
}

/// JSON for an error reply. Falls back to a plain string if the error
/// itself cannot be serialized.
#[must_use]
pub fn error_json(error: &PipelineError) -> String {
    serde_json::to_string(error)
        .unwrap_or_else(|ser_err| format!("\"serialization error: {ser_err}\""))
}

/// Message protocol: the main thread sends a JS object with:
/// - `imageBytes`: `Uint8Array` containing the raw image file bytes
/// - `requestJson`: `String` containing a JSON-serialized `RenderRequest`
/// - `generation`: `f64` generation counter (passed through to response)
///
/// On success the worker responds with a JS object containing:
/// - `generation`: `f64` matching the request generation
/// - `ok`: `true`
/// - `width`, `height`: `f64` -- rendered image dimensions
/// - `pixels`: `Uint8Array` -- raw RGBA pixel data
///
/// On error the worker responds with:
/// - `generation`: `f64`
/// - `ok`: `false`
/// - `errorJson`: `String` -- JSON-serialized `PipelineError`
///
/// # Worker entry point
///
/// Called automatically when the WASM module is instantiated in the
/// worker context.
#[wasm_bindgen(start)]
pub fn worker_main() {
    console_error_panic_hook::set_once();

    let global: web_sys::DedicatedWorkerGlobalScope = js_sys::global()
        .dyn_into()
        .expect_throw("not running in a DedicatedWorkerGlobalScope");

    let onmessage =
        Closure::<dyn FnMut(web_sys::MessageEvent)>::new(move |event: web_sys::MessageEvent| {
            handle_message(event);
        });
    global.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget(); // leak -- lives for the worker lifetime
}

/// Handle an incoming message from the main thread.
#[allow(clippy::needless_pass_by_value)]
fn handle_message(event: web_sys::MessageEvent) {
    let data = event.data();

    let image_bytes_val = js_sys::Reflect::get(&data, &JsValue::from_str("imageBytes"))
        .expect_throw("missing imageBytes field");
    let request_json_val = js_sys::Reflect::get(&data, &JsValue::from_str("requestJson"))
        .expect_throw("missing requestJson field");
    let generation_val = js_sys::Reflect::get(&data, &JsValue::from_str("generation"))
        .expect_throw("missing generation field");

    let image_bytes_js: js_sys::Uint8Array = image_bytes_val
        .dyn_into()
        .expect_throw("imageBytes is not a Uint8Array");
    let image_bytes = image_bytes_js.to_vec();

    let request_json = request_json_val
        .as_string()
        .expect_throw("requestJson is not a string");
    let generation = generation_val
        .as_f64()
        .expect_throw("generation is not a number");

    // Synchronous -- blocks this worker thread only.
    match run_request(&image_bytes, &request_json) {
        Ok(image) => post_success_response(generation, &image),
        Err(e) => post_error_json(generation, &error_json(&e)),
    }
}

/// Post rendered pixels back to the main thread.
fn post_success_response(generation: f64, image: &RgbaImage) {
    let response = js_sys::Object::new();
    let set = |key: &str, val: &JsValue| {
        js_sys::Reflect::set(&response, &JsValue::from_str(key), val)
            .expect_throw("failed to set response field");
    };

    set("generation", &JsValue::from_f64(generation));
    set("ok", &JsValue::from_bool(true));
    set("width", &JsValue::from_f64(f64::from(image.width())));
    set("height", &JsValue::from_f64(f64::from(image.height())));
    set(
        "pixels",
        &js_sys::Uint8Array::from(image.as_raw().as_slice()),
    );

    let global: web_sys::DedicatedWorkerGlobalScope = js_sys::global()
        .dyn_into()
        .expect_throw("not in worker scope");
    global
        .post_message(&response)
        .expect_throw("failed to postMessage");
}

/// Post a pre-serialized error JSON back to the main thread.
fn post_error_json(generation: f64, error_json: &str) {
    let response = js_sys::Object::new();
    let _ = js_sys::Reflect::set(
        &response,
        &JsValue::from_str("generation"),
        &JsValue::from_f64(generation),
    );
    let _ = js_sys::Reflect::set(
        &response,
        &JsValue::from_str("ok"),
        &JsValue::from_bool(false),
    );
    let _ = js_sys::Reflect::set(
        &response,
        &JsValue::from_str("errorJson"),
        &JsValue::from_str(error_json),
    );

    if let Ok(global) = js_sys::global().dyn_into::<web_sys::DedicatedWorkerGlobalScope>() {
        let _ = global.post_message(&response);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, image::Rgba([200, 180, 160, 255]));
        photosheet_pipeline::decode::encode_png(&img).unwrap()
    }

    #[test]
    fn sheet_request_renders_full_canvas() {
        let out = run_request(&png(30, 40), r#"{"kind":"sheet","options":{"photoCount":3}}"#)
            .unwrap();
        assert_eq!(out.dimensions(), (1200, 1800));
    }

    #[test]
    fn preview_request_keeps_size() {
        let out = run_request(
            &png(12, 9),
            r#"{"kind":"preview","filters":{"brightness":120,"vignette":30}}"#,
        )
        .unwrap();
        assert_eq!(out.dimensions(), (12, 9));
    }

    #[test]
    fn malformed_request_is_config_error() {
        let err = run_request(&png(2, 2), "{not json").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }

    #[test]
    fn layout_errors_cross_the_boundary() {
        let err = run_request(&png(2, 2), r#"{"kind":"sheet","options":{"photoCount":5}}"#)
            .unwrap_err();
        let json = error_json(&err);
        let back: PipelineError = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, PipelineError::InvalidConfig(ref m) if m.contains('5')));
    }
}
