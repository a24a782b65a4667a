//! WASM bindings for browser-based chapter extraction.
//!
//! Results cross the boundary as JSON so the JavaScript side gets plain
//! objects with camelCase keys.

use wasm_bindgen::prelude::*;

use crate::{Error, ParseOptions, parse_epub_with};

/// Initialize panic hook for better error messages in the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Parse EPUB bytes and return the parsed book as a JSON string.
///
/// On failure the rejection value is the short user-facing message.
#[wasm_bindgen]
pub fn parse_epub(data: &[u8]) -> Result<String, JsValue> {
    let book = parse_epub_with(data, &ParseOptions::default()).map_err(to_js_error)?;
    serde_json::to_string(&book).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Like [`parse_epub`] with a custom timeout in milliseconds.
#[wasm_bindgen]
pub fn parse_epub_with_timeout(data: &[u8], timeout_ms: u32) -> Result<String, JsValue> {
    let options = ParseOptions::default()
        .with_timeout(std::time::Duration::from_millis(u64::from(timeout_ms)));
    let book = parse_epub_with(data, &options).map_err(to_js_error)?;
    serde_json::to_string(&book).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn to_js_error(error: Error) -> JsValue {
    JsValue::from_str(error.user_message())
}
