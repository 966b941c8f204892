//! Raw image handler bindings.
//!
//! Exposes `rawio_core::RawIoHandler` to a JavaScript image loader. The
//! loader hands over the file bytes once, may ask for the native size, set a
//! scaled size, and then calls `read()`.
//!
//! # Example
//!
//! ```typescript
//! import { JsRawIoHandler } from '@rawio/wasm';
//!
//! const handler = new JsRawIoHandler(new Uint8Array(await file.arrayBuffer()));
//! if (handler.can_read()) {
//!   handler.set_scaled_size(320, 240);
//!   const image = handler.read();
//!   ctx.putImageData(new ImageData(new Uint8ClampedArray(image.pixels()), image.width), 0, 0);
//! }
//! ```

use std::io::Cursor;

use rawio_core::{AdapterError, RawIoHandler, Size};
use wasm_bindgen::prelude::*;

use crate::types::{filter_from_u8, JsCanonicalImage};

fn to_js_error(err: AdapterError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// A raw decoder bound to one in-memory file.
#[wasm_bindgen]
pub struct JsRawIoHandler {
    inner: RawIoHandler<Cursor<Vec<u8>>>,
}

#[wasm_bindgen]
impl JsRawIoHandler {
    /// Wrap the raw file bytes. Nothing is decoded until asked.
    #[wasm_bindgen(constructor)]
    pub fn new(bytes: Vec<u8>) -> JsRawIoHandler {
        JsRawIoHandler {
            inner: RawIoHandler::new(Cursor::new(bytes)),
        }
    }

    /// Handler name
    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.inner.name().to_string()
    }

    /// True if the bytes are a raw file the decoder understands.
    pub fn can_read(&mut self) -> bool {
        self.inner.can_read()
    }

    /// Full-resolution width in pixels.
    pub fn native_width(&mut self) -> Result<u32, JsValue> {
        self.native_size().map(|s| s.width).map_err(to_js_error)
    }

    /// Full-resolution height in pixels.
    pub fn native_height(&mut self) -> Result<u32, JsValue> {
        self.native_size().map(|s| s.height).map_err(to_js_error)
    }

    /// Request a scaled output size. Non-positive dimensions are rejected.
    pub fn set_scaled_size(&mut self, width: i32, height: i32) -> Result<(), JsValue> {
        self.apply_scaled_size(width, height).map_err(to_js_error)
    }

    /// Go back to decoding at native size.
    pub fn clear_scaled_size(&mut self) {
        self.inner.options_mut().clear_requested_size();
    }

    /// Resize algorithm: 0=Nearest, 1=Bilinear, 2=CatmullRom (default), 3=Lanczos3
    pub fn set_filter(&mut self, filter: u8) {
        self.inner.options_mut().filter = filter_from_u8(filter);
    }

    /// Decode the file with the current options.
    pub fn read(&mut self) -> Result<JsCanonicalImage, JsValue> {
        self.inner
            .read()
            .map(JsCanonicalImage::from_canonical)
            .map_err(to_js_error)
    }

    /// Current options as a plain JS object.
    pub fn options(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.options())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl JsRawIoHandler {
    fn native_size(&mut self) -> Result<Size, AdapterError> {
        self.inner.native_size()
    }

    fn apply_scaled_size(&mut self, width: i32, height: i32) -> Result<(), AdapterError> {
        let size = Size::from_signed(width as i64, height as i64)?;
        self.inner.options_mut().set_requested_size(Some(size))
    }
}

/// Check if bytes start with the header of a known raw container.
#[wasm_bindgen]
pub fn is_raw_file(bytes: &[u8]) -> bool {
    rawio_core::is_raw_file(bytes)
}
