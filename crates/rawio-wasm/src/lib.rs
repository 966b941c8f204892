//! rawio WASM - WebAssembly bindings for the rawio handler
//!
//! This crate exposes `rawio-core` to JavaScript image loaders.
//!
//! # Module Structure
//!
//! - `handler` - `JsRawIoHandler`: can_read / read / scaled size over file bytes
//! - `types` - WASM-compatible wrapper types for image data
//! - `logging` - forwards `log` records to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsRawIoHandler } from '@rawio/wasm';
//!
//! await init();
//!
//! const handler = new JsRawIoHandler(new Uint8Array(await file.arrayBuffer()));
//! const image = handler.read();
//! console.log(`Decoded ${image.width}x${image.height}`);
//! ```

use wasm_bindgen::prelude::*;

mod handler;
mod logging;
mod types;

pub use handler::{is_raw_file, JsRawIoHandler};
pub use types::JsCanonicalImage;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logging::init_logging(log::LevelFilter::Info);
}

/// Enable debug output in the browser console.
#[wasm_bindgen]
pub fn set_verbose(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    logging::init_logging(level);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
