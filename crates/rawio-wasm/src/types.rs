//! WASM-compatible wrapper types for image data.

use rawio_core::{CanonicalImage, FilterType};
use wasm_bindgen::prelude::*;

/// A canonical image wrapper for JavaScript.
///
/// Pixels are 4 bytes each in R, G, B, pad order with the pad byte set to
/// 255, so `pixels()` can be copied straight into an `ImageData`.
///
/// # Memory Management
///
/// The pixel data lives in WASM memory. `pixels()` copies it into a
/// JavaScript `Uint8Array`. `free()` releases the WASM side early; otherwise
/// the wasm-bindgen finalizer does it.
#[wasm_bindgen]
pub struct JsCanonicalImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsCanonicalImage {
    /// Get the image width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the image height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns RGBX pixel data as Uint8Array (copied).
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Explicitly free WASM memory.
    pub fn free(self) {}
}

impl JsCanonicalImage {
    pub(crate) fn from_canonical(img: CanonicalImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }
}

/// Convert a u8 filter value to the core FilterType.
///
/// Values:
/// - 0 = Nearest
/// - 1 = Bilinear
/// - 2 = CatmullRom (default)
/// - 3 = Lanczos3
///
/// Any other value maps to the default.
pub(crate) fn filter_from_u8(value: u8) -> FilterType {
    match value {
        0 => FilterType::Nearest,
        1 => FilterType::Bilinear,
        3 => FilterType::Lanczos3,
        _ => FilterType::CatmullRom,
    }
}
