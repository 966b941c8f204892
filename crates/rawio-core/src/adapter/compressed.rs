//! Decoding compressed sources (embedded JPEG previews) into canonical images.

use std::io::Cursor;

use image::ImageReader;

use super::{AdapterError, CanonicalImage, Encoding, Size};

/// Decode compressed bytes of the declared encoding into a canonical image.
///
/// The decoded dimensions are kept as-is. Any source alpha is replaced by the
/// pad byte.
///
/// # Errors
///
/// Returns `AdapterError::Decode` if the bytes are not valid for `encoding`.
pub fn decode_compressed(encoding: Encoding, bytes: &[u8]) -> Result<CanonicalImage, AdapterError> {
    let img = image::load_from_memory_with_format(bytes, encoding.to_image_format())
        .map_err(|e| AdapterError::Decode(e.to_string()))?;

    let mut rgba = img.into_rgba8();
    for px in rgba.pixels_mut() {
        px.0[3] = CanonicalImage::PAD;
    }
    Ok(CanonicalImage::from_rgba_image(rgba))
}

/// Read the dimensions of a compressed image from its header only.
pub fn compressed_dimensions(encoding: Encoding, bytes: &[u8]) -> Result<Size, AdapterError> {
    let reader = ImageReader::with_format(Cursor::new(bytes), encoding.to_image_format());
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| AdapterError::Decode(e.to_string()))?;
    Ok(Size::new(width, height))
}
