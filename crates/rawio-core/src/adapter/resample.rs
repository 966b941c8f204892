//! Resampling canonical images to an exact target size.

use super::{AdapterError, CanonicalImage, FilterType, Size};

/// Resample an image to exactly `target`, ignoring aspect ratio.
///
/// If the image already has the target dimensions it is returned as-is.
/// Each channel (including pad) is filtered independently.
///
/// # Errors
///
/// Returns `AdapterError::InvalidSize` if either target dimension is zero.
pub fn resample(
    image: CanonicalImage,
    target: Size,
    filter: FilterType,
) -> Result<CanonicalImage, AdapterError> {
    target.validate()?;

    if image.size() == target {
        return Ok(image);
    }

    let rgba = image
        .into_rgba_image()
        .ok_or_else(|| AdapterError::Decode("Pixel buffer does not match dimensions".to_string()))?;

    let resized = image::imageops::resize(&rgba, target.width, target.height, filter.to_image_filter());

    Ok(CanonicalImage::from_rgba_image(resized))
}
