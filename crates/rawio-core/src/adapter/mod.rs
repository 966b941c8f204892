//! Pixel buffer adapter: turns decoder output into canonical RGBX images.
//!
//! This module provides:
//! - Choosing between the full raw frame and the embedded thumbnail
//! - Normalizing raw samples or compressed previews into R, G, B, pad bytes
//! - Resampling to a requested output size
//!
//! # Pipeline
//!
//! [`produce`] runs one request end to end:
//!
//! 1. [`select_source`] picks the thumbnail when it still covers the request
//! 2. the decode session delivers a [`SourceImage`]
//! 3. [`normalize`] converts it to a [`CanonicalImage`]
//! 4. [`resample`] runs only when the normalized size differs from the target
//!
//! Without a requested size the target is the normalized image's own size,
//! so no resampling happens.

pub(crate) mod compressed;
mod normalize;
mod resample;
mod select;
mod types;

pub use compressed::{compressed_dimensions, decode_compressed};
pub use normalize::{normalize, normalize_raw};
pub use resample::resample;
pub use select::{select_source, SourceSelector, ThumbnailTieBreak};
pub use types::{
    AdapterError, CanonicalImage, Encoding, FilterType, PixelFormat, RawSamples, SampleByteOrder,
    Size, SourceImage,
};

use log::debug;

use crate::decoder::DecodeSession;
use crate::options::HandlerOptions;

/// Decode one image through `session` and convert it to the canonical format.
///
/// # Errors
///
/// - `AdapterError::InvalidSize` - the requested size has a zero dimension
/// - any error from the session's decode calls
/// - any error from [`normalize`]
pub fn produce<S: DecodeSession + ?Sized>(
    session: &mut S,
    options: &HandlerOptions,
) -> Result<CanonicalImage, AdapterError> {
    let requested = options.requested_size().map(Size::validate).transpose()?;

    let selector = select_source(
        session.native_size(),
        session.thumbnail_size(),
        requested,
        options.thumbnail_tie_break,
    );

    let source = match selector {
        SourceSelector::Thumbnail => {
            debug!("Using embedded thumbnail");
            session.decode_thumbnail()?
        }
        SourceSelector::FullResolution => {
            debug!("Decoding raw data");
            session.decode_image()?
        }
    };

    let normalized = normalize(source, options.sample_byte_order)?;
    let target = requested.unwrap_or_else(|| normalized.size());

    if normalized.size() == target {
        return Ok(normalized);
    }

    debug!("Resampling {} to {}", normalized.size(), target);
    resample(normalized, target, options.filter)
}
