//! Converting decoder output into the canonical R, G, B, pad layout.

use super::compressed::decode_compressed;
use super::{AdapterError, CanonicalImage, RawSamples, SampleByteOrder, SourceImage};

/// Convert any decoder output into a canonical image of the same dimensions.
///
/// # Errors
///
/// - `AdapterError::Decode` - compressed bytes are malformed, or the raw
///   sample buffer is shorter than its declared geometry
/// - `AdapterError::UnsupportedChannelLayout` - raw channel count is not 1 or 3
/// - `AdapterError::UnsupportedSampleDepth` - raw bit depth is not 8 or 16
pub fn normalize(
    source: SourceImage,
    order: SampleByteOrder,
) -> Result<CanonicalImage, AdapterError> {
    match source {
        SourceImage::Compressed { encoding, bytes } => decode_compressed(encoding, &bytes),
        SourceImage::Raw(raw) => normalize_raw(&raw, order),
    }
}

/// Reorder interleaved raw samples into canonical pixels.
///
/// Three channels are reversed (stored order is B, G, R); one channel is
/// replicated into R, G and B.
pub fn normalize_raw(
    raw: &RawSamples,
    order: SampleByteOrder,
) -> Result<CanonicalImage, AdapterError> {
    validate_layout(raw)?;

    let count = raw.size().pixel_count();
    let mut pixels = Vec::with_capacity(count * CanonicalImage::BYTES_PER_PIXEL);

    match raw.channels {
        3 => {
            for i in 0..count {
                pixels.extend_from_slice(&[
                    raw.sample(i, 2, order),
                    raw.sample(i, 1, order),
                    raw.sample(i, 0, order),
                    CanonicalImage::PAD,
                ]);
            }
        }
        _ => {
            for i in 0..count {
                let v = raw.sample(i, 0, order);
                pixels.extend_from_slice(&[v, v, v, CanonicalImage::PAD]);
            }
        }
    }

    Ok(CanonicalImage::new(raw.width, raw.height, pixels))
}

fn validate_layout(raw: &RawSamples) -> Result<(), AdapterError> {
    if raw.channels != 1 && raw.channels != 3 {
        return Err(AdapterError::UnsupportedChannelLayout(raw.channels));
    }
    if raw.bits != 8 && raw.bits != 16 {
        return Err(AdapterError::UnsupportedSampleDepth(raw.bits));
    }

    let needed = raw
        .size()
        .pixel_count()
        .checked_mul(raw.pixel_stride())
        .ok_or_else(|| AdapterError::Decode("Sample buffer size overflows".to_string()))?;
    if raw.data.len() < needed {
        return Err(AdapterError::Decode(format!(
            "Sample buffer holds {} bytes, {}x{} needs {}",
            raw.data.len(),
            raw.width,
            raw.height,
            needed
        )));
    }
    Ok(())
}


// ============================================================================
// Property-Based Tests
// ============================================================================
