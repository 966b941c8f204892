//! Handler options.
//!
//! The set of options is closed: the native size is reported by the handler,
//! the requested size is set by the host, and the remaining fields are
//! decode policies with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::adapter::{
    AdapterError, CanonicalImage, FilterType, PixelFormat, SampleByteOrder, Size,
    ThumbnailTieBreak,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerOptions {
    /// Full-resolution size of the current stream, once probed.
    #[serde(skip_deserializing)]
    native_size: Option<Size>,
    /// Output size requested by the host; `None` means native size.
    #[serde(default)]
    requested_size: Option<Size>,
    /// Resampling filter used when the output size differs from the source.
    #[serde(default)]
    pub filter: FilterType,
    #[serde(default)]
    pub thumbnail_tie_break: ThumbnailTieBreak,
    /// Byte kept when truncating 16-bit samples.
    #[serde(default)]
    pub sample_byte_order: SampleByteOrder,
}

impl HandlerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn native_size(&self) -> Option<Size> {
        self.native_size
    }

    pub(crate) fn set_native_size(&mut self, size: Size) {
        self.native_size = Some(size);
    }

    pub fn requested_size(&self) -> Option<Size> {
        self.requested_size
    }

    /// Set or clear the requested output size.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::InvalidSize` if either dimension is zero; the
    /// previous value is kept.
    pub fn set_requested_size(&mut self, size: Option<Size>) -> Result<(), AdapterError> {
        self.requested_size = size.map(Size::validate).transpose()?;
        Ok(())
    }

    /// Go back to decoding at native size.
    pub fn clear_requested_size(&mut self) {
        self.requested_size = None;
    }

    /// Output pixel format; always the canonical RGBX layout.
    pub fn image_format(&self) -> PixelFormat {
        CanonicalImage::FORMAT
    }
}
