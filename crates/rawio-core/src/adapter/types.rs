//! Core types for the pixel buffer adapter.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for decode and conversion operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The decoder could not open the stream (not a recognized raw file).
    #[error("Failed to open stream: {0}")]
    StreamOpen(String),

    /// Compressed bytes or decoder output were malformed.
    #[error("Decode failed: {0}")]
    Decode(String),

    /// Raw samples with a channel count other than 1 or 3.
    #[error("Unsupported channel layout: {0} channels")]
    UnsupportedChannelLayout(u8),

    /// Raw samples with a bit depth other than 8 or 16.
    #[error("Unsupported sample depth: {0} bits")]
    UnsupportedSampleDepth(u8),

    /// A requested or target size with a non-positive dimension.
    #[error("Invalid size: {width}x{height}")]
    InvalidSize { width: i64, height: i64 },

    /// I/O error while reading the stream.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AdapterError {
    fn from(err: std::io::Error) -> Self {
        AdapterError::Io(err.to_string())
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Build a size from signed host values, rejecting zero or negative dimensions.
    pub fn from_signed(width: i64, height: i64) -> Result<Self, AdapterError> {
        if width <= 0 || height <= 0 || width > u32::MAX as i64 || height > u32::MAX as i64 {
            return Err(AdapterError::InvalidSize { width, height });
        }
        Ok(Self::new(width as u32, height as u32))
    }

    /// Both dimensions are non-zero.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Returns `InvalidSize` unless both dimensions are non-zero.
    pub fn validate(self) -> Result<Self, AdapterError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(AdapterError::InvalidSize {
                width: self.width as i64,
                height: self.height as i64,
            })
        }
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Filter type for resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, not smooth).
    Nearest,
    /// Bilinear interpolation.
    Bilinear,
    /// Catmull-Rom bicubic interpolation.
    #[default]
    CatmullRom,
    /// Lanczos3 interpolation (slowest, sharpest).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::CatmullRom => image::imageops::FilterType::CatmullRom,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Which byte of a multi-byte sample survives truncation to 8 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SampleByteOrder {
    /// Samples are big-endian; keep the first byte.
    #[default]
    MostSignificantFirst,
    /// Samples are little-endian; keep the last byte.
    LeastSignificantFirst,
}

/// Encoding of a compressed source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Jpeg,
    Png,
}

impl Encoding {
    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            Encoding::Jpeg => image::ImageFormat::Jpeg,
            Encoding::Png => image::ImageFormat::Png,
        }
    }
}

/// Output pixel format reported to hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PixelFormat {
    /// 8 bits per channel, byte order R, G, B, pad.
    Rgbx8,
}

/// Interleaved samples as produced by the raw decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSamples {
    pub width: u32,
    pub height: u32,
    /// Samples per pixel (1 = grey, 3 = color).
    pub channels: u8,
    /// Bits per sample (8 or 16).
    pub bits: u8,
    pub data: Vec<u8>,
}

impl RawSamples {
    pub fn new(width: u32, height: u32, channels: u8, bits: u8, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            channels,
            bits,
            data,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Bytes per sample, rounded up.
    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        (self.bits as usize).div_ceil(8)
    }

    /// Bytes covered by one pixel's sample group.
    #[inline]
    pub fn pixel_stride(&self) -> usize {
        self.channels as usize * self.bytes_per_sample()
    }

    /// The retained byte of `channel` within pixel `pixel`.
    ///
    /// Callers must have checked the buffer length; indices out of range panic.
    #[inline]
    pub fn sample(&self, pixel: usize, channel: usize, order: SampleByteOrder) -> u8 {
        let depth = self.bytes_per_sample();
        let start = pixel * self.pixel_stride() + channel * depth;
        match order {
            SampleByteOrder::MostSignificantFirst => self.data[start],
            SampleByteOrder::LeastSignificantFirst => self.data[start + depth - 1],
        }
    }
}

/// A decoder-produced image, either still compressed or as raw samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceImage {
    Compressed { encoding: Encoding, bytes: Vec<u8> },
    Raw(RawSamples),
}

/// Fixed-format output image: 4 bytes per pixel in R, G, B, pad order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalImage {
    pub width: u32,
    pub height: u32,
    /// Row-major pixel data, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl CanonicalImage {
    pub const BYTES_PER_PIXEL: usize = 4;
    /// Value written to the pad byte.
    pub const PAD: u8 = 0xFF;
    pub const FORMAT: PixelFormat = PixelFormat::Rgbx8;

    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * Self::BYTES_PER_PIXEL,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    pub fn into_rgba_image(self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// The four bytes of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}
