//! rawio core - camera raw decoding adapter
//!
//! This crate lets an image-loading host decode camera raw files through the
//! `rawloader` crate and receive images in one canonical layout: 4 bytes per
//! pixel in R, G, B, pad order, optionally resampled to a requested size.
//!
//! # Module Structure
//!
//! - `adapter` - source selection, pixel normalization, resampling
//! - `decoder` - the external decoder seam and its rawloader implementation
//! - `handler` - the host-facing `can_read` / `read` surface
//! - `options` - the typed option set a host can query and change

pub mod adapter;
pub mod decoder;
pub mod handler;
pub mod options;

pub use adapter::{
    normalize, produce, resample, select_source, AdapterError, CanonicalImage, Encoding,
    FilterType, PixelFormat, RawSamples, SampleByteOrder, Size, SourceImage, SourceSelector,
    ThumbnailTieBreak,
};
pub use decoder::{is_raw_file, DecodeSession, RawDecoder, RawloaderDecoder};
pub use handler::{RawIoHandler, HANDLER_NAME};
pub use options::HandlerOptions;
