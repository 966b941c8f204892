//! External raw decoder seam.
//!
//! A [`RawDecoder`] opens a stream and hands back a [`DecodeSession`] that
//! owns every buffer needed for one request. Dropping the session releases
//! the decoder state, so cleanup happens on success and error paths alike.
//!
//! The production implementation is [`RawloaderDecoder`], backed by the
//! `rawloader` crate plus the embedded preview extractor in [`preview`].
//!
//! # Sample layout
//!
//! `decode_image` returns `SourceImage::Raw` with interleaved samples. A
//! three-channel pixel is stored B, G, R, which the adapter reverses into
//! R, G, B; a one-channel pixel is grey. Sessions backed by decoders that
//! store R, G, B must swap the outer channels before handing samples out.

mod backend;
mod develop;
pub mod preview;

use std::io::{Read, Seek};

pub use backend::{RawloaderDecoder, RawloaderSession};
pub use preview::{find_embedded_jpeg, is_raw_file};

use crate::adapter::{AdapterError, Size, SourceImage};

/// A byte source the decoder can read and rewind.
pub trait ImageStream: Read + Seek {}

impl<T: Read + Seek + ?Sized> ImageStream for T {}

/// Opens streams for decoding.
pub trait RawDecoder {
    type Session: DecodeSession;

    /// Open `stream` for one decode request.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::StreamOpen` if the stream is not a file this
    /// decoder understands.
    fn open(&self, stream: &mut dyn ImageStream) -> Result<Self::Session, AdapterError>;
}

/// One opened raw file.
pub trait DecodeSession {
    /// Full-resolution image size.
    fn native_size(&self) -> Size;

    /// Size of the embedded thumbnail, if the file carries one.
    fn thumbnail_size(&self) -> Option<Size>;

    /// Decode the full-resolution image, three-channel samples in B, G, R order.
    fn decode_image(&mut self) -> Result<SourceImage, AdapterError>;

    /// Hand out the embedded thumbnail.
    fn decode_thumbnail(&mut self) -> Result<SourceImage, AdapterError>;
}
