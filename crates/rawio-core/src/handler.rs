//! Host-facing raw image handler.
//!
//! [`RawIoHandler`] is what an image-loading host talks to: it owns the
//! stream, probes it on demand, and runs one full decode per [`read`] call.
//! Each call opens a fresh decode session that is dropped before returning.
//!
//! [`read`]: RawIoHandler::read

use std::io::{Read, Seek};

use log::debug;

use crate::adapter::{produce, AdapterError, CanonicalImage, Size};
use crate::decoder::{DecodeSession, RawDecoder, RawloaderDecoder};
use crate::options::HandlerOptions;

/// Name the handler registers under.
pub const HANDLER_NAME: &str = "rawloader";

/// Decodes camera raw files from a seekable stream into canonical images.
///
/// # Example
///
/// ```ignore
/// use rawio_core::{RawIoHandler, Size};
///
/// let file = std::fs::File::open("photo.ARW")?;
/// let mut handler = RawIoHandler::new(file);
/// if handler.can_read() {
///     handler.options_mut().set_requested_size(Some(Size::new(320, 240)))?;
///     let image = handler.read()?;
/// }
/// ```
pub struct RawIoHandler<R, D = RawloaderDecoder> {
    stream: R,
    decoder: D,
    options: HandlerOptions,
}

impl<R: Read + Seek> RawIoHandler<R> {
    pub fn new(stream: R) -> Self {
        Self::with_decoder(stream, RawloaderDecoder::new())
    }
}

impl<R: Read + Seek, D: RawDecoder> RawIoHandler<R, D> {
    pub fn with_decoder(stream: R, decoder: D) -> Self {
        Self {
            stream,
            decoder,
            options: HandlerOptions::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        HANDLER_NAME
    }

    /// True if the decoder can open the stream.
    pub fn can_read(&mut self) -> bool {
        self.open().is_ok()
    }

    /// Full-resolution size, probing the stream if it is not known yet.
    pub fn native_size(&mut self) -> Result<Size, AdapterError> {
        if let Some(size) = self.options.native_size() {
            return Ok(size);
        }
        Ok(self.open()?.native_size())
    }

    /// Decode the stream into a canonical image honoring the current options.
    pub fn read(&mut self) -> Result<CanonicalImage, AdapterError> {
        let mut session = self.open()?;
        produce(&mut session, &self.options)
    }

    pub fn options(&self) -> &HandlerOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut HandlerOptions {
        &mut self.options
    }

    /// Give back the underlying stream.
    pub fn into_inner(self) -> R {
        self.stream
    }

    fn open(&mut self) -> Result<D::Session, AdapterError> {
        let session = self.decoder.open(&mut self.stream).inspect_err(|e| {
            debug!("Stream rejected: {}", e);
        })?;
        self.options.set_native_size(session.native_size());
        Ok(session)
    }
}
