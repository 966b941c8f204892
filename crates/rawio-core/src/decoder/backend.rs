//! `rawloader`-backed decoder.
//!
//! Opening a stream only parses metadata (`rawloader::decode_dummy`), which
//! is enough for the native size and the embedded preview. The sensor data
//! is unpacked and developed when the full-resolution image is requested.

use std::io::{Cursor, Read, Seek, SeekFrom};

use log::{debug, warn};
use rawloader::RawImage;

use super::develop::{develop, visible_size};
use super::preview::find_embedded_jpeg;
use super::{DecodeSession, ImageStream, RawDecoder};
use crate::adapter::{compressed_dimensions, AdapterError, Encoding, Size, SourceImage};

/// Decoder backed by the `rawloader` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawloaderDecoder;

impl RawloaderDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl RawDecoder for RawloaderDecoder {
    type Session = RawloaderSession;

    fn open(&self, stream: &mut dyn ImageStream) -> Result<RawloaderSession, AdapterError> {
        stream.seek(SeekFrom::Start(0))?;
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;

        let meta = rawloader::decode_dummy(&mut Cursor::new(&bytes))
            .map_err(|e| AdapterError::StreamOpen(e.to_string()))?;
        debug!(
            "Opened {} {} raw, {}x{}, {} channel(s), CFA {}",
            meta.clean_make, meta.clean_model, meta.width, meta.height, meta.cpp, meta.cfa
        );

        let preview = find_embedded_jpeg(&bytes).map(<[u8]>::to_vec);
        let mut session = RawloaderSession {
            size: visible_size(&meta),
            sensor: Sensor::Packed(bytes),
            preview: None,
        };
        if let Some(jpeg) = preview {
            if let Err(e) = session.set_preview(jpeg) {
                warn!("Ignoring unreadable embedded preview: {}", e);
            }
        }

        Ok(session)
    }
}

enum Sensor {
    /// The file as read; unpacked on demand.
    Packed(Vec<u8>),
    Unpacked(RawImage),
}

/// An opened raw file: its sensor data and embedded preview.
pub struct RawloaderSession {
    sensor: Sensor,
    size: Size,
    preview: Option<(Vec<u8>, Size)>,
}

impl RawloaderSession {
    /// Wrap a sensor image that has already been unpacked.
    pub fn from_raw_image(image: RawImage) -> Self {
        Self {
            size: visible_size(&image),
            sensor: Sensor::Unpacked(image),
            preview: None,
        }
    }

    /// Attach a JPEG preview, reading its size from the header.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Decode` if the JPEG header is unreadable; the
    /// current preview is kept.
    pub fn set_preview(&mut self, jpeg: Vec<u8>) -> Result<(), AdapterError> {
        let size = compressed_dimensions(Encoding::Jpeg, &jpeg)?;
        self.preview = Some((jpeg, size));
        Ok(())
    }
}

impl DecodeSession for RawloaderSession {
    fn native_size(&self) -> Size {
        self.size
    }

    fn thumbnail_size(&self) -> Option<Size> {
        self.preview.as_ref().map(|(_, size)| *size)
    }

    fn decode_image(&mut self) -> Result<SourceImage, AdapterError> {
        let samples = match &self.sensor {
            Sensor::Packed(bytes) => {
                debug!("Unpacking sensor data");
                let image = rawloader::decode(&mut Cursor::new(bytes))
                    .map_err(|e| AdapterError::Decode(e.to_string()))?;
                develop(&image)?
            }
            Sensor::Unpacked(image) => develop(image)?,
        };
        Ok(SourceImage::Raw(samples))
    }

    fn decode_thumbnail(&mut self) -> Result<SourceImage, AdapterError> {
        let (bytes, _) = self
            .preview
            .as_ref()
            .ok_or_else(|| AdapterError::Decode("No embedded thumbnail".to_string()))?;
        Ok(SourceImage::Compressed {
            encoding: Encoding::Jpeg,
            bytes: bytes.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::compressed::tests::MINIMAL_JPEG;
    use crate::adapter::{produce, RawSamples};
    use crate::decoder::develop::tests::sensor;
    use crate::decoder::preview::tests::tiff_with_jpeg;
    use crate::options::HandlerOptions;

    #[test]
    fn test_open_rejects_non_raw() {
        let mut stream = Cursor::new(vec![0x00u8, 0x01, 0x02, 0x03]);
        let result = RawloaderDecoder::new().open(&mut stream);
        assert!(matches!(result, Err(AdapterError::StreamOpen(_))));
    }

    #[test]
    fn test_open_rejects_empty_stream() {
        let mut stream = Cursor::new(Vec::<u8>::new());
        assert!(RawloaderDecoder::new().open(&mut stream).is_err());
    }

    #[test]
    fn test_open_rejects_plain_jpeg() {
        let mut stream = Cursor::new(MINIMAL_JPEG.to_vec());
        assert!(matches!(
            RawloaderDecoder::new().open(&mut stream),
            Err(AdapterError::StreamOpen(_))
        ));
    }

    #[test]
    fn test_open_rejects_tiff_without_camera() {
        // A TIFF shell with a preview but no camera make is not a raw file
        let mut stream = Cursor::new(tiff_with_jpeg(MINIMAL_JPEG));
        assert!(RawloaderDecoder::new().open(&mut stream).is_err());
    }

    #[test]
    fn test_decode_image_bayer_is_demosaiced() {
        let mut session =
            RawloaderSession::from_raw_image(sensor(2, 2, 1, "RGGB", vec![65535, 0, 0, 0]));
        assert_eq!(session.native_size(), Size::new(2, 2));

        match session.decode_image().unwrap() {
            SourceImage::Raw(raw) => {
                assert_eq!(raw.channels, 3);
                assert_eq!(raw.bits, 16);
            }
            other => panic!("expected raw samples, got {:?}", other),
        }
    }

    #[test]
    fn test_red_bayer_scene_produces_red_pixels() {
        let mut session =
            RawloaderSession::from_raw_image(sensor(2, 2, 1, "RGGB", vec![65535, 0, 0, 0]));
        let img = produce(&mut session, &HandlerOptions::default()).unwrap();
        assert_eq!(img.pixels, [255u8, 0, 0, 255].repeat(4));
    }

    #[test]
    fn test_red_rgb_pixel_keeps_channel_order() {
        let mut session = RawloaderSession::from_raw_image(sensor(1, 1, 3, "", vec![65535, 0, 0]));
        let img = produce(&mut session, &HandlerOptions::default()).unwrap();
        assert_eq!(img.pixels, vec![255, 0, 0, 255]);
    }

    #[test]
    fn test_monochrome_sensor_produces_grey() {
        let mut session = RawloaderSession::from_raw_image(sensor(2, 1, 1, "", vec![65535, 0]));
        match session.decode_image().unwrap() {
            SourceImage::Raw(raw) => {
                assert_eq!(raw, RawSamples::new(2, 1, 1, 16, vec![0xFF, 0xFF, 0, 0]));
            }
            other => panic!("expected raw samples, got {:?}", other),
        }

        let img = produce(&mut session, &HandlerOptions::default()).unwrap();
        assert_eq!(img.pixels, vec![255, 255, 255, 255, 0, 0, 0, 255]);
    }

    #[test]
    fn test_native_size_is_cropped_area() {
        let mut image = sensor(6, 4, 1, "RGGB", vec![0; 24]);
        image.crops = [0, 2, 2, 0];
        let mut session = RawloaderSession::from_raw_image(image);

        assert_eq!(session.native_size(), Size::new(4, 2));
        let img = produce(&mut session, &HandlerOptions::default()).unwrap();
        assert_eq!(img.size(), Size::new(4, 2));
    }

    #[test]
    fn test_decode_thumbnail_returns_jpeg() {
        let mut session =
            RawloaderSession::from_raw_image(sensor(40, 30, 1, "RGGB", vec![0; 1200]));
        session.set_preview(MINIMAL_JPEG.to_vec()).unwrap();

        assert_eq!(session.thumbnail_size(), Some(Size::new(1, 1)));
        assert_eq!(
            session.decode_thumbnail().unwrap(),
            SourceImage::Compressed {
                encoding: Encoding::Jpeg,
                bytes: MINIMAL_JPEG.to_vec(),
            }
        );
    }

    #[test]
    fn test_decode_thumbnail_without_preview() {
        let mut session = RawloaderSession::from_raw_image(sensor(2, 2, 1, "RGGB", vec![0; 4]));
        assert_eq!(session.thumbnail_size(), None);
        assert!(matches!(
            session.decode_thumbnail(),
            Err(AdapterError::Decode(_))
        ));
    }

    #[test]
    fn test_set_preview_rejects_garbage() {
        let mut session = RawloaderSession::from_raw_image(sensor(2, 2, 1, "RGGB", vec![0; 4]));
        assert!(session.set_preview(vec![0xFF, 0xD8, 0x00]).is_err());
        assert_eq!(session.thumbnail_size(), None);
    }

    #[test]
    fn test_packed_sensor_decode_error() {
        let mut session = RawloaderSession {
            sensor: Sensor::Packed(vec![0u8; 16]),
            size: Size::new(2, 2),
            preview: None,
        };
        assert!(matches!(
            session.decode_image(),
            Err(AdapterError::Decode(_))
        ));
    }
}
