//! Recognizing raw containers and locating their embedded JPEG preview.
//!
//! Most raw formats (ARW, CR2, NEF, DNG, ORF, RW2, ...) are TIFF containers
//! that carry one or more JPEG previews next to the sensor data. The preview
//! is found by walking the IFD chain:
//!
//! 1. SubIFDs of IFD0 (larger previews on Sony and Nikon bodies)
//! 2. IFD1 (the standard EXIF thumbnail)
//! 3. JPEG tags directly in IFD0
//! 4. a scan for large SOI..EOI payloads as a last resort
//!
//! RAF declares its preview in the file header. Other containers (CR3, CRW,
//! MRW, X3F) only get the scan.

// TIFF constants
const TIFF_MAGIC_LE: [u8; 4] = [0x49, 0x49, 0x2A, 0x00]; // II + 42
const TIFF_MAGIC_BE: [u8; 4] = [0x4D, 0x4D, 0x00, 0x2A]; // MM + 42

// TIFF layouts with a vendor magic number
const ORF_MAGIC_LE: [u8; 4] = *b"IIRO";
const ORF_MAGIC_LE_ALT: [u8; 4] = *b"IIRS";
const ORF_MAGIC_BE: [u8; 4] = *b"MMOR";
const RW2_MAGIC: [u8; 4] = [0x49, 0x49, 0x55, 0x00];

// Non-TIFF containers
const RAF_MAGIC: &[u8] = b"FUJIFILM";
const RAF_JPEG_OFFSET: usize = 84;
const CR3_BRAND: &[u8] = b"ftypcrx ";
const CRW_SIGNATURE: &[u8] = b"HEAPCCDR";
const MRW_MAGIC: &[u8] = b"\0MRM";
const X3F_MAGIC: &[u8] = b"FOVb";

// TIFF tag IDs
const TAG_COMPRESSION: u16 = 0x0103;
const TAG_STRIP_OFFSETS: u16 = 0x0111;
const TAG_STRIP_BYTE_COUNTS: u16 = 0x0117;
const TAG_SUBIFD: u16 = 0x014A;
const TAG_JPEG_OFFSET: u16 = 0x0201; // JpegInterchangeFormat
const TAG_JPEG_LENGTH: u16 = 0x0202; // JpegInterchangeFormatLength

const COMPRESSION_JPEG: u32 = 6;
const COMPRESSION_JPEG_OLD: u32 = 7;

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

const MAX_IFD_ENTRIES: u16 = 1000;
const MAX_SUBIFDS: u32 = 16;
// SubIFD JPEGs smaller than this are usually lossless raw tiles, not previews.
const MIN_SUBIFD_PREVIEW: usize = 10_000;
const MIN_SCANNED_PREVIEW: usize = 50_000;
const SCAN_START: usize = 8192;

/// True if the bytes start with the header of a known raw container.
///
/// This is a cheap signature check; the decoder still decides whether it
/// can actually read the file.
pub fn is_raw_file(bytes: &[u8]) -> bool {
    tiff_byte_order(bytes).is_some()
        || bytes.starts_with(RAF_MAGIC)
        || bytes.starts_with(MRW_MAGIC)
        || bytes.starts_with(X3F_MAGIC)
        || bytes.get(4..12) == Some(CR3_BRAND)
        || bytes.get(6..14) == Some(CRW_SIGNATURE)
}

/// Find the embedded JPEG preview, borrowing it from `bytes`.
pub fn find_embedded_jpeg(bytes: &[u8]) -> Option<&[u8]> {
    if bytes.starts_with(RAF_MAGIC) {
        return raf_jpeg(bytes).or_else(|| scan_for_jpeg(bytes));
    }
    match Tiff::parse(bytes) {
        Some(tiff) => tiff.preview().or_else(|| scan_for_jpeg(bytes)),
        None if is_raw_file(bytes) => scan_for_jpeg(bytes),
        None => None,
    }
}

/// `Some(little_endian)` for TIFF-structured headers.
fn tiff_byte_order(bytes: &[u8]) -> Option<bool> {
    let header: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    match header {
        TIFF_MAGIC_LE | ORF_MAGIC_LE | ORF_MAGIC_LE_ALT | RW2_MAGIC => Some(true),
        TIFF_MAGIC_BE | ORF_MAGIC_BE => Some(false),
        _ => None,
    }
}

/// RAF stores the preview offset and length big-endian in its header.
fn raf_jpeg(bytes: &[u8]) -> Option<&[u8]> {
    let field = |at: usize| -> Option<usize> {
        let raw: [u8; 4] = bytes.get(at..at + 4)?.try_into().ok()?;
        Some(u32::from_be_bytes(raw) as usize)
    };
    let offset = field(RAF_JPEG_OFFSET)?;
    let length = field(RAF_JPEG_OFFSET + 4)?;
    if length == 0 {
        return None;
    }
    let data = bytes.get(offset..offset.checked_add(length)?)?;
    data.starts_with(&JPEG_SOI).then_some(data)
}

struct IfdEntry {
    tag: u16,
    count: u32,
    value: u32,
}

struct Ifd {
    entries: Vec<IfdEntry>,
    next: u32,
}

struct Tiff<'a> {
    bytes: &'a [u8],
    little_endian: bool,
}

impl<'a> Tiff<'a> {
    fn parse(bytes: &'a [u8]) -> Option<Self> {
        Some(Self {
            bytes,
            little_endian: tiff_byte_order(bytes)?,
        })
    }

    fn preview(&self) -> Option<&'a [u8]> {
        let ifd0 = self.ifd(self.u32_at(4)?)?;

        if let Some(entry) = ifd0.entries.iter().find(|e| e.tag == TAG_SUBIFD) {
            for offset in self.subifd_offsets(entry) {
                let found = self
                    .ifd(offset)
                    .and_then(|ifd| self.jpeg_in(&ifd.entries))
                    .filter(|jpeg| jpeg.len() > MIN_SUBIFD_PREVIEW);
                if found.is_some() {
                    return found;
                }
            }
        }

        if ifd0.next != 0 {
            if let Some(jpeg) = self.ifd(ifd0.next).and_then(|ifd| self.jpeg_in(&ifd.entries)) {
                return Some(jpeg);
            }
        }

        self.jpeg_in(&ifd0.entries)
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        let raw: [u8; 2] = self.bytes.get(offset..offset.checked_add(2)?)?.try_into().ok()?;
        Some(if self.little_endian {
            u16::from_le_bytes(raw)
        } else {
            u16::from_be_bytes(raw)
        })
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let raw: [u8; 4] = self.bytes.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
        Some(if self.little_endian {
            u32::from_le_bytes(raw)
        } else {
            u32::from_be_bytes(raw)
        })
    }

    fn ifd(&self, offset: u32) -> Option<Ifd> {
        let offset = offset as usize;
        let count = self.u16_at(offset)?;
        if count > MAX_IFD_ENTRIES {
            return None;
        }

        let mut entries = Vec::with_capacity(count as usize);
        for i in 0..count as usize {
            let at = offset + 2 + i * 12;
            let tag = self.u16_at(at)?;
            let typ = self.u16_at(at + 2)?;
            let n = self.u32_at(at + 4)?;
            // SHORT values sit in the first two bytes of the value field.
            let value = if typ == 3 && n == 1 {
                self.u16_at(at + 8)? as u32
            } else {
                self.u32_at(at + 8)?
            };
            entries.push(IfdEntry {
                tag,
                count: n,
                value,
            });
        }

        let next = self.u32_at(offset + 2 + count as usize * 12).unwrap_or(0);
        Some(Ifd { entries, next })
    }

    fn subifd_offsets(&self, entry: &IfdEntry) -> Vec<u32> {
        match entry.count {
            0 => Vec::new(),
            1 => vec![entry.value],
            n => (0..n.min(MAX_SUBIFDS))
                .filter_map(|i| self.u32_at(entry.value as usize + i as usize * 4))
                .collect(),
        }
    }

    fn jpeg_in(&self, entries: &[IfdEntry]) -> Option<&'a [u8]> {
        let value = |tag: u16| entries.iter().find(|e| e.tag == tag).map(|e| e.value);

        if let (Some(offset), Some(length)) = (value(TAG_JPEG_OFFSET), value(TAG_JPEG_LENGTH)) {
            if let Some(jpeg) = self.jpeg_at(offset, length) {
                return Some(jpeg);
            }
        }

        let compressed = matches!(
            value(TAG_COMPRESSION),
            Some(COMPRESSION_JPEG) | Some(COMPRESSION_JPEG_OLD)
        );
        match (value(TAG_STRIP_OFFSETS), value(TAG_STRIP_BYTE_COUNTS)) {
            (Some(offset), Some(length)) if compressed => self.jpeg_at(offset, length),
            _ => None,
        }
    }

    fn jpeg_at(&self, offset: u32, length: u32) -> Option<&'a [u8]> {
        if length == 0 {
            return None;
        }
        let start = offset as usize;
        let data = self.bytes.get(start..start.checked_add(length as usize)?)?;
        data.starts_with(&JPEG_SOI).then_some(data)
    }
}

fn scan_for_jpeg(bytes: &[u8]) -> Option<&[u8]> {
    let start = SCAN_START.min(bytes.len());

    for i in start..bytes.len().saturating_sub(1) {
        if bytes[i..].starts_with(&JPEG_SOI) {
            for j in (i + 2)..bytes.len().saturating_sub(1) {
                if bytes[j..].starts_with(&JPEG_EOI) && j + 2 - i > MIN_SCANNED_PREVIEW {
                    return Some(&bytes[i..j + 2]);
                }
            }
        }
    }

    None
}
