use log::{debug, warn};

use crate::config::DecodeLimits;
use crate::format::ImageFormat;
use crate::tiff::decode_tiff;
use crate::value::RawTagMap;
use crate::{ExtractError, MetadataReader};

/// Signature that opens the EXIF flavour of an APP1 segment.
const EXIF_SIGNATURE: &[u8; 6] = b"Exif\0\0";

/// Location of the EXIF APP1 segment inside a JPEG byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExifSegment {
    /// Offset of the `FF E1` marker.
    pub marker_offset: usize,
    /// Offset of the TIFF header, right after `"Exif\0\0"`.
    pub tiff_start: usize,
    /// One past the last byte the length field claims. Lies beyond the
    /// buffer when the file is truncated.
    pub end: usize,
}

/// Finds the EXIF data segment (APP1) in a JPEG byte stream.
///
/// Returns `None` when the stream is not a JPEG, when the scan reaches the
/// image data (SOS) or the end of the buffer first, or when the marker
/// structure is corrupt.
pub fn find_exif_segment(bytes: &[u8]) -> Option<ExifSegment> {
    if bytes.len() < 2 || bytes[0..2] != [0xFF, 0xD8] {
        return None;
    }

    let mut offset = 2; // Skip the initial SOI marker (0xFFD8)
    while offset + 2 <= bytes.len() {
        if bytes[offset] != 0xFF {
            debug!("Invalid marker start at offset {offset}");
            return None;
        }

        let marker = bytes[offset + 1];

        // Fill byte: markers may be preceded by any number of 0xFF.
        if marker == 0xFF {
            offset += 1;
            continue;
        }

        // Standalone markers (no length field)
        if (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
            offset += 2;
            continue;
        }

        // Markers that signify the end of metadata or start of image data
        if marker == 0xD9 || marker == 0xDA {
            break;
        }

        if offset + 4 > bytes.len() {
            debug!("Not enough bytes to read length at offset {offset}");
            return None;
        }
        let length = u16::from_be_bytes([bytes[offset + 2], bytes[offset + 3]]) as usize;

        // Length counts its own two bytes.
        if length < 2 {
            debug!("Corrupt length field at offset {offset}: {length}");
            return None;
        }

        // Check the signature before the segment length so that a truncated
        // file still exposes the directories it does contain.
        if marker == 0xE1 && length >= 2 + EXIF_SIGNATURE.len() {
            let sig_start = offset + 4;
            let sig_end = sig_start + EXIF_SIGNATURE.len();
            if bytes.get(sig_start..sig_end) == Some(&EXIF_SIGNATURE[..]) {
                return Some(ExifSegment {
                    marker_offset: offset,
                    tiff_start: sig_end,
                    end: offset + 2 + length,
                });
            }
        }

        // Move to the next marker
        offset += 2 + length;
    }

    // EXIF APP1 segment not found
    None
}

/// Reads the EXIF block of a JPEG file.
#[derive(Debug, Clone)]
pub struct JpegReader<'a> {
    file_bytes: &'a [u8],
    limits: DecodeLimits,
}

impl<'a> MetadataReader<'a> for JpegReader<'a> {
    fn new(file_bytes: &'a [u8], limits: DecodeLimits) -> Result<Self, ExtractError> {
        // Basic JPEG check
        if file_bytes.len() < 2 || file_bytes[0..2] != [0xFF, 0xD8] {
            return Err(ExtractError::ParsingError("Not a valid JPEG file".into()));
        }
        Ok(Self { file_bytes, limits })
    }

    fn format(&self) -> ImageFormat {
        ImageFormat::Jpeg
    }

    fn read_raw_tags(&self) -> Result<RawTagMap, ExtractError> {
        let Some(segment) = find_exif_segment(self.file_bytes) else {
            debug!("No EXIF APP1 segment found");
            return Ok(RawTagMap::new());
        };

        // Offsets must not wander out of the segment into scan data.
        let segment_bytes = &self.file_bytes[..segment.end.min(self.file_bytes.len())];
        decode_tiff(segment_bytes, segment.tiff_start, &self.limits).inspect_err(|e| {
            warn!("EXIF segment at offset {} is unusable: {e}", segment.marker_offset);
        })
    }
}
