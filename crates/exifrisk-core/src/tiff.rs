// File: crates/exifrisk-core/src/tiff.rs

//! The 8-byte TIFF header that opens every EXIF payload.
//!
//! ```text
//! Bytes 0-1: Byte order ("II" little-endian, "MM" big-endian)
//! Bytes 2-3: Magic number 42
//! Bytes 4-7: Offset to the first IFD, relative to byte 0
//! ```

use log::debug;

use crate::config::DecodeLimits;
use crate::cursor::{ByteCursor, ByteOrder};
use crate::format::ImageFormat;
use crate::ifd::DirectoryDecoder;
use crate::value::RawTagMap;
use crate::{ExtractError, MetadataReader};

const TIFF_MAGIC: u16 = 42;

/// Size of the header in bytes.
pub const TIFF_HEADER_SIZE: usize = 8;

/// Where the TIFF structure starts inside the file and how to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Absolute offset of the byte-order mark. All IFD offsets are relative
    /// to this position.
    pub tiff_start: usize,
    pub byte_order: ByteOrder,
    pub first_ifd_offset: u32,
}

impl TiffHeader {
    /// Parse the header found at `tiff_start` in `buf`.
    ///
    /// # Errors
    /// - `TruncatedHeader` if fewer than 8 bytes remain
    /// - `InvalidByteOrder` if the first two bytes are neither "II" nor "MM"
    /// - `InvalidMagic` if the version field is not 42
    pub fn parse(buf: &[u8], tiff_start: usize) -> Result<Self, ExtractError> {
        let mut cursor = ByteCursor::at(buf, tiff_start);
        if !cursor.has(TIFF_HEADER_SIZE) {
            return Err(ExtractError::TruncatedHeader(tiff_start));
        }

        let mark = cursor
            .read_bytes(2)
            .ok_or(ExtractError::TruncatedHeader(tiff_start))?;
        let byte_order = match mark {
            b"II" => ByteOrder::LittleEndian,
            b"MM" => ByteOrder::BigEndian,
            _ => return Err(ExtractError::InvalidByteOrder([mark[0], mark[1]])),
        };

        let magic = cursor
            .read_u16(byte_order)
            .ok_or(ExtractError::TruncatedHeader(tiff_start))?;
        if magic != TIFF_MAGIC {
            return Err(ExtractError::InvalidMagic(magic));
        }

        let first_ifd_offset = cursor
            .read_u32(byte_order)
            .ok_or(ExtractError::TruncatedHeader(tiff_start))?;

        Ok(TiffHeader {
            tiff_start,
            byte_order,
            first_ifd_offset,
        })
    }
}

/// Parse the header at `tiff_start` and decode every directory it reaches.
///
/// Offsets inside the block may only reach bytes of `buf`, so callers pass
/// exactly the region the block is allowed to occupy.
pub fn decode_tiff(buf: &[u8], tiff_start: usize, limits: &DecodeLimits) -> Result<RawTagMap, ExtractError> {
    let header = TiffHeader::parse(buf, tiff_start)?;
    Ok(DirectoryDecoder::new(buf, header, limits).decode())
}

/// Reads a bare TIFF file. DNG and most camera raw formats are TIFF
/// underneath and go through here too.
#[derive(Debug, Clone)]
pub struct TiffReader<'a> {
    file_bytes: &'a [u8],
    limits: DecodeLimits,
}

impl<'a> MetadataReader<'a> for TiffReader<'a> {
    fn new(file_bytes: &'a [u8], limits: DecodeLimits) -> Result<Self, ExtractError> {
        if !file_bytes.starts_with(b"II\x2A\x00") && !file_bytes.starts_with(b"MM\x00\x2A") {
            return Err(ExtractError::ParsingError("Not a valid TIFF file".into()));
        }
        Ok(Self { file_bytes, limits })
    }

    fn format(&self) -> ImageFormat {
        ImageFormat::Tiff
    }

    fn read_raw_tags(&self) -> Result<RawTagMap, ExtractError> {
        let tags = decode_tiff(self.file_bytes, 0, &self.limits)?;
        debug!("TIFF file: {} tags", tags.len());
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{Field, TiffBuilder};
    use crate::value::TagValue;

    #[test]
    fn parses_big_endian_header() {
        let buf = [0xAA, b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08];
        let header = TiffHeader::parse(&buf, 1).unwrap();
        assert_eq!(header.byte_order, ByteOrder::BigEndian);
        assert_eq!(header.first_ifd_offset, 8);
        assert_eq!(header.tiff_start, 1);
    }

    #[test]
    fn parses_little_endian_header() {
        let buf = [b'I', b'I', 0x2A, 0x00, 0x10, 0x00, 0x00, 0x00];
        let header = TiffHeader::parse(&buf, 0).unwrap();
        assert_eq!(header.byte_order, ByteOrder::LittleEndian);
        assert_eq!(header.first_ifd_offset, 16);
    }

    #[test]
    fn rejects_unknown_byte_order() {
        let buf = [b'X', b'X', 0x00, 0x2A, 0, 0, 0, 8];
        assert!(matches!(
            TiffHeader::parse(&buf, 0),
            Err(ExtractError::InvalidByteOrder([b'X', b'X']))
        ));
    }

    #[test]
    fn rejects_wrong_magic() {
        // "MM" with 42 written little-endian reads as 0x2A00.
        let buf = [b'M', b'M', 0x2A, 0x00, 0, 0, 0, 8];
        assert!(matches!(
            TiffHeader::parse(&buf, 0),
            Err(ExtractError::InvalidMagic(0x2A00))
        ));
    }

    #[test]
    fn rejects_short_header() {
        let buf = [b'I', b'I', 0x2A, 0x00, 0x08];
        assert!(matches!(
            TiffHeader::parse(&buf, 0),
            Err(ExtractError::TruncatedHeader(0))
        ));
    }

    #[test]
    fn tiff_reader_decodes_bare_files() {
        let mut builder = TiffBuilder::new(ByteOrder::BigEndian);
        let ifd0 = builder.add_ifd(vec![
            Field::ascii(0x010F, "Hasselblad"),
            Field::shorts(0x0112, &[8]),
        ]);
        builder.set_root(ifd0);
        let tiff = builder.build();

        let reader = TiffReader::new(&tiff, DecodeLimits::default()).unwrap();
        assert_eq!(reader.format(), ImageFormat::Tiff);
        let tags = reader.read_raw_tags().unwrap();
        assert_eq!(tags.get("Make"), Some(&TagValue::Text("Hasselblad".into())));
        assert_eq!(tags.get("Orientation"), Some(&TagValue::Integer(8)));

        assert!(TiffReader::new(b"II\x2B\x00", DecodeLimits::default()).is_err());
    }
}
