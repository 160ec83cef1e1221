// File: crates/exifrisk-core/src/png.rs

use crate::config::DecodeLimits;
use crate::cursor::{ByteCursor, ByteOrder};
use crate::format::ImageFormat;
use crate::tiff::decode_tiff;
use crate::value::{RawTagMap, TagValue};
use crate::{ExtractError, MetadataReader};
use log::debug;
use std::io::Cursor;

const PNG_SIGNATURE: &[u8; 8] = &[137, 80, 78, 71, 13, 10, 26, 10];

/// Reads the IHDR basics, the eXIf block and the textual chunks of a PNG
/// file.
///
/// PNG keeps free-form keyword/value pairs in tEXt, zTXt and iTXt chunks.
/// Editors put their name there and image generators put their whole prompt
/// there, so these pairs go through the same classifier as EXIF tags.
#[derive(Debug, Clone)]
pub struct PngReader<'a> {
    file_bytes: &'a [u8],
    limits: DecodeLimits,
}

impl<'a> MetadataReader<'a> for PngReader<'a> {
    fn new(file_bytes: &'a [u8], limits: DecodeLimits) -> Result<Self, ExtractError> {
        // The png::Decoder will fail if it's not a valid PNG, which is a robust check.
        let decoder = png::Decoder::new(Cursor::new(file_bytes));
        if decoder.read_info().is_err() {
            return Err(ExtractError::UnsupportedFileType(
                "Not a valid PNG file.".to_string(),
            ));
        }
        Ok(Self { file_bytes, limits })
    }

    fn format(&self) -> ImageFormat {
        ImageFormat::Png
    }

    fn read_raw_tags(&self) -> Result<RawTagMap, ExtractError> {
        let decoder = png::Decoder::new(Cursor::new(self.file_bytes));
        let mut reader = decoder
            .read_info()
            .map_err(|e| ExtractError::ParsingError(e.to_string()))?;
        // Text chunks may also follow the image data.
        if let Err(e) = reader.finish() {
            debug!("Stopped reading trailing PNG chunks: {e}");
        }
        let info = reader.info();
        let mut tags = RawTagMap::new();

        tags.insert("ImageWidth", TagValue::Integer(info.width.into()));
        tags.insert("ImageHeight", TagValue::Integer(info.height.into()));
        tags.insert("BitDepth", TagValue::Integer(i64::from(info.bit_depth as u8)));
        tags.insert("ColorType", TagValue::Text(format!("{:?}", info.color_type)));

        if let Some(exif) = find_exif_chunk(self.file_bytes) {
            // Some writers keep the JPEG APP1 signature in front of the TIFF block.
            let exif = exif.strip_prefix(b"Exif\0\0").unwrap_or(exif);
            match decode_tiff(exif, 0, &self.limits) {
                Ok(exif_tags) => tags.merge(exif_tags),
                Err(e) => debug!("Skipping eXIf chunk: {e}"),
            }
        }

        for chunk in &info.uncompressed_latin1_text {
            tags.insert(chunk.keyword.clone(), TagValue::Text(chunk.text.clone()));
        }
        for chunk in &info.compressed_latin1_text {
            match chunk.get_text() {
                Ok(text) => {
                    tags.insert(chunk.keyword.clone(), TagValue::Text(text));
                }
                Err(e) => debug!("Skipping zTXt chunk {}: {e}", chunk.keyword),
            }
        }
        for chunk in &info.utf8_text {
            match chunk.get_text() {
                Ok(text) => {
                    tags.insert(chunk.keyword.clone(), TagValue::Text(text));
                }
                Err(e) => debug!("Skipping iTXt chunk {}: {e}", chunk.keyword),
            }
        }

        Ok(tags)
    }
}

/// Data of the first `eXIf` chunk. The `png` decoder does not keep this
/// chunk, so the chunk list is walked here.
fn find_exif_chunk(bytes: &[u8]) -> Option<&[u8]> {
    let mut cursor = ByteCursor::at(bytes, PNG_SIGNATURE.len());
    loop {
        let length = usize::try_from(cursor.read_u32(ByteOrder::BigEndian)?).ok()?;
        let kind = cursor.read_bytes(4)?;
        let data = cursor.read_bytes(length)?;
        cursor.read_bytes(4)?; // CRC
        match kind {
            b"eXIf" => return Some(data),
            b"IEND" => return None,
            _ => {}
        }
    }
}
