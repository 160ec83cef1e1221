// crates/exifrisk-core/src/lib.rs

pub mod assemble;
pub mod classify;
pub mod config;
pub mod cursor;
pub mod format;
pub mod gps;
pub mod ifd;
pub mod jpeg;
pub mod png;
pub mod tags;
pub mod tiff;
pub mod value;

#[cfg(test)]
mod testutil;

use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

use crate::jpeg::JpegReader;
use crate::png::PngReader;
use crate::tiff::TiffReader;

pub use assemble::{DisplayValue, ProcessedTag};
pub use classify::RiskCategory;
pub use config::DecodeLimits;
pub use format::ImageFormat;
pub use gps::GpsCoordinate;
pub use value::{RawTagMap, TagValue};

/// Structural failures. Anything smaller than a whole container is dropped
/// field by field and never surfaces here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Invalid TIFF byte order mark: {0:02X?}")]
    InvalidByteOrder([u8; 2]),

    #[error("Invalid TIFF magic number: {0}")]
    InvalidMagic(u16),

    #[error("TIFF header at offset {0} does not fit in the buffer")]
    TruncatedHeader(usize),

    #[error("File parsing failed: {0}")]
    ParsingError(String),
}

/// Everything found in one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub tags: Vec<ProcessedTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps: Option<GpsCoordinate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_format: Option<String>,
}

/// Any container we can pull metadata out of implements this trait.
pub trait MetadataReader<'a> {
    /// Wraps the file bytes, checking that they look like this format.
    fn new(file_bytes: &'a [u8], limits: DecodeLimits) -> Result<Self, ExtractError>
    where
        Self: Sized;

    fn format(&self) -> ImageFormat;

    /// Every decodable tag, keyed by name. Values are not yet formatted.
    fn read_raw_tags(&self) -> Result<RawTagMap, ExtractError>;
}

/// Detects the file type and returns the matching reader.
pub fn reader_for_file<'a>(
    file_bytes: &'a [u8],
    limits: &DecodeLimits,
) -> Result<Box<dyn MetadataReader<'a> + 'a>, ExtractError> {
    // PNG files start with a specific 8-byte signature.
    if file_bytes.starts_with(&[137, 80, 78, 71, 13, 10, 26, 10]) {
        let reader = PngReader::new(file_bytes, limits.clone())?;
        return Ok(Box::new(reader));
    }

    // JPEG files start with 0xFFD8.
    if file_bytes.starts_with(&[0xFF, 0xD8]) {
        let reader = JpegReader::new(file_bytes, limits.clone())?;
        return Ok(Box::new(reader));
    }

    // Bare TIFF (and TIFF-based raw formats) starts with its own header.
    if file_bytes.starts_with(b"II\x2A\x00") || file_bytes.starts_with(b"MM\x00\x2A") {
        let reader = TiffReader::new(file_bytes, limits.clone())?;
        return Ok(Box::new(reader));
    }

    Err(ExtractError::UnsupportedFileType(
        "Could not determine file type.".to_string(),
    ))
}

/// Extract, classify and sort the metadata of one image using the default
/// limits.
///
/// Never fails: malformed or unsupported input gives an empty tag list.
pub fn extract_metadata(buffer: &[u8], mime_type_hint: &str) -> ExtractionResult {
    extract_metadata_with(buffer, mime_type_hint, &DecodeLimits::default())
}

/// Same as [`extract_metadata`] with explicit decoder limits.
pub fn extract_metadata_with(
    buffer: &[u8],
    mime_type_hint: &str,
    limits: &DecodeLimits,
) -> ExtractionResult {
    let image_format = ImageFormat::detect(buffer, mime_type_hint).map(|f| f.as_str().to_string());

    let raw = match reader_for_file(buffer, limits).and_then(|reader| reader.read_raw_tags()) {
        Ok(raw) => raw,
        Err(ExtractError::UnsupportedFileType(reason)) => {
            debug!("No metadata reader for {mime_type_hint:?}: {reason}");
            RawTagMap::new()
        }
        Err(e) => {
            warn!("Metadata extraction failed: {e}");
            RawTagMap::new()
        }
    };

    ExtractionResult {
        tags: assemble::assemble(&raw, limits),
        gps: gps::extract_gps(&raw),
        image_format,
    }
}
