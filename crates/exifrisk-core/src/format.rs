// File: crates/exifrisk-core/src/format.rs

use serde::Serialize;

/// Container formats recognised from magic bytes or a MIME hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Tiff,
    Heic,
    Avif,
    Bmp,
}

impl ImageFormat {
    /// Identify the container. Magic bytes win; the MIME hint is only
    /// consulted when the bytes are not recognised.
    pub fn detect(bytes: &[u8], mime_hint: &str) -> Option<Self> {
        Self::sniff(bytes).or_else(|| Self::from_mime(mime_hint))
    }

    fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        // PNG files start with a specific 8-byte signature.
        if bytes.starts_with(&[137, 80, 78, 71, 13, 10, 26, 10]) {
            return Some(ImageFormat::Png);
        }
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            return Some(ImageFormat::Gif);
        }
        if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            return Some(ImageFormat::Webp);
        }
        if bytes.starts_with(b"II\x2A\x00") || bytes.starts_with(b"MM\x00\x2A") {
            return Some(ImageFormat::Tiff);
        }
        if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
            return match &bytes[8..12] {
                b"heic" | b"heix" | b"hevc" | b"mif1" | b"msf1" => Some(ImageFormat::Heic),
                b"avif" | b"avis" => Some(ImageFormat::Avif),
                _ => None,
            };
        }
        if bytes.starts_with(b"BM") && bytes.len() >= 14 {
            return Some(ImageFormat::Bmp);
        }
        None
    }

    fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        Some(match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => ImageFormat::Jpeg,
            "image/png" => ImageFormat::Png,
            "image/gif" => ImageFormat::Gif,
            "image/webp" => ImageFormat::Webp,
            "image/tiff" => ImageFormat::Tiff,
            "image/heic" | "image/heif" => ImageFormat::Heic,
            "image/avif" => ImageFormat::Avif,
            "image/bmp" | "image/x-ms-bmp" => ImageFormat::Bmp,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Heic => "heic",
            ImageFormat::Avif => "avif",
            ImageFormat::Bmp => "bmp",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_beat_the_hint() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0];
        assert_eq!(ImageFormat::detect(&jpeg, "image/png"), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn recognises_iso_bmff_brands() {
        let mut heic = vec![0, 0, 0, 0x18];
        heic.extend_from_slice(b"ftypheic");
        assert_eq!(ImageFormat::detect(&heic, ""), Some(ImageFormat::Heic));

        let mut avif = vec![0, 0, 0, 0x1C];
        avif.extend_from_slice(b"ftypavif");
        assert_eq!(ImageFormat::detect(&avif, ""), Some(ImageFormat::Avif));
    }

    #[test]
    fn falls_back_to_mime_hint() {
        assert_eq!(
            ImageFormat::detect(b"????", "Image/WebP; charset=binary"),
            Some(ImageFormat::Webp)
        );
        assert_eq!(ImageFormat::detect(b"????", "application/octet-stream"), None);
    }
}
