// File: crates/exifrisk-core/src/tags.rs

//! Tag ID -> name tables for the three EXIF namespaces.
//!
//! TIFF/IFD0, the EXIF sub-IFD and the GPS sub-IFD each number their tags
//! independently, and the GPS IDs (0x0000-0x001F) overlap values used
//! elsewhere. A lookup therefore always names its namespace.

/// Which table resolves tag IDs while walking a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// IFD0 and the chained IFD1 (thumbnail).
    Main,
    Exif,
    Gps,
}

/// IFD0 tag pointing at the EXIF sub-IFD.
pub const EXIF_IFD_POINTER: u16 = 0x8769;
/// IFD0 tag pointing at the GPS sub-IFD.
pub const GPS_IFD_POINTER: u16 = 0x8825;

/// Resolve a tag ID inside `namespace`.
pub fn tag_name(namespace: Namespace, id: u16) -> Option<&'static str> {
    match namespace {
        Namespace::Main => main_tag_name(id),
        Namespace::Exif => exif_tag_name(id),
        Namespace::Gps => gps_tag_name(id),
    }
}

fn main_tag_name(id: u16) -> Option<&'static str> {
    Some(match id {
        0x000B => "ProcessingSoftware",
        0x00FE => "NewSubfileType",
        0x00FF => "SubfileType",
        0x0100 => "ImageWidth",
        0x0101 => "ImageLength",
        0x0102 => "BitsPerSample",
        0x0103 => "Compression",
        0x0106 => "PhotometricInterpretation",
        0x010D => "DocumentName",
        0x010E => "ImageDescription",
        0x010F => "Make",
        0x0110 => "Model",
        0x0111 => "StripOffsets",
        0x0112 => "Orientation",
        0x0115 => "SamplesPerPixel",
        0x0116 => "RowsPerStrip",
        0x0117 => "StripByteCounts",
        0x011A => "XResolution",
        0x011B => "YResolution",
        0x011C => "PlanarConfiguration",
        0x0128 => "ResolutionUnit",
        0x012D => "TransferFunction",
        0x0131 => "Software",
        0x0132 => "DateTime",
        0x013B => "Artist",
        0x013C => "HostComputer",
        0x013E => "WhitePoint",
        0x013F => "PrimaryChromaticities",
        0x0201 => "JPEGInterchangeFormat",
        0x0202 => "JPEGInterchangeFormatLength",
        0x0211 => "YCbCrCoefficients",
        0x0212 => "YCbCrSubSampling",
        0x0213 => "YCbCrPositioning",
        0x0214 => "ReferenceBlackWhite",
        0x02BC => "XMLPacket",
        0x4746 => "Rating",
        0x4749 => "RatingPercent",
        0x8298 => "Copyright",
        0x83BB => "IPTC-NAA",
        0x8769 => "ExifIFDPointer",
        0x8773 => "InterColorProfile",
        0x8825 => "GPSInfoIFDPointer",
        0x9C9B => "XPTitle",
        0x9C9C => "XPComment",
        0x9C9D => "XPAuthor",
        0x9C9E => "XPKeywords",
        0x9C9F => "XPSubject",
        0xC4A5 => "PrintImageMatching",
        _ => return None,
    })
}

fn exif_tag_name(id: u16) -> Option<&'static str> {
    Some(match id {
        0x829A => "ExposureTime",
        0x829D => "FNumber",
        0x8822 => "ExposureProgram",
        0x8824 => "SpectralSensitivity",
        0x8827 => "ISOSpeedRatings",
        0x8828 => "OECF",
        0x8830 => "SensitivityType",
        0x8832 => "RecommendedExposureIndex",
        0x9000 => "ExifVersion",
        0x9003 => "DateTimeOriginal",
        0x9004 => "DateTimeDigitized",
        0x9010 => "OffsetTime",
        0x9011 => "OffsetTimeOriginal",
        0x9012 => "OffsetTimeDigitized",
        0x9101 => "ComponentsConfiguration",
        0x9102 => "CompressedBitsPerPixel",
        0x9201 => "ShutterSpeedValue",
        0x9202 => "ApertureValue",
        0x9203 => "BrightnessValue",
        0x9204 => "ExposureBiasValue",
        0x9205 => "MaxApertureValue",
        0x9206 => "SubjectDistance",
        0x9207 => "MeteringMode",
        0x9208 => "LightSource",
        0x9209 => "Flash",
        0x920A => "FocalLength",
        0x9214 => "SubjectArea",
        0x927C => "MakerNote",
        0x9286 => "UserComment",
        0x9290 => "SubSecTime",
        0x9291 => "SubSecTimeOriginal",
        0x9292 => "SubSecTimeDigitized",
        0xA000 => "FlashpixVersion",
        0xA001 => "ColorSpace",
        0xA002 => "PixelXDimension",
        0xA003 => "PixelYDimension",
        0xA004 => "RelatedSoundFile",
        0xA20B => "FlashEnergy",
        0xA20E => "FocalPlaneXResolution",
        0xA20F => "FocalPlaneYResolution",
        0xA210 => "FocalPlaneResolutionUnit",
        0xA214 => "SubjectLocation",
        0xA215 => "ExposureIndex",
        0xA217 => "SensingMethod",
        0xA300 => "FileSource",
        0xA301 => "SceneType",
        0xA302 => "CFAPattern",
        0xA401 => "CustomRendered",
        0xA402 => "ExposureMode",
        0xA403 => "WhiteBalance",
        0xA404 => "DigitalZoomRatio",
        0xA405 => "FocalLengthIn35mmFilm",
        0xA406 => "SceneCaptureType",
        0xA407 => "GainControl",
        0xA408 => "Contrast",
        0xA409 => "Saturation",
        0xA40A => "Sharpness",
        0xA40B => "DeviceSettingDescription",
        0xA40C => "SubjectDistanceRange",
        0xA420 => "ImageUniqueID",
        0xA430 => "CameraOwnerName",
        0xA431 => "BodySerialNumber",
        0xA432 => "LensSpecification",
        0xA433 => "LensMake",
        0xA434 => "LensModel",
        0xA435 => "LensSerialNumber",
        0xA460 => "CompositeImage",
        0xA500 => "Gamma",
        _ => return None,
    })
}

fn gps_tag_name(id: u16) -> Option<&'static str> {
    Some(match id {
        0x0000 => "GPSVersionID",
        0x0001 => "GPSLatitudeRef",
        0x0002 => "GPSLatitude",
        0x0003 => "GPSLongitudeRef",
        0x0004 => "GPSLongitude",
        0x0005 => "GPSAltitudeRef",
        0x0006 => "GPSAltitude",
        0x0007 => "GPSTimeStamp",
        0x0008 => "GPSSatellites",
        0x0009 => "GPSStatus",
        0x000A => "GPSMeasureMode",
        0x000B => "GPSDOP",
        0x000C => "GPSSpeedRef",
        0x000D => "GPSSpeed",
        0x000E => "GPSTrackRef",
        0x000F => "GPSTrack",
        0x0010 => "GPSImgDirectionRef",
        0x0011 => "GPSImgDirection",
        0x0012 => "GPSMapDatum",
        0x0013 => "GPSDestLatitudeRef",
        0x0014 => "GPSDestLatitude",
        0x0015 => "GPSDestLongitudeRef",
        0x0016 => "GPSDestLongitude",
        0x0017 => "GPSDestBearingRef",
        0x0018 => "GPSDestBearing",
        0x0019 => "GPSDestDistanceRef",
        0x001A => "GPSDestDistance",
        0x001B => "GPSProcessingMethod",
        0x001C => "GPSAreaInformation",
        0x001D => "GPSDateStamp",
        0x001E => "GPSDifferential",
        0x001F => "GPSHPositioningError",
        _ => return None,
    })
}

/// Resolve an ID without knowing its namespace: Main first, then EXIF, then
/// GPS. Only used for names that arrive as bare numbers from outside the
/// directory walker.
pub fn any_tag_name(id: u16) -> Option<&'static str> {
    main_tag_name(id)
        .or_else(|| exif_tag_name(id))
        .or_else(|| gps_tag_name(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_do_not_leak() {
        assert_eq!(tag_name(Namespace::Gps, 0x0002), Some("GPSLatitude"));
        assert_eq!(tag_name(Namespace::Main, 0x0002), None);
        assert_eq!(tag_name(Namespace::Exif, 0x0002), None);

        // 0x000B is ProcessingSoftware in IFD0 but GPSDOP in the GPS IFD.
        assert_eq!(tag_name(Namespace::Main, 0x000B), Some("ProcessingSoftware"));
        assert_eq!(tag_name(Namespace::Gps, 0x000B), Some("GPSDOP"));
    }

    #[test]
    fn exif_tags_only_resolve_in_exif_namespace() {
        assert_eq!(tag_name(Namespace::Exif, 0x9003), Some("DateTimeOriginal"));
        assert_eq!(tag_name(Namespace::Main, 0x9003), None);
    }

    #[test]
    fn any_tag_name_prefers_main() {
        assert_eq!(any_tag_name(0x0110), Some("Model"));
        assert_eq!(any_tag_name(0x000B), Some("ProcessingSoftware"));
        assert_eq!(any_tag_name(0x0004), Some("GPSLongitude"));
        assert_eq!(any_tag_name(0xFFFF), None);
    }
}
