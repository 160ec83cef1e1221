// File: crates/exifrisk-core/src/classify.rs

//! Privacy classification of tag names.
//!
//! Classification is an ordered list of substring rules evaluated against the
//! lower-cased, normalised tag name; the first rule that matches decides. The
//! lists err on the side of "more sensitive": flagging a harmless tag costs a
//! user a second look, missing a location leak costs far more. Names no rule
//! knows default to [`RiskCategory::Medium`].

use std::borrow::Cow;

use log::trace;
use serde::Serialize;

use crate::tags::any_tag_name;

/// How much a tag reveals about the person behind the photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    /// Location, time, identity, device serials, free text.
    High,
    /// Equipment and capture settings.
    Medium,
    /// Pixel layout, encoding and format details.
    Safe,
}

impl RiskCategory {
    /// Sort rank: high risk first.
    pub fn rank(self) -> u8 {
        match self {
            RiskCategory::High => 0,
            RiskCategory::Medium => 1,
            RiskCategory::Safe => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskCategory::High => "high",
            RiskCategory::Medium => "medium",
            RiskCategory::Safe => "safe",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const HIGH_RISK_TAGS: &[&str] = &[
    // location
    "gpslatitude",
    "gpslongitude",
    "gpsaltitude",
    "gpsposition",
    "gpstimestamp",
    "gpsdatestamp",
    "gpsimgdirection",
    "gpsdestlatitude",
    "gpsdestlongitude",
    "gpsareainformation",
    "gpsprocessingmethod",
    "gpsspeed",
    "gpstrack",
    "gpsmapdatum",
    "subjectlocation",
    // time
    "datetime",
    "datetimeoriginal",
    "datetimedigitized",
    "createdate",
    "modifydate",
    "offsettime",
    "subsectime",
    // identity
    "artist",
    "copyright",
    "author",
    "creator",
    "ownername",
    "cameraownername",
    "xpauthor",
    // device identifiers
    "serialnumber",
    "bodyserialnumber",
    "lensserialnumber",
    "internalserialnumber",
    "imageuniqueid",
    // free text written by a person
    "imagedescription",
    "usercomment",
    "xpcomment",
    "xptitle",
    "xpsubject",
    "xpkeywords",
    "documentname",
    "makernote",
    // embedded metadata packets that can carry any of the above
    "xmlpacket",
    "iptc",
    // AI generation provenance
    "parameters",
    "prompt",
    "negative_prompt",
    "workflow",
    "sd-metadata",
    "invokeai_metadata",
    "dream",
    // tooling and host
    "software",
    "processingsoftware",
    "hostcomputer",
];

// Bare "make"/"model" are left to the pattern rules below so that the
// "model" carve-out for colour models keeps working.
const MEDIUM_RISK_TAGS: &[&str] = &[
    "lensmake",
    "lensmodel",
    "lensspecification",
    "exposuretime",
    "exposureprogram",
    "exposurebiasvalue",
    "exposuremode",
    "exposureindex",
    "fnumber",
    "isospeedratings",
    "photographicsensitivity",
    "sensitivitytype",
    "recommendedexposureindex",
    "focallength",
    "focallengthin35mmfilm",
    "aperturevalue",
    "maxaperturevalue",
    "shutterspeedvalue",
    "brightnessvalue",
    "flash",
    "whitebalance",
    "meteringmode",
    "lightsource",
    "subjectdistance",
    "digitalzoomratio",
    "scenecapturetype",
    "gaincontrol",
    "contrast",
    "saturation",
    "sharpness",
    "sensingmethod",
    "customrendered",
    "orientation",
    "rating",
];

const SAFE_TAGS: &[&str] = &[
    "imagewidth",
    "imageheight",
    "imagelength",
    "pixelxdimension",
    "pixelydimension",
    "bitspersample",
    "bitdepth",
    "samplesperpixel",
    "compression",
    "compressedbitsperpixel",
    "photometricinterpretation",
    "planarconfiguration",
    "xresolution",
    "yresolution",
    "resolutionunit",
    "ycbcr",
    "stripoffsets",
    "stripbytecounts",
    "rowsperstrip",
    "newsubfiletype",
    "subfiletype",
    "jpeginterchangeformat",
    "thumbnail",
    "ifdpointer",
    "colorspace",
    "colortype",
    "colormodel",
    "colorprofile",
    "iccprofile",
    "intercolorprofile",
    "whitepoint",
    "primarychromaticities",
    "referenceblackwhite",
    "transferfunction",
    "gamma",
    "exifversion",
    "flashpixversion",
    "componentsconfiguration",
    "interoperability",
    "filesource",
    "filetype",
    "mimetype",
    "interlace",
    "printimagematching",
];

enum Matcher {
    /// The name contains any of these.
    Any(&'static [&'static str]),
    /// The name contains `needle` but not `unless`.
    Except {
        needle: &'static str,
        unless: &'static str,
    },
}

impl Matcher {
    fn matches(&self, name: &str) -> bool {
        match self {
            Matcher::Any(needles) => needles.iter().any(|n| name.contains(n)),
            Matcher::Except { needle, unless } => name.contains(needle) && !name.contains(unless),
        }
    }
}

struct Rule {
    label: &'static str,
    matcher: Matcher,
    category: RiskCategory,
}

/// Evaluated top to bottom. Order matters: "ExposureTime" is high because the
/// time rule fires before any equipment rule, and "ColorModel" escapes the
/// model rule through its carve-out.
const RULES: &[Rule] = &[
    Rule {
        label: "high allow-list",
        matcher: Matcher::Any(HIGH_RISK_TAGS),
        category: RiskCategory::High,
    },
    Rule {
        label: "location",
        matcher: Matcher::Any(&["gps", "location", "coordinate", "latitude", "longitude"]),
        category: RiskCategory::High,
    },
    Rule {
        label: "date",
        matcher: Matcher::Any(&["date"]),
        category: RiskCategory::High,
    },
    Rule {
        label: "time",
        matcher: Matcher::Except {
            needle: "time",
            unless: "timezone",
        },
        category: RiskCategory::High,
    },
    Rule {
        label: "identity",
        matcher: Matcher::Any(&["owner", "artist", "serial", "comment", "author", "copyright"]),
        category: RiskCategory::High,
    },
    Rule {
        label: "medium allow-list",
        matcher: Matcher::Any(MEDIUM_RISK_TAGS),
        category: RiskCategory::Medium,
    },
    Rule {
        label: "equipment",
        matcher: Matcher::Any(&["camera", "lens", "make"]),
        category: RiskCategory::Medium,
    },
    Rule {
        label: "model",
        matcher: Matcher::Except {
            needle: "model",
            unless: "color",
        },
        category: RiskCategory::Medium,
    },
    Rule {
        label: "capture settings",
        matcher: Matcher::Any(&[
            "exposure",
            "iso",
            "focal",
            "aperture",
            "shutter",
            "flash",
            "white",
            "orientation",
        ]),
        category: RiskCategory::Medium,
    },
    Rule {
        label: "safe allow-list",
        matcher: Matcher::Any(SAFE_TAGS),
        category: RiskCategory::Safe,
    },
];

/// Replace a bare numeric tag ID with its name.
///
/// Known IDs resolve through the Main, EXIF and GPS tables in that order;
/// unknown IDs become `Unknown_Tag_<id>`. Any other input is already a name
/// and comes back unchanged.
pub fn normalize(tag: &str) -> Cow<'_, str> {
    if tag.is_empty() || !tag.bytes().all(|b| b.is_ascii_digit()) {
        return Cow::Borrowed(tag);
    }
    match tag.parse::<u16>().ok().and_then(any_tag_name) {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(format!("Unknown_Tag_{tag}")),
    }
}

/// Risk category of a tag name. Depends on nothing but the name.
pub fn classify(tag: &str) -> RiskCategory {
    let name = normalize(tag).to_ascii_lowercase();
    for rule in RULES {
        if rule.matcher.matches(&name) {
            trace!("{tag}: {} -> {}", rule.label, rule.category);
            return rule.category;
        }
    }
    RiskCategory::Medium
}

/// Human-readable explanation of what a tag reveals.
pub fn describe(tag: &str) -> Cow<'static, str> {
    let name = normalize(tag);
    if let Some(text) = known_description(&name) {
        return Cow::Borrowed(text);
    }

    let lower = name.to_ascii_lowercase();
    let contains_any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if contains_any(&["gps", "latitude", "longitude", "location", "coordinate"]) {
        Cow::Borrowed("GPS location data - reveals coordinates where the photo was taken")
    } else if lower.contains("date") || (lower.contains("time") && !lower.contains("timezone")) {
        Cow::Borrowed("Timestamp - reveals when the photo was taken and can expose daily routines")
    } else if contains_any(&["serial", "uniqueid"]) || lower.ends_with("id") {
        Cow::Borrowed("Unique identifier - enables device tracking across photos")
    } else if contains_any(&["make", "model", "camera", "lens"]) {
        Cow::Borrowed("Camera equipment info - identifies the device used")
    } else if contains_any(&["software", "version"]) {
        Cow::Borrowed("Software/version info - discloses the editing tools used")
    } else {
        Cow::Owned(format!("EXIF metadata: {name}"))
    }
}

fn known_description(name: &str) -> Option<&'static str> {
    Some(match name {
        "GPSLatitude" => "Latitude where the photo was taken",
        "GPSLongitude" => "Longitude where the photo was taken",
        "GPSLatitudeRef" => "North/South hemisphere of the photo location",
        "GPSLongitudeRef" => "East/West hemisphere of the photo location",
        "GPSAltitude" => "Altitude where the photo was taken",
        "GPSTimeStamp" => "UTC time from the GPS receiver",
        "GPSDateStamp" => "UTC date from the GPS receiver",
        "GPSImgDirection" => "Compass direction the camera was facing",
        "DateTime" => "Date and time the file was last changed",
        "DateTimeOriginal" => "Date and time the photo was taken",
        "DateTimeDigitized" => "Date and time the photo was digitized",
        "OffsetTime" | "OffsetTimeOriginal" | "OffsetTimeDigitized" => {
            "Timezone offset - narrows down where in the world the photo was taken"
        }
        "Artist" => "Name of the photographer",
        "Copyright" => "Copyright holder, usually a real name",
        "CameraOwnerName" => "Name of the camera's registered owner",
        "BodySerialNumber" => "Camera serial number - links photos to one device",
        "LensSerialNumber" => "Lens serial number - links photos to one lens",
        "ImageUniqueID" => "Unique identifier assigned to this image",
        "ImageDescription" => "Free-text description of the image",
        "UserComment" => "Free-text comment written by the user",
        "XPComment" | "XPTitle" | "XPSubject" | "XPKeywords" => {
            "Windows Explorer text field written by the user"
        }
        "XPAuthor" => "Author recorded by Windows Explorer",
        "MakerNote" => "Manufacturer-specific data, often containing serial numbers",
        "Software" => "Software used to create or edit the image",
        "HostComputer" => "Name of the computer used to process the image",
        "XMLPacket" => "Embedded XMP packet, may contain location and editing history",
        "parameters" | "prompt" | "workflow" => "AI image generation settings and prompt",
        "Make" => "Camera manufacturer",
        "Model" => "Camera model",
        "LensMake" => "Lens manufacturer",
        "LensModel" => "Lens model",
        "ExposureTime" => "Shutter speed in seconds",
        "FNumber" => "Aperture f-number",
        "ISOSpeedRatings" => "ISO sensitivity",
        "FocalLength" => "Lens focal length in millimetres",
        "Flash" => "Flash mode and whether it fired",
        "WhiteBalance" => "White balance mode",
        "Orientation" => "How the image should be rotated for display",
        "ImageWidth" => "Image width in pixels",
        "ImageLength" | "ImageHeight" => "Image height in pixels",
        "PixelXDimension" => "Width of the main image in pixels",
        "PixelYDimension" => "Height of the main image in pixels",
        "Compression" => "Compression scheme",
        "XResolution" => "Horizontal resolution",
        "YResolution" => "Vertical resolution",
        "ResolutionUnit" => "Unit of the resolution values",
        "ColorSpace" => "Colour space of the image data",
        "JPEGInterchangeFormat" => "Offset of the embedded thumbnail",
        "JPEGInterchangeFormatLength" => "Size of the embedded thumbnail",
        _ => return None,
    })
}
