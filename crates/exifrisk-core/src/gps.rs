// File: crates/exifrisk-core/src/gps.rs

use serde::Serialize;

use crate::value::{RawTagMap, TagValue};

/// A decoded GPS position in signed decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsCoordinate {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters; negative below sea level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

/// Pull a coordinate out of decoded GPS tags.
///
/// Returns `None` when latitude or longitude is missing, unparseable or out
/// of range. A photo without GPS is the normal case, not an error.
pub fn extract_gps(tags: &RawTagMap) -> Option<GpsCoordinate> {
    let latitude = signed_degrees(tags, "GPSLatitude", "GPSLatitudeRef", 'S')?;
    let longitude = signed_degrees(tags, "GPSLongitude", "GPSLongitudeRef", 'W')?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }

    let altitude = tags
        .get("GPSAltitude")
        .and_then(TagValue::as_f64)
        .filter(|a| a.is_finite())
        .map(|a| match tags.get("GPSAltitudeRef").and_then(TagValue::as_f64) {
            Some(r) if r == 1.0 => -a,
            _ => a,
        });

    Some(GpsCoordinate {
        latitude,
        longitude,
        altitude,
    })
}

fn signed_degrees(tags: &RawTagMap, value_tag: &str, ref_tag: &str, negative_ref: char) -> Option<f64> {
    let degrees = to_decimal_degrees(tags.get(value_tag)?)?;
    let negative = tags
        .get(ref_tag)
        .and_then(TagValue::as_text)
        .and_then(|r| r.trim().chars().next())
        .is_some_and(|c| c.eq_ignore_ascii_case(&negative_ref));
    Some(if negative { -degrees.abs() } else { degrees })
}

/// Decimal degrees from a scalar, a numeric string, or a
/// degrees/minutes/seconds triple.
pub fn to_decimal_degrees(value: &TagValue) -> Option<f64> {
    let degrees = match value {
        TagValue::List(parts) if parts.len() == 3 => {
            let d = parts[0].as_f64()?;
            let m = parts[1].as_f64()?;
            let s = parts[2].as_f64()?;
            d + m / 60.0 + s / 3600.0
        }
        other => other.as_f64()?,
    };
    degrees.is_finite().then_some(degrees)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dms(d: f64, m: f64, s: f64) -> TagValue {
        TagValue::List(vec![TagValue::Float(d), TagValue::Float(m), TagValue::Float(s)])
    }

    fn tags_with(lat_ref: Option<&str>, lon_ref: Option<&str>) -> RawTagMap {
        let mut tags = RawTagMap::new();
        tags.insert("GPSLatitude", dms(40.0, 26.0, 46.0));
        tags.insert("GPSLongitude", dms(79.0, 58.0, 56.0));
        if let Some(r) = lat_ref {
            tags.insert("GPSLatitudeRef", TagValue::Text(r.into()));
        }
        if let Some(r) = lon_ref {
            tags.insert("GPSLongitudeRef", TagValue::Text(r.into()));
        }
        tags
    }

    #[test]
    fn north_east_is_positive() {
        let gps = extract_gps(&tags_with(Some("N"), Some("E"))).unwrap();
        assert!((gps.latitude - 40.446_111).abs() < 1e-5, "{}", gps.latitude);
        assert!((gps.longitude - 79.982_222).abs() < 1e-5, "{}", gps.longitude);
        assert_eq!(gps.altitude, None);
    }

    #[test]
    fn south_west_is_negative() {
        let gps = extract_gps(&tags_with(Some("S"), Some("W"))).unwrap();
        assert!((gps.latitude + 40.446_111).abs() < 1e-5);
        assert!((gps.longitude + 79.982_222).abs() < 1e-5);
    }

    #[test]
    fn missing_refs_default_to_north_and_east() {
        let gps = extract_gps(&tags_with(None, None)).unwrap();
        assert!(gps.latitude > 0.0);
        assert!(gps.longitude > 0.0);
    }

    #[test]
    fn accepts_decimal_and_string_values() {
        let mut tags = RawTagMap::new();
        tags.insert("GPSLatitude", TagValue::Text("51.5007".into()));
        tags.insert("GPSLongitude", TagValue::Float(0.1246));
        tags.insert("GPSLongitudeRef", TagValue::Text("W".into()));
        let gps = extract_gps(&tags).unwrap();
        assert_eq!(gps.latitude, 51.5007);
        assert_eq!(gps.longitude, -0.1246);
    }

    #[test]
    fn altitude_below_sea_level() {
        let mut tags = tags_with(Some("N"), Some("E"));
        tags.insert("GPSAltitude", TagValue::Float(28.5));
        tags.insert("GPSAltitudeRef", TagValue::Integer(1));
        assert_eq!(extract_gps(&tags).unwrap().altitude, Some(-28.5));
    }

    #[test]
    fn missing_or_garbage_is_none() {
        let mut tags = RawTagMap::new();
        tags.insert("GPSLatitude", dms(40.0, 26.0, 46.0));
        assert_eq!(extract_gps(&tags), None);

        let mut tags = RawTagMap::new();
        tags.insert("GPSLatitude", TagValue::Text("north-ish".into()));
        tags.insert("GPSLongitude", TagValue::Float(10.0));
        assert_eq!(extract_gps(&tags), None);

        let mut tags = RawTagMap::new();
        tags.insert("GPSLatitude", TagValue::Float(123.0));
        tags.insert("GPSLongitude", TagValue::Float(10.0));
        assert_eq!(extract_gps(&tags), None);
    }
}
