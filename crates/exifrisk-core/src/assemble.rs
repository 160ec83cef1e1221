// File: crates/exifrisk-core/src/assemble.rs

//! Turns a [`RawTagMap`] into the sorted, annotated list shown to users.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::classify::{RiskCategory, classify, describe, normalize};
use crate::config::DecodeLimits;
use crate::cursor::ByteOrder;
use crate::value::{RawTagMap, TagValue};

/// Key prefixes used for bookkeeping entries that are never shown.
const RESERVED_PREFIXES: &[&str] = &["_", "$"];

const TRUNCATION_MARKER: &str = "...";

const UNICODE_CHARSET: &[u8; 8] = b"UNICODE\0";

/// A value ready for display or JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Integer(i64),
    Number(f64),
    Text(String),
    List(Vec<DisplayValue>),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Integer(v) => write!(f, "{v}"),
            DisplayValue::Number(v) => write!(f, "{v}"),
            DisplayValue::Text(s) => f.write_str(s),
            DisplayValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// One classified tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedTag {
    pub tag: String,
    pub value: DisplayValue,
    pub description: String,
    pub category: RiskCategory,
}

/// Classify, describe and format every displayable tag, sorted high risk
/// first and then by name.
pub fn assemble(raw: &RawTagMap, limits: &DecodeLimits) -> Vec<ProcessedTag> {
    let mut tags: Vec<ProcessedTag> = raw
        .iter()
        .filter(|(key, _)| !key.is_empty() && !RESERVED_PREFIXES.iter().any(|p| key.starts_with(p)))
        .filter_map(|(key, value)| {
            let name = normalize(key).into_owned();
            let value = format_value(&name, value, limits)?;
            Some(ProcessedTag {
                category: classify(&name),
                description: describe(&name).into_owned(),
                value,
                tag: name,
            })
        })
        .collect();
    sort_tags(&mut tags);
    tags
}

/// Stable sort by category rank, then tag name (byte order).
pub fn sort_tags(tags: &mut [ProcessedTag]) {
    tags.sort_by(|a, b| {
        a.category
            .rank()
            .cmp(&b.category.rank())
            .then_with(|| a.tag.cmp(&b.tag))
    });
}

/// Render one raw value. `None` means there is nothing worth showing.
pub fn format_value(name: &str, value: &TagValue, limits: &DecodeLimits) -> Option<DisplayValue> {
    match value {
        TagValue::Integer(v) => Some(DisplayValue::Integer(*v)),
        TagValue::Float(v) => format_float(*v),
        TagValue::Text(s) => format_text(s),
        TagValue::Bytes(bytes) => format_bytes(name, bytes, limits),
        TagValue::List(items) => {
            if name.starts_with("XP") {
                if let Some(text) = decode_ucs2(items) {
                    return format_text(&text);
                }
            }
            if items.len() > limits.max_list_len {
                let rendered = items
                    .iter()
                    .filter_map(|item| format_value(name, item, limits))
                    .map(|item| item.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Some(DisplayValue::Text(cap(&format!("[{rendered}]"), limits.max_display_len)));
            }
            let formatted: Vec<_> = items
                .iter()
                .filter_map(|item| format_value(name, item, limits))
                .collect();
            (!formatted.is_empty()).then_some(DisplayValue::List(formatted))
        }
    }
}

fn format_float(v: f64) -> Option<DisplayValue> {
    if !v.is_finite() {
        return None;
    }
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        return Some(DisplayValue::Integer(v as i64));
    }
    Some(DisplayValue::Number((v * 1e6).round() / 1e6))
}

fn format_text(s: &str) -> Option<DisplayValue> {
    let trimmed = s.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if trimmed.is_empty() {
        return None;
    }
    Some(DisplayValue::Text(
        exif_date_to_iso(trimmed).unwrap_or_else(|| trimmed.to_string()),
    ))
}

/// EXIF writes dates as `YYYY:MM:DD HH:MM:SS`; GPS date stamps as
/// `YYYY:MM:DD`.
fn exif_date_to_iso(s: &str) -> Option<String> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S") {
        return Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string());
    }
    NaiveDate::parse_from_str(s, "%Y:%m:%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

fn format_bytes(name: &str, bytes: &[u8], limits: &DecodeLimits) -> Option<DisplayValue> {
    if bytes.is_empty() {
        return None;
    }
    let payload = if name == "UserComment" {
        let body = strip_charset_prefix(bytes)?;
        if bytes.starts_with(UNICODE_CHARSET) {
            if let Some(text) = utf16_text(body, guess_utf16_order(body)) {
                return format_text(&text).map(|v| cap_display(v, limits));
            }
        }
        body
    } else {
        bytes
    };

    let text = payload.strip_suffix(&[0]).unwrap_or(payload);
    if !text.is_empty() && text.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        let text = String::from_utf8_lossy(text);
        return format_text(&text).map(|v| cap_display(v, limits));
    }
    if payload.iter().all(|&b| b == 0) {
        return None;
    }
    let rendered = format!("{} bytes: {}", payload.len(), hex::encode(payload));
    Some(DisplayValue::Text(cap(&rendered, limits.max_display_len)))
}

/// `UserComment` starts with an 8-byte character code. Returns `None` when
/// the comment body is empty.
fn strip_charset_prefix(bytes: &[u8]) -> Option<&[u8]> {
    if bytes.len() < 8 {
        return Some(bytes);
    }
    let (code, body) = bytes.split_at(8);
    let known = [
        &b"ASCII\0\0\0"[..],
        &UNICODE_CHARSET[..],
        &b"JIS\0\0\0\0\0"[..],
        &b"\0\0\0\0\0\0\0\0"[..],
    ];
    if !known.contains(&code) {
        return Some(bytes);
    }
    let body = body
        .iter()
        .rposition(|&b| b != 0 && b != b' ')
        .map(|end| &body[..=end])?;
    Some(body)
}

/// Windows XP tags hold UCS-2LE text in a BYTE array.
fn decode_ucs2(items: &[TagValue]) -> Option<String> {
    let bytes = items
        .iter()
        .map(|item| match item {
            TagValue::Integer(b) => u8::try_from(*b).ok(),
            _ => None,
        })
        .collect::<Option<Vec<u8>>>()?;
    utf16_text(&bytes, ByteOrder::LittleEndian)
}

/// A `UNICODE` comment is written in the byte order of its TIFF block,
/// which the raw value no longer carries. Mostly-Latin text has its zero
/// bytes on the high side of each unit, so that side gives the order away.
fn guess_utf16_order(bytes: &[u8]) -> ByteOrder {
    let zeros_at = |parity: usize| {
        bytes
            .iter()
            .skip(parity)
            .step_by(2)
            .filter(|&&b| b == 0)
            .count()
    };
    if zeros_at(1) > zeros_at(0) {
        ByteOrder::LittleEndian
    } else {
        ByteOrder::BigEndian
    }
}

/// Decode UTF-16 up to the first NUL unit. A dangling odd byte is the low
/// half of a unit whose zero high byte was trimmed away.
fn utf16_text(bytes: &[u8], order: ByteOrder) -> Option<String> {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| {
            let pair = [pair[0], pair.get(1).copied().unwrap_or(0)];
            order.u16_from(pair)
        })
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16(&units).ok()
}

fn cap_display(value: DisplayValue, limits: &DecodeLimits) -> DisplayValue {
    match value {
        DisplayValue::Text(s) => DisplayValue::Text(cap(&s, limits.max_display_len)),
        other => other,
    }
}

fn cap(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(TRUNCATION_MARKER.len());
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}
