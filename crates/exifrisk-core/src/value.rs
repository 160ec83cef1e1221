// File: crates/exifrisk-core/src/value.rs

//! Tag values and the decoder that materialises them from IFD entries.
//!
//! A TIFF entry stores its value inline in the 4-byte value field when the
//! value fits, and otherwise stores an offset (relative to the TIFF header)
//! to where the value lives.

use std::collections::BTreeMap;

use crate::cursor::{ByteCursor, ByteOrder};
use crate::ifd::DirectoryEntry;

/// A decoded tag value.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Integer(i64),
    Float(f64),
    Text(String),
    /// UNDEFINED payloads, kept as raw bytes.
    Bytes(Vec<u8>),
    List(Vec<TagValue>),
}

impl TagValue {
    /// Numeric view of the value. Numeric strings are parsed; a one-element
    /// list is unwrapped.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TagValue::Integer(v) => Some(*v as f64),
            TagValue::Float(v) => Some(*v),
            TagValue::Text(s) => s.trim().parse().ok(),
            TagValue::List(items) if items.len() == 1 => items[0].as_f64(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TagValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// The TIFF field types this decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Byte,
    Ascii,
    Short,
    Long,
    Rational,
    Undefined,
    SLong,
    SRational,
}

impl FieldType {
    pub fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            1 => FieldType::Byte,
            2 => FieldType::Ascii,
            3 => FieldType::Short,
            4 => FieldType::Long,
            5 => FieldType::Rational,
            7 => FieldType::Undefined,
            9 => FieldType::SLong,
            10 => FieldType::SRational,
            _ => return None,
        })
    }

    /// Size in bytes of one element.
    pub fn width(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::Undefined => 1,
            FieldType::Short => 2,
            FieldType::Long | FieldType::SLong => 4,
            FieldType::Rational | FieldType::SRational => 8,
        }
    }
}

/// Decode the value of one directory entry.
///
/// Returns `None` for unsupported field types, zero counts and any value
/// whose bytes fall outside `buf`. The full extent is checked before anything
/// is allocated, so a corrupt `count` costs nothing.
pub fn decode_value(
    buf: &[u8],
    order: ByteOrder,
    entry: &DirectoryEntry,
    tiff_start: usize,
) -> Option<TagValue> {
    let field_type = FieldType::from_code(entry.type_code)?;
    if entry.count == 0 {
        return None;
    }
    let count = usize::try_from(entry.count).ok()?;
    let total = field_type.width().checked_mul(count)?;

    let mut cursor = if total <= 4 {
        ByteCursor::new(&entry.value_field[..])
    } else {
        let offset = usize::try_from(order.u32_from(entry.value_field)).ok()?;
        ByteCursor::at(buf, tiff_start.checked_add(offset)?)
    };
    if !cursor.has(total) {
        return None;
    }

    match field_type {
        FieldType::Ascii => cursor.read_fixed_string(count).map(TagValue::Text),
        FieldType::Undefined => cursor
            .read_bytes(count)
            .map(|bytes| TagValue::Bytes(bytes.to_vec())),
        _ if count == 1 => read_scalar(&mut cursor, field_type, order),
        _ => {
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(read_scalar(&mut cursor, field_type, order)?);
            }
            Some(TagValue::List(items))
        }
    }
}

fn read_scalar(cursor: &mut ByteCursor<'_>, field_type: FieldType, order: ByteOrder) -> Option<TagValue> {
    match field_type {
        FieldType::Byte => cursor.read_u8().map(|v| TagValue::Integer(v.into())),
        FieldType::Short => cursor.read_u16(order).map(|v| TagValue::Integer(v.into())),
        FieldType::Long => cursor.read_u32(order).map(|v| TagValue::Integer(v.into())),
        FieldType::SLong => cursor.read_i32(order).map(|v| TagValue::Integer(v.into())),
        FieldType::Rational => cursor.read_rational(order).map(TagValue::Float),
        FieldType::SRational => cursor.read_srational(order).map(TagValue::Float),
        FieldType::Ascii | FieldType::Undefined => None,
    }
}

/// Tag name -> decoded value, as produced by one decode call.
///
/// Iteration is ordered by name. When a name is inserted twice the first
/// value is kept: IFD0 is always walked before the thumbnail IFD that
/// repeats some of its tags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTagMap {
    entries: BTreeMap<String, TagValue>,
}

impl RawTagMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the name is already present. Returns whether the value
    /// was stored.
    pub fn insert(&mut self, name: impl Into<String>, value: TagValue) -> bool {
        match self.entries.entry(name.into()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Add every entry of `other` whose name is not taken yet.
    pub fn merge(&mut self, other: RawTagMap) {
        for (name, value) in other.entries {
            self.entries.entry(name).or_insert(value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&TagValue> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(type_code: u16, count: u32, value_field: [u8; 4]) -> DirectoryEntry {
        DirectoryEntry {
            tag_id: 0,
            type_code,
            count,
            value_field,
        }
    }

    #[test]
    fn inline_short_pair() {
        let e = entry(3, 2, [0x00, 0x02, 0x00, 0x03]);
        assert_eq!(
            decode_value(&[], ByteOrder::BigEndian, &e, 0),
            Some(TagValue::List(vec![TagValue::Integer(2), TagValue::Integer(3)]))
        );
    }

    #[test]
    fn four_byte_ascii_is_inline_and_five_byte_is_offset() {
        let inline = entry(2, 4, *b"abc\0");
        // "abc" padded to five bytes, stored at offset 2 from a TIFF start of 1.
        let buf = b"xxxabc\0\0";
        let offset = entry(2, 5, [0, 0, 0, 2]);

        let a = decode_value(&[], ByteOrder::BigEndian, &inline, 0);
        let b = decode_value(buf, ByteOrder::BigEndian, &offset, 1);
        assert_eq!(a, Some(TagValue::Text("abc".into())));
        assert_eq!(a, b);
    }

    #[test]
    fn four_and_five_bytes_decode_the_same_way() {
        let inline = entry(1, 4, [9, 8, 7, 6]);
        let buf = [0, 0, 9, 8, 7, 6, 5];
        let offset = entry(1, 5, [2, 0, 0, 0]);

        let Some(TagValue::List(short)) = decode_value(&[], ByteOrder::LittleEndian, &inline, 0)
        else {
            panic!("inline bytes did not decode to a list");
        };
        let Some(TagValue::List(long)) = decode_value(&buf, ByteOrder::LittleEndian, &offset, 0)
        else {
            panic!("offset bytes did not decode to a list");
        };
        assert_eq!(short[..], long[..4]);
        assert_eq!(long[4], TagValue::Integer(5));
    }

    #[test]
    fn rational_reads_through_offset() {
        let buf = [0, 0, 0, 1, 0, 0, 0, 4];
        let e = entry(5, 1, [0, 0, 0, 0]);
        assert_eq!(
            decode_value(&buf, ByteOrder::BigEndian, &e, 0),
            Some(TagValue::Float(0.25))
        );
    }

    #[test]
    fn signed_long_is_sign_extended() {
        let e = entry(9, 1, (-5i32).to_le_bytes());
        assert_eq!(
            decode_value(&[], ByteOrder::LittleEndian, &e, 0),
            Some(TagValue::Integer(-5))
        );
    }

    #[test]
    fn undefined_stays_raw() {
        let e = entry(7, 4, *b"0232");
        assert_eq!(
            decode_value(&[], ByteOrder::BigEndian, &e, 0),
            Some(TagValue::Bytes(b"0232".to_vec()))
        );
    }

    #[test]
    fn unsupported_type_and_zero_count_are_dropped() {
        // 11 = FLOAT, 12 = DOUBLE
        assert_eq!(decode_value(&[], ByteOrder::BigEndian, &entry(11, 1, [0; 4]), 0), None);
        assert_eq!(decode_value(&[], ByteOrder::BigEndian, &entry(3, 0, [0; 4]), 0), None);
    }

    #[test]
    fn offset_past_end_is_none() {
        let buf = [0u8; 16];
        let e = entry(4, 4, [0, 0, 0, 10]);
        assert_eq!(decode_value(&buf, ByteOrder::BigEndian, &e, 0), None);
    }

    #[test]
    fn huge_count_does_not_allocate_or_panic() {
        let buf = [0u8; 64];
        let e = entry(10, u32::MAX, [0, 0, 0, 8]);
        assert_eq!(decode_value(&buf, ByteOrder::BigEndian, &e, 0), None);
    }

    #[test]
    fn first_insert_wins() {
        let mut map = RawTagMap::new();
        assert!(map.insert("Compression", TagValue::Integer(1)));
        assert!(!map.insert("Compression", TagValue::Integer(6)));
        assert_eq!(map.get("Compression"), Some(&TagValue::Integer(1)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn merge_keeps_existing_entries() {
        let mut map = RawTagMap::new();
        map.insert("ImageWidth", TagValue::Integer(640));
        let mut exif = RawTagMap::new();
        exif.insert("ImageWidth", TagValue::Integer(4000));
        exif.insert("Make", TagValue::Text("Cam".into()));
        map.merge(exif);
        assert_eq!(map.get("ImageWidth"), Some(&TagValue::Integer(640)));
        assert_eq!(map.get("Make"), Some(&TagValue::Text("Cam".into())));
    }

    #[test]
    fn numeric_views() {
        assert_eq!(TagValue::Text(" 12.5 ".into()).as_f64(), Some(12.5));
        assert_eq!(TagValue::List(vec![TagValue::Integer(3)]).as_f64(), Some(3.0));
        assert_eq!(TagValue::Bytes(vec![1]).as_f64(), None);
    }
}
