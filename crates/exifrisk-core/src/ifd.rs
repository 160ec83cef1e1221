// File: crates/exifrisk-core/src/ifd.rs

//! Image File Directory walking.
//!
//! An IFD is a u16 entry count, that many 12-byte entries, and a u32 offset
//! to the next IFD (0 for none):
//!
//! ```text
//! Bytes 0-1:  Tag ID
//! Bytes 2-3:  Field type
//! Bytes 4-7:  Count
//! Bytes 8-11: Value (inline) or offset to value
//! ```
//!
//! IFD0 links to the EXIF and GPS sub-IFDs through pointer tags and to IFD1
//! (the thumbnail) through its next offset. All offsets are relative to the
//! TIFF header and none of them can be trusted.

use std::collections::HashSet;

use log::debug;

use crate::config::{DecodeLimits, IFD_DEPTH_CEILING};
use crate::cursor::{ByteCursor, ByteOrder};
use crate::tags::{EXIF_IFD_POINTER, GPS_IFD_POINTER, Namespace, tag_name};
use crate::tiff::TiffHeader;
use crate::value::{RawTagMap, decode_value};

/// Size of a single IFD entry in bytes.
pub const IFD_ENTRY_SIZE: usize = 12;

/// One raw directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub tag_id: u16,
    pub type_code: u16,
    pub count: u32,
    /// The last four bytes of the entry, exactly as stored.
    pub value_field: [u8; 4],
}

/// Walks the IFD tree of one TIFF structure into a [`RawTagMap`].
///
/// Each directory is visited at most once. Together with the depth cap this
/// guarantees termination even when offsets point back into the chain.
pub struct DirectoryDecoder<'a> {
    buf: &'a [u8],
    header: TiffHeader,
    limits: &'a DecodeLimits,
    visited: HashSet<usize>,
}

impl<'a> DirectoryDecoder<'a> {
    pub fn new(buf: &'a [u8], header: TiffHeader, limits: &'a DecodeLimits) -> Self {
        Self {
            buf,
            header,
            limits,
            visited: HashSet::new(),
        }
    }

    /// Decode everything reachable from the first IFD.
    pub fn decode(mut self) -> RawTagMap {
        let mut tags = RawTagMap::new();
        if self.header.first_ifd_offset != 0 {
            self.decode_ifd(self.header.first_ifd_offset, Namespace::Main, 0, &mut tags);
        }
        tags
    }

    /// Decode the IFD at `offset` (relative to the TIFF header) into `tags`.
    ///
    /// Failures only end this directory; whatever was collected so far stays
    /// in `tags`.
    pub fn decode_ifd(&mut self, offset: u32, namespace: Namespace, depth: usize, tags: &mut RawTagMap) {
        let max_depth = self.limits.max_ifd_depth.min(IFD_DEPTH_CEILING);
        if depth > max_depth {
            debug!("IFD at offset {offset} exceeds depth {max_depth}, skipping");
            return;
        }
        let Some(start) = usize::try_from(offset)
            .ok()
            .and_then(|o| self.header.tiff_start.checked_add(o))
        else {
            return;
        };
        if !self.visited.insert(start) {
            debug!("IFD at offset {offset} already visited, breaking cycle");
            return;
        }

        let order = self.header.byte_order;
        let mut cursor = ByteCursor::at(self.buf, start);
        let Some(count) = cursor.read_u16(order).map(usize::from) else {
            debug!("{namespace:?} IFD offset {offset} is outside the buffer");
            return;
        };
        if count > self.limits.max_ifd_entries {
            debug!(
                "{namespace:?} IFD at offset {offset} claims {count} entries (limit {}), skipping",
                self.limits.max_ifd_entries
            );
            return;
        }
        if !cursor.has(count * IFD_ENTRY_SIZE) {
            debug!("{namespace:?} IFD at offset {offset} is truncated, skipping");
            return;
        }

        for _ in 0..count {
            let Some(entry) = read_entry(&mut cursor, order) else {
                return;
            };
            self.decode_entry(&entry, namespace, depth, tags);
        }

        // The next-IFD link only chains main directories (IFD0 -> IFD1).
        let next = cursor.read_u32(order).unwrap_or(0);
        if next != 0 && namespace == Namespace::Main {
            self.decode_ifd(next, Namespace::Main, depth + 1, tags);
        }
    }

    fn decode_entry(&mut self, entry: &DirectoryEntry, namespace: Namespace, depth: usize, tags: &mut RawTagMap) {
        if namespace != Namespace::Gps {
            let sub_namespace = match entry.tag_id {
                EXIF_IFD_POINTER => Some(Namespace::Exif),
                GPS_IFD_POINTER => Some(Namespace::Gps),
                _ => None,
            };
            if let Some(sub_namespace) = sub_namespace {
                let target = self.header.byte_order.u32_from(entry.value_field);
                self.decode_ifd(target, sub_namespace, depth + 1, tags);
                return;
            }
        }

        let Some(name) = tag_name(namespace, entry.tag_id) else {
            return;
        };
        match decode_value(self.buf, self.header.byte_order, entry, self.header.tiff_start) {
            Some(value) => {
                tags.insert(name, value);
            }
            None => debug!(
                "dropping {name}: type {} count {} did not decode",
                entry.type_code, entry.count
            ),
        }
    }
}

fn read_entry(cursor: &mut ByteCursor<'_>, order: ByteOrder) -> Option<DirectoryEntry> {
    let tag_id = cursor.read_u16(order)?;
    let type_code = cursor.read_u16(order)?;
    let count = cursor.read_u32(order)?;
    let raw = cursor.read_bytes(4)?;
    Some(DirectoryEntry {
        tag_id,
        type_code,
        count,
        value_field: [raw[0], raw[1], raw[2], raw[3]],
    })
}
