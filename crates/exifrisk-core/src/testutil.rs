//! Synthetic TIFF/JPEG builders for decoder tests.

use crate::cursor::ByteOrder;

enum Payload {
    Raw(u16, u32, Vec<u8>),
    Shorts(Vec<u16>),
    Longs(Vec<u32>),
    SLongs(Vec<i32>),
    Rationals(Vec<(u32, u32)>),
    SRationals(Vec<(i32, i32)>),
    Pointer(usize),
}

pub(crate) struct Field {
    tag: u16,
    payload: Payload,
}

impl Field {
    pub(crate) fn raw(tag: u16, type_code: u16, count: u32, data: Vec<u8>) -> Self {
        Self {
            tag,
            payload: Payload::Raw(type_code, count, data),
        }
    }

    pub(crate) fn bytes(tag: u16, data: &[u8]) -> Self {
        Self::raw(tag, 1, data.len() as u32, data.to_vec())
    }

    pub(crate) fn ascii(tag: u16, text: &str) -> Self {
        let mut data = text.as_bytes().to_vec();
        data.push(0);
        Self::raw(tag, 2, data.len() as u32, data)
    }

    pub(crate) fn undefined(tag: u16, data: &[u8]) -> Self {
        Self::raw(tag, 7, data.len() as u32, data.to_vec())
    }

    pub(crate) fn shorts(tag: u16, values: &[u16]) -> Self {
        Self {
            tag,
            payload: Payload::Shorts(values.to_vec()),
        }
    }

    pub(crate) fn longs(tag: u16, values: &[u32]) -> Self {
        Self {
            tag,
            payload: Payload::Longs(values.to_vec()),
        }
    }

    pub(crate) fn slongs(tag: u16, values: &[i32]) -> Self {
        Self {
            tag,
            payload: Payload::SLongs(values.to_vec()),
        }
    }

    pub(crate) fn rationals(tag: u16, values: &[(u32, u32)]) -> Self {
        Self {
            tag,
            payload: Payload::Rationals(values.to_vec()),
        }
    }

    pub(crate) fn srationals(tag: u16, values: &[(i32, i32)]) -> Self {
        Self {
            tag,
            payload: Payload::SRationals(values.to_vec()),
        }
    }

    /// A LONG holding the offset of another IFD added to the same builder.
    pub(crate) fn pointer(tag: u16, ifd: usize) -> Self {
        Self {
            tag,
            payload: Payload::Pointer(ifd),
        }
    }

    /// (type code, count, encoded bytes)
    fn encode(&self, order: ByteOrder, ifd_offsets: &[u32]) -> (u16, u32, Vec<u8>) {
        let mut out = Vec::new();
        match &self.payload {
            Payload::Raw(type_code, count, data) => return (*type_code, *count, data.clone()),
            Payload::Shorts(v) => {
                v.iter().for_each(|x| put_u16(&mut out, order, *x));
                (3, v.len() as u32, out)
            }
            Payload::Longs(v) => {
                v.iter().for_each(|x| put_u32(&mut out, order, *x));
                (4, v.len() as u32, out)
            }
            Payload::SLongs(v) => {
                v.iter().for_each(|x| put_u32(&mut out, order, *x as u32));
                (9, v.len() as u32, out)
            }
            Payload::Rationals(v) => {
                for (n, d) in v {
                    put_u32(&mut out, order, *n);
                    put_u32(&mut out, order, *d);
                }
                (5, v.len() as u32, out)
            }
            Payload::SRationals(v) => {
                for (n, d) in v {
                    put_u32(&mut out, order, *n as u32);
                    put_u32(&mut out, order, *d as u32);
                }
                (10, v.len() as u32, out)
            }
            Payload::Pointer(ifd) => {
                put_u32(&mut out, order, ifd_offsets[*ifd]);
                (4, 1, out)
            }
        }
    }
}

struct PendingIfd {
    fields: Vec<Field>,
    next: Option<usize>,
}

/// Lays out a TIFF structure: header, then every IFD back to back, then the
/// out-of-line value area.
pub(crate) struct TiffBuilder {
    order: ByteOrder,
    ifds: Vec<PendingIfd>,
    root: usize,
}

impl TiffBuilder {
    pub(crate) fn new(order: ByteOrder) -> Self {
        Self {
            order,
            ifds: Vec::new(),
            root: 0,
        }
    }

    pub(crate) fn add_ifd(&mut self, fields: Vec<Field>) -> usize {
        self.ifds.push(PendingIfd { fields, next: None });
        self.ifds.len() - 1
    }

    pub(crate) fn push_field(&mut self, ifd: usize, field: Field) {
        self.ifds[ifd].fields.push(field);
    }

    pub(crate) fn set_next(&mut self, ifd: usize, next: usize) {
        self.ifds[ifd].next = Some(next);
    }

    pub(crate) fn set_root(&mut self, ifd: usize) {
        self.root = ifd;
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let order = self.order;
        let mut offsets = Vec::with_capacity(self.ifds.len());
        let mut pos = 8u32;
        for ifd in &self.ifds {
            offsets.push(pos);
            pos += 2 + 12 * ifd.fields.len() as u32 + 4;
        }
        let data_start = pos;

        let mut out = Vec::new();
        out.extend_from_slice(match order {
            ByteOrder::LittleEndian => b"II",
            ByteOrder::BigEndian => b"MM",
        });
        put_u16(&mut out, order, 42);
        put_u32(&mut out, order, offsets.get(self.root).copied().unwrap_or(0));

        let mut data = Vec::new();
        for ifd in &self.ifds {
            put_u16(&mut out, order, ifd.fields.len() as u16);
            for field in &ifd.fields {
                let (type_code, count, bytes) = field.encode(order, &offsets);
                put_u16(&mut out, order, field.tag);
                put_u16(&mut out, order, type_code);
                put_u32(&mut out, order, count);
                if bytes.len() <= 4 {
                    let mut inline = [0u8; 4];
                    inline[..bytes.len()].copy_from_slice(&bytes);
                    out.extend_from_slice(&inline);
                } else {
                    put_u32(&mut out, order, data_start + data.len() as u32);
                    data.extend_from_slice(&bytes);
                    if data.len() % 2 == 1 {
                        data.push(0);
                    }
                }
            }
            let next = ifd.next.map(|n| offsets[n]).unwrap_or(0);
            put_u32(&mut out, order, next);
        }
        out.extend_from_slice(&data);
        out
    }
}

/// Wrap a TIFF structure into a minimal JPEG: SOI, APP1 "Exif", a DQT
/// segment, SOS and EOI.
pub(crate) fn jpeg_with_exif(tiff: &[u8]) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    out.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(tiff);
    out.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x05, 0x00, 0x01, 0x01]);
    out.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02, 0x3F, 0x00]);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

fn put_u16(out: &mut Vec<u8>, order: ByteOrder, v: u16) {
    out.extend_from_slice(&match order {
        ByteOrder::LittleEndian => v.to_le_bytes(),
        ByteOrder::BigEndian => v.to_be_bytes(),
    });
}

fn put_u32(out: &mut Vec<u8>, order: ByteOrder, v: u32) {
    out.extend_from_slice(&match order {
        ByteOrder::LittleEndian => v.to_le_bytes(),
        ByteOrder::BigEndian => v.to_be_bytes(),
    });
}
