// File: crates/exifrisk-core/src/cursor.rs

//! Bounds-checked, endian-aware reads over an immutable byte buffer.
//!
//! Every read returns `None` instead of panicking when the requested bytes
//! are not all inside the buffer. A failed read leaves the position where it
//! was, so callers can give up on one field and carry on with the next.

/// Byte order of multi-byte values, declared by the TIFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// "II" (Intel)
    LittleEndian,
    /// "MM" (Motorola)
    BigEndian,
}

impl ByteOrder {
    #[inline]
    pub fn u16_from(self, bytes: [u8; 2]) -> u16 {
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(bytes),
            ByteOrder::BigEndian => u16::from_be_bytes(bytes),
        }
    }

    #[inline]
    pub fn u32_from(self, bytes: [u8; 4]) -> u32 {
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(bytes),
            ByteOrder::BigEndian => u32::from_be_bytes(bytes),
        }
    }

    #[inline]
    pub fn i32_from(self, bytes: [u8; 4]) -> i32 {
        match self {
            ByteOrder::LittleEndian => i32::from_le_bytes(bytes),
            ByteOrder::BigEndian => i32::from_be_bytes(bytes),
        }
    }
}

/// A read position over a borrowed buffer.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// A cursor positioned at `pos`. The position may lie past the end; the
    /// first read will then fail.
    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Bytes left between the position and the end of the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Whether `len` more bytes can be read from the current position.
    #[inline]
    pub fn has(&self, len: usize) -> bool {
        self.remaining() >= len
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let slice = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let slice = self.take(N)?;
        // `take` returned exactly N bytes.
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Some(out)
    }

    pub fn read_u8(&mut self) -> Option<u8> {
        self.take_array::<1>().map(|b| b[0])
    }

    pub fn read_u16(&mut self, order: ByteOrder) -> Option<u16> {
        self.take_array().map(|b| order.u16_from(b))
    }

    pub fn read_u32(&mut self, order: ByteOrder) -> Option<u32> {
        self.take_array().map(|b| order.u32_from(b))
    }

    pub fn read_i32(&mut self, order: ByteOrder) -> Option<i32> {
        self.take_array().map(|b| order.i32_from(b))
    }

    /// Borrow `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        self.take(len)
    }

    /// Read a fixed-width text field. The result ends at the first NUL, so
    /// trailing NUL padding never reaches the caller. Non-UTF-8 bytes are
    /// replaced rather than rejected.
    pub fn read_fixed_string(&mut self, len: usize) -> Option<String> {
        let raw = self.take(len)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Some(String::from_utf8_lossy(&raw[..end]).into_owned())
    }

    /// Unsigned fraction; a zero denominator reads as 0.0.
    pub fn read_rational(&mut self, order: ByteOrder) -> Option<f64> {
        let start = self.pos;
        let num = self.read_u32(order)?;
        let Some(den) = self.read_u32(order) else {
            self.pos = start;
            return None;
        };
        Some(if den == 0 {
            0.0
        } else {
            f64::from(num) / f64::from(den)
        })
    }

    /// Signed fraction; a zero denominator reads as 0.0.
    pub fn read_srational(&mut self, order: ByteOrder) -> Option<f64> {
        let start = self.pos;
        let num = self.read_i32(order)?;
        let Some(den) = self.read_i32(order) else {
            self.pos = start;
            return None;
        };
        Some(if den == 0 {
            0.0
        } else {
            f64::from(num) / f64::from(den)
        })
    }
}
