//! Bounded bit accumulator backing every cell
//!
//! Bits are packed most-significant-bit first. Bits past `bit_len` in the last
//! byte are always zero, so the buffer can be hashed and serialized as is.

use crate::tvm::cell::MAX_CELL_BITS;
use crate::tvm::error::{CellError, CellResult};

/// Append-only bit buffer limited to [`MAX_CELL_BITS`] bits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitWriter {
    data: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    /// Creates an empty writer
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(MAX_CELL_BITS.div_ceil(8)),
            bit_len: 0,
        }
    }

    /// Number of bits written so far
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Number of bits that can still be written
    pub fn available_bits(&self) -> usize {
        MAX_CELL_BITS - self.bit_len
    }

    /// Number of whole bytes that can still be written
    pub fn available_bytes(&self) -> usize {
        self.available_bits() / 8
    }

    /// Written bytes; the last one may be partially filled
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Appends a single bit
    pub fn append_bit(&mut self, bit: bool) -> CellResult<&mut Self> {
        self.ensure_capacity(1)?;
        self.push_bit(bit);
        Ok(self)
    }

    /// Appends the first `bit_len` bits of `bits`, most significant bit first
    pub fn append_bits(&mut self, bits: &[u8], bit_len: usize) -> CellResult<&mut Self> {
        self.ensure_capacity(bit_len)?;
        if bits.len() < bit_len.div_ceil(8) {
            return Err(CellError::InsufficientData {
                bit_len,
                available: bits.len(),
            });
        }

        let full_bytes = bit_len / 8;
        if self.bit_len % 8 == 0 {
            self.data.extend_from_slice(&bits[..full_bytes]);
            self.bit_len += full_bytes * 8;
        } else {
            for &byte in &bits[..full_bytes] {
                self.push_byte_unaligned(byte);
            }
        }

        for i in 0..bit_len % 8 {
            self.push_bit((bits[full_bytes] >> (7 - i)) & 1 == 1);
        }

        Ok(self)
    }

    /// Appends `data` as `data.len() * 8` bits
    pub fn append_bytes(&mut self, data: &[u8]) -> CellResult<&mut Self> {
        self.append_bits(data, data.len() * 8)
    }

    /// Appends the `width` low-order bits of `value`, most significant bit first.
    ///
    /// Widths above 64 are allowed and are filled with leading zero bits.
    pub fn append_uint(&mut self, value: u64, width: usize) -> CellResult<&mut Self> {
        if width < 64 && value >> width != 0 {
            return Err(CellError::ValueTooLarge { value, width });
        }
        self.ensure_capacity(width)?;

        for i in (0..width).rev() {
            let bit = i < 64 && (value >> i) & 1 == 1;
            self.push_bit(bit);
        }

        Ok(self)
    }

    pub(crate) fn into_parts(self) -> (Vec<u8>, usize) {
        (self.data, self.bit_len)
    }

    fn ensure_capacity(&self, requested: usize) -> CellResult<()> {
        let available = self.available_bits();
        if requested > available {
            return Err(CellError::CapacityExceeded {
                requested,
                available,
            });
        }
        Ok(())
    }

    fn push_byte_unaligned(&mut self, byte: u8) {
        let shift = self.bit_len % 8;
        // the current last byte receives the high bits, a new byte the low ones
        if let Some(last) = self.data.last_mut() {
            *last |= byte >> shift;
        }
        self.data.push(byte << (8 - shift));
        self.bit_len += 8;
    }

    fn push_bit(&mut self, bit: bool) {
        let offset = self.bit_len % 8;
        if offset == 0 {
            self.data.push(0);
        }
        if bit {
            if let Some(last) = self.data.last_mut() {
                *last |= 0x80 >> offset;
            }
        }
        self.bit_len += 1;
    }
}
