//! Cell implementation for TON blockchain
//!
//! A cell is a fundamental data structure in TON that can store up to 1023 bits
//! of data and maintain up to 4 references to other cells. Cells are immutable:
//! they are produced once by [`CellBuilder::end_cell`] and shared through [`Arc`].

use crate::tvm::bits::BitWriter;
use crate::tvm::boc::BocSerializer;
use crate::tvm::error::{CellError, CellResult};
use sha2::{Digest, Sha256};
use std::sync::{Arc, OnceLock};

/// Maximum number of bits a cell can store
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of references a cell can have
pub const MAX_CELL_REFS: usize = 4;

/// Maximum number of whole bytes a single cell can store
pub const MAX_CELL_BYTES: usize = MAX_CELL_BITS / 8;

/// Represents an ordinary cell in the TON blockchain
#[derive(Debug, Clone)]
pub struct Cell {
    /// Cell data, bits past `bit_len` are zero
    data: Vec<u8>,
    /// Number of bits in the cell (not necessarily a multiple of 8)
    bit_len: usize,
    /// References to other cells
    references: Vec<Arc<Cell>>,
    /// Depth and representation hash, filled together on first use
    meta: OnceLock<(u16, [u8; 32])>,
}

impl Cell {
    /// Creates a new empty cell
    pub fn new() -> Self {
        Self::from_parts(Vec::new(), 0, Vec::new())
    }

    /// Creates a leaf cell with the given data and bit length
    pub fn with_data(data: Vec<u8>, bit_len: usize) -> CellResult<Self> {
        let mut writer = BitWriter::new();
        writer.append_bits(&data, bit_len)?;
        let (data, bit_len) = writer.into_parts();
        Ok(Self::from_parts(data, bit_len, Vec::new()))
    }

    fn from_parts(data: Vec<u8>, bit_len: usize, references: Vec<Arc<Cell>>) -> Self {
        Self {
            data,
            bit_len,
            references,
            meta: OnceLock::new(),
        }
    }

    /// Returns the cell's data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of bits in the cell
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Returns the cell's references
    pub fn references(&self) -> &[Arc<Cell>] {
        &self.references
    }

    /// Returns the number of references
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Gets a reference by index
    pub fn reference(&self, index: usize) -> Option<&Arc<Cell>> {
        self.references.get(index)
    }

    /// Computes the cell's descriptors (2 bytes)
    pub fn descriptors(&self) -> [u8; 2] {
        // d1 = r + 8*s + 32*l, always an ordinary level-0 cell here
        let refs_descriptor = self.references.len() as u8;

        // d2 = floor(b/8) + ceil(b/8)
        let bits_descriptor = (self.bit_len / 8 + self.bit_len.div_ceil(8)) as u8;

        [refs_descriptor, bits_descriptor]
    }

    /// Serializes the cell data, appending the completion tag to an incomplete last byte
    pub fn serialize_data(&self) -> Vec<u8> {
        let mut result = self.data.clone();

        let bits_in_last_byte = self.bit_len % 8;
        if bits_in_last_byte != 0 {
            if let Some(last) = result.last_mut() {
                *last |= 0x80 >> bits_in_last_byte;
            }
        }

        result
    }

    /// Depth of the cell: 0 for a leaf, otherwise 1 + the deepest child.
    ///
    /// Saturates at `u16::MAX`.
    pub fn depth(&self) -> u16 {
        self.meta().0
    }

    /// Representation hash of the cell, computed on first use
    pub fn hash(&self) -> [u8; 32] {
        self.meta().1
    }

    /// Fills depth and hash of every cell below this one, children first, without recursion
    fn meta(&self) -> (u16, [u8; 32]) {
        if let Some(meta) = self.meta.get() {
            return *meta;
        }

        let mut stack: Vec<&Cell> = vec![self];
        while let Some(&cell) = stack.last() {
            if cell.meta.get().is_some() {
                stack.pop();
                continue;
            }

            let pending: Vec<&Cell> = cell
                .references
                .iter()
                .map(|r| r.as_ref())
                .filter(|r| r.meta.get().is_none())
                .collect();

            if pending.is_empty() {
                stack.pop();
                let _ = cell.meta.set(cell.compute_meta());
            } else {
                stack.extend(pending);
            }
        }

        *self.meta.get_or_init(|| self.compute_meta())
    }

    /// Depth and hash of this cell; children must already be computed
    fn compute_meta(&self) -> (u16, [u8; 32]) {
        let children: Vec<(u16, [u8; 32])> = self
            .references
            .iter()
            .map(|r| r.meta.get().copied().unwrap_or_default())
            .collect();

        let depth = children
            .iter()
            .map(|(depth, _)| depth.saturating_add(1))
            .max()
            .unwrap_or(0);

        let mut hasher = Sha256::new();
        hasher.update(self.descriptors());
        hasher.update(self.serialize_data());
        for (depth, _) in &children {
            hasher.update(depth.to_be_bytes());
        }
        for (_, hash) in &children {
            hasher.update(hash);
        }

        (depth, hasher.finalize().into())
    }

    /// Serializes the tree rooted at this cell into a bag of cells
    pub fn to_boc(self: &Arc<Self>, has_crc32c: bool) -> CellResult<Vec<u8>> {
        BocSerializer::new(self.clone())
            .with_crc32c(has_crc32c)
            .serialize()
    }
}

// unlink chains iteratively, a long snake would otherwise drop recursively
impl Drop for Cell {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.references);
        while let Some(cell) = pending.pop() {
            if let Ok(mut cell) = Arc::try_unwrap(cell) {
                pending.append(&mut cell.references);
            }
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for Cell {}

/// Mutable builder producing a single immutable [`Cell`]
///
/// # Example
///
/// ```rust
/// use tonfee_rs::tvm::CellBuilder;
///
/// let mut builder = CellBuilder::new();
/// builder.store_u32(0x12345678).unwrap();
/// builder.store_byte(0xFF).unwrap();
/// let cell = builder.end_cell();
/// assert_eq!(cell.bit_len(), 40);
/// ```
#[derive(Debug, Default)]
pub struct CellBuilder {
    bits: BitWriter,
    references: Vec<Arc<Cell>>,
}

impl CellBuilder {
    /// Creates a new cell builder
    pub fn new() -> Self {
        Self {
            bits: BitWriter::new(),
            references: Vec::new(),
        }
    }

    /// Returns the number of bits used
    pub fn bit_len(&self) -> usize {
        self.bits.bit_len()
    }

    /// Returns the number of available bits
    pub fn available_bits(&self) -> usize {
        self.bits.available_bits()
    }

    /// Returns the number of available bytes
    pub fn available_bytes(&self) -> usize {
        self.bits.available_bytes()
    }

    /// Returns the number of references
    pub fn ref_count(&self) -> usize {
        self.references.len()
    }

    /// Returns the number of available references
    pub fn available_refs(&self) -> usize {
        MAX_CELL_REFS - self.references.len()
    }

    /// Stores a single bit
    pub fn store_bit(&mut self, bit: bool) -> CellResult<&mut Self> {
        self.bits.append_bit(bit)?;
        Ok(self)
    }

    /// Stores the first `bit_len` bits of a byte slice
    pub fn store_slice(&mut self, bits: &[u8], bit_len: usize) -> CellResult<&mut Self> {
        self.bits.append_bits(bits, bit_len)?;
        Ok(self)
    }

    /// Stores a byte
    pub fn store_byte(&mut self, byte: u8) -> CellResult<&mut Self> {
        self.bits.append_bytes(&[byte])?;
        Ok(self)
    }

    /// Stores multiple bytes
    pub fn store_bytes(&mut self, bytes: &[u8]) -> CellResult<&mut Self> {
        self.bits.append_bytes(bytes)?;
        Ok(self)
    }

    /// Stores a u32 value
    pub fn store_u32(&mut self, value: u32) -> CellResult<&mut Self> {
        self.store_uint(value as u64, 32)
    }

    /// Stores a u64 value
    pub fn store_u64(&mut self, value: u64) -> CellResult<&mut Self> {
        self.store_uint(value, 64)
    }

    /// Stores the `bits` low-order bits of `value` in big-endian bit order
    pub fn store_uint(&mut self, value: u64, bits: usize) -> CellResult<&mut Self> {
        self.bits.append_uint(value, bits)?;
        Ok(self)
    }

    /// Adds a reference to another cell
    pub fn store_ref(&mut self, cell: Arc<Cell>) -> CellResult<&mut Self> {
        if self.references.len() >= MAX_CELL_REFS {
            return Err(CellError::TooManyReferences);
        }
        self.references.push(cell);
        Ok(self)
    }

    /// Stores bytes of any length as a snake: a chain of cells linked through their
    /// single reference.
    ///
    /// The current cell is filled with as many whole bytes as fit, the rest goes into
    /// child cells of at most [`MAX_CELL_BYTES`] bytes each. No prefix or length header
    /// is written. Storing an empty slice is a no-op.
    pub fn store_binary_snake(&mut self, bytes: &[u8]) -> CellResult<&mut Self> {
        let fits = bytes.len().min(self.available_bytes());
        let (head, tail) = bytes.split_at(fits);

        if !tail.is_empty() && self.available_refs() == 0 {
            return Err(CellError::TooManyReferences);
        }

        // build the tail back to front so long inputs do not recurse
        let mut next: Option<Arc<Cell>> = None;
        for chunk in tail.chunks(MAX_CELL_BYTES).rev() {
            let mut builder = CellBuilder::new();
            builder.store_bytes(chunk)?;
            if let Some(child) = next.take() {
                builder.store_ref(child)?;
            }
            next = Some(builder.end_cell());
        }

        self.store_bytes(head)?;
        if let Some(child) = next {
            self.store_ref(child)?;
        }

        Ok(self)
    }

    /// Stores a UTF-8 string as a snake
    pub fn store_snake_string(&mut self, s: &str) -> CellResult<&mut Self> {
        self.store_binary_snake(s.as_bytes())
    }

    /// Finalizes the builder into an immutable cell
    pub fn end_cell(self) -> Arc<Cell> {
        let (data, bit_len) = self.bits.into_parts();
        Arc::new(Cell::from_parts(data, bit_len, self.references))
    }
}
