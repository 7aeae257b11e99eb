//! Bag of Cells (BoC) serialization
//!
//! BoC is a serialization format that encodes cells into byte arrays.
//! Only construction is supported: a single root, cells collected by identity and
//! emitted bottom-up so every reference points to an already emitted cell.
//!
//! The root is the last cell of the bag. TON's reference deserializer expects the
//! opposite order (root first, child indices greater than the parent's index) and
//! rejects these bags; readers that only follow indices accept them.

use crate::crc::CRC32C;
use crate::tvm::cell::Cell;
use crate::tvm::error::{CellError, CellResult};
use base64::Engine;
use bytes::BufMut;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// BoC magic number for the generic format
pub const BOC_GENERIC_MAGIC: u32 = 0xb5ee9c72;

/// Largest cell count accepted, bounded by a 3-byte count field
pub const MAX_BOC_CELLS: usize = (1 << 24) - 1;

const HAS_CRC32C_FLAG: u8 = 1 << 6;

/// Serializer for a single-root bag of cells
#[derive(Debug, Clone, Default)]
pub struct BocSerializer {
    root: Option<Arc<Cell>>,
    has_crc32c: bool,
}

impl BocSerializer {
    pub fn new(root: Arc<Cell>) -> Self {
        Self {
            root: Some(root),
            has_crc32c: false,
        }
    }

    /// Appends a CRC32C of the whole bag as a little-endian trailer
    pub fn with_crc32c(mut self, has_crc32c: bool) -> Self {
        self.has_crc32c = has_crc32c;
        self
    }

    /// Produces the wire bytes. Serializing the same tree twice yields identical output.
    pub fn serialize(&self) -> CellResult<Vec<u8>> {
        let root = self.root.as_ref().ok_or(CellError::EmptyTree)?;

        let cells = collect_cells(root);
        ensure_cell_count(cells.len())?;

        let size_bytes = bytes_needed(cells.len());
        let index: HashMap<*const Cell, usize> = cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| (Arc::as_ptr(cell), idx))
            .collect();

        let mut cells_data = Vec::new();
        for cell in &cells {
            serialize_cell(cell, &index, size_bytes, &mut cells_data);
        }

        let offset_bytes = bytes_needed(cells_data.len());
        // children come first, so the root is always the last cell
        let root_index = cells.len() - 1;

        let mut result = Vec::with_capacity(cells_data.len() + 6 + 4 * size_bytes + offset_bytes + 4);
        result.put_u32(BOC_GENERIC_MAGIC);

        let mut flags = size_bytes as u8;
        if self.has_crc32c {
            flags |= HAS_CRC32C_FLAG;
        }
        result.put_u8(flags);
        result.put_u8(offset_bytes as u8);

        result.put_uint(cells.len() as u64, size_bytes);
        result.put_uint(1, size_bytes); // roots
        result.put_uint(0, size_bytes); // absent cells
        result.put_uint(cells_data.len() as u64, offset_bytes);
        result.put_uint(root_index as u64, size_bytes);

        result.extend_from_slice(&cells_data);

        if self.has_crc32c {
            let crc = CRC32C.checksum(&result);
            result.put_u32_le(crc);
        }

        Ok(result)
    }
}

/// Serializes a cell and its references into a Bag of Cells (BoC) format
pub fn serialize_boc(root: &Arc<Cell>, has_crc32c: bool) -> CellResult<Vec<u8>> {
    BocSerializer::new(root.clone())
        .with_crc32c(has_crc32c)
        .serialize()
}

/// Converts a BoC to a hex string
pub fn boc_to_hex(cell: &Arc<Cell>, has_crc32c: bool) -> CellResult<String> {
    let bytes = serialize_boc(cell, has_crc32c)?;
    Ok(hex::encode(bytes))
}

/// Converts a BoC to base64
pub fn boc_to_base64(cell: &Arc<Cell>, has_crc32c: bool) -> CellResult<String> {
    let bytes = serialize_boc(cell, has_crc32c)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

fn serialize_cell(
    cell: &Arc<Cell>,
    index: &HashMap<*const Cell, usize>,
    size_bytes: usize,
    out: &mut Vec<u8>,
) {
    out.extend_from_slice(&cell.descriptors());
    out.extend_from_slice(&cell.serialize_data());

    for reference in cell.references() {
        // collect_cells indexed every reachable cell
        let ref_idx = index.get(&Arc::as_ptr(reference)).copied().unwrap_or_default();
        out.put_uint(ref_idx as u64, size_bytes);
    }
}

/// Collects distinct cells (by identity) in post-order: children before parents.
fn collect_cells(root: &Arc<Cell>) -> Vec<Arc<Cell>> {
    let mut cells = Vec::new();
    let mut visited: HashSet<*const Cell> = HashSet::from([Arc::as_ptr(root)]);
    // (cell, next reference to visit)
    let mut stack: Vec<(&Arc<Cell>, usize)> = vec![(root, 0)];

    while let Some((cell, next)) = stack.pop() {
        if let Some(child) = cell.reference(next) {
            stack.push((cell, next + 1));
            if visited.insert(Arc::as_ptr(child)) {
                stack.push((child, 0));
            }
        } else {
            cells.push(cell.clone());
        }
    }

    cells
}

fn ensure_cell_count(count: usize) -> CellResult<()> {
    if count > MAX_BOC_CELLS {
        return Err(CellError::TooManyCells {
            count,
            limit: MAX_BOC_CELLS,
        });
    }
    Ok(())
}

fn bytes_needed(value: usize) -> usize {
    if value == 0 {
        return 1;
    }

    let bits = (usize::BITS - value.leading_zeros()) as usize;
    bits.div_ceil(8)
}
