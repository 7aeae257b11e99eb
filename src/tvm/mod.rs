//! TVM (TON Virtual Machine) data structures
//!
//! This module provides the construction side of TON's cell model:
//! - BitWriter: bounded bit accumulator (up to 1023 bits per cell)
//! - Cell: immutable node with up to 1023 bits and up to 4 references
//! - CellBuilder: mutable builder finalized into a Cell, with snake encoding
//! - BoC: Bag of Cells serialization of a cell tree into bytes
//! - Address: TON address formats

pub mod address;
pub mod bits;
pub mod boc;
pub mod cell;
pub mod error;

pub use address::Address;
pub use bits::BitWriter;
pub use boc::{BOC_GENERIC_MAGIC, BocSerializer, MAX_BOC_CELLS, boc_to_base64, boc_to_hex, serialize_boc};
pub use cell::{Cell, CellBuilder, MAX_CELL_BITS, MAX_CELL_BYTES, MAX_CELL_REFS};
pub use error::{CellError, CellResult};
