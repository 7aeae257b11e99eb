use thiserror::Error;

/// Errors produced while building cells or serializing them into a bag of cells.
///
/// All of them are deterministic: they are caused by the caller's input, never by
/// transient conditions, so none of them is worth retrying.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CellError {
    #[error("Cell capacity exceeded: {requested} bits requested, {available} bits available")]
    CapacityExceeded { requested: usize, available: usize },
    #[error("Value {value} does not fit in {width} bits")]
    ValueTooLarge { value: u64, width: usize },
    #[error("Insufficient data: {bit_len} bits requested from {available} bytes")]
    InsufficientData { bit_len: usize, available: usize },
    #[error("Cell already holds the maximum of {max} references", max = crate::tvm::MAX_CELL_REFS)]
    TooManyReferences,
    #[error("Bag of cells has no root cell")]
    EmptyTree,
    #[error("Bag of cells holds {count} cells, the limit is {limit}")]
    TooManyCells { count: usize, limit: usize },
}

pub type CellResult<T> = Result<T, CellError>;
