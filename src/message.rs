//! Transfer message bodies handed to the fee estimator
//!
//! The body is the UTF-8 text `"<message> <amount>"` stored as a snake of cells,
//! serialized as a bag of cells with a CRC32C trailer and encoded as base64.

use crate::tvm::{Cell, CellBuilder, CellResult, boc_to_base64};
use std::sync::Arc;

/// Prefix of the comment sent along with an estimated transfer
pub const TRANSFER_MESSAGE_PREFIX: &str = "Test transaction message to ";

/// Default amount written into the body, in nanotons (1 TON)
pub const DEFAULT_AMOUNT: &str = "1000000000";

/// Comment addressed to `address`
pub fn transfer_comment(address: &str) -> String {
    format!("{TRANSFER_MESSAGE_PREFIX}{address}")
}

/// Builds the snake cell chain holding `"<message> <amount>"`
pub fn build_transaction_cell(message: &str, amount: &str) -> CellResult<Arc<Cell>> {
    let text = format!("{message} {amount}");
    let mut builder = CellBuilder::new();
    builder.store_snake_string(&text)?;
    Ok(builder.end_cell())
}

/// Base64 bag of cells carrying `"<message> <amount>"`
pub fn create_transaction_body(message: &str, amount: &str) -> CellResult<String> {
    let cell = build_transaction_cell(message, amount)?;
    boc_to_base64(&cell, true)
}
