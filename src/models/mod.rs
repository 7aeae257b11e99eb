pub mod fee;
pub mod toncenter_v2;

pub use fee::{Fee, NANOTONS_PER_TON};
pub use toncenter_v2::{EstimateFeeRequest, EstimateFeeResponse, EstimateFeeResult, Fees};
