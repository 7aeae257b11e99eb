pub mod base;
pub mod error;
pub mod toncenter_v2;

pub use base::{ClientParams, FeeEstimator};
pub use error::FeeEstimateError;
pub use toncenter_v2::{TONCENTER_V2_URL, ToncenterV2Client};
