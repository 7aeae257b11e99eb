pub mod cli;
pub mod client;
pub mod crc;
pub mod message;
pub mod models;
pub mod tvm;
pub mod utils;
pub mod wallet;
