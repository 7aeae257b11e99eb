use serde::{Deserialize, Serialize};


#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EstimateFeeRequest {
    pub address: String,
    pub body: String,
    pub ignore_chksig: bool,
    pub init_code: String,
    pub init_data: String,
}

impl EstimateFeeRequest {
    /// Request for a plain message: signature checks skipped, no state init
    pub fn new(address: &str, body: &str) -> Self {
        Self {
            address: address.to_string(),
            body: body.to_string(),
            ignore_chksig: true,
            init_code: String::new(),
            init_data: String::new(),
        }
    }
}


#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fees {
    #[serde(default)]
    pub in_fwd_fee: u64,
    #[serde(default)]
    pub storage_fee: u64,
    #[serde(default)]
    pub gas_fee: u64,
    #[serde(default)]
    pub fwd_fee: u64,
}

impl Fees {
    /// Sum of all four components, in nanotons
    pub fn total(&self) -> u64 {
        self.in_fwd_fee
            .saturating_add(self.storage_fee)
            .saturating_add(self.gas_fee)
            .saturating_add(self.fwd_fee)
    }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateFeeResult {
    pub source_fees: Fees,
    #[serde(default)]
    pub destination_fees: Vec<Fees>,
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateFeeResponse {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<EstimateFeeResult>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}
