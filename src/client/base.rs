use crate::client::error::FeeEstimateError;
use crate::models::Fee;
use async_trait::async_trait;


#[derive(Debug, Clone)]
pub struct ClientParams {
    /// Whole-request timeout in seconds
    pub timeout: Option<u64>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Proxy URI, e.g. `socks5://127.0.0.1:9050`
    pub proxy: Option<String>,
    pub max_retries: Option<u64>,
    /// Delay before the first retry in milliseconds, doubled on every further retry
    pub retry_backoff_ms: Option<u64>,
}

impl Default for ClientParams {
    fn default() -> Self {
        Self {
            timeout: Some(10),
            api_key: None,
            base_url: None,
            proxy: None,
            max_retries: Some(2),
            retry_backoff_ms: Some(500),
        }
    }
}


/// Remote service pricing a message body sent to an address
#[async_trait]
pub trait FeeEstimator: Send + Sync {
    /// `body` is a base64 encoded bag of cells
    async fn estimate_fee(&self, address: &str, body: &str) -> Result<Fee, FeeEstimateError>;
}
