use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeeEstimateError {
    #[error("Request failed: {0}")]
    Transport(#[from] ureq::Error),
    #[error("Endpoint responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Fee estimation rejected: {0}")]
    Rejected(String),
    #[error("Request task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl FeeEstimateError {
    /// Whether repeating the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Json(_) | Self::Rejected(_) | Self::Join(_) => false,
        }
    }
}
