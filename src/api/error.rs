use thiserror::Error;

/// Errors raised while talking to the statistics API
#[derive(Error, Debug)]
pub enum ApiError {
    /// The HTTP client could not be constructed
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    /// Connection or transport failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The request exceeded the configured timeout
    #[error("Request to {0} timed out")]
    Timeout(String),

    /// Non-success HTTP status
    #[error("{url} answered HTTP {status}")]
    Status { status: u16, url: String },

    /// Body was not the JSON shape we expect
    #[error("Failed to decode response from {url}: {error}")]
    Decode { url: String, error: String },
}

impl ApiError {
    /// Short form shown in the status bar
    pub fn summary(&self) -> String {
        match self {
            ApiError::Client(_) => "client error".to_string(),
            ApiError::Request(e) if e.is_connect() => "offline".to_string(),
            ApiError::Request(_) => "request failed".to_string(),
            ApiError::Timeout(_) => "timed out".to_string(),
            ApiError::Status { status, .. } => format!("HTTP {status}"),
            ApiError::Decode { .. } => "bad payload".to_string(),
        }
    }
}
