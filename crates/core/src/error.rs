use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No analysis data available")]
    MissingAnalysis,

    #[error("Unexpected response from server: {reason}")]
    UnexpectedResponse { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
