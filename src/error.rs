use thiserror::Error;

#[derive(Error, Debug)]
pub enum MrLensError {
    #[error("GitLab client has not been initialized; save a configuration first")]
    ClientUninitialized,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    #[error("GraphQL response contained no data")]
    NoResponseData,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MrLensError>;
