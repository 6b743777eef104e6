use thiserror::Error;

#[derive(Error, Debug)]
pub enum TravisStatusError {
    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No builds found for {repo} on branch {branch}")]
    NoBuilds { repo: String, branch: String },

    #[error("Source control query failed: {0}")]
    SourceControl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TravisStatusError>;
