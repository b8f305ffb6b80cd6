use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to obtain a usable state document from evcc.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Cannot connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Cannot connect to {url}: request timed out")]
    Timeout { url: String },

    #[error("API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed state document: {0}")]
    Decode(String),

    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// The state document is missing something every snapshot needs.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BuildError {
    #[error("state document is missing mandatory field '{0}'")]
    MissingField(&'static str),
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("webhook responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Anything that ends a collection cycle before distribution.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

pub type Result<T> = std::result::Result<T, AppError>;
