use thiserror::Error;

/// Failure reading or writing local storage.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored value is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
