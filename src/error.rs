use thiserror::Error;

/// Errors that can occur while harvesting recipes
#[derive(Error, Debug)]
pub enum HarvestError {
    /// Failed to fetch a listing page (transport failure or non-success status)
    #[error("Failed to fetch URL: {0}")]
    FetchError(#[from] reqwest::Error),

    /// Error building HTTP headers
    #[error("Header parse error: {0}")]
    HeaderError(#[from] reqwest::header::InvalidHeaderValue),

    /// Could not reach the Tor control port
    #[error("Failed to connect to proxy control port: {0}")]
    ProxyConnectError(std::io::Error),

    /// The Tor control port answered with something other than 250
    #[error("Proxy control error: {0}")]
    ProxyControlError(String),

    /// Failed to write harvested recipes
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to serialize a recipe
    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
}

impl HarvestError {
    /// Whether retrying the same page may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, HarvestError::FetchError(_))
    }
}
