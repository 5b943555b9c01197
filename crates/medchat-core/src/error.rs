//! Error types for the medchat pipeline

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for indexing and answering
#[derive(Error, Debug)]
pub enum Error {
    /// Missing credentials or inconsistent settings. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Empty corpus or malformed chunks. Aborts an indexing run.
    #[error("Data error: {0}")]
    Data(String),

    /// Vector index unreachable or the named index does not exist.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Answer generator or embedding model failed.
    #[error("Generation error: {0}")]
    Generation(String),

    /// The timeout form of a generation failure: the generator did not
    /// answer within `GenerationConfig::timeout`. Kept apart from
    /// `Generation` so it is not retried and the front-end can report 504.
    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a failed call may succeed if repeated.
    ///
    /// Only service-side failures qualify. Configuration and data problems
    /// fail the same way every time, and a timeout has already spent the
    /// caller's whole budget.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Retrieval(_) | Error::Generation(_) | Error::Network(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
