use thiserror::Error;

/// Failures reported by a generation oracle or an oracle-backed classifier.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered with a non-success status.
    #[error("oracle returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },
    /// The response body could not be interpreted.
    #[error("malformed oracle response: {0}")]
    Malformed(String),
}

/// Errors surfaced to callers of the simplifier.
///
/// Oracle trouble inside a sentence never reaches this type; it only shortens
/// that sentence's depth chain.
#[derive(Debug, Error)]
pub enum SimplifyError {
    /// Credentials were missing or blank.
    #[error("API key is required but was not provided or is empty")]
    MissingCredentials,
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Oracle construction failed (e.g. the HTTP client could not be built).
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Convenience alias used across the crate.
pub type SimplifyResult<T> = Result<T, SimplifyError>;
