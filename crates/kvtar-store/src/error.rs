/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No endpoint could be reached.
    #[error("no reachable endpoint (tried {tried}): {last}")]
    Unreachable { tried: usize, last: String },

    /// The endpoint list is empty or an endpoint cannot be parsed.
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The store answered with an error status.
    #[error("store returned {status}: {message}")]
    Server { status: u16, message: String },

    /// Transport failure while talking to the store.
    #[error("transport error: {0}")]
    Transport(String),

    /// The store response could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Configuration could not be loaded.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error from the underlying runtime or a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
