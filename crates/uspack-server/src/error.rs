//! Error types for the uspack dev server.

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File watch error.
    #[error("file watch error: {0}")]
    Watch(String),

    /// The listen address could not be bound.
    #[error("cannot bind {addr}: {message}")]
    Bind { addr: String, message: String },
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display_carries_the_source_message() {
        let err = ServerError::from(std::io::Error::other("socket closed"));
        assert_eq!(err.to_string(), "IO error: socket closed");
    }
}
