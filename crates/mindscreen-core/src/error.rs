//! Error types for Mindscreen

/// Result type alias using Mindscreen's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Mindscreen operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors (bad tables, invalid settings, too little training data)
    #[error("configuration error: {0}")]
    Config(String),

    /// Text-completion collaborator errors
    #[error("completion error: {0}")]
    Completion(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new completion error
    pub fn completion(msg: impl Into<String>) -> Self {
        Self::Completion(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("need at least 4 samples");
        assert_eq!(err.to_string(), "configuration error: need at least 4 samples");
        assert_eq!(Error::Timeout.to_string(), "operation timed out");
    }

    #[test]
    fn test_source_conversions() {
        let err: Error = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));

        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(Error::completion("503").to_string().starts_with("completion error"));
    }
}
