use thiserror::Error;

/// Type alias for Result with MuteError
pub type Result<T> = std::result::Result<T, MuteError>;

/// Error types for the unsubscribe pipeline
///
/// Per-message analysis problems and per-attempt execution problems are never
/// represented here; they degrade to safe defaults or classified outcome text.
/// These variants cover batch-fatal and setup failures only.
#[derive(Error, Debug)]
pub enum MuteError {
    /// The message source could not be reached or read at all
    #[error("Message source error: {0}")]
    SourceError(String),

    /// History database failure
    #[error("History error: {0}")]
    HistoryError(#[from] rusqlite::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// User cancelled operation
    #[error("Operation cancelled: {0}")]
    OperationCancelled(String),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic catch-all error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl MuteError {
    /// Check if the error should abort an entire batch run
    ///
    /// All variants except cancellation indicate the run could not be set up
    /// at all. Cancellation is a clean early exit.
    pub fn is_batch_fatal(&self) -> bool {
        !matches!(self, MuteError::OperationCancelled(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_fatal_classification() {
        let source = MuteError::SourceError("connection refused".to_string());
        assert!(source.is_batch_fatal());

        let config = MuteError::ConfigError("bad threshold".to_string());
        assert!(config.is_batch_fatal());

        let cancelled = MuteError::OperationCancelled("ctrl-c".to_string());
        assert!(!cancelled.is_batch_fatal());
    }

    #[test]
    fn test_error_display() {
        let error = MuteError::SourceError("maildir missing".to_string());
        let display = format!("{}", error);
        assert!(display.contains("Message source error"));
        assert!(display.contains("maildir missing"));
    }
}
