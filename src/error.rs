use thiserror::Error;

/// Errors raised while planning, distributing, computing or collecting a round.
#[derive(Error, Debug)]
pub enum MatmulError {
    /// Invalid run parameters (participant count, dimensions, config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shapes that cannot be combined or indexed
    #[error("Dimension error: {0}")]
    Dimension(String),

    /// IO error while reading inputs or writing output
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed matrix text or config file
    #[error("Parse error: {0}")]
    Parse(String),

    /// A collective payload did not have the expected type or length
    #[error("Transport error: {0}")]
    Transport(String),

    /// A participant left before reaching a collective
    #[error("Participation error: rank {rank} {reason}")]
    Participation { rank: usize, reason: String },

    /// The coordinator's round advanced out of order
    #[error("Round state error: cannot move from {from} to {to}")]
    State {
        from: &'static str,
        to: &'static str,
    },
}

/// Result type alias for matrix multiplication operations.
pub type Result<T> = std::result::Result<T, MatmulError>;

impl From<toml::de::Error> for MatmulError {
    fn from(e: toml::de::Error) -> Self {
        MatmulError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MatmulError::Config("participant count must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: participant count must be at least 1"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: MatmulError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_participation_display() {
        let err = MatmulError::Participation {
            rank: 2,
            reason: "disconnected during gather".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Participation error: rank 2 disconnected during gather"
        );
    }
}
