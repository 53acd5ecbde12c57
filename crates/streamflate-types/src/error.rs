//! Error types for streamflate
//!
//! The error type deliberately carries only owned strings so that a stream
//! adapter can store the first terminal error and hand out clones of it on
//! every subsequent call (the sticky terminal state).

/// Main error type for streamflate operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// Downstream sink or upstream source I/O failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the failed I/O operation
        message: String,
    },

    /// Invalid construction parameters
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// The compression engine reported an unrecoverable codec fault
    #[error("Codec error: {message}")]
    Codec {
        /// Error message from the compression engine
        message: String,
    },

    /// The stream was already finished normally
    ///
    /// Distinct from every failure variant: a stream in this state ended
    /// cleanly and a repeated finish is not an error.
    #[error("Stream already closed")]
    Closed,
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// I/O related errors
    Io,
    /// Configuration errors
    Config,
    /// Codec errors
    Codec,
    /// Normal end of stream
    Closed,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::Config { .. } => ErrorKind::Config,
            Self::Codec { .. } => ErrorKind::Codec,
            Self::Closed => ErrorKind::Closed,
        }
    }

    /// Check whether this is the normal end-of-stream marker rather than
    /// a failure
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new codec error
    pub fn codec<S: Into<String>>(message: S) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(error: Error) -> Self {
        match &error {
            Error::Closed => std::io::Error::new(std::io::ErrorKind::NotConnected, error),
            Error::Config { .. } => std::io::Error::new(std::io::ErrorKind::InvalidInput, error),
            Error::Codec { .. } => std::io::Error::new(std::io::ErrorKind::InvalidData, error),
            Error::Io { .. } => std::io::Error::other(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_error_kind_consistency(message in ".*") {
            let errors = vec![
                Error::Io { message: message.clone() },
                Error::Config { message: message.clone() },
                Error::Codec { message: message.clone() },
                Error::Closed,
            ];

            for error in errors {
                let kind = error.kind();
                match error {
                    Error::Io { .. } => prop_assert_eq!(kind, ErrorKind::Io),
                    Error::Config { .. } => prop_assert_eq!(kind, ErrorKind::Config),
                    Error::Codec { .. } => prop_assert_eq!(kind, ErrorKind::Codec),
                    Error::Closed => prop_assert_eq!(kind, ErrorKind::Closed),
                }
            }
        }

        #[test]
        fn test_error_clone_round_trip(message in ".*") {
            let error = Error::codec(message.clone());
            prop_assert_eq!(error.clone(), error);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe gone");
        let error = Error::from(io_error);

        assert_eq!(error.kind(), ErrorKind::Io);
        assert!(error.to_string().contains("pipe gone"));
    }

    #[test]
    fn test_closed_is_not_a_failure_kind() {
        let closed = Error::Closed;
        assert!(closed.is_closed());
        assert!(!Error::codec("bad block").is_closed());
        assert!(!Error::io("sink failed").is_closed());
    }

    #[test]
    fn test_back_conversion_preserves_category() {
        let io: std::io::Error = Error::codec("corrupt header").into();
        assert_eq!(io.kind(), std::io::ErrorKind::InvalidData);

        let io: std::io::Error = Error::Closed.into();
        assert_eq!(io.kind(), std::io::ErrorKind::NotConnected);
    }
}
