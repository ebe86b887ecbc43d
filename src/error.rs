//! Error types for the QServer client.
//!
//! Everything the core can fail with is a [`ProtocolError`]. Connection
//! level failures (`Io`, `ConnectionClosed`, `Timeout`, `Rejected`) leave the
//! session closed; `AuthenticationFailed` leaves it connected so the caller
//! may retry or close.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during connect, reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The server closed the connection before the reply was complete.
    #[error("connection closed by server with {pending} bytes pending")]
    ConnectionClosed {
        /// Bytes left in the receive buffer when EOF was seen.
        pending: usize,
    },

    /// No terminal line arrived within the configured read deadline.
    #[error("timed out waiting for reply to {token}")]
    Timeout {
        /// Token of the command that was waiting.
        token: String,
    },

    /// The server answered a command with an `X` line.
    ///
    /// This is connection-fatal: the session has already been closed.
    #[error("command {token} rejected by server: {line}")]
    Rejected {
        /// Token of the rejected command.
        token: String,
        /// The raw rejection line.
        line: String,
    },

    /// AuthServ did not acknowledge the supplied credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A command could not be put on the wire as a single line.
    #[error("invalid command: {0:?}")]
    InvalidCommand(String),

    /// The session is closed.
    #[error("session is not connected")]
    NotConnected,

    /// The receive buffer grew past its limit without a terminal line.
    #[error("receive buffer overflow: {len} bytes (limit {limit})")]
    BufferOverflow {
        /// Current buffer length.
        len: usize,
        /// Configured limit.
        limit: usize,
    },

    /// A string could not be used as a correlation token.
    #[error("invalid token: {0:?}")]
    InvalidToken(String),
}

impl ProtocolError {
    /// Returns `true` if the session cannot be used after this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::AuthenticationFailed(_) | Self::InvalidCommand(_) | Self::InvalidToken(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::Rejected {
            token: "GS00042".to_string(),
            line: "GS00042 X".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "command GS00042 rejected by server: GS00042 X"
        );

        let err = ProtocolError::BufferOverflow {
            len: 70000,
            limit: 65536,
        };
        assert_eq!(
            err.to_string(),
            "receive buffer overflow: 70000 bytes (limit 65536)"
        );

        let err = ProtocolError::AuthenticationFailed("Incorrect password.".to_string());
        assert_eq!(err.to_string(), "authentication failed: Incorrect password.");
    }

    #[test]
    fn test_error_conversion() {
        let io_err =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let protocol_err: ProtocolError = io_err.into();

        match protocol_err {
            ProtocolError::Io(_) => {}
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_fatality() {
        assert!(ProtocolError::NotConnected.is_fatal());
        assert!(ProtocolError::ConnectionClosed { pending: 0 }.is_fatal());
        assert!(!ProtocolError::AuthenticationFailed(String::new()).is_fatal());
        assert!(!ProtocolError::InvalidCommand("a\nb".to_string()).is_fatal());
    }
}
