//! Error types for the checkin server.

use checkin_protocol::WireError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the checkin server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Config file could not be read.
    #[error("error reading config {path}: {source}")]
    ConfigRead {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Config file could not be parsed.
    #[error("error parsing config {path}: {source}")]
    ConfigParse {
        /// Path that was being parsed.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// Config values failed validation.
    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    /// Listener could not bind its address. Fatal at startup.
    #[error("error starting TCP server on {addr}: {source}")]
    BindFailed {
        /// Address the listener tried to bind.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Client failed authentication.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Check store error.
    #[error("store error: {0}")]
    Store(String),

    /// Wire protocol error.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ServerError::BindFailed {
            addr: "127.0.0.1:4430".into(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        let msg = err.to_string();
        assert!(msg.contains("127.0.0.1:4430"));
        assert!(msg.contains("in use"));
    }

    #[test]
    fn wire_errors_convert() {
        let wire = WireError::UnknownKind(9);
        let err: ServerError = wire.into();
        assert!(matches!(err, ServerError::Wire(_)));
    }
}
