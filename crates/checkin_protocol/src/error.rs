//! Error types for the wire protocol.

use crate::messages::MessageKind;
use thiserror::Error;

/// Result type for wire operations.
pub type WireResult<T> = Result<T, WireError>;

/// Errors that can occur while encoding or decoding protocol traffic.
#[derive(Error, Debug)]
pub enum WireError {
    /// Frame did not start with the protocol magic.
    #[error("invalid magic: {0:#010x}")]
    InvalidMagic(u32),

    /// Frame carried a protocol version this build does not speak.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u16),

    /// Frame kind byte does not name a known message.
    #[error("unknown message kind: {0}")]
    UnknownKind(u8),

    /// A well-formed frame arrived out of protocol sequence.
    #[error("unexpected message: expected {expected:?}, got {got:?}")]
    UnexpectedMessage {
        /// Kind the current protocol phase called for.
        expected: MessageKind,
        /// Kind actually carried by the frame.
        got: MessageKind,
    },

    /// Declared payload length exceeds the protocol bound.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Declared payload size.
        size: u32,
        /// Maximum allowed payload size.
        max: u32,
    },

    /// Payload serialization failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Payload deserialization failed.
    #[error("decode error: {0}")]
    Decode(String),

    /// I/O error while reading or writing a frame.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
