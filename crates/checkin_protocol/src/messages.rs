//! Protocol messages.
//!
//! Each message is a CBOR-encoded struct carried in one frame. The frame
//! header names the message kind, so a peer can reject traffic that arrives
//! out of protocol sequence before deserializing it.

use crate::error::{WireError, WireResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Kind of message carried by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Client credential presentation.
    AuthRequest,
    /// Server's verdict on an authentication attempt.
    AuthOutcome,
    /// One streamed check result.
    CheckResult,
}

impl MessageKind {
    /// Converts to the numeric code used on the wire.
    pub fn to_code(&self) -> u8 {
        match self {
            MessageKind::AuthRequest => 1,
            MessageKind::AuthOutcome => 2,
            MessageKind::CheckResult => 3,
        }
    }

    /// Converts from a numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(MessageKind::AuthRequest),
            2 => Some(MessageKind::AuthOutcome),
            3 => Some(MessageKind::CheckResult),
            _ => None,
        }
    }
}

/// A message that can travel in a frame of a fixed kind.
pub trait WireMessage: Serialize + DeserializeOwned {
    /// Frame kind this message travels under.
    const KIND: MessageKind;
}

/// Authentication request from a client.
///
/// The token is an HMAC-SHA256 tag over the protocol auth context, keyed by
/// the shared credential — see [`auth_token`](crate::auth_token). The
/// credential itself never crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    /// HMAC tag proving knowledge of the shared credential.
    pub token: Vec<u8>,
}

impl WireMessage for AuthRequest {
    const KIND: MessageKind = MessageKind::AuthRequest;
}

/// The server's answer to an authentication attempt.
///
/// Sent exactly once per non-throttled connection, immediately after the
/// exchange. A throttled client never receives one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthOutcome {
    /// Whether the presented credential was accepted.
    pub success: bool,
}

impl WireMessage for AuthOutcome {
    const KIND: MessageKind = MessageKind::AuthOutcome;
}

/// A status report streamed by an authenticated client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Status code of the external check.
    pub status: i32,
    /// Captured output of the check.
    pub output: String,
}

impl CheckResult {
    /// Creates a new check result.
    pub fn new(status: i32, output: impl Into<String>) -> Self {
        Self {
            status,
            output: output.into(),
        }
    }
}

impl WireMessage for CheckResult {
    const KIND: MessageKind = MessageKind::CheckResult;
}

/// Encodes a message to CBOR payload bytes.
pub fn encode_payload<M: WireMessage>(message: &M) -> WireResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(message, &mut buf).map_err(|err| WireError::Encode(err.to_string()))?;
    Ok(buf)
}

/// Decodes a message from CBOR payload bytes.
pub fn decode_payload<M: WireMessage>(bytes: &[u8]) -> WireResult<M> {
    ciborium::from_reader(bytes).map_err(|err: ciborium::de::Error<std::io::Error>| {
        WireError::Decode(err.to_string())
    })
}
