//! # Checkin Protocol
//!
//! Wire protocol for the checkin server: explicit, versioned framing with
//! CBOR payloads, used symmetrically by the server and its clients.
//!
//! # Frame layout
//!
//! ```text
//! magic: u32 | version: u16 | kind: u8 | length: u32 | payload: length bytes
//! ```
//!
//! Header fields are big-endian; payloads are CBOR. See [`frame`] for the
//! constants and [`messages`] for the message schema.
//!
//! # Protocol sequence
//!
//! 1. Client connects over TCP.
//! 2. Client sends one [`AuthRequest`]; the server answers with exactly one
//!    [`AuthOutcome`]. A throttled client receives nothing — the server
//!    closes without writing a byte.
//! 3. On a positive outcome the client streams zero or more [`CheckResult`]
//!    frames. The server sends nothing in return; the stream ends when either
//!    side closes the connection.
//!
//! # Authentication
//!
//! The client proves knowledge of the shared credential by sending
//! [`auth_token`] — an HMAC-SHA256 tag over a fixed context string — rather
//! than the credential itself. The server verifies with [`verify_token`]
//! (constant-time comparison).

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod frame;
pub mod messages;
mod token;

pub use error::{WireError, WireResult};
pub use frame::{
    read_frame, read_message, write_frame, write_message, Frame, FrameHeader, FRAME_HEADER_SIZE,
    MAGIC, MAX_PAYLOAD_SIZE, PROTOCOL_VERSION,
};
pub use messages::{
    decode_payload, encode_payload, AuthOutcome, AuthRequest, CheckResult, MessageKind, WireMessage,
};
pub use token::{auth_token, verify_token, AUTH_CONTEXT, AUTH_TOKEN_LEN};
