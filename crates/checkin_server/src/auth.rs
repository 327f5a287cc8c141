//! Client authentication.
//!
//! One exchange per connection: the client sends a single
//! [`AuthRequest`](checkin_protocol::AuthRequest) and the handler answers
//! with one `AuthOutcome`. This module only reads and verifies; writing the
//! outcome stays with the connection handler.

use crate::error::{ServerError, ServerResult};
use checkin_protocol::{read_message, verify_token, AuthRequest};
use tokio::io::AsyncRead;

/// Verifies client credentials against the configured shared key.
pub struct Authenticator {
    shared_key: String,
}

impl Authenticator {
    /// Creates an authenticator for the given shared key.
    pub fn new(shared_key: impl Into<String>) -> Self {
        Self {
            shared_key: shared_key.into(),
        }
    }

    /// Reads one auth request from the stream and verifies its token.
    ///
    /// Returns a descriptive error on credential mismatch, malformed input,
    /// or I/O failure. Consumes the request bytes from the stream and
    /// nothing else.
    pub async fn authenticate<S>(&self, stream: &mut S) -> ServerResult<()>
    where
        S: AsyncRead + Unpin,
    {
        let request: AuthRequest = read_message(stream).await?;

        if verify_token(&self.shared_key, &request.token) {
            Ok(())
        } else {
            Err(ServerError::AuthenticationFailed(
                "presented token does not match shared key".into(),
            ))
        }
    }
}
