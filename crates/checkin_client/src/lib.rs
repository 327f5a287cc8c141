//! # Checkin Client
//!
//! Async client for the checkin server: connect, authenticate with the
//! shared credential, then stream check results.
//!
//! ```rust,ignore
//! use checkin_client::CheckinClient;
//! use checkin_protocol::CheckResult;
//!
//! let mut client = CheckinClient::connect("monitor.example.net:4430").await?;
//! let outcome = client.authenticate("hunter2").await?;
//! if outcome.success {
//!     client.send(&CheckResult::new(0, "backup completed")).await?;
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

use checkin_protocol::{
    auth_token, read_message, write_message, AuthOutcome, AuthRequest, CheckResult, WireError,
};
use thiserror::Error;
use tokio::net::{TcpStream, ToSocketAddrs};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the checkin client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Wire protocol error.
    ///
    /// A server that closes without answering — the throttled case — shows
    /// up here as an unexpected-EOF I/O error.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// I/O error while connecting.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A connection to a checkin server.
pub struct CheckinClient {
    stream: TcpStream,
}

impl CheckinClient {
    /// Connects to a checkin server.
    pub async fn connect(addr: impl ToSocketAddrs) -> ClientResult<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self { stream })
    }

    /// Presents the shared credential and returns the server's verdict.
    ///
    /// Call once, before [`send`](Self::send). The credential never crosses
    /// the wire; its derived token does.
    pub async fn authenticate(&mut self, shared_key: &str) -> ClientResult<AuthOutcome> {
        let request = AuthRequest {
            token: auth_token(shared_key),
        };
        write_message(&mut self.stream, &request).await?;

        let outcome = read_message(&mut self.stream).await?;
        Ok(outcome)
    }

    /// Sends one check result.
    ///
    /// The server never replies on the streaming leg; delivery is confirmed
    /// only by the connection staying open.
    pub async fn send(&mut self, result: &CheckResult) -> ClientResult<()> {
        write_message(&mut self.stream, result).await?;
        Ok(())
    }
}
