//! # Checkin Server
//!
//! TCP check-in server: remote clients authenticate with a shared credential
//! and stream check results that the server logs and persists.
//!
//! # Architecture
//!
//! - [`CheckinServer`] accepts connections and spawns one handler task per
//!   connection.
//! - [`handle_connection`] drives the per-connection sequence: throttle
//!   check, authentication, outcome notification, streaming decode loop.
//! - [`ThrottleTracker`] is the only state shared across connections; it
//!   counts failed auth attempts per client host within a rolling window.
//! - [`CheckSink`] receives every decoded result; the shipped sink is the
//!   append-only [`CheckLog`].
//!
//! A throttled client is disconnected before any bytes are exchanged. A
//! client with wrong credentials receives exactly one negative
//! `AuthOutcome`, and one failure is recorded against its host.
//!
//! # Example
//!
//! ```rust,ignore
//! use checkin_server::{CheckinServer, CheckLog, ServerConfig};
//! use std::sync::Arc;
//!
//! let config = ServerConfig::load("checkind.toml".as_ref())?;
//! let sink = Arc::new(CheckLog::open(&config.store_path)?);
//! let server = CheckinServer::bind(config, sink).await?;
//! server.run().await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod auth;
mod config;
mod error;
mod handler;
mod server;
mod store;
mod throttle;

pub use auth::Authenticator;
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{handle_connection, HandlerContext};
pub use server::CheckinServer;
pub use store::{CheckLog, CheckSink, MemorySink, StoredCheck};
pub use throttle::ThrottleTracker;
