//! Per-connection protocol state machine.
//!
//! One handler task per accepted connection. The sequence is fixed: throttle
//! check, authentication, outcome notification, then the streaming decode
//! loop. No step is revisited, and any failure closes this connection
//! without touching the rest of the server.

use crate::auth::Authenticator;
use crate::config::ServerConfig;
use crate::store::CheckSink;
use crate::throttle::ThrottleTracker;
use checkin_protocol::{read_message, write_message, AuthOutcome, CheckResult};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

/// State shared by every connection handler.
pub struct HandlerContext {
    /// Throttle state, shared across all connections.
    pub throttle: ThrottleTracker,
    authenticator: Authenticator,
    sink: Arc<dyn CheckSink>,
}

impl HandlerContext {
    /// Creates the shared handler state from the server configuration.
    pub fn new(config: &ServerConfig, sink: Arc<dyn CheckSink>) -> Self {
        Self {
            throttle: ThrottleTracker::new(config.auth_attempts_allowed, config.auth_window()),
            authenticator: Authenticator::new(config.shared_key.clone()),
            sink,
        }
    }
}

/// Drives one client connection from accept to close.
///
/// A throttled client is disconnected before any bytes are exchanged, so at
/// the network level "throttled" (silent close) is distinguishable from
/// "wrong credentials" (one negative outcome, then close).
pub async fn handle_connection<S>(context: Arc<HandlerContext>, mut stream: S, peer: SocketAddr)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let client = peer.ip().to_string();
    debug!("new connection from {}", client);

    if context.throttle.is_throttled(&client) {
        info!("closing connection, address is throttled: {}", client);
        return;
    }

    match context.authenticator.authenticate(&mut stream).await {
        Ok(()) => {
            // Best-effort notification; the decided outcome stands even if
            // the client never hears it.
            if let Err(err) = write_message(&mut stream, &AuthOutcome { success: true }).await {
                warn!("failed to write auth outcome to {}: {}", client, err);
            }
            info!("client authenticated: {}", client);
        }
        Err(err) => {
            info!("failed to auth connection from {}: {}", client, err);
            context.throttle.failed_attempt(&client);

            if let Err(err) = write_message(&mut stream, &AuthOutcome { success: false }).await {
                warn!("failed to write auth outcome to {}: {}", client, err);
            }
            return;
        }
    }

    loop {
        let result: CheckResult = match read_message(&mut stream).await {
            Ok(result) => result,
            Err(err) => {
                debug!("stream from {} ended: {} - closing connection", client, err);
                return;
            }
        };

        debug!(
            "check result from {} - status {}: {}",
            client, result.status, result.output
        );

        if let Err(err) = context.sink.record(&client, &result) {
            error!("failed to record check result from {}: {}", client, err);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySink;
    use checkin_protocol::{auth_token, AuthRequest};
    use tokio::io::AsyncReadExt;

    const PEER: &str = "203.0.113.9:51000";

    fn test_context(attempts: u32, sink: Arc<MemorySink>) -> Arc<HandlerContext> {
        let config = ServerConfig::new("127.0.0.1:0", "hunter2").with_attempts_allowed(attempts);
        Arc::new(HandlerContext::new(&config, sink))
    }

    fn spawn_handler(
        context: Arc<HandlerContext>,
    ) -> (tokio::io::DuplexStream, tokio::task::JoinHandle<()>) {
        let (client, server) = tokio::io::duplex(4096);
        let peer: SocketAddr = PEER.parse().unwrap();
        let task = tokio::spawn(handle_connection(context, server, peer));
        (client, task)
    }

    #[tokio::test]
    async fn throttled_connection_gets_zero_bytes() {
        let sink = Arc::new(MemorySink::new());
        let context = test_context(1, Arc::clone(&sink));
        context.throttle.failed_attempt("203.0.113.9");

        let (mut client, task) = spawn_handler(context);

        let mut buf = [0u8; 64];
        let n = client.read(&mut buf).await.unwrap();
        assert_eq!(n, 0);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn bad_credentials_get_one_negative_outcome() {
        let sink = Arc::new(MemorySink::new());
        let context = test_context(3, Arc::clone(&sink));

        let (mut client, task) = spawn_handler(Arc::clone(&context));
        write_message(
            &mut client,
            &AuthRequest {
                token: auth_token("letmein"),
            },
        )
        .await
        .unwrap();

        let outcome: AuthOutcome = read_message(&mut client).await.unwrap();
        assert!(!outcome.success);

        // Connection is closed after the outcome.
        let mut buf = [0u8; 64];
        assert_eq!(client.read(&mut buf).await.unwrap(), 0);

        task.await.unwrap();
        assert!(!context.throttle.is_throttled("203.0.113.9"));
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn good_credentials_stream_to_sink() {
        let sink = Arc::new(MemorySink::new());
        let context = test_context(3, Arc::clone(&sink));

        let (mut client, task) = spawn_handler(context);
        write_message(
            &mut client,
            &AuthRequest {
                token: auth_token("hunter2"),
            },
        )
        .await
        .unwrap();

        let outcome: AuthOutcome = read_message(&mut client).await.unwrap();
        assert!(outcome.success);

        write_message(&mut client, &CheckResult::new(0, "ok")).await.unwrap();
        write_message(&mut client, &CheckResult::new(2, "disk full"))
            .await
            .unwrap();
        drop(client);

        task.await.unwrap();
        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].client, "203.0.113.9");
        assert_eq!(records[0].output, "ok");
        assert_eq!(records[1].status, 2);
    }

    #[tokio::test]
    async fn malformed_stream_closes_connection() {
        use tokio::io::AsyncWriteExt;

        let sink = Arc::new(MemorySink::new());
        let context = test_context(3, Arc::clone(&sink));

        let (mut client, task) = spawn_handler(context);
        write_message(
            &mut client,
            &AuthRequest {
                token: auth_token("hunter2"),
            },
        )
        .await
        .unwrap();

        let outcome: AuthOutcome = read_message(&mut client).await.unwrap();
        assert!(outcome.success);

        write_message(&mut client, &CheckResult::new(0, "ok")).await.unwrap();
        client.write_all(b"not a frame at all").await.unwrap();

        task.await.unwrap();
        assert_eq!(sink.records().len(), 1);
    }

    #[tokio::test]
    async fn failures_accumulate_to_throttle() {
        let sink = Arc::new(MemorySink::new());
        let context = test_context(2, Arc::clone(&sink));

        for _ in 0..2 {
            let (mut client, task) = spawn_handler(Arc::clone(&context));
            write_message(
                &mut client,
                &AuthRequest {
                    token: auth_token("letmein"),
                },
            )
            .await
            .unwrap();
            let outcome: AuthOutcome = read_message(&mut client).await.unwrap();
            assert!(!outcome.success);
            task.await.unwrap();
        }

        assert!(context.throttle.is_throttled("203.0.113.9"));

        // The next connection from the same host is closed silently.
        let (mut client, task) = spawn_handler(Arc::clone(&context));
        let mut buf = [0u8; 64];
        assert_eq!(client.read(&mut buf).await.unwrap(), 0);
        task.await.unwrap();
    }
}
