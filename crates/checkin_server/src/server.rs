//! TCP listener.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{handle_connection, HandlerContext};
use crate::store::CheckSink;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// The checkin server.
///
/// Owns the listening socket and the state shared by connection handlers.
/// Each accepted connection runs in its own task; the listener never waits
/// on a handler.
pub struct CheckinServer {
    listener: TcpListener,
    context: Arc<HandlerContext>,
    sweep_interval: Duration,
}

impl CheckinServer {
    /// Validates the configuration and binds the listen address.
    ///
    /// A bind failure is fatal: the caller is expected to abort startup.
    pub async fn bind(config: ServerConfig, sink: Arc<dyn CheckSink>) -> ServerResult<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).await.map_err(|source| {
            ServerError::BindFailed {
                addr: config.listen_addr.clone(),
                source,
            }
        })?;
        info!("listening on {}", listener.local_addr()?);

        let context = Arc::new(HandlerContext::new(&config, sink));

        Ok(Self {
            listener,
            context,
            sweep_interval: config.auth_window(),
        })
    }

    /// Returns the address the server is listening on.
    ///
    /// Tests bind port 0 and read the assigned port back from here.
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the process exits.
    ///
    /// A transient accept error is logged and accepting continues. Also
    /// drives the periodic throttle sweep at window-length cadence.
    pub async fn run(self) -> ServerResult<()> {
        let sweep_context = Arc::clone(&self.context);
        let sweep_interval = self.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.tick().await; // first tick is immediate
            loop {
                ticker.tick().await;
                sweep_context.throttle.sweep();
            }
        });

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let context = Arc::clone(&self.context);
                    tokio::spawn(handle_connection(context, stream, peer));
                }
                Err(err) => {
                    error!("error accepting connection: {}", err);
                }
            }
        }
    }
}
