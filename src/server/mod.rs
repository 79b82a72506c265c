//! Chat server.
//!
//! Listens on a local port (the one a Tor hidden service forwards to) and
//! serves one client at a time:
//!
//! ```text
//! accept ──▶ password challenge ──▶ welcome line ──▶ duplex chat
//!   ▲               │ fail                                │
//!   └───────────────┴──────────── peer gone ◀─────────────┘
//! ```
//!
//! Only a local `/quit` stops the server. Anything else, including the end
//! of local input, ends just the current session.

pub mod config;
mod metrics;

pub use config::ServerConfig;
pub use metrics::{MetricsSnapshot, ServerMetrics};

use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;

use crate::chat::line::write_message;
use crate::chat::{self, AuthSession, Console, ConsoleEvent, LineInput, LoopOptions, Role, SessionEnd};
use crate::error::{Error, Result};

/// Label for messages from the client.
const PEER_LABEL: &str = "Client";

/// A configured chat server.
pub struct ChatServer {
    config: ServerConfig,
    metrics: ServerMetrics,
}

impl ChatServer {
    /// Create a server. Fails on an invalid configuration.
    pub fn new(config: ServerConfig) -> Result<Self> {
        config.validate().map_err(Error::config)?;
        Ok(Self {
            config,
            metrics: ServerMetrics::new(),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the metrics collector.
    pub fn metrics(&self) -> &ServerMetrics {
        &self.metrics
    }

    /// Bind the configured listen address.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.listen_socket_addr().map_err(Error::config)?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::connect(addr.to_string(), e))?;

        tracing::info!("Chat server listening on {}", listener.local_addr()?);
        Ok(listener)
    }

    /// Bind and serve until the operator stops the server.
    pub async fn run<C>(&self, input: &mut LineInput, console: &mut C) -> Result<()>
    where
        C: Console + ?Sized,
    {
        let listener = self.bind().await?;
        self.serve(listener, input, console).await
    }

    /// Accept and serve clients one at a time.
    ///
    /// Returns once a session ends with a local `/quit`.
    pub async fn serve<C>(
        &self,
        listener: TcpListener,
        input: &mut LineInput,
        console: &mut C,
    ) -> Result<()>
    where
        C: Console + ?Sized,
    {
        console.show(ConsoleEvent::Notice("Waiting for a client to connect..."));

        loop {
            let (stream, peer_addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!("Accept error: {}", e);
                    continue;
                }
            };

            if let Err(e) = stream.set_nodelay(true) {
                tracing::debug!("Failed to set TCP_NODELAY for {}: {}", peer_addr, e);
            }

            let outcome = self.serve_session(stream, peer_addr, input, console).await;
            tracing::info!("Server metrics: {}", self.metrics.snapshot());

            match outcome {
                Ok(SessionEnd::LocalQuit) => {
                    tracing::info!("Server shutting down");
                    return Ok(());
                }
                Ok(SessionEnd::InputClosed) => {
                    tracing::info!("Local input closed, ended session with {}", peer_addr);
                }
                Ok(SessionEnd::PeerClosed) => {}
                Err(e) => tracing::warn!("Session with {} ended: {}", peer_addr, e),
            }

            console.show(ConsoleEvent::Notice("Waiting for a client to connect..."));
        }
    }

    /// Authenticate one client, welcome it and chat.
    pub async fn serve_session<S, C>(
        &self,
        stream: S,
        peer_addr: SocketAddr,
        input: &mut LineInput,
        console: &mut C,
    ) -> Result<SessionEnd>
    where
        S: AsyncRead + AsyncWrite + Unpin,
        C: Console + ?Sized,
    {
        self.metrics.increment_connections();
        tracing::info!("Connection from {}", peer_addr);
        console.show(ConsoleEvent::Notice(&format!(
            "Client connected from {}",
            peer_addr
        )));

        let session = AuthSession::new(self.config.max_auth_attempts);
        let mut stream =
            match chat::respond(stream, &self.config.secret, session, self.config.max_line_len).await {
                Ok(stream) => stream,
                Err(e) => {
                    if e.is_auth_failure() {
                        self.metrics.increment_auth_failures();
                    } else {
                        self.metrics.increment_session_errors();
                    }
                    console.show(ConsoleEvent::Warning("Client failed to authenticate"));
                    return Err(e);
                }
            };

        self.metrics.increment_authenticated();
        console.show(ConsoleEvent::Notice("Client authenticated. Chat started."));
        console.show(ConsoleEvent::Help(Role::Server));

        if let Err(e) = write_message(&mut stream, &self.config.welcome_message).await {
            self.metrics.increment_session_errors();
            return Err(e);
        }

        let options = LoopOptions::new(Role::Server, PEER_LABEL, self.config.max_line_len)
            .with_farewell(self.config.farewell_message.clone());
        let end = chat::run(stream, input, console, &options).await;
        if end.is_err() {
            self.metrics.increment_session_errors();
        }
        end
    }
}
